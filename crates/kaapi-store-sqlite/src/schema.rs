//! SQL schema for the Kaapi SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per submission. Rows are never deleted and only `status` is ever
-- updated, from 'active' to 'deleted'.
CREATE TABLE IF NOT EXISTS reviews (
    seq             INTEGER PRIMARY KEY AUTOINCREMENT,
    id              TEXT NOT NULL UNIQUE,
    entity_type     TEXT NOT NULL CHECK (entity_type IN ('coffee', 'roaster')),
    entity_id       TEXT NOT NULL,
    user_id         TEXT,
    anon_id         TEXT,
    recommend       INTEGER,
    rating          INTEGER CHECK (rating BETWEEN 1 AND 5),
    value_for_money INTEGER,
    works_with_milk INTEGER,
    brew_method     TEXT,
    comment         TEXT CHECK (comment IS NULL OR length(comment) > 0),
    status          TEXT NOT NULL DEFAULT 'active'
                    CHECK (status IN ('active', 'deleted')),
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC, fixed width; sortable
    CHECK ((user_id IS NULL) <> (anon_id IS NULL)),
    CHECK (recommend IS NOT NULL OR rating IS NOT NULL
        OR value_for_money IS NOT NULL OR works_with_milk IS NOT NULL
        OR brew_method IS NOT NULL OR comment IS NOT NULL)
);

CREATE INDEX IF NOT EXISTS reviews_entity_idx ON reviews(entity_type, entity_id);
CREATE INDEX IF NOT EXISTS reviews_user_idx   ON reviews(user_id) WHERE user_id IS NOT NULL;
CREATE INDEX IF NOT EXISTS reviews_anon_idx   ON reviews(anon_id) WHERE anon_id IS NOT NULL;

-- Latest-per-identity: for each identity+entity pair, the most recently
-- created row, kept only while it is active. Insertion order breaks
-- created_at ties.
CREATE VIEW IF NOT EXISTS latest_reviews AS
SELECT r.seq, r.id, r.entity_type, r.entity_id, r.user_id, r.anon_id,
       r.recommend, r.rating, r.value_for_money, r.works_with_milk,
       r.brew_method, r.comment, r.status, r.created_at
FROM reviews r
WHERE r.status = 'active'
  AND NOT EXISTS (
    SELECT 1 FROM reviews newer
    WHERE newer.entity_type = r.entity_type
      AND newer.entity_id   = r.entity_id
      AND newer.user_id IS r.user_id
      AND newer.anon_id IS r.anon_id
      AND (newer.created_at > r.created_at
        OR (newer.created_at = r.created_at AND newer.seq > r.seq))
  );

PRAGMA user_version = 1;
";
