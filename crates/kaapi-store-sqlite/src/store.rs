//! [`SqliteStore`] — the SQLite implementation of [`ReviewStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use kaapi_core::{
  entity::EntityRef,
  identity::{AnonId, Identity},
  review::{EntitySummary, NewReview, Review, ReviewStatus},
  store::ReviewStore,
};

use crate::{
  Result,
  encode::{
    REVIEW_COLUMNS, RawReview, encode_dt, encode_uuid, entity_params, identity_params,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kaapi review store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "review store opened");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT` of [`REVIEW_COLUMNS`] and decode every row.
  async fn query_reviews(
    &self,
    sql: String,
    params: Vec<Option<String>>,
  ) -> Result<Vec<Review>> {
    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_review).collect()
  }
}

/// SQL `COUNT`s are `i64`; clamp into the `u32` the domain uses.
fn saturating_count(count: i64) -> u32 { u32::try_from(count).unwrap_or(u32::MAX) }

// ─── ReviewStore impl ────────────────────────────────────────────────────────

impl ReviewStore for SqliteStore {
  type Error = crate::Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert_review(&self, input: NewReview) -> Result<Review> {
    let review = Review {
      id:         Uuid::new_v4(),
      entity:     input.entity,
      identity:   input.identity,
      signals:    input.signals,
      status:     ReviewStatus::Active,
      created_at: Utc::now(),
    };

    let id_str                   = encode_uuid(review.id);
    let (entity_type, entity_id) = entity_params(review.entity);
    let (user_id, anon_id)       = identity_params(&review.identity);
    let signals                  = review.signals.clone();
    let rating                   = signals.rating.map(|r| i64::from(r.get()));
    let brew_method              = signals.brew_method.map(|b| b.as_ref().to_owned());
    let status_str               = review.status.as_ref().to_owned();
    let created_at_str           = encode_dt(review.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reviews (
             id, entity_type, entity_id, user_id, anon_id,
             recommend, rating, value_for_money, works_with_milk,
             brew_method, comment, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            id_str,
            entity_type,
            entity_id,
            user_id,
            anon_id,
            signals.recommend,
            rating,
            signals.value_for_money,
            signals.works_with_milk,
            brew_method,
            signals.comment,
            status_str,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(review)
  }

  async fn mark_deleted(&self, review_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(review_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE reviews SET status = 'deleted' WHERE id = ?1 AND status = 'active'",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  // ── Latest-per-identity reads ─────────────────────────────────────────────

  async fn current_review(
    &self,
    identity: &Identity,
    entity:   EntityRef,
  ) -> Result<Option<Review>> {
    let (entity_type, entity_id) = entity_params(entity);
    let (user_id, anon_id)       = identity_params(identity);

    let raw: Option<RawReview> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {REVIEW_COLUMNS} FROM latest_reviews
                 WHERE entity_type = ?1 AND entity_id = ?2
                   AND user_id IS ?3 AND anon_id IS ?4"
              ),
              rusqlite::params![entity_type, entity_id, user_id, anon_id],
              RawReview::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReview::into_review).transpose()
  }

  async fn current_reviews_for(&self, entity: EntityRef) -> Result<Vec<Review>> {
    let (entity_type, entity_id) = entity_params(entity);
    self
      .query_reviews(
        format!(
          "SELECT {REVIEW_COLUMNS} FROM latest_reviews
           WHERE entity_type = ?1 AND entity_id = ?2
           ORDER BY created_at DESC, seq DESC"
        ),
        vec![Some(entity_type), Some(entity_id)],
      )
      .await
  }

  async fn count_reviewed_entities(
    &self,
    anon_id: &AnonId,
    exclude: Option<EntityRef>,
  ) -> Result<u32> {
    let anon_str = anon_id.as_str().to_owned();
    let (ex_type, ex_id) = exclude.map(entity_params).unzip();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM (
             SELECT DISTINCT entity_type, entity_id FROM latest_reviews
             WHERE anon_id = ?1
               AND NOT (entity_type IS ?2 AND entity_id IS ?3)
           )",
          rusqlite::params![anon_str, ex_type, ex_id],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(saturating_count(count))
  }

  async fn summarize(&self, entity: EntityRef) -> Result<EntitySummary> {
    let (entity_type, entity_id) = entity_params(entity);

    let (reviews, ratings, average, rec_yes, rec_no, vfm_yes, milk_yes) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*), COUNT(rating), AVG(rating),
                  COUNT(CASE WHEN recommend = 1 THEN 1 END),
                  COUNT(CASE WHEN recommend = 0 THEN 1 END),
                  COUNT(CASE WHEN value_for_money = 1 THEN 1 END),
                  COUNT(CASE WHEN works_with_milk = 1 THEN 1 END)
           FROM latest_reviews
           WHERE entity_type = ?1 AND entity_id = ?2",
          rusqlite::params![entity_type, entity_id],
          |row| {
            Ok((
              row.get::<_, i64>(0)?,
              row.get::<_, i64>(1)?,
              row.get::<_, Option<f64>>(2)?,
              row.get::<_, i64>(3)?,
              row.get::<_, i64>(4)?,
              row.get::<_, i64>(5)?,
              row.get::<_, i64>(6)?,
            ))
          },
        )?)
      })
      .await?;

    Ok(EntitySummary {
      entity,
      review_count: saturating_count(reviews),
      rating_count: saturating_count(ratings),
      average_rating: average,
      recommend_yes: saturating_count(rec_yes),
      recommend_no: saturating_count(rec_no),
      value_for_money_yes: saturating_count(vfm_yes),
      works_with_milk_yes: saturating_count(milk_yes),
    })
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn review_history(
    &self,
    identity: &Identity,
    entity:   EntityRef,
  ) -> Result<Vec<Review>> {
    let (entity_type, entity_id) = entity_params(entity);
    let (user_id, anon_id)       = identity_params(identity);
    self
      .query_reviews(
        format!(
          "SELECT {REVIEW_COLUMNS} FROM reviews
           WHERE entity_type = ?1 AND entity_id = ?2
             AND user_id IS ?3 AND anon_id IS ?4
           ORDER BY created_at DESC, seq DESC"
        ),
        vec![Some(entity_type), Some(entity_id), user_id, anon_id],
      )
      .await
  }
}
