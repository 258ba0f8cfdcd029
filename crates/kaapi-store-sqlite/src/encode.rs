//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that string order is time order. UUIDs are stored as hyphenated
//! lowercase strings. Enumerations use their snake_case names.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, Utc};
use kaapi_core::{
  entity::{EntityRef, EntityType},
  identity::Identity,
  review::{BrewMethod, Rating, Review, ReviewStatus, Signals},
};
use uuid::Uuid;

use crate::{Error, Result};

/// Column list shared by every `SELECT` that builds a [`RawReview`].
pub const REVIEW_COLUMNS: &str = "id, entity_type, entity_id, user_id, anon_id, \
   recommend, rating, value_for_money, works_with_milk, brew_method, comment, \
   status, created_at";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ─────────────────────────────────────────────────────────────

pub fn decode_entity_type(s: &str) -> Result<EntityType> {
  EntityType::from_str(s)
    .map_err(|_| kaapi_core::Error::UnknownEntityType(s.to_owned()).into())
}

pub fn decode_brew_method(s: &str) -> Result<BrewMethod> {
  BrewMethod::from_str(s)
    .map_err(|_| kaapi_core::Error::UnknownBrewMethod(s.to_owned()).into())
}

pub fn decode_status(s: &str) -> Result<ReviewStatus> {
  ReviewStatus::from_str(s)
    .map_err(|_| kaapi_core::Error::UnknownStatus(s.to_owned()).into())
}

// ─── Entity / identity parameters ─────────────────────────────────────────────

/// `(entity_type, entity_id)` as bound into SQL.
pub fn entity_params(entity: EntityRef) -> (String, String) {
  (entity.entity_type.as_ref().to_owned(), encode_uuid(entity.entity_id))
}

/// `(user_id, anon_id)` as bound into SQL; exactly one is `Some`.
pub fn identity_params(identity: &Identity) -> (Option<String>, Option<String>) {
  (
    identity.user_id().map(str::to_owned),
    identity.anon_id().map(|a| a.as_str().to_owned()),
  )
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `reviews` (or `latest_reviews`) row, in
/// [`REVIEW_COLUMNS`] order.
pub struct RawReview {
  pub id:              String,
  pub entity_type:     String,
  pub entity_id:       String,
  pub user_id:         Option<String>,
  pub anon_id:         Option<String>,
  pub recommend:       Option<bool>,
  pub rating:          Option<i64>,
  pub value_for_money: Option<bool>,
  pub works_with_milk: Option<bool>,
  pub brew_method:     Option<String>,
  pub comment:         Option<String>,
  pub status:          String,
  pub created_at:      String,
}

impl RawReview {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      entity_type:     row.get(1)?,
      entity_id:       row.get(2)?,
      user_id:         row.get(3)?,
      anon_id:         row.get(4)?,
      recommend:       row.get(5)?,
      rating:          row.get(6)?,
      value_for_money: row.get(7)?,
      works_with_milk: row.get(8)?,
      brew_method:     row.get(9)?,
      comment:         row.get(10)?,
      status:          row.get(11)?,
      created_at:      row.get(12)?,
    })
  }

  pub fn into_review(self) -> Result<Review> {
    let entity = EntityRef::new(
      decode_entity_type(&self.entity_type)?,
      decode_uuid(&self.entity_id)?,
    );
    let identity = Identity::from_columns(self.user_id, self.anon_id)?;

    let rating = self.rating.map(Rating::try_from).transpose()?;
    let brew_method = self.brew_method.as_deref().map(decode_brew_method).transpose()?;

    Ok(Review {
      id: decode_uuid(&self.id)?,
      entity,
      identity,
      signals: Signals {
        recommend: self.recommend,
        rating,
        value_for_money: self.value_for_money,
        works_with_milk: self.works_with_milk,
        brew_method,
        comment: self.comment,
      },
      status: decode_status(&self.status)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn timestamps_sort_as_strings() {
    let whole = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
    let later = whole + chrono::Duration::microseconds(1);
    let (a, b) = (encode_dt(whole), encode_dt(later));
    assert_eq!(a, "2025-03-01T09:30:00.000000Z");
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), later);
  }

  #[test]
  fn unknown_enum_values_are_errors() {
    assert!(decode_entity_type("cafe").is_err());
    assert!(decode_brew_method("siphon").is_err());
    assert!(decode_status("archived").is_err());
    assert_eq!(decode_brew_method("moka_pot").unwrap(), BrewMethod::MokaPot);
  }
}
