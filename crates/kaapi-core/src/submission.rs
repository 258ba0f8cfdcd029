//! Caller-supplied review payloads and their validation.
//!
//! Checks run in a fixed order and stop at the first failure, so a caller
//! always sees the same error for the same payload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{EntityRef, EntityType},
  error::ReviewError,
  identity::is_uuid_shape,
  review::{BrewMethod, Rating, Signals},
};

/// Longest accepted comment, counted in characters after trimming.
pub const MAX_COMMENT_CHARS: usize = 5000;

// ─── Target ──────────────────────────────────────────────────────────────────

/// Which entity an operation is about, as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewTarget {
  pub entity_type: EntityType,
  /// Kept as a string so a malformed id surfaces as `InvalidEntityId`
  /// instead of a deserialisation failure.
  #[serde(default)]
  pub entity_id:   String,
  /// Detail-page slug, used only to address the page cache.
  #[serde(default)]
  pub entity_slug: Option<String>,
}

impl ReviewTarget {
  pub fn new(entity: EntityRef) -> Self {
    Self {
      entity_type: entity.entity_type,
      entity_id:   entity.entity_id.to_string(),
      entity_slug: None,
    }
  }

  pub fn entity(&self) -> Result<EntityRef, ReviewError> {
    let id = self.entity_id.trim();
    if !is_uuid_shape(id) {
      return Err(ReviewError::InvalidEntityId);
    }
    let entity_id = Uuid::parse_str(id).map_err(|_| ReviewError::InvalidEntityId)?;
    Ok(EntityRef::new(self.entity_type, entity_id))
  }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// A create-review request body, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewInput {
  #[serde(flatten)]
  pub target:          ReviewTarget,
  pub recommend:       Option<bool>,
  /// Any JSON number; only whole numbers 1–5 pass validation.
  pub rating:          Option<f64>,
  pub value_for_money: Option<bool>,
  pub works_with_milk: Option<bool>,
  pub brew_method:     Option<BrewMethod>,
  pub comment:         Option<String>,
}

impl ReviewInput {
  /// An input for `target` with every signal absent.
  pub fn new(target: ReviewTarget) -> Self {
    Self {
      target,
      recommend: None,
      rating: None,
      value_for_money: None,
      works_with_milk: None,
      brew_method: None,
      comment: None,
    }
  }

  fn trimmed_comment(&self) -> Option<&str> {
    self.comment.as_deref().map(str::trim).filter(|c| !c.is_empty())
  }

  fn has_signal(&self) -> bool {
    self.recommend.is_some()
      || self.rating.is_some()
      || self.value_for_money.is_some()
      || self.works_with_milk.is_some()
      || self.brew_method.is_some()
      || self.trimmed_comment().is_some()
  }

  /// Payload checks that need no identity or store access.
  pub fn validate(&self) -> Result<(EntityRef, Signals), ReviewError> {
    let entity = self.target.entity()?;

    if !self.has_signal() {
      return Err(ReviewError::NoSignal);
    }

    let rating = self.rating.map(validate_rating).transpose()?;

    let comment = self.trimmed_comment();
    if comment.is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS) {
      return Err(ReviewError::CommentTooLong);
    }

    let signals = Signals {
      recommend: self.recommend,
      rating,
      value_for_money: self.value_for_money,
      works_with_milk: self.works_with_milk,
      brew_method: self.brew_method,
      comment: comment.map(str::to_owned),
    };
    Ok((entity, signals))
  }
}

fn validate_rating(value: f64) -> Result<Rating, ReviewError> {
  if !value.is_finite() || value.fract() != 0.0 {
    return Err(ReviewError::InvalidRating);
  }
  Rating::try_from(value as i64).map_err(|_| ReviewError::InvalidRating)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn coffee_target() -> ReviewTarget {
    ReviewTarget {
      entity_type: EntityType::Coffee,
      entity_id:   Uuid::new_v4().to_string(),
      entity_slug: None,
    }
  }

  fn with_rating(rating: f64) -> ReviewInput {
    ReviewInput { rating: Some(rating), ..ReviewInput::new(coffee_target()) }
  }

  fn with_comment(comment: String) -> ReviewInput {
    ReviewInput { comment: Some(comment), ..ReviewInput::new(coffee_target()) }
  }

  #[test]
  fn rating_boundaries() {
    for bad in [0.0, 6.0, 3.5, -1.0, f64::NAN] {
      assert_eq!(
        with_rating(bad).validate().unwrap_err(),
        ReviewError::InvalidRating,
        "rating {bad}"
      );
    }
    for good in [1.0, 5.0] {
      let (_, signals) = with_rating(good).validate().unwrap();
      assert_eq!(signals.rating.map(Rating::get), Some(good as u8));
    }
  }

  #[test]
  fn comment_boundaries_count_after_trim() {
    let exact = format!("  {}\n", "a".repeat(MAX_COMMENT_CHARS));
    let (_, signals) = with_comment(exact).validate().unwrap();
    assert_eq!(signals.comment.unwrap().len(), MAX_COMMENT_CHARS);

    let over = "a".repeat(MAX_COMMENT_CHARS + 1);
    assert_eq!(
      with_comment(over).validate().unwrap_err(),
      ReviewError::CommentTooLong
    );
  }

  #[test]
  fn comment_counts_characters_not_bytes() {
    let kannada = "ಕ".repeat(MAX_COMMENT_CHARS);
    assert!(with_comment(kannada).validate().is_ok());
  }

  #[test]
  fn blank_payload_has_no_signal() {
    assert_eq!(
      ReviewInput::new(coffee_target()).validate().unwrap_err(),
      ReviewError::NoSignal
    );
    assert_eq!(
      with_comment("   \n\t".into()).validate().unwrap_err(),
      ReviewError::NoSignal
    );
  }

  #[test]
  fn false_booleans_are_signals() {
    let input = ReviewInput {
      works_with_milk: Some(false),
      ..ReviewInput::new(coffee_target())
    };
    let (_, signals) = input.validate().unwrap();
    assert_eq!(signals.works_with_milk, Some(false));
    assert!(signals.comment.is_none());
  }

  #[test]
  fn entity_id_checked_first() {
    let mut target = coffee_target();
    target.entity_id = "roaster-42".into();
    // No signals either; the id check runs first.
    assert_eq!(
      ReviewInput::new(target.clone()).validate().unwrap_err(),
      ReviewError::InvalidEntityId
    );
    target.entity_id.clear();
    assert_eq!(
      ReviewInput::new(target).validate().unwrap_err(),
      ReviewError::InvalidEntityId
    );
  }

  #[test]
  fn signal_checked_before_rating() {
    let (_, signals) = with_rating(2.0).validate().unwrap();
    assert!(!signals.is_empty());
    // A present-but-invalid rating is still a signal; the rating check fails.
    assert_eq!(with_rating(0.0).validate().unwrap_err(), ReviewError::InvalidRating);
  }

  #[test]
  fn body_deserialises_flat() {
    let id = Uuid::new_v4();
    let input: ReviewInput = serde_json::from_value(serde_json::json!({
      "entity_type": "roaster",
      "entity_id": id.to_string(),
      "rating": 4,
      "comment": "Great body",
    }))
    .unwrap();
    let (entity, signals) = input.validate().unwrap();
    assert_eq!(entity, EntityRef::new(EntityType::Roaster, id));
    assert_eq!(signals.comment.as_deref(), Some("Great body"));
  }
}
