//! Review rows — the append-only record of what people thought.
//!
//! A review row is never edited. What a user experiences as "editing" is a new
//! row for the same identity and entity; the current review is whichever row
//! for the pair was created last, provided it is still active.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, entity::EntityRef, identity::Identity};

// ─── Categories ──────────────────────────────────────────────────────────────

/// How the reviewer brewed the coffee.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BrewMethod {
  Espresso,
  PourOver,
  FrenchPress,
  Aeropress,
  MokaPot,
  SouthIndianFilter,
  ColdBrew,
  Drip,
  Other,
}

/// Only `Active → Deleted` ever happens, and only once.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReviewStatus {
  #[default]
  Active,
  Deleted,
}

impl ReviewStatus {
  pub fn is_active(self) -> bool { matches!(self, Self::Active) }
}

// ─── Rating ──────────────────────────────────────────────────────────────────

/// A star rating, 1 to 5 inclusive.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
  pub const MAX: u8 = 5;
  pub const MIN: u8 = 1;

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<i64> for Rating {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self> {
    if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
      Ok(Self(value as u8))
    } else {
      Err(Error::RatingOutOfRange(value))
    }
  }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> Self { r.0 }
}

// ─── Signals ─────────────────────────────────────────────────────────────────

/// The opinion-bearing fields of a review, already validated. At least one is
/// present on every persisted row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
  pub recommend:       Option<bool>,
  pub rating:          Option<Rating>,
  pub value_for_money: Option<bool>,
  pub works_with_milk: Option<bool>,
  pub brew_method:     Option<BrewMethod>,
  /// Trimmed; `None` rather than empty.
  pub comment:         Option<String>,
}

impl Signals {
  pub fn is_empty(&self) -> bool {
    self.recommend.is_none()
      && self.rating.is_none()
      && self.value_for_money.is_none()
      && self.works_with_milk.is_none()
      && self.brew_method.is_none()
      && self.comment.is_none()
  }
}

// ─── Review ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
  pub id:         Uuid,
  #[serde(flatten)]
  pub entity:     EntityRef,
  pub identity:   Identity,
  #[serde(flatten)]
  pub signals:    Signals,
  pub status:     ReviewStatus,
  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
}

/// A review as shown to everyone. Carries no identity: an anonymous id is the
/// visitor's only credential, and user ids are private.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicReview {
  pub id:            Uuid,
  #[serde(flatten)]
  pub entity:        EntityRef,
  #[serde(flatten)]
  pub signals:       Signals,
  /// Written by a signed-in user.
  pub authenticated: bool,
  pub created_at:    DateTime<Utc>,
}

impl From<Review> for PublicReview {
  fn from(review: Review) -> Self {
    Self {
      id:            review.id,
      entity:        review.entity,
      signals:       review.signals,
      authenticated: !review.identity.is_anonymous(),
      created_at:    review.created_at,
    }
  }
}

/// Input to [`crate::store::ReviewStore::insert_review`]. The store assigns
/// `id`, `status` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewReview {
  pub entity:   EntityRef,
  pub identity: Identity,
  pub signals:  Signals,
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Statistics over the current review of every identity for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
  #[serde(flatten)]
  pub entity:              EntityRef,
  pub review_count:        u32,
  pub rating_count:        u32,
  pub average_rating:      Option<f64>,
  pub recommend_yes:       u32,
  pub recommend_no:        u32,
  pub value_for_money_yes: u32,
  pub works_with_milk_yes: u32,
}

impl EntitySummary {
  pub fn empty(entity: EntityRef) -> Self {
    Self {
      entity,
      review_count: 0,
      rating_count: 0,
      average_rating: None,
      recommend_yes: 0,
      recommend_no: 0,
      value_for_money_yes: 0,
      works_with_milk_yes: 0,
    }
  }

  /// Fold a set of current reviews into a summary.
  pub fn from_reviews<'a>(
    entity: EntityRef,
    reviews: impl IntoIterator<Item = &'a Review>,
  ) -> Self {
    let mut summary = Self::empty(entity);
    let mut rating_total = 0u32;

    for review in reviews {
      let s = &review.signals;
      summary.review_count += 1;
      if let Some(rating) = s.rating {
        summary.rating_count += 1;
        rating_total += u32::from(rating.get());
      }
      match s.recommend {
        Some(true) => summary.recommend_yes += 1,
        Some(false) => summary.recommend_no += 1,
        None => {}
      }
      if s.value_for_money == Some(true) {
        summary.value_for_money_yes += 1;
      }
      if s.works_with_milk == Some(true) {
        summary.works_with_milk_yes += 1;
      }
    }

    if summary.rating_count > 0 {
      summary.average_rating =
        Some(f64::from(rating_total) / f64::from(summary.rating_count));
    }
    summary
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{entity::EntityType, identity::AnonId};

  #[test]
  fn rating_bounds() {
    assert!(Rating::try_from(0).is_err());
    assert_eq!(Rating::try_from(1).unwrap().get(), 1);
    assert_eq!(Rating::try_from(5).unwrap().get(), 5);
    assert!(Rating::try_from(6).is_err());
  }

  #[test]
  fn review_json_shape() {
    let entity = EntityRef::new(EntityType::Coffee, Uuid::new_v4());
    let review = Review {
      id: Uuid::new_v4(),
      entity,
      identity: Identity::Anon(
        AnonId::parse("3f2b8c1e-9d4a-4e6b-a1c2-7f8e9d0a1b2c").unwrap(),
      ),
      signals: Signals {
        rating: Some(Rating::try_from(4).unwrap()),
        brew_method: Some(BrewMethod::SouthIndianFilter),
        ..Signals::default()
      },
      status: ReviewStatus::Active,
      created_at: Utc::now(),
    };

    let json = serde_json::to_value(&review).unwrap();
    assert_eq!(json["entity_type"], "coffee");
    assert_eq!(json["rating"], 4);
    assert_eq!(json["brew_method"], "south_indian_filter");
    assert_eq!(json["status"], "active");
    assert_eq!(json["identity"]["kind"], "anon");

    let back: Review = serde_json::from_value(json).unwrap();
    assert_eq!(back, review);
  }

  #[test]
  fn public_review_hides_identity() {
    const ANON: &str = "3f2b8c1e-9d4a-4e6b-a1c2-7f8e9d0a1b2c";
    let review = Review {
      id:         Uuid::new_v4(),
      entity:     EntityRef::new(EntityType::Roaster, Uuid::new_v4()),
      identity:   Identity::Anon(AnonId::parse(ANON).unwrap()),
      signals:    Signals { recommend: Some(true), ..Signals::default() },
      status:     ReviewStatus::Active,
      created_at: Utc::now(),
    };

    let json = serde_json::to_value(PublicReview::from(review)).unwrap();
    assert!(json.get("identity").is_none());
    assert_eq!(json["authenticated"], false);
    assert_eq!(json["recommend"], true);
    assert!(!json.to_string().contains(ANON));
  }

  #[test]
  fn summary_folds_signals() {
    let entity = EntityRef::new(EntityType::Roaster, Uuid::new_v4());
    let make = |rating: Option<i64>, recommend: Option<bool>| Review {
      id: Uuid::new_v4(),
      entity,
      identity: Identity::User(Uuid::new_v4().to_string()),
      signals: Signals {
        rating: rating.map(|r| Rating::try_from(r).unwrap()),
        recommend,
        works_with_milk: Some(true),
        ..Signals::default()
      },
      status: ReviewStatus::Active,
      created_at: Utc::now(),
    };
    let reviews = [make(Some(5), Some(true)), make(Some(2), Some(false)), make(None, None)];

    let summary = EntitySummary::from_reviews(entity, &reviews);
    assert_eq!(summary.review_count, 3);
    assert_eq!(summary.rating_count, 2);
    assert_eq!(summary.average_rating, Some(3.5));
    assert_eq!((summary.recommend_yes, summary.recommend_no), (1, 1));
    assert_eq!(summary.works_with_milk_yes, 3);
    assert_eq!(summary.value_for_money_yes, 0);
  }
}
