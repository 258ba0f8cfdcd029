//! Error types for `kaapi-core`.
//!
//! [`Error`] covers malformed persisted data; [`ReviewError`] is the
//! caller-facing taxonomy returned by [`crate::service::ReviewService`].

use thiserror::Error;

use crate::submission::MAX_COMMENT_CHARS;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown entity type: {0:?}")]
  UnknownEntityType(String),

  #[error("unknown brew method: {0:?}")]
  UnknownBrewMethod(String),

  #[error("unknown review status: {0:?}")]
  UnknownStatus(String),

  #[error("rating {0} is outside 1..=5")]
  RatingOutOfRange(i64),

  #[error("a review must belong to exactly one of a user or an anonymous id")]
  AmbiguousIdentity,

  #[error("malformed anonymous id: {0:?}")]
  MalformedAnonId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── ReviewError ─────────────────────────────────────────────────────────────

/// Why a review operation was refused.
///
/// The [`code`](ReviewError::code) is the stable contract; the `Display`
/// message is for humans and may change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
  #[error("entity id must be a UUID")]
  InvalidEntityId,

  #[error("add a rating, a recommendation, a brew detail or a comment")]
  NoSignal,

  #[error("rating must be a whole number from 1 to 5")]
  InvalidRating,

  #[error("comment must be at most {} characters", MAX_COMMENT_CHARS)]
  CommentTooLong,

  #[error("sign in or enable cookies to leave a review")]
  MissingIdentity,

  #[error("anonymous id is not a valid UUID")]
  InvalidIdentityFormat,

  #[error("anonymous id does not match the one issued to this browser")]
  IdentityMismatch,

  #[error(
    "anonymous visitors can review up to {limit} coffees or roasters; sign in \
     to review more"
  )]
  AnonLimitReached { limit: u32 },

  #[error("there is no active review to delete")]
  NoActiveReview,

  #[error(
    "review store unavailable{}",
    .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
  )]
  PersistenceFailed { detail: Option<String> },
}

impl ReviewError {
  /// Machine-checkable code; clients branch on this, never on the message.
  pub fn code(&self) -> &'static str {
    match self {
      Self::InvalidEntityId => "INVALID_ENTITY_ID",
      Self::NoSignal => "NO_SIGNAL",
      Self::InvalidRating => "INVALID_RATING",
      Self::CommentTooLong => "COMMENT_TOO_LONG",
      Self::MissingIdentity => "MISSING_IDENTITY",
      Self::InvalidIdentityFormat => "INVALID_IDENTITY_FORMAT",
      Self::IdentityMismatch => "IDENTITY_MISMATCH",
      Self::AnonLimitReached { .. } => "ANON_LIMIT_REACHED",
      Self::NoActiveReview => "NO_ACTIVE_REVIEW",
      Self::PersistenceFailed { .. } => "PERSISTENCE_FAILED",
    }
  }
}
