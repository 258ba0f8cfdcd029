//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use kaapi_core::ReviewError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// Rendered as `{"error": <message>, "code": <CODE>}`; clients branch on
/// `code`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Review(#[from] ReviewError),

  #[error("invalid request: {0}")]
  BadRequest(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Review(e) => match e {
        ReviewError::InvalidEntityId
        | ReviewError::NoSignal
        | ReviewError::InvalidRating
        | ReviewError::CommentTooLong
        | ReviewError::InvalidIdentityFormat => StatusCode::BAD_REQUEST,
        ReviewError::MissingIdentity => StatusCode::UNAUTHORIZED,
        ReviewError::IdentityMismatch => StatusCode::FORBIDDEN,
        ReviewError::AnonLimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,
        ReviewError::NoActiveReview => StatusCode::NOT_FOUND,
        ReviewError::PersistenceFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::BadRequest(_) => "INVALID_REQUEST",
      Self::Review(e) => e.code(),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = json!({ "error": self.to_string(), "code": self.code() });
    (self.status(), Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quota_error_is_429_with_stable_code() {
    let err = ApiError::from(ReviewError::AnonLimitReached { limit: 3 });
    assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(err.code(), "ANON_LIMIT_REACHED");
  }

  #[test]
  fn mismatch_is_forbidden() {
    let err = ApiError::from(ReviewError::IdentityMismatch);
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
  }
}
