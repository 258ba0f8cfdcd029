//! Handlers for `/reviews` endpoints.
//!
//! | Method   | Path               | Notes |
//! |----------|--------------------|-------|
//! | `POST`   | `/reviews`         | 201 `{"id", "review_count"?}`; may set the anon cookie |
//! | `DELETE` | `/reviews`         | 204; soft-deletes the caller's current review |
//! | `GET`    | `/reviews/mine`    | `?entity_type&entity_id[&anon_id]`; `null` if none |
//! | `GET`    | `/reviews/history` | Same query; every row the caller wrote, newest first |

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use kaapi_core::{
  effects::{Notifier, PageCache},
  review::Review,
  store::ReviewStore,
  submission::{ReviewInput, ReviewTarget},
};
use serde::Deserialize;

use crate::{ApiState, caller::RequestCaller, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(flatten)]
  pub review:  ReviewInput,
  /// Anonymous id held by the client, for callers without a session.
  #[serde(default)]
  pub anon_id: Option<String>,
}

/// `POST /reviews`
///
/// When an anonymous review is written for a request that carried no anon
/// cookie, the response sets one so later requests are attributed to the same
/// visitor.
pub async fn create<S, C, N>(
  State(state): State<ApiState<S, C, N>>,
  RequestCaller(caller): RequestCaller,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ReviewStore + 'static,
  C: PageCache,
  N: Notifier,
{
  let Json(body) = body?;
  let created = state
    .service
    .create_review(&caller, body.review, body.anon_id.as_deref())
    .await?;

  let set_cookie = match created.identity.anon_id() {
    Some(anon_id) if caller.anon_cookie.is_none() => state.cookie.set_cookie(anon_id),
    _ => None,
  };

  let mut response = (StatusCode::CREATED, Json(&created)).into_response();
  if let Some(value) = set_cookie {
    response.headers_mut().insert(header::SET_COOKIE, value);
  }
  Ok(response)
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteBody {
  #[serde(flatten)]
  pub target:  ReviewTarget,
  #[serde(default)]
  pub anon_id: Option<String>,
}

/// `DELETE /reviews` — body: `{"entity_type":"coffee","entity_id":"…"}`
pub async fn delete<S, C, N>(
  State(state): State<ApiState<S, C, N>>,
  RequestCaller(caller): RequestCaller,
  body: Result<Json<DeleteBody>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
  S: ReviewStore + 'static,
  C: PageCache,
  N: Notifier,
{
  let Json(body) = body?;
  state
    .service
    .delete_review(&caller, body.target, body.anon_id.as_deref())
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Caller reads ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TargetQuery {
  #[serde(flatten)]
  pub target:  ReviewTarget,
  #[serde(default)]
  pub anon_id: Option<String>,
}

/// `GET /reviews/mine?entity_type=<type>&entity_id=<uuid>[&anon_id=<id>]`
pub async fn mine<S, C, N>(
  State(state): State<ApiState<S, C, N>>,
  RequestCaller(caller): RequestCaller,
  query: Result<Query<TargetQuery>, QueryRejection>,
) -> Result<Json<Option<Review>>, ApiError>
where
  S: ReviewStore + 'static,
  C: PageCache,
  N: Notifier,
{
  let Query(query) = query?;
  let review = state
    .service
    .current_review(&caller, &query.target, query.anon_id.as_deref())
    .await?;
  Ok(Json(review))
}

/// `GET /reviews/history?entity_type=<type>&entity_id=<uuid>[&anon_id=<id>]`
pub async fn history<S, C, N>(
  State(state): State<ApiState<S, C, N>>,
  RequestCaller(caller): RequestCaller,
  query: Result<Query<TargetQuery>, QueryRejection>,
) -> Result<Json<Vec<Review>>, ApiError>
where
  S: ReviewStore + 'static,
  C: PageCache,
  N: Notifier,
{
  let Query(query) = query?;
  let reviews = state
    .service
    .review_history(&caller, &query.target, query.anon_id.as_deref())
    .await?;
  Ok(Json(reviews))
}
