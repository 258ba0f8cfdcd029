//! Public read handlers for `/entities/{entity_type}/{entity_id}/…`.

use axum::{
  Json,
  extract::{Path, State, rejection::PathRejection},
};
use kaapi_core::{
  effects::{Notifier, PageCache},
  entity::EntityType,
  review::{EntitySummary, PublicReview},
  store::ReviewStore,
  submission::ReviewTarget,
};

use crate::{ApiState, error::ApiError};

type EntityPath = Result<Path<(EntityType, String)>, PathRejection>;

fn target(path: EntityPath) -> Result<ReviewTarget, ApiError> {
  let Path((entity_type, entity_id)) = path?;
  Ok(ReviewTarget { entity_type, entity_id, entity_slug: None })
}

/// `GET /entities/{entity_type}/{entity_id}/reviews` — current reviews, newest
/// first. Public, so reviewer identities are left out.
pub async fn reviews<S, C, N>(
  State(state): State<ApiState<S, C, N>>,
  path: EntityPath,
) -> Result<Json<Vec<PublicReview>>, ApiError>
where
  S: ReviewStore + 'static,
  C: PageCache,
  N: Notifier,
{
  let target = target(path)?;
  Ok(Json(state.service.entity_reviews(&target).await?))
}

/// `GET /entities/{entity_type}/{entity_id}/summary`
pub async fn summary<S, C, N>(
  State(state): State<ApiState<S, C, N>>,
  path: EntityPath,
) -> Result<Json<EntitySummary>, ApiError>
where
  S: ReviewStore + 'static,
  C: PageCache,
  N: Notifier,
{
  let target = target(path)?;
  Ok(Json(state.service.entity_summary(&target).await?))
}
