//! [`ReviewService`] — the single write path for reviews.
//!
//! Creating and "editing" are the same operation: both append a row. Deleting
//! flips the current row's status. Cache invalidation and team notifications
//! run as detached tasks and can never change an operation's outcome.

use std::{fmt::Display, sync::Arc};

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  effects::{Notifier, PageCache, ReviewEvent},
  entity::EntityRef,
  error::ReviewError,
  identity::{AnonId, Caller, Identity, resolve_identity},
  review::{EntitySummary, NewReview, PublicReview, Review},
  store::ReviewStore,
  submission::{ReviewInput, ReviewTarget},
};

/// How many distinct entities one anonymous visitor may review.
pub const ANON_REVIEW_LIMIT: u32 = 3;

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServiceSettings {
  pub anon_review_limit:   u32,
  /// Include store error text in `PersistenceFailed`. Off in production.
  pub expose_error_detail: bool,
}

impl Default for ServiceSettings {
  fn default() -> Self {
    Self { anon_review_limit: ANON_REVIEW_LIMIT, expose_error_detail: false }
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// Returned by [`ReviewService::create_review`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedReview {
  pub id:           Uuid,
  /// Distinct entities reviewed so far; anonymous identities only.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub review_count: Option<u32>,
  /// The identity the review was written as.
  #[serde(skip)]
  pub identity:     Identity,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct ReviewService<S, C, N> {
  store:    Arc<S>,
  cache:    Arc<C>,
  notifier: Arc<N>,
  settings: ServiceSettings,
}

impl<S, C, N> ReviewService<S, C, N> {
  pub fn new(
    store: Arc<S>,
    cache: Arc<C>,
    notifier: Arc<N>,
    settings: ServiceSettings,
  ) -> Self {
    Self { store, cache, notifier, settings }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn settings(&self) -> &ServiceSettings { &self.settings }

  fn persistence_failed(&self, err: impl Display) -> ReviewError {
    error!(error = %err, "review store operation failed");
    ReviewError::PersistenceFailed {
      detail: self.settings.expose_error_detail.then(|| err.to_string()),
    }
  }
}

impl<S, C, N> ReviewService<S, C, N>
where
  S: ReviewStore,
  C: PageCache,
  N: Notifier,
{
  // ── Writes ────────────────────────────────────────────────────────────

  /// Validate and append one review for `input`'s entity.
  ///
  /// `client_anon_id` is the anonymous id the client claims; it only matters
  /// when the caller has no session.
  pub async fn create_review(
    &self,
    caller: &Caller,
    input: ReviewInput,
    client_anon_id: Option<&str>,
  ) -> Result<CreatedReview, ReviewError> {
    let (entity, signals) = input.validate()?;
    let identity = resolve_identity(caller, client_anon_id)?;

    let prior_count = match &identity {
      Identity::Anon(anon_id) => {
        Some(self.check_anon_quota(&identity, anon_id, entity).await?)
      }
      Identity::User(_) => None,
    };

    let review = self
      .store
      .insert_review(NewReview { entity, identity, signals })
      .await
      .map_err(|e| self.persistence_failed(e))?;

    info!(
      review_id = %review.id,
      entity_type = %entity.entity_type,
      entity_id = %entity.entity_id,
      anonymous = review.identity.is_anonymous(),
      "review recorded"
    );

    self.refresh_page(entity, input.target.entity_slug.as_deref());
    self.announce(ReviewEvent::from(&review));

    Ok(CreatedReview {
      id:           review.id,
      review_count: prior_count.map(|n| n + 1),
      identity:     review.identity,
    })
  }

  /// Soft-delete the caller's current review of `target`.
  pub async fn delete_review(
    &self,
    caller: &Caller,
    target: ReviewTarget,
    client_anon_id: Option<&str>,
  ) -> Result<(), ReviewError> {
    let identity = resolve_identity(caller, client_anon_id)?;
    let entity = target.entity()?;

    let current = self
      .store
      .current_review(&identity, entity)
      .await
      .map_err(|e| self.persistence_failed(e))?
      .ok_or(ReviewError::NoActiveReview)?;

    // A concurrent delete of the same row loses here.
    let deleted = self
      .store
      .mark_deleted(current.id)
      .await
      .map_err(|e| self.persistence_failed(e))?;
    if !deleted {
      return Err(ReviewError::NoActiveReview);
    }

    info!(
      review_id = %current.id,
      entity_type = %entity.entity_type,
      entity_id = %entity.entity_id,
      "review deleted"
    );

    self.refresh_page(entity, target.entity_slug.as_deref());
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The caller's current review of `target`; `None` for a caller with no
  /// identity at all.
  pub async fn current_review(
    &self,
    caller: &Caller,
    target: &ReviewTarget,
    client_anon_id: Option<&str>,
  ) -> Result<Option<Review>, ReviewError> {
    let identity = match resolve_identity(caller, client_anon_id) {
      Ok(identity) => identity,
      Err(ReviewError::MissingIdentity) => return Ok(None),
      Err(e) => return Err(e),
    };
    let entity = target.entity()?;

    self
      .store
      .current_review(&identity, entity)
      .await
      .map_err(|e| self.persistence_failed(e))
  }

  /// Every row the caller wrote for `target`, newest first.
  pub async fn review_history(
    &self,
    caller: &Caller,
    target: &ReviewTarget,
    client_anon_id: Option<&str>,
  ) -> Result<Vec<Review>, ReviewError> {
    let identity = resolve_identity(caller, client_anon_id)?;
    let entity = target.entity()?;

    self
      .store
      .review_history(&identity, entity)
      .await
      .map_err(|e| self.persistence_failed(e))
  }

  /// Current reviews of `target`, one per identity, without identities.
  pub async fn entity_reviews(
    &self,
    target: &ReviewTarget,
  ) -> Result<Vec<PublicReview>, ReviewError> {
    let entity = target.entity()?;
    let reviews = self
      .store
      .current_reviews_for(entity)
      .await
      .map_err(|e| self.persistence_failed(e))?;
    Ok(reviews.into_iter().map(PublicReview::from).collect())
  }

  pub async fn entity_summary(
    &self,
    target: &ReviewTarget,
  ) -> Result<EntitySummary, ReviewError> {
    let entity = target.entity()?;
    self
      .store
      .summarize(entity)
      .await
      .map_err(|e| self.persistence_failed(e))
  }

  // ── Internals ─────────────────────────────────────────────────────────

  /// Returns the distinct-entity count excluding `entity`, or refuses a new
  /// entity once the limit is reached. Edits are never refused.
  async fn check_anon_quota(
    &self,
    identity: &Identity,
    anon_id: &AnonId,
    entity: EntityRef,
  ) -> Result<u32, ReviewError> {
    let is_edit = self
      .store
      .current_review(identity, entity)
      .await
      .map_err(|e| self.persistence_failed(e))?
      .is_some();

    let count = self
      .reviewed_entity_count(anon_id, is_edit.then_some(entity))
      .await;
    let limit = self.settings.anon_review_limit;

    if !is_edit && count >= limit {
      info!(anon_id = %anon_id, count, limit, "anonymous review limit reached");
      return Err(ReviewError::AnonLimitReached { limit });
    }
    Ok(count)
  }

  /// Fail-open: a broken count query must not block a write.
  async fn reviewed_entity_count(
    &self,
    anon_id: &AnonId,
    exclude: Option<EntityRef>,
  ) -> u32 {
    match self.store.count_reviewed_entities(anon_id, exclude).await {
      Ok(count) => count,
      Err(err) => {
        warn!(anon_id = %anon_id, error = %err, "anonymous quota count failed; allowing write");
        0
      }
    }
  }

  fn refresh_page(&self, entity: EntityRef, slug: Option<&str>) {
    let cache = Arc::clone(&self.cache);
    let path = entity.page_path(slug);
    tokio::spawn(async move {
      match cache.revalidate(&path).await {
        Ok(()) => debug!(%path, "page revalidated"),
        Err(err) => warn!(%path, error = %err, "page revalidation failed"),
      }
    });
  }

  fn announce(&self, event: ReviewEvent) {
    let notifier = Arc::clone(&self.notifier);
    tokio::spawn(async move {
      if let Err(err) = notifier.notify(&event).await {
        warn!(review_id = %event.review_id, error = %err, "review notification failed");
      }
    });
  }
}
