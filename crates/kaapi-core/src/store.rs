//! The `ReviewStore` trait.
//!
//! Implemented by storage backends (e.g. `kaapi-store-sqlite`). The service
//! and HTTP layers depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  entity::EntityRef,
  identity::{AnonId, Identity},
  review::{EntitySummary, NewReview, Review},
};

/// Abstraction over a review store backend.
///
/// Rows are append-only: the only mutation is a review's own
/// `active → deleted` transition. "Current" always means the most recently
/// created row for an identity+entity pair, and only while that row is active.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ReviewStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Append a new active review. `id` and `created_at` are set by the store.
  fn insert_review(
    &self,
    input: NewReview,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  /// Transition an active review to deleted. Returns `false` if the review
  /// does not exist or is already deleted.
  fn mark_deleted(
    &self,
    review_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Latest-per-identity reads ─────────────────────────────────────────

  /// The current review for `identity` on `entity`, if any.
  fn current_review<'a>(
    &'a self,
    identity: &'a Identity,
    entity: EntityRef,
  ) -> impl Future<Output = Result<Option<Review>, Self::Error>> + Send + 'a;

  /// Current reviews of every identity for `entity`, newest first.
  fn current_reviews_for(
    &self,
    entity: EntityRef,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + '_;

  /// Number of distinct entities `anon_id` currently has an active review
  /// for, ignoring `exclude` if given.
  fn count_reviewed_entities<'a>(
    &'a self,
    anon_id: &'a AnonId,
    exclude: Option<EntityRef>,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + 'a;

  /// Aggregate statistics over [`current_reviews_for`](Self::current_reviews_for).
  fn summarize(
    &self,
    entity: EntityRef,
  ) -> impl Future<Output = Result<EntitySummary, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// Every row `identity` ever wrote for `entity`, deleted ones included,
  /// newest first.
  fn review_history<'a>(
    &'a self,
    identity: &'a Identity,
    entity: EntityRef,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + 'a;
}
