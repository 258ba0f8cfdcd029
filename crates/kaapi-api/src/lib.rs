//! JSON REST API for Kaapi reviews.
//!
//! Exposes an axum [`Router`] backed by a [`ReviewService`]. Session
//! verification, TLS, and transport concerns are the caller's responsibility:
//! an authenticated request must carry a [`caller::SessionUser`] extension by
//! the time it reaches these handlers.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", kaapi_api::api_router(state.clone()))
//! ```

pub mod caller;
pub mod entities;
pub mod error;
pub mod reviews;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use kaapi_core::{
  effects::{Notifier, PageCache},
  service::ReviewService,
  store::ReviewStore,
};

pub use caller::{AnonCookie, RequestCaller, SessionUser};
pub use error::ApiError;

/// Shared handler state.
pub struct ApiState<S, C, N> {
  pub service: Arc<ReviewService<S, C, N>>,
  pub cookie:  AnonCookie,
}

// Derived `Clone` would demand `S: Clone` and friends.
impl<S, C, N> Clone for ApiState<S, C, N> {
  fn clone(&self) -> Self {
    Self { service: Arc::clone(&self.service), cookie: self.cookie.clone() }
  }
}

impl<S, C, N> ApiState<S, C, N> {
  pub fn new(service: Arc<ReviewService<S, C, N>>, cookie: AnonCookie) -> Self {
    Self { service, cookie }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C, N>(state: ApiState<S, C, N>) -> Router<()>
where
  S: ReviewStore + 'static,
  C: PageCache,
  N: Notifier,
{
  Router::new()
    // Reviews
    .route(
      "/reviews",
      post(reviews::create::<S, C, N>).delete(reviews::delete::<S, C, N>),
    )
    .route("/reviews/mine", get(reviews::mine::<S, C, N>))
    .route("/reviews/history", get(reviews::history::<S, C, N>))
    // Entities
    .route(
      "/entities/{entity_type}/{entity_id}/reviews",
      get(entities::reviews::<S, C, N>),
    )
    .route(
      "/entities/{entity_type}/{entity_id}/summary",
      get(entities::summary::<S, C, N>),
    )
    .with_state(state)
}
