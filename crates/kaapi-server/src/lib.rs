//! HTTP server for Kaapi reviews.
//!
//! Wraps the JSON API from [`kaapi_api`] with Basic-auth sessions, request
//! tracing and a health check, and provides the outbound integrations the
//! review service needs.

pub mod auth;
pub mod error;
pub mod integrations;

pub use error::Error;
pub use integrations::{HttpRevalidator, IntegrationError, WebhookNotifier};

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use kaapi_api::ApiState;
use kaapi_core::{
  effects::{Notifier, PageCache},
  service::{ANON_REVIEW_LIMIT, ServiceSettings},
  store::ReviewStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, UserAccount};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Deployment environment. Development exposes store error text to clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  #[default]
  Production,
  Development,
}

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  #[serde(default)]
  pub environment:        Environment,
  #[serde(default = "default_anon_review_limit")]
  pub anon_review_limit:  u32,
  #[serde(default)]
  pub cookie_secure:      bool,
  #[serde(default)]
  pub users:              Vec<UserAccount>,
  #[serde(default)]
  pub notify_webhook_url: Option<String>,
  #[serde(default)]
  pub revalidate_url:     Option<String>,
  #[serde(default)]
  pub revalidate_secret:  Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_anon_review_limit() -> u32 { ANON_REVIEW_LIMIT }

impl ServerConfig {
  pub fn service_settings(&self) -> ServiceSettings {
    ServiceSettings {
      anon_review_limit:   self.anon_review_limit,
      expose_error_detail: self.environment == Environment::Development,
    }
  }

  pub fn auth_config(&self) -> AuthConfig { AuthConfig { users: self.users.clone() } }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the router needs.
pub struct AppState<S, C, N> {
  pub api:  ApiState<S, C, N>,
  pub auth: Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application [`Router`]: `/api/…`, `/healthz`, sessions and
/// tracing.
pub fn router<S, C, N>(state: AppState<S, C, N>) -> Router
where
  S: ReviewStore + 'static,
  C: PageCache,
  N: Notifier,
{
  Router::new()
    .nest("/api", kaapi_api::api_router(state.api))
    .route("/healthz", get(healthz))
    .layer(middleware::from_fn_with_state(state.auth, auth::session))
    .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str { "ok" }

// ─── Integration tests ────────────────────────────────────────────────────────
