//! Outbound HTTP integrations: the team webhook and page revalidation.
//!
//! Both are optional. When their URL is not configured they succeed without
//! doing anything.

use kaapi_core::effects::{Notifier, PageCache, ReviewEvent};
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrationError {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("{target} responded with {status}")]
  Status { target: &'static str, status: StatusCode },
}

fn check(resp: Response, target: &'static str) -> Result<(), IntegrationError> {
  let status = resp.status();
  if status.is_success() {
    Ok(())
  } else {
    Err(IntegrationError::Status { target, status })
  }
}

// ─── Webhook ──────────────────────────────────────────────────────────────────

/// Posts `{"text": "<summary>"}` to a chat-style incoming webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
  client: Client,
  url:    Option<String>,
}

impl WebhookNotifier {
  pub fn new(client: Client, url: Option<String>) -> Self { Self { client, url } }
}

impl Notifier for WebhookNotifier {
  type Error = IntegrationError;

  async fn notify(&self, event: &ReviewEvent) -> Result<(), IntegrationError> {
    let Some(url) = self.url.as_deref() else {
      return Ok(());
    };
    let resp = self
      .client
      .post(url)
      .json(&json!({ "text": event.summary() }))
      .send()
      .await?;
    check(resp, "webhook")
  }
}

// ─── Revalidation ─────────────────────────────────────────────────────────────

/// Asks the front-end to re-render a page: posts `{"path", "secret"}`.
#[derive(Debug, Clone)]
pub struct HttpRevalidator {
  client: Client,
  url:    Option<String>,
  secret: Option<String>,
}

impl HttpRevalidator {
  pub fn new(client: Client, url: Option<String>, secret: Option<String>) -> Self {
    Self { client, url, secret }
  }
}

impl PageCache for HttpRevalidator {
  type Error = IntegrationError;

  async fn revalidate(&self, path: &str) -> Result<(), IntegrationError> {
    let Some(url) = self.url.as_deref() else {
      return Ok(());
    };
    let resp = self
      .client
      .post(url)
      .json(&json!({ "path": path, "secret": self.secret }))
      .send()
      .await?;
    check(resp, "revalidate")
  }
}
