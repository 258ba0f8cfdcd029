//! Side-effect sinks triggered by successful writes.
//!
//! Both are fire-and-forget from the service's point of view: it spawns the
//! call and never looks at the outcome beyond logging a failure.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{entity::EntityType, review::Review};

/// Marks a cached page render as stale.
pub trait PageCache: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  fn revalidate<'a>(
    &'a self,
    path: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Delivers a notification about a new review to the team.
pub trait Notifier: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify<'a>(
    &'a self,
    event: &'a ReviewEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Payload sent to the [`Notifier`] when a review is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
  pub review_id:     Uuid,
  pub entity_type:   EntityType,
  pub entity_id:     Uuid,
  pub rating:        Option<u8>,
  pub authenticated: bool,
}

impl From<&Review> for ReviewEvent {
  fn from(review: &Review) -> Self {
    Self {
      review_id:     review.id,
      entity_type:   review.entity.entity_type,
      entity_id:     review.entity.entity_id,
      rating:        review.signals.rating.map(|r| r.get()),
      authenticated: !review.identity.is_anonymous(),
    }
  }
}

impl ReviewEvent {
  /// One-line human summary, e.g. for a chat message.
  pub fn summary(&self) -> String {
    let who = if self.authenticated { "signed-in user" } else { "anonymous visitor" };
    match self.rating {
      Some(r) => format!(
        "New {r}★ review of {} {} by a {who}",
        self.entity_type, self.entity_id
      ),
      None => format!(
        "New review of {} {} by a {who}",
        self.entity_type, self.entity_id
      ),
    }
  }
}
