//! Who is writing: a signed-in user or an anonymous visitor.
//!
//! The anonymous id issued in the first-party cookie is the trust anchor. A
//! request that carries a different id in its body is refused outright rather
//! than reconciled, since arbitrary script can forge the body but not the
//! cookie.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, error::ReviewError};

// ─── UUID shape ──────────────────────────────────────────────────────────────

/// `true` if `s` is five hyphen-separated groups of 8-4-4-4-12 hex digits,
/// in either case. Braced, URN and unhyphenated forms are rejected.
pub fn is_uuid_shape(s: &str) -> bool {
  const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

  let mut parts = s.split('-');
  GROUPS.iter().all(|&len| {
    parts
      .next()
      .is_some_and(|p| p.len() == len && p.bytes().all(|b| b.is_ascii_hexdigit()))
  }) && parts.next().is_none()
}

// ─── AnonId ──────────────────────────────────────────────────────────────────

/// A UUID-shaped anonymous visitor id. Kept verbatim; never normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnonId(String);

impl AnonId {
  pub fn parse(s: &str) -> Result<Self, ReviewError> {
    if is_uuid_shape(s) {
      Ok(Self(s.to_owned()))
    } else {
      Err(ReviewError::InvalidIdentityFormat)
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for AnonId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> {
    if is_uuid_shape(&s) {
      Ok(Self(s))
    } else {
      Err(Error::MalformedAnonId(s))
    }
  }
}

impl From<AnonId> for String {
  fn from(id: AnonId) -> Self { id.0 }
}

impl fmt::Display for AnonId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// The author of a review. Exactly one kind, by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Identity {
  User(String),
  Anon(AnonId),
}

impl Identity {
  /// Rebuild an identity from the two nullable `reviews` columns.
  pub fn from_columns(
    user_id: Option<String>,
    anon_id: Option<String>,
  ) -> Result<Self, Error> {
    match (user_id, anon_id) {
      (Some(user), None) => Ok(Self::User(user)),
      (None, Some(anon)) => Ok(Self::Anon(AnonId::try_from(anon)?)),
      _ => Err(Error::AmbiguousIdentity),
    }
  }

  pub fn user_id(&self) -> Option<&str> {
    match self {
      Self::User(id) => Some(id),
      Self::Anon(_) => None,
    }
  }

  pub fn anon_id(&self) -> Option<&AnonId> {
    match self {
      Self::User(_) => None,
      Self::Anon(id) => Some(id),
    }
  }

  pub fn is_anonymous(&self) -> bool { matches!(self, Self::Anon(_)) }
}

// ─── Caller ──────────────────────────────────────────────────────────────────

/// What the transport layer knows about the request's author before any
/// client-supplied data is considered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
  /// Set when the request carries a verified session.
  pub user_id:     Option<String>,
  /// The anonymous id previously issued in the first-party cookie.
  pub anon_cookie: Option<String>,
}

impl Caller {
  pub fn user(id: impl Into<String>) -> Self {
    Self { user_id: Some(id.into()), anon_cookie: None }
  }

  pub fn anonymous(cookie: Option<String>) -> Self {
    Self { user_id: None, anon_cookie: cookie }
  }
}

fn present(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|v| !v.is_empty())
}

/// Decide which identity a write is performed as.
///
/// A session always wins and the client-supplied id is ignored. Otherwise the
/// cookie and client ids must agree when both are present; the cookie takes
/// precedence, and the effective id must be UUID-shaped.
pub fn resolve_identity(
  caller: &Caller,
  client_anon_id: Option<&str>,
) -> Result<Identity, ReviewError> {
  if let Some(user_id) = present(caller.user_id.as_deref()) {
    return Ok(Identity::User(user_id.to_owned()));
  }

  let cookie = present(caller.anon_cookie.as_deref());
  let client = present(client_anon_id);

  if let (Some(cookie), Some(client)) = (cookie, client)
    && cookie != client
  {
    warn!(
      cookie_anon_id = cookie,
      client_anon_id = client,
      "anonymous id in request does not match cookie; possible tampering"
    );
    return Err(ReviewError::IdentityMismatch);
  }

  let effective = cookie.or(client).ok_or(ReviewError::MissingIdentity)?;
  AnonId::parse(effective).map(Identity::Anon)
}
