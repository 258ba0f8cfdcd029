//! Per-request identity inputs: the session user and the anonymous-id cookie.
//!
//! Session verification happens upstream (the server's auth middleware), which
//! records the outcome as a [`SessionUser`] request extension. This module only
//! reads it, together with the first-party cookie.

use std::convert::Infallible;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, HeaderValue, header, request::Parts},
};
use kaapi_core::identity::{AnonId, Caller};

/// Name of the first-party cookie holding the anonymous visitor id.
pub const ANON_COOKIE: &str = "kaapi_anon_id";

/// One year.
const ANON_COOKIE_MAX_AGE: u64 = 365 * 24 * 60 * 60;

/// Request extension set by the session layer for authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub String);

/// Extractor yielding the [`Caller`] for this request. Never rejects.
#[derive(Debug, Clone)]
pub struct RequestCaller(pub Caller);

impl<St> FromRequestParts<St> for RequestCaller
where
  St: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    let user_id = parts
      .extensions
      .get::<SessionUser>()
      .map(|SessionUser(id)| id.clone());
    let anon_cookie = read_cookie(&parts.headers, ANON_COOKIE).map(str::to_owned);
    Ok(Self(Caller { user_id, anon_cookie }))
  }
}

/// Value of cookie `name` across all `Cookie` headers, if set and non-empty.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(key, _)| *key == name)
    .map(|(_, value)| value.trim().trim_matches('"'))
    .filter(|value| !value.is_empty())
}

/// Attributes of the anonymous-id cookie issued by this server.
#[derive(Debug, Clone, Default)]
pub struct AnonCookie {
  /// Add the `Secure` attribute; set whenever the site is served over HTTPS.
  pub secure: bool,
}

impl AnonCookie {
  /// The `Set-Cookie` value that stores `id`.
  pub fn set_cookie(&self, id: &AnonId) -> Option<HeaderValue> {
    let secure = if self.secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
      "{ANON_COOKIE}={id}; Path=/; Max-Age={ANON_COOKIE_MAX_AGE}; HttpOnly; \
       SameSite=Lax{secure}"
    ))
    .ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn headers(cookies: &[&'static str]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for c in cookies {
      map.append(header::COOKIE, HeaderValue::from_static(c));
    }
    map
  }

  #[test]
  fn reads_named_cookie_among_others() {
    let h = headers(&["theme=dark; kaapi_anon_id=abc ; lang=en"]);
    assert_eq!(read_cookie(&h, ANON_COOKIE), Some("abc"));
    assert_eq!(read_cookie(&h, "lang"), Some("en"));
    assert_eq!(read_cookie(&h, "missing"), None);
  }

  #[test]
  fn reads_across_multiple_headers_and_ignores_empty() {
    let h = headers(&["theme=dark", "kaapi_anon_id=\"xyz\""]);
    assert_eq!(read_cookie(&h, ANON_COOKIE), Some("xyz"));
    assert_eq!(read_cookie(&headers(&["kaapi_anon_id="]), ANON_COOKIE), None);
  }

  #[test]
  fn set_cookie_attributes() {
    let id = AnonId::parse("3f2b8c1e-9d4a-4e6b-a1c2-7f8e9d0a1b2c").unwrap();
    let plain = AnonCookie { secure: false }.set_cookie(&id).unwrap();
    let plain = plain.to_str().unwrap();
    assert!(plain.starts_with("kaapi_anon_id=3f2b8c1e-9d4a-4e6b-a1c2-7f8e9d0a1b2c;"));
    assert!(plain.contains("HttpOnly"));
    assert!(!plain.contains("Secure"));

    let secure = AnonCookie { secure: true }.set_cookie(&id).unwrap();
    assert!(secure.to_str().unwrap().ends_with("; Secure"));
  }
}
