//! HTTP Basic-auth sessions.
//!
//! A request without an `Authorization` header is anonymous. A request with
//! one must carry valid credentials for a configured user, otherwise it is
//! rejected before reaching any handler.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use kaapi_api::SessionUser;
use serde::Deserialize;

use crate::error::Error;

/// One account allowed to sign in.
#[derive(Debug, Clone, Deserialize)]
pub struct UserAccount {
  /// Stable user id recorded on reviews.
  pub id:            String,
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Credentials accepted as valid for this server instance.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
  pub users: Vec<UserAccount>,
}

/// Resolve the session user from headers.
///
/// `Ok(None)` when no credentials were sent; `Err` when credentials were sent
/// but do not match a configured user.
pub fn verify_auth<'a>(
  headers: &HeaderMap,
  config: &'a AuthConfig,
) -> Result<Option<&'a UserAccount>, Error> {
  let Some(header_val) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let header_val = header_val.to_str().map_err(|_| Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let account = config
    .users
    .iter()
    .find(|u| u.username == username)
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(Some(account))
}

/// Middleware: attach a [`SessionUser`] for authenticated requests.
pub async fn session(
  State(auth): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  match verify_auth(req.headers(), &auth) {
    Ok(Some(account)) => {
      req.extensions_mut().insert(SessionUser(account.id.clone()));
    }
    Ok(None) => {}
    Err(e) => {
      tracing::debug!("rejected request with invalid credentials");
      return Err(e);
    }
  }
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use super::*;
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::HeaderValue;
  use rand_core::OsRng;

  fn make_config(password: &str) -> AuthConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    AuthConfig {
      users: vec![UserAccount {
        id:            "user_42".to_string(),
        username:      "priya".to_string(),
        password_hash: hash,
      }],
    }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[test]
  fn correct_credentials_resolve_user_id() {
    let config = make_config("secret");
    let account = verify_auth(&headers(&basic("priya", "secret")), &config)
      .unwrap()
      .unwrap();
    assert_eq!(account.id, "user_42");
  }

  #[test]
  fn missing_header_is_anonymous() {
    let config = make_config("secret");
    assert!(verify_auth(&HeaderMap::new(), &config).unwrap().is_none());
  }

  #[test]
  fn wrong_password() {
    let config = make_config("secret");
    let res = verify_auth(&headers(&basic("priya", "wrong")), &config);
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[test]
  fn unknown_user() {
    let config = make_config("secret");
    let res = verify_auth(&headers(&basic("arjun", "secret")), &config);
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[test]
  fn invalid_base64_and_other_schemes() {
    let config = make_config("secret");
    let res = verify_auth(&headers("Basic !!!not-base64!!!"), &config);
    assert!(matches!(res, Err(Error::Unauthorized)));
    let res = verify_auth(&headers("Bearer abc"), &config);
    assert!(matches!(res, Err(Error::Unauthorized)));
  }
}
