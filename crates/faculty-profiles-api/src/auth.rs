//! HTTP Basic-auth identity extractor.
//!
//! A request without an `Authorization` header runs as
//! [`Identity::Anonymous`]. A header that is present but does not name a
//! configured user with the right password is rejected with 401.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use faculty_profiles_core::{
  identity::Identity,
  store::{ProfileStore, RecordIndex},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// One account allowed to authenticate.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCredentials {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default)]
  pub roles:         Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
  pub users: Vec<UserCredentials>,
}

/// The identity a handler acts for.
pub struct Caller(pub Identity);

/// Resolve the caller's identity from request headers.
pub fn identify(headers: &HeaderMap, config: &AuthConfig) -> Result<Identity, ApiError> {
  let Some(header_val) = headers.get(header::AUTHORIZATION) else {
    return Ok(Identity::Anonymous);
  };
  let header_val = header_val.to_str().map_err(|_| ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let user = config
    .users
    .iter()
    .find(|u| u.username == username)
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&user.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(Identity::user(user.username.clone(), user.roles.clone()))
}

impl<S, R> FromRequestParts<AppState<S, R>> for Caller
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, R>,
  ) -> Result<Self, Self::Rejection> {
    let identity = identify(&parts.headers, &state.auth)?;
    if let Identity::User { username, .. } = &identity {
      tracing::debug!(%username, "authenticated request");
    }
    Ok(Caller(identity))
  }
}
