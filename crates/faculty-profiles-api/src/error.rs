//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body has the shape `{"status": <code>, "message": "..."}`;
//! validation failures add an `errors` list of `{field, messages}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use faculty_profiles_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("unauthorized")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::Core(e) => match e {
        CoreError::FileNotFound | CoreError::PersistentIdentifierNotFound(_) => {
          StatusCode::NOT_FOUND
        }
        CoreError::PhotoSizeLimit { .. } | CoreError::Validation(_) | CoreError::Upload(_) => {
          StatusCode::BAD_REQUEST
        }
        CoreError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        CoreError::Store(_) | CoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let body = match &self {
      Self::Core(CoreError::Validation(errors)) => json!({
        "status":  status.as_u16(),
        "message": self.to_string(),
        "errors":  errors,
      }),
      Self::Core(CoreError::Store(_) | CoreError::Serialization(_)) => json!({
        "status":  status.as_u16(),
        "message": "Internal server error.",
      }),
      _ => json!({
        "status":  status.as_u16(),
        "message": self.to_string(),
      }),
    };

    let mut res = (status, Json(body)).into_response();
    if matches!(self, Self::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"faculty-profiles\""),
      );
    }
    res
  }
}
