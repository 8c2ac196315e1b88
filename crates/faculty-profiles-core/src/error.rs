//! Error types for `faculty-profiles-core`.

use thiserror::Error;

use crate::{permissions::Action, schema::ValidationErrors};

#[derive(Debug, Error)]
pub enum Error {
  /// The requested slot holds no file.
  #[error("No file exists for this faculty profile.")]
  FileNotFound,

  #[error(
    "Picture size limit exceeded. Limit: {limit} bytes Given: {given} bytes"
  )]
  PhotoSizeLimit { limit: u64, given: u64 },

  #[error("Permission denied.")]
  PermissionDenied(Action),

  /// The id did not resolve to a stored profile (or was not a valid id).
  #[error("The persistent identifier does not exist.")]
  PersistentIdentifierNotFound(String),

  #[error("A validation error occurred.")]
  Validation(ValidationErrors),

  #[error("upload stream error: {0}")]
  Upload(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self { Self::Validation(errors) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
