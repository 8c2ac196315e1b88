//! Error type for `faculty-profiles-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A file operation named a profile that does not exist.
  #[error("profile not found: {0}")]
  ProfileNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
