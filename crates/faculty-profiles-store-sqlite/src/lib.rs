//! SQLite backend for the faculty profiles repository.
//!
//! Implements both [`ProfileStore`](faculty_profiles_core::store::ProfileStore)
//! and [`RecordIndex`](faculty_profiles_core::store::RecordIndex). Wraps
//! [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod records;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
