//! The `ProfileStore` and `RecordIndex` traits.
//!
//! Both are implemented by storage backends (e.g.
//! `faculty-profiles-store-sqlite`). The service depends on these
//! abstractions, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  profile::{FileEntry, FileWrite, NewProfile, Profile, StoredFile},
  record::ResearchRecord,
  search::{ProfilePage, ProfileQuery, RecordPage, RecordQuery},
};

/// Abstraction over a profile store backend.
///
/// Every mutating method is a single unit of work: it either commits fully or
/// leaves the store untouched. Each commit bumps the profile's `revision_id`
/// and `updated` timestamp.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Persist a new profile with a fresh id and timestamps.
  fn create_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Retrieve a profile and its file entries. Returns `None` if not found.
  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Replace a profile's metadata and flags. Returns `None` if not found.
  fn update_profile(
    &self,
    id: Uuid,
    input: NewProfile,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Delete a profile together with all its files. Returns whether a profile
  /// was deleted.
  fn delete_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Search profiles, returning one page plus the type facet.
  fn search_profiles<'a>(
    &'a self,
    query: &'a ProfileQuery,
  ) -> impl Future<Output = Result<ProfilePage, Self::Error>> + Send + 'a;

  // ── Files ─────────────────────────────────────────────────────────────

  /// Read a file's entry and content. Returns `None` if the key is absent.
  fn read_file(
    &self,
    id: Uuid,
    key: String,
  ) -> impl Future<Output = Result<Option<StoredFile>, Self::Error>> + Send + '_;

  /// Hard-delete every other file in `write.slot` and store `write.content`
  /// under `write.entry.key`, overwriting any file with that key. Returns
  /// `None` if the profile does not exist.
  fn write_file(
    &self,
    id: Uuid,
    write: FileWrite,
  ) -> impl Future<Output = Result<Option<FileEntry>, Self::Error>> + Send + '_;

  /// Hard-delete a file. Returns the removed entry, or `None` if absent.
  fn delete_file(
    &self,
    id: Uuid,
    key: String,
  ) -> impl Future<Output = Result<Option<FileEntry>, Self::Error>> + Send + '_;
}

/// The repository's main record index, consulted to list a profile's
/// research output.
pub trait RecordIndex: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Add or replace a record in the index.
  fn index_record(
    &self,
    record: ResearchRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Search records matching `query.filter` (and `query.q` against titles).
  fn search_records<'a>(
    &'a self,
    query: &'a RecordQuery,
  ) -> impl Future<Output = Result<RecordPage, Self::Error>> + Send + 'a;
}
