//! [`ProfileService`]: permission-checked profile and file operations.
//!
//! Every operation takes the caller's [`Identity`], resolves the target
//! profile (if any), checks the relevant [`Action`] and only then touches the
//! store.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use futures::{Stream, TryStreamExt as _};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  identity::Identity,
  permissions::{self, Action, ProfilePermissions},
  profile::{FileEntry, FileWrite, NewProfile, Profile, Slot, StoredFile, file_extension},
  record::RecordFilter,
  schema::{self, ValidationErrors},
  search::{
    self, ProfilePage, ProfileQuery, RecordPage, RecordQuery, RecordSearchParams,
    SearchParams, SortOption,
  },
  store::{ProfileStore, RecordIndex},
};

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
  /// Largest accepted photo upload, in bytes.
  pub photo_max_file_size:   u64,
  /// Sort applied when a search has a query but names no sort.
  pub sort_default:          SortOption,
  /// Sort applied when a search has neither a query nor a sort.
  pub sort_default_no_query: SortOption,
}

impl ServiceConfig {
  pub const DEFAULT_PHOTO_MAX_FILE_SIZE: u64 = 1_000_000;

  /// Build from a configured limit. Zero or negative means "use the default".
  pub fn with_photo_max_file_size(limit: i64) -> Self {
    let photo_max_file_size = u64::try_from(limit)
      .ok()
      .filter(|l| *l > 0)
      .unwrap_or(Self::DEFAULT_PHOTO_MAX_FILE_SIZE);
    Self { photo_max_file_size, ..Self::default() }
  }

  /// The sort used when the caller names none.
  pub fn default_sort(&self, q: Option<&str>) -> SortOption {
    match q {
      Some(q) if !q.trim().is_empty() => self.sort_default,
      _ => self.sort_default_no_query,
    }
  }
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      photo_max_file_size:   Self::DEFAULT_PHOTO_MAX_FILE_SIZE,
      sort_default:          SortOption::BestMatch,
      sort_default_no_query: SortOption::FamilyNameAsc,
    }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Orchestrates profile CRUD, file slots and record search over a
/// [`ProfileStore`] and a [`RecordIndex`].
pub struct ProfileService<S, R> {
  store:   Arc<S>,
  records: Arc<R>,
  config:  ServiceConfig,
}

impl<S, R> Clone for ProfileService<S, R> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      records: Arc::clone(&self.records),
      config:  self.config,
    }
  }
}

fn store_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Store(Box::new(e))
}

fn require(identity: &Identity, action: Action) -> Result<()> {
  if permissions::allows(identity, action) {
    Ok(())
  } else {
    debug!(?identity, %action, "permission denied");
    Err(Error::PermissionDenied(action))
  }
}

fn parse_id(id: &str) -> Result<Uuid> {
  Uuid::parse_str(id).map_err(|_| Error::PersistentIdentifierNotFound(id.to_owned()))
}

impl<S, R> ProfileService<S, R>
where
  S: ProfileStore,
  R: RecordIndex,
{
  pub fn new(store: Arc<S>, records: Arc<R>, config: ServiceConfig) -> Self {
    Self { store, records, config }
  }

  pub fn config(&self) -> &ServiceConfig { &self.config }

  /// What `identity` may do with profiles, for serialised results.
  pub fn permissions(&self, identity: &Identity) -> ProfilePermissions {
    ProfilePermissions::for_identity(identity)
  }

  async fn resolve(&self, id: &str) -> Result<Profile> {
    let uuid = parse_id(id)?;
    self
      .store
      .get_profile(uuid)
      .await
      .map_err(store_error)?
      .ok_or_else(|| Error::PersistentIdentifierNotFound(id.to_owned()))
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  pub async fn create(&self, identity: &Identity, data: serde_json::Value) -> Result<Profile> {
    require(identity, Action::Create)?;
    let input = schema::load(data)?;

    let profile = self
      .store
      .create_profile(NewProfile {
        metadata:      input.metadata,
        active:        input.active.unwrap_or(true),
        files_enabled: input.files.and_then(|f| f.enabled).unwrap_or(true),
      })
      .await
      .map_err(store_error)?;

    info!(id = %profile.id, "created faculty profile");
    Ok(profile)
  }

  pub async fn read(&self, identity: &Identity, id: &str) -> Result<Profile> {
    let profile = self.resolve(id).await?;
    require(identity, Action::Read)?;
    Ok(profile)
  }

  /// Replace a profile's metadata. `active` and `files.enabled` keep their
  /// stored values when omitted.
  pub async fn update(
    &self,
    identity: &Identity,
    id: &str,
    data: serde_json::Value,
  ) -> Result<Profile> {
    let current = self.resolve(id).await?;
    require(identity, Action::Update)?;
    let input = schema::load(data)?;

    let profile = self
      .store
      .update_profile(current.id, NewProfile {
        metadata:      input.metadata,
        active:        input.active.unwrap_or(current.active),
        files_enabled: input
          .files
          .and_then(|f| f.enabled)
          .unwrap_or(current.files.enabled),
      })
      .await
      .map_err(store_error)?
      .ok_or_else(|| Error::PersistentIdentifierNotFound(id.to_owned()))?;

    info!(id = %profile.id, revision = profile.revision_id, "updated faculty profile");
    Ok(profile)
  }

  pub async fn delete(&self, identity: &Identity, id: &str) -> Result<()> {
    let profile = self.resolve(id).await?;
    require(identity, Action::Delete)?;

    if !self.store.delete_profile(profile.id).await.map_err(store_error)? {
      return Err(Error::PersistentIdentifierNotFound(id.to_owned()));
    }
    info!(id = %profile.id, "deleted faculty profile");
    Ok(())
  }

  pub async fn search(&self, identity: &Identity, params: SearchParams) -> Result<ProfilePage> {
    require(identity, Action::Search)?;

    let q = search::query_text(params.q);
    let sort = match params.sort.as_deref() {
      Some(name) => SortOption::parse(name).ok_or_else(|| {
        Error::Validation(ValidationErrors::single("sort", format!("Invalid sort option: {name}.")))
      })?,
      None => self.config.default_sort(q.as_deref()),
    };
    let (page, size) = search::pagination(params.page, params.size);
    let query = ProfileQuery {
      q,
      sort,
      kind: params.kind.filter(|k| !k.is_empty()),
      page,
      size,
    };

    debug!(?query, "searching faculty profiles");
    self.store.search_profiles(&query).await.map_err(store_error)
  }

  // ── File slots ────────────────────────────────────────────────────────────

  /// The file currently in `slot`, with its content.
  pub async fn read_slot(&self, identity: &Identity, id: &str, slot: Slot) -> Result<StoredFile> {
    let profile = self.resolve(id).await?;
    require(identity, Action::Read)?;

    let key = profile.files.slot_key(slot).ok_or(Error::FileNotFound)?.to_owned();
    debug!(id = %profile.id, %key, "reading profile file");
    self
      .store
      .read_file(profile.id, key)
      .await
      .map_err(store_error)?
      .ok_or(Error::FileNotFound)
  }

  /// Replace the file in `slot` with the content of `body`.
  ///
  /// The stored key is the slot name plus the extension of `filename`. Any
  /// file in the slot under a different key is removed in the same commit,
  /// so the slot never holds more than one file. A profile deleted while the
  /// body was being read is reported as not found.
  pub async fn update_slot<B, E>(
    &self,
    identity: &Identity,
    id: &str,
    slot: Slot,
    filename: Option<&str>,
    body: B,
    content_length: Option<u64>,
  ) -> Result<FileEntry>
  where
    B: Stream<Item = Result<Bytes, E>> + Send + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
  {
    let extension = filename.and_then(file_extension);
    let profile = self.resolve(id).await?;
    require(identity, Action::Update)?;

    if slot == Slot::Photo {
      let limit = self.config.photo_max_file_size;
      if let Some(given) = content_length.filter(|given| *given > limit) {
        warn!(id = %profile.id, limit, given, "rejected oversized photo upload");
        return Err(Error::PhotoSizeLimit { limit, given });
      }
    }

    let key = slot.key_for(extension);
    let content = collect_body(body).await?;
    let entry = FileEntry::describe(key, &content, Utc::now());
    let entry = self
      .store
      .write_file(profile.id, FileWrite { slot, entry, content })
      .await
      .map_err(store_error)?
      .ok_or_else(|| Error::PersistentIdentifierNotFound(id.to_owned()))?;

    info!(id = %profile.id, key = %entry.key, size = entry.size, "stored profile file");
    Ok(entry)
  }

  /// Remove the file in `slot`, returning its metadata.
  pub async fn delete_slot(&self, identity: &Identity, id: &str, slot: Slot) -> Result<FileEntry> {
    let profile = self.resolve(id).await?;
    require(identity, Action::Update)?;

    let key = profile.files.slot_key(slot).ok_or(Error::FileNotFound)?.to_owned();
    let entry = self
      .store
      .delete_file(profile.id, key)
      .await
      .map_err(store_error)?
      .ok_or(Error::FileNotFound)?;

    info!(id = %profile.id, key = %entry.key, "deleted profile file");
    Ok(entry)
  }

  // ── Records ───────────────────────────────────────────────────────────────

  /// Research records attributed to the profile, by identifier or name.
  pub async fn search_records(
    &self,
    identity: &Identity,
    id: &str,
    params: RecordSearchParams,
  ) -> Result<RecordPage> {
    let profile = self.resolve(id).await?;
    require(identity, Action::SearchRecords)?;

    let (page, size) = search::pagination(params.page, params.size);
    let query = RecordQuery {
      filter: RecordFilter::for_profile(&profile.metadata),
      q: search::query_text(params.q),
      page,
      size,
    };

    debug!(id = %profile.id, filter = ?query.filter, "searching profile records");
    self.records.search_records(&query).await.map_err(store_error)
  }
}

async fn collect_body<B, E>(mut body: B) -> Result<Bytes>
where
  B: Stream<Item = Result<Bytes, E>> + Send + Unpin,
  E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
  let mut buf = BytesMut::new();
  while let Some(chunk) = body.try_next().await.map_err(|e| Error::Upload(e.into()))? {
    buf.extend_from_slice(&chunk);
  }
  Ok(buf.freeze())
}
