//! Profile records and their attached files.
//!
//! A profile owns a small collection of named files. Two logical slots exist,
//! `photo` and `cv`; a file belongs to a slot when its key is the slot name
//! followed by the uploaded file's extension (`photo.jpg`, `cv.pdf`).

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::schema::Metadata;

// ─── Slots ───────────────────────────────────────────────────────────────────

/// A single-file position on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
  Photo,
  Cv,
}

impl Slot {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Photo => "photo",
      Self::Cv => "cv",
    }
  }

  /// Whether `key` is a file in this slot, whatever its extension.
  ///
  /// Extension-less uploads are stored under the bare slot name, so that key
  /// belongs to the slot too.
  pub fn owns_key(self, key: &str) -> bool {
    match key.strip_prefix(self.as_str()) {
      Some(rest) => rest.is_empty() || rest.starts_with('.'),
      None => false,
    }
  }

  /// The storage key for an upload with the given extension (dot included).
  pub fn key_for(self, extension: Option<&str>) -> String {
    match extension {
      Some(ext) => format!("{}{ext}", self.as_str()),
      None => self.as_str().to_owned(),
    }
  }
}

impl std::fmt::Display for Slot {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The extension of `filename`, including the leading dot.
///
/// Follows the usual path rules: only the final component counts, and a
/// leading dot on its own (`.bashrc`) does not start an extension.
pub fn file_extension(filename: &str) -> Option<&str> {
  let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
  let stem_len = base.len() - base.trim_start_matches('.').len();
  let idx = base[stem_len..].rfind('.')? + stem_len;
  Some(&base[idx..])
}

// ─── Files ───────────────────────────────────────────────────────────────────

/// Metadata about one stored file. Content lives in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
  pub key:      String,
  pub size:     u64,
  /// `sha256:<hex>` digest of the content.
  pub checksum: String,
  pub mimetype: String,
  pub created:  DateTime<Utc>,
  pub updated:  DateTime<Utc>,
}

impl FileEntry {
  /// Describe `content` stored under `key`.
  pub fn describe(key: String, content: &[u8], now: DateTime<Utc>) -> Self {
    let mimetype = mime_guess::from_path(&key)
      .first_or_octet_stream()
      .essence_str()
      .to_owned();
    Self {
      checksum: checksum(content),
      size: content.len() as u64,
      key,
      mimetype,
      created: now,
      updated: now,
    }
  }
}

/// Content digest in `algorithm:hex` form.
pub fn checksum(content: &[u8]) -> String {
  format!("sha256:{}", hex::encode(Sha256::digest(content)))
}

/// A file's metadata together with its content.
#[derive(Debug, Clone)]
pub struct StoredFile {
  pub entry:   FileEntry,
  pub content: Bytes,
}

/// Input to [`crate::store::ProfileStore::write_file`].
///
/// The store applies the write in one transaction: every other key owned by
/// `slot` is hard-deleted, then `entry.key` is inserted or overwritten. The
/// slot's current keys are read inside that transaction, so of two
/// overlapping uploads the later commit is the one left in the slot.
#[derive(Debug, Clone)]
pub struct FileWrite {
  pub slot:    Slot,
  pub entry:   FileEntry,
  pub content: Bytes,
}

/// The file collection of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Files {
  pub enabled: bool,
  pub entries: BTreeMap<String, FileEntry>,
}

impl Files {
  /// The key currently occupying `slot`, if any.
  pub fn slot_key(&self, slot: Slot) -> Option<&str> {
    self.entries.keys().map(String::as_str).find(|k| slot.owns_key(k))
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A stored faculty profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub id:          Uuid,
  pub metadata:    Metadata,
  pub active:      bool,
  pub files:       Files,
  pub created:     DateTime<Utc>,
  pub updated:     DateTime<Utc>,
  /// Incremented on every committed change, files included.
  pub revision_id: u32,
}

/// Input to profile creation and replacement. Ids and timestamps are always
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewProfile {
  pub metadata:      Metadata,
  pub active:        bool,
  pub files_enabled: bool,
}
