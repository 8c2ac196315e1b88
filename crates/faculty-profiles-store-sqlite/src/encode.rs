//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond
//! precision, so text order is time order. Metadata and record creators are
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use faculty_profiles_core::{
  profile::{FileEntry, Files, Profile, StoredFile},
  record::{Creator, ResearchRecord},
  schema::Metadata,
  search,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Search text ─────────────────────────────────────────────────────────────

/// Every string value in `metadata`, lowercased and newline-separated. Field
/// names are left out so a query for `"name"` does not match every profile.
pub fn search_text(metadata: &Metadata) -> Result<String> {
  fn collect(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
      serde_json::Value::String(s) => out.push(s.to_lowercase()),
      serde_json::Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
      serde_json::Value::Object(map) => map.values().for_each(|v| collect(v, out)),
      _ => {}
    }
  }

  let mut parts = Vec::new();
  collect(&serde_json::to_value(metadata)?, &mut parts);
  Ok(parts.join("\n"))
}

/// `OFFSET` for a 1-based page. Pages past any addressable row clamp to
/// `i64::MAX`, which SQLite answers with no rows.
pub fn sql_offset(page: usize, size: usize) -> i64 {
  search::offset(page, size)
    .and_then(|o| i64::try_from(o).ok())
    .unwrap_or(i64::MAX)
}

/// A case-folded `LIKE` pattern matching `q` anywhere, with wildcards in `q`
/// escaped. Use with `ESCAPE '\'`.
pub fn like_pattern(q: &str) -> String {
  let mut pattern = String::with_capacity(q.len() + 2);
  pattern.push('%');
  for c in q.to_lowercase().chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `profile_files` row (content excluded).
pub struct RawFileEntry {
  pub file_key:   String,
  pub size:       i64,
  pub checksum:   String,
  pub mimetype:   String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawFileEntry {
  pub fn into_entry(self) -> Result<FileEntry> {
    Ok(FileEntry {
      key:      self.file_key,
      size:     u64::try_from(self.size).unwrap_or_default(),
      checksum: self.checksum,
      mimetype: self.mimetype,
      created:  decode_dt(&self.created_at)?,
      updated:  decode_dt(&self.updated_at)?,
    })
  }

  pub fn into_stored(self, content: Vec<u8>) -> Result<StoredFile> {
    Ok(StoredFile { entry: self.into_entry()?, content: Bytes::from(content) })
  }
}

/// Raw values read directly from a `profiles` row.
pub struct RawProfile {
  pub profile_id:    String,
  pub metadata_json: String,
  pub active:        bool,
  pub files_enabled: bool,
  pub created_at:    String,
  pub updated_at:    String,
  pub revision_id:   u32,
}

pub const PROFILE_COLUMNS: &str = "profile_id, metadata_json, active, files_enabled, \
                                   created_at, updated_at, revision_id";

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:    row.get(0)?,
      metadata_json: row.get(1)?,
      active:        row.get(2)?,
      files_enabled: row.get(3)?,
      created_at:    row.get(4)?,
      updated_at:    row.get(5)?,
      revision_id:   row.get(6)?,
    })
  }

  pub fn into_profile(self, files: Vec<RawFileEntry>) -> Result<Profile> {
    let metadata: Metadata = serde_json::from_str(&self.metadata_json)?;
    let entries = files
      .into_iter()
      .map(|raw| raw.into_entry().map(|entry| (entry.key.clone(), entry)))
      .collect::<Result<BTreeMap<_, _>>>()?;

    Ok(Profile {
      id: decode_uuid(&self.profile_id)?,
      metadata,
      active: self.active,
      files: Files { enabled: self.files_enabled, entries },
      created: decode_dt(&self.created_at)?,
      updated: decode_dt(&self.updated_at)?,
      revision_id: self.revision_id,
    })
  }
}

/// Raw values read directly from a `records` row.
pub struct RawRecord {
  pub record_id:     String,
  pub title:         String,
  pub created_at:    String,
  pub creators_json: String,
}

impl RawRecord {
  pub fn into_record(self) -> Result<ResearchRecord> {
    let creators: Vec<Creator> = serde_json::from_str(&self.creators_json)?;
    Ok(ResearchRecord {
      id: self.record_id,
      title: self.title,
      creators,
      created: decode_dt(&self.created_at)?,
    })
  }
}
