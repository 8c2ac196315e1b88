//! [`SqliteStore`]: the SQLite implementation of [`ProfileStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use faculty_profiles_core::{
  profile::{FileEntry, FileWrite, NewProfile, Profile, StoredFile},
  search::{FacetBucket, ProfilePage, ProfileQuery, SortOption},
  store::ProfileStore,
};

use crate::{
  Error, Result,
  encode::{
    PROFILE_COLUMNS, RawFileEntry, RawProfile, decode_dt, encode_dt, encode_uuid, like_pattern,
    search_text, sql_offset,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A faculty profile store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

const FILE_COLUMNS: &str = "file_key, size, checksum, mimetype, created_at, updated_at";

fn file_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawFileEntry> {
  Ok(RawFileEntry {
    file_key:   row.get(0)?,
    size:       row.get(1)?,
    checksum:   row.get(2)?,
    mimetype:   row.get(3)?,
    created_at: row.get(4)?,
    updated_at: row.get(5)?,
  })
}

/// Bump a profile's revision inside the current transaction. Returns `false`
/// when the profile does not exist.
fn touch_profile(conn: &rusqlite::Connection, id: &str, at: &str) -> rusqlite::Result<bool> {
  let changed = conn.execute(
    "UPDATE profiles SET revision_id = revision_id + 1, updated_at = ?2
     WHERE profile_id = ?1",
    rusqlite::params![id, at],
  )?;
  Ok(changed > 0)
}

fn order_clause(sort: SortOption, ranked: bool) -> &'static str {
  match sort {
    SortOption::BestMatch if ranked => {
      "ORDER BY (lower(family_name) = ?3 OR lower(given_names) = ?3) DESC,
                instr(lower(family_name || ' ' || given_names), ?3) = 0,
                family_name COLLATE NOCASE, given_names COLLATE NOCASE, rowid"
    }
    SortOption::BestMatch | SortOption::FamilyNameAsc => {
      "ORDER BY family_name COLLATE NOCASE ASC, given_names COLLATE NOCASE ASC, rowid"
    }
    SortOption::FamilyNameDesc => {
      "ORDER BY family_name COLLATE NOCASE DESC, given_names COLLATE NOCASE DESC, rowid DESC"
    }
    SortOption::Newest => "ORDER BY created_at DESC, rowid DESC",
    SortOption::Oldest => "ORDER BY created_at ASC, rowid ASC",
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write a profile row; `created_at` and the revision are only set on
  /// insert.
  async fn write_profile(&self, id: Uuid, input: NewProfile, insert: bool) -> Result<bool> {
    let id_str        = encode_uuid(id);
    let metadata_json = serde_json::to_string(&input.metadata)?;
    let family_name   = input.metadata.family_name.clone();
    let given_names   = input.metadata.given_names.clone();
    let type_id       = input.metadata.kind.as_ref().map(|k| k.id.clone());
    let search_text   = search_text(&input.metadata)?;
    let now_str       = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        let changed = if insert {
          conn.execute(
            "INSERT INTO profiles (
               profile_id, metadata_json, family_name, given_names, type_id,
               active, files_enabled, created_at, updated_at, revision_id, search_text
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, 1, ?9)",
            rusqlite::params![
              id_str,
              metadata_json,
              family_name,
              given_names,
              type_id,
              input.active,
              input.files_enabled,
              now_str,
              search_text,
            ],
          )?
        } else {
          conn.execute(
            "UPDATE profiles SET
               metadata_json = ?2, family_name = ?3, given_names = ?4, type_id = ?5,
               active = ?6, files_enabled = ?7, updated_at = ?8,
               revision_id = revision_id + 1, search_text = ?9
             WHERE profile_id = ?1",
            rusqlite::params![
              id_str,
              metadata_json,
              family_name,
              given_names,
              type_id,
              input.active,
              input.files_enabled,
              now_str,
              search_text,
            ],
          )?
        };
        Ok(changed > 0)
      })
      .await?;
    Ok(changed)
  }

  async fn load_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);

    let raw: Option<(RawProfile, Vec<RawFileEntry>)> = self
      .conn
      .call(move |conn| {
        let profile = conn
          .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id = ?1"),
            rusqlite::params![id_str],
            RawProfile::from_row,
          )
          .optional()?;
        let Some(profile) = profile else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(&format!(
          "SELECT {FILE_COLUMNS} FROM profile_files WHERE profile_id = ?1 ORDER BY file_key"
        ))?;
        let files = stmt
          .query_map(rusqlite::params![id_str], file_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some((profile, files)))
      })
      .await?;

    raw.map(|(profile, files)| profile.into_profile(files)).transpose()
  }

  /// File entries for a batch of profiles, keyed by position in `ids`.
  async fn load_files(&self, ids: Vec<String>) -> Result<Vec<Vec<RawFileEntry>>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM profile_files WHERE profile_id = ?1 ORDER BY file_key"
          ))?;
          let mut out = Vec::with_capacity(ids.len());
          for id in &ids {
            out.push(
              stmt
                .query_map(rusqlite::params![id], file_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            );
          }
          Ok(out)
        })
        .await?,
    )
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn create_profile(&self, input: NewProfile) -> Result<Profile> {
    let id = Uuid::new_v4();
    self.write_profile(id, input, true).await?;
    self.load_profile(id).await?.ok_or(Error::ProfileNotFound(id))
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    self.load_profile(id).await
  }

  async fn update_profile(&self, id: Uuid, input: NewProfile) -> Result<Option<Profile>> {
    if !self.write_profile(id, input, false).await? {
      return Ok(None);
    }
    self.load_profile(id).await
  }

  async fn delete_profile(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "DELETE FROM profiles WHERE profile_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(changed > 0)
      })
      .await?;
    Ok(deleted)
  }

  async fn search_profiles<'a>(&'a self, query: &'a ProfileQuery) -> Result<ProfilePage> {
    let pattern    = query.q.as_deref().map(like_pattern);
    let rank_q     = query.q.as_deref().map(str::to_lowercase);
    let kind       = query.kind.clone();
    let order      = order_clause(query.sort, rank_q.is_some());
    let limit_val  = query.size as i64;
    let offset_val = sql_offset(query.page, query.size);

    let (raws, total, buckets): (Vec<RawProfile>, i64, Vec<(String, i64)>) = self
      .conn
      .call(move |conn| {
        let text_cond = "(?1 IS NULL OR search_text LIKE ?1 ESCAPE '\\')";
        let kind_cond = "(?2 IS NULL OR type_id = ?2)";

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM profiles WHERE {text_cond} AND {kind_cond}"),
          rusqlite::params![pattern.as_deref(), kind.as_deref()],
          |row| row.get(0),
        )?;

        // The facet ignores the type filter so every type stays selectable.
        let mut stmt = conn.prepare(&format!(
          "SELECT type_id, COUNT(*) FROM profiles
           WHERE {text_cond} AND type_id IS NOT NULL
           GROUP BY type_id ORDER BY COUNT(*) DESC, type_id"
        ))?;
        let buckets = stmt
          .query_map(rusqlite::params![pattern.as_deref()], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS} FROM profiles
           WHERE {text_cond} AND {kind_cond}
           {order}
           LIMIT ?4 OFFSET ?5"
        ))?;
        let raws = stmt
          .query_map(
            rusqlite::params![
              pattern.as_deref(),
              kind.as_deref(),
              rank_q.as_deref(),
              limit_val,
              offset_val,
            ],
            RawProfile::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((raws, total, buckets))
      })
      .await?;

    let ids = raws.iter().map(|r| r.profile_id.clone()).collect();
    let files = self.load_files(ids).await?;
    let hits = raws
      .into_iter()
      .zip(files)
      .map(|(raw, files)| raw.into_profile(files))
      .collect::<Result<Vec<_>>>()?;

    Ok(ProfilePage {
      hits,
      total: total.unsigned_abs(),
      type_facet: buckets
        .into_iter()
        .map(|(key, count)| FacetBucket { key, doc_count: count.unsigned_abs() })
        .collect(),
      query: query.clone(),
    })
  }

  // ── Files ─────────────────────────────────────────────────────────────────

  async fn read_file(&self, id: Uuid, key: String) -> Result<Option<StoredFile>> {
    let id_str = encode_uuid(id);

    let raw: Option<(RawFileEntry, Vec<u8>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {FILE_COLUMNS}, content FROM profile_files
                 WHERE profile_id = ?1 AND file_key = ?2"
              ),
              rusqlite::params![id_str, key],
              |row| Ok((file_from_row(row)?, row.get(6)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|(entry, content)| entry.into_stored(content)).transpose()
  }

  async fn write_file(&self, id: Uuid, write: FileWrite) -> Result<Option<FileEntry>> {
    let id_str   = encode_uuid(id);
    let now_str  = encode_dt(Utc::now());
    let FileWrite { slot, mut entry, content } = write;
    let key      = entry.key.clone();
    let size     = i64::try_from(entry.size).unwrap_or(i64::MAX);
    let checksum = entry.checksum.clone();
    let mimetype = entry.mimetype.clone();
    let updated_str = now_str.clone();

    let created: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !touch_profile(&tx, &id_str, &now_str)? {
          return Ok(None);
        }
        let stale: Vec<String> = {
          let mut stmt = tx.prepare("SELECT file_key FROM profile_files WHERE profile_id = ?1")?;
          let keys = stmt
            .query_map(rusqlite::params![id_str], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          keys.into_iter().filter(|k| slot.owns_key(k) && *k != key).collect()
        };
        for old in stale {
          tx.execute(
            "DELETE FROM profile_files WHERE profile_id = ?1 AND file_key = ?2",
            rusqlite::params![id_str, old],
          )?;
        }
        tx.execute(
          "INSERT INTO profile_files (
             profile_id, file_key, content, size, checksum, mimetype, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
           ON CONFLICT (profile_id, file_key) DO UPDATE SET
             content = excluded.content,
             size = excluded.size,
             checksum = excluded.checksum,
             mimetype = excluded.mimetype,
             updated_at = excluded.updated_at",
          rusqlite::params![id_str, key, content.as_ref(), size, checksum, mimetype, now_str],
        )?;
        let created: String = tx.query_row(
          "SELECT created_at FROM profile_files WHERE profile_id = ?1 AND file_key = ?2",
          rusqlite::params![id_str, key],
          |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(Some(created))
      })
      .await?;

    let Some(created) = created else {
      return Ok(None);
    };
    entry.created = decode_dt(&created)?;
    entry.updated = decode_dt(&updated_str)?;
    Ok(Some(entry))
  }

  async fn delete_file(&self, id: Uuid, key: String) -> Result<Option<FileEntry>> {
    let id_str  = encode_uuid(id);
    let now_str = encode_dt(Utc::now());

    let raw: Option<RawFileEntry> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = tx
          .query_row(
            &format!(
              "SELECT {FILE_COLUMNS} FROM profile_files WHERE profile_id = ?1 AND file_key = ?2"
            ),
            rusqlite::params![id_str, key],
            file_from_row,
          )
          .optional()?;
        if raw.is_some() {
          tx.execute(
            "DELETE FROM profile_files WHERE profile_id = ?1 AND file_key = ?2",
            rusqlite::params![id_str, key],
          )?;
          touch_profile(&tx, &id_str, &now_str)?;
        }
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawFileEntry::into_entry).transpose()
  }
}
