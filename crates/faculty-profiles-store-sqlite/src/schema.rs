//! SQL schema for the faculty profiles SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS profiles (
    profile_id    TEXT PRIMARY KEY,
    metadata_json TEXT NOT NULL,
    family_name   TEXT NOT NULL,     -- copied from metadata for sorting
    given_names   TEXT NOT NULL,
    type_id       TEXT,              -- metadata.type.id, for the type facet
    search_text   TEXT NOT NULL,     -- lowercased metadata values, see encode::search_text
    active        INTEGER NOT NULL,
    files_enabled INTEGER NOT NULL,
    created_at    TEXT NOT NULL,     -- RFC 3339 UTC, microsecond precision
    updated_at    TEXT NOT NULL,
    revision_id   INTEGER NOT NULL
);

-- File content is stored inline so that file writes commit together with
-- the owning profile's revision bump.
CREATE TABLE IF NOT EXISTS profile_files (
    profile_id TEXT NOT NULL REFERENCES profiles(profile_id) ON DELETE CASCADE,
    file_key   TEXT NOT NULL,
    content    BLOB NOT NULL,
    size       INTEGER NOT NULL,
    checksum   TEXT NOT NULL,
    mimetype   TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (profile_id, file_key)
);

CREATE TABLE IF NOT EXISTS records (
    record_id     TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    title_folded  TEXT NOT NULL,     -- str::to_lowercase of title, for LIKE
    created_at    TEXT NOT NULL,
    creators_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS record_creator_names (
    record_id TEXT NOT NULL REFERENCES records(record_id) ON DELETE CASCADE,
    name      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS record_creator_identifiers (
    record_id  TEXT NOT NULL REFERENCES records(record_id) ON DELETE CASCADE,
    identifier TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS profiles_family_idx   ON profiles(family_name);
CREATE INDEX IF NOT EXISTS profiles_created_idx  ON profiles(created_at);
CREATE INDEX IF NOT EXISTS creator_names_idx     ON record_creator_names(name);
CREATE INDEX IF NOT EXISTS creator_ids_idx       ON record_creator_identifiers(identifier);

PRAGMA user_version = 2;
";
