//! ETag computation for profile and file resources.
//!
//! A profile's ETag is its revision id, which the store bumps on every
//! committed change (file uploads included). A file's ETag is its content
//! checksum.

use faculty_profiles_core::profile::{FileEntry, Profile};

pub fn profile_etag(profile: &Profile) -> String {
  format!("\"{}\"", profile.revision_id)
}

pub fn file_etag(entry: &FileEntry) -> String {
  let digest = entry
    .checksum
    .split_once(':')
    .map_or(entry.checksum.as_str(), |(_, hex)| hex);
  format!("\"{digest}\"")
}
