//! Search parameters, sort options and result pages.

use serde::{Deserialize, Serialize};

use crate::{
  profile::Profile,
  record::{RecordFilter, ResearchRecord},
};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

// ─── Sorting ─────────────────────────────────────────────────────────────────

/// Sort orders offered by profile search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOption {
  #[serde(rename = "bestmatch")]
  BestMatch,
  #[serde(rename = "family-name-asc")]
  FamilyNameAsc,
  #[serde(rename = "family-name-desc")]
  FamilyNameDesc,
  #[serde(rename = "newest")]
  Newest,
  #[serde(rename = "oldest")]
  Oldest,
}

impl SortOption {
  /// All options, in the order they are offered to the search UI.
  pub const ALL: [SortOption; 5] = [
    Self::BestMatch,
    Self::FamilyNameAsc,
    Self::FamilyNameDesc,
    Self::Newest,
    Self::Oldest,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::BestMatch => "bestmatch",
      Self::FamilyNameAsc => "family-name-asc",
      Self::FamilyNameDesc => "family-name-desc",
      Self::Newest => "newest",
      Self::Oldest => "oldest",
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      Self::BestMatch => "Best match",
      Self::FamilyNameAsc => "Family Name [A-Z]",
      Self::FamilyNameDesc => "Family Name [Z-A]",
      Self::Newest => "Newest",
      Self::Oldest => "Oldest",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|o| o.as_str() == s)
  }
}

// ─── Profile search ──────────────────────────────────────────────────────────

/// Caller-facing search parameters, as received from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
  pub q:    Option<String>,
  pub sort: Option<String>,
  /// Restrict to this profile type id (`metadata.type.id`).
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub page: Option<usize>,
  pub size: Option<usize>,
}

/// Resolved query handed to [`crate::store::ProfileStore::search_profiles`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileQuery {
  pub q:    Option<String>,
  pub sort: SortOption,
  pub kind: Option<String>,
  pub page: usize,
  pub size: usize,
}

/// A count of profiles per `metadata.type.id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetBucket {
  pub key:       String,
  pub doc_count: u64,
}

#[derive(Debug, Clone)]
pub struct ProfilePage {
  pub hits:        Vec<Profile>,
  pub total:       u64,
  /// Type facet, computed over the whole match set (not just this page).
  pub type_facet:  Vec<FacetBucket>,
  pub query:       ProfileQuery,
}

// ─── Record search ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordSearchParams {
  pub q:    Option<String>,
  pub page: Option<usize>,
  pub size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
  pub filter: RecordFilter,
  pub q:      Option<String>,
  pub page:   usize,
  pub size:   usize,
}

#[derive(Debug, Clone)]
pub struct RecordPage {
  pub hits:  Vec<ResearchRecord>,
  pub total: u64,
  pub page:  usize,
  pub size:  usize,
}

/// Clamp a requested page/size pair to usable values.
pub fn pagination(page: Option<usize>, size: Option<usize>) -> (usize, usize) {
  (
    page.unwrap_or(1).max(1),
    size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
  )
}

/// Rows to skip before `page`, or `None` when the page lies beyond any
/// addressable row.
pub fn offset(page: usize, size: usize) -> Option<usize> {
  page.saturating_sub(1).checked_mul(size)
}

/// Normalise a free-text query: blank becomes `None`.
pub fn query_text(q: Option<String>) -> Option<String> {
  q.map(|q| q.trim().to_owned()).filter(|q| !q.is_empty())
}
