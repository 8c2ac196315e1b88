//! Research records held by the repository's main record index, and the
//! creator filter that scopes them to one profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::Metadata;

/// A creator of a research record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
  /// `"Family, Given"` form.
  pub name:        String,
  #[serde(default)]
  pub identifiers: Vec<String>,
}

/// A research record as exposed by the record index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRecord {
  pub id:       String,
  pub title:    String,
  pub creators: Vec<Creator>,
  pub created:  DateTime<Utc>,
}

/// One disjunct of a [`RecordFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatorClause {
  /// Some creator lists this identifier.
  Identifier(String),
  /// Some creator has exactly this name.
  Name(String),
}

/// Which records belong to a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
  /// Matches nothing.
  MatchNone,
  /// Matches records satisfying at least one clause. Never empty.
  AnyOf(Vec<CreatorClause>),
}

impl RecordFilter {
  /// Records whose creators carry one of the profile's identifiers, or whose
  /// creator name is the profile's `"Family, Given"` name.
  ///
  /// A profile with neither identifiers nor a family name matches nothing.
  pub fn for_profile(metadata: &Metadata) -> Self {
    let mut clauses: Vec<CreatorClause> = metadata
      .identifiers
      .iter()
      .map(|id| CreatorClause::Identifier(id.identifier.clone()))
      .collect();
    if let Some(name) = metadata.creator_name() {
      clauses.push(CreatorClause::Name(name));
    }

    if clauses.is_empty() {
      Self::MatchNone
    } else {
      Self::AnyOf(clauses)
    }
  }

  pub fn matches(&self, record: &ResearchRecord) -> bool {
    match self {
      Self::MatchNone => false,
      Self::AnyOf(clauses) => clauses.iter().any(|clause| {
        record.creators.iter().any(|creator| match clause {
          CreatorClause::Identifier(id) => creator.identifiers.contains(id),
          CreatorClause::Name(name) => creator.name == *name,
        })
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::schema::Identifier;

  fn record(creator: &str, ids: &[&str]) -> ResearchRecord {
    ResearchRecord {
      id:       "rec-1".into(),
      title:    "On Things".into(),
      creators: vec![Creator {
        name:        creator.into(),
        identifiers: ids.iter().map(|s| s.to_string()).collect(),
      }],
      created:  Utc.timestamp_opt(0, 0).unwrap(),
    }
  }

  #[test]
  fn empty_profile_matches_nothing() {
    let metadata = Metadata::default();
    let filter = RecordFilter::for_profile(&metadata);
    assert_eq!(filter, RecordFilter::MatchNone);
    assert!(!filter.matches(&record("", &[])));
  }

  #[test]
  fn name_and_identifier_clauses() {
    let metadata = Metadata {
      family_name: " Doe ".into(),
      given_names: "John ".into(),
      identifiers: vec![Identifier {
        identifier: "0000-0002-1825-0097".into(),
        scheme:     Some("orcid".into()),
      }],
      ..Metadata::default()
    };
    let filter = RecordFilter::for_profile(&metadata);
    assert_eq!(
      filter,
      RecordFilter::AnyOf(vec![
        CreatorClause::Identifier("0000-0002-1825-0097".into()),
        CreatorClause::Name("Doe, John".into()),
      ])
    );

    assert!(filter.matches(&record("Doe, John", &[])));
    assert!(filter.matches(&record("J. Doe", &["0000-0002-1825-0097"])));
    assert!(!filter.matches(&record("Doe, Jane", &[])));
  }

  #[test]
  fn identifiers_alone_suffice() {
    let metadata = Metadata {
      identifiers: vec![Identifier { identifier: "03yrm5c26".into(), scheme: None }],
      ..Metadata::default()
    };
    assert_eq!(
      RecordFilter::for_profile(&metadata),
      RecordFilter::AnyOf(vec![CreatorClause::Identifier("03yrm5c26".into())])
    );
  }
}
