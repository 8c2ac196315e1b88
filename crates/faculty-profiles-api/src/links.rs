//! Hypermedia links attached to serialised profiles and files.

use std::fmt::Display;

use faculty_profiles_core::profile::Slot;
use serde::Serialize;
use uuid::Uuid;

/// Base URLs the links are built from.
#[derive(Debug, Clone)]
pub struct Links {
  api: String,
  ui:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileLinks {
  #[serde(rename = "self")]
  pub self_:     String,
  pub self_html: String,
  pub edit_html: String,
  pub photo:     String,
  pub cv:        String,
  pub records:   String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLinks {
  #[serde(rename = "self")]
  pub self_: String,
}

impl Links {
  /// Trailing slashes on either base are ignored.
  pub fn new(api_base_url: &str, ui_base_url: &str) -> Self {
    Self {
      api: api_base_url.trim_end_matches('/').to_owned(),
      ui:  ui_base_url.trim_end_matches('/').to_owned(),
    }
  }

  /// The profile collection endpoint.
  pub fn collection(&self) -> String { format!("{}/faculty-profiles", self.api) }

  pub fn profile(&self, id: Uuid) -> ProfileLinks {
    let api = format!("{}/faculty-profiles/{id}", self.api);
    let ui  = format!("{}/faculty-profiles/{id}", self.ui);
    ProfileLinks {
      self_html: ui.clone(),
      edit_html: format!("{ui}/edit"),
      photo:     format!("{api}/photo"),
      cv:        format!("{api}/cv"),
      records:   format!("{api}/records"),
      self_:     api,
    }
  }

  pub fn file(&self, id: impl Display, slot: Slot) -> FileLinks {
    FileLinks { self_: format!("{}/faculty-profiles/{id}/{slot}", self.api) }
  }
}
