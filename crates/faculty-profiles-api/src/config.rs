//! Runtime server configuration, deserialised from `config.toml` and
//! `FACULTY_PROFILES_*` environment variables.

use std::path::PathBuf;

use faculty_profiles_core::{search::SortOption, service::ServiceConfig};
use serde::Deserialize;

use crate::auth::{AuthConfig, UserCredentials};

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 5000 }

/// Ceiling on any request body, in bytes.
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

fn default_max_upload_size() -> usize { DEFAULT_MAX_UPLOAD_SIZE }

fn default_pagination_options() -> Vec<usize> { vec![10, 20] }

fn default_sort() -> SortOption { SortOption::BestMatch }

fn default_sort_no_query() -> SortOption { SortOption::FamilyNameAsc }

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  pub store_path:          PathBuf,
  pub api_base_url:        String,
  pub ui_base_url:         String,
  /// Largest accepted photo upload in bytes. Zero or negative means the
  /// built-in default.
  #[serde(default)]
  pub photo_max_file_size: i64,
  /// Hard limit on request bodies, applied to every route. Larger uploads
  /// are refused with 413 when declared up front, or cut off mid-stream.
  #[serde(default = "default_max_upload_size")]
  pub max_upload_size:     usize,
  #[serde(default)]
  pub users:               Vec<UserCredentials>,
  #[serde(default)]
  pub search:              SearchOptions,
}

/// Options for profile search and the search UI.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SearchOptions {
  /// Page sizes offered by the search UI; the first is the default.
  #[serde(default = "default_pagination_options")]
  pub pagination_options:    Vec<usize>,
  #[serde(default = "default_sort")]
  pub sort_default:          SortOption,
  #[serde(default = "default_sort_no_query")]
  pub sort_default_no_query: SortOption,
}

impl Default for SearchOptions {
  fn default() -> Self {
    Self {
      pagination_options:    default_pagination_options(),
      sort_default:          default_sort(),
      sort_default_no_query: default_sort_no_query(),
    }
  }
}

impl ServerConfig {
  pub fn service_config(&self) -> ServiceConfig {
    ServiceConfig {
      sort_default:          self.search.sort_default,
      sort_default_no_query: self.search.sort_default_no_query,
      ..ServiceConfig::with_photo_max_file_size(self.photo_max_file_size)
    }
  }

  pub fn auth_config(&self) -> AuthConfig {
    AuthConfig { users: self.users.clone() }
  }
}
