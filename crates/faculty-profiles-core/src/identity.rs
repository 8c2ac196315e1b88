//! The caller on whose behalf a service operation runs.

use serde::{Deserialize, Serialize};

/// Role granting administrative access to faculty profiles.
pub const ADMINISTRATION_ROLE: &str = "administration";

/// Who is performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
  /// No credentials were presented.
  Anonymous,
  /// An authenticated user and the roles they hold.
  User {
    username: String,
    roles:    Vec<String>,
  },
  /// Internal caller (seeding, maintenance tasks).
  System,
}

impl Identity {
  pub fn user(username: impl Into<String>, roles: Vec<String>) -> Self {
    Self::User { username: username.into(), roles }
  }

  /// An authenticated user holding the administration role.
  pub fn administrator(username: impl Into<String>) -> Self {
    Self::user(username, vec![ADMINISTRATION_ROLE.to_owned()])
  }

  pub fn has_role(&self, role: &str) -> bool {
    match self {
      Self::User { roles, .. } => roles.iter().any(|r| r == role),
      Self::Anonymous | Self::System => false,
    }
  }

  pub fn is_system(&self) -> bool { matches!(self, Self::System) }
}
