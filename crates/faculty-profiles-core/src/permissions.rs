//! Table-driven permission policy.
//!
//! Every action maps to a list of generators; an identity is allowed when any
//! generator in the list matches it. There is no state and no precedence.

use serde::Serialize;

use crate::identity::{ADMINISTRATION_ROLE, Identity};

/// Actions checked by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  Search,
  Create,
  Read,
  Update,
  Delete,
  CreateFiles,
  SetContentFiles,
  GetContentFiles,
  CommitFiles,
  ReadFiles,
  UpdateFiles,
  DeleteFiles,
  SearchRecords,
}

impl Action {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Search => "search",
      Self::Create => "create",
      Self::Read => "read",
      Self::Update => "update",
      Self::Delete => "delete",
      Self::CreateFiles => "create_files",
      Self::SetContentFiles => "set_content_files",
      Self::GetContentFiles => "get_content_files",
      Self::CommitFiles => "commit_files",
      Self::ReadFiles => "read_files",
      Self::UpdateFiles => "update_files",
      Self::DeleteFiles => "delete_files",
      Self::SearchRecords => "search_records",
    }
  }
}

impl std::fmt::Display for Action {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A predicate over identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
  /// Anyone, including anonymous callers.
  AnyUser,
  /// Users holding [`ADMINISTRATION_ROLE`].
  Administration,
  /// Internal callers.
  SystemProcess,
  /// Anyone, when the file is stored locally. Every file is local here.
  LocalTransferAnyUser,
}

impl Generator {
  pub fn matches(self, identity: &Identity) -> bool {
    match self {
      Self::AnyUser | Self::LocalTransferAnyUser => true,
      Self::Administration => identity.has_role(ADMINISTRATION_ROLE),
      Self::SystemProcess => identity.is_system(),
    }
  }
}

use Generator::{Administration, AnyUser, LocalTransferAnyUser, SystemProcess};

/// The generators granting `action`.
pub fn policy(action: Action) -> &'static [Generator] {
  match action {
    Action::Search | Action::Read | Action::ReadFiles | Action::SearchRecords => {
      &[AnyUser, SystemProcess]
    }
    Action::Create
    | Action::Update
    | Action::Delete
    | Action::CreateFiles
    | Action::SetContentFiles
    | Action::UpdateFiles
    | Action::DeleteFiles => &[Administration, SystemProcess],
    Action::GetContentFiles => &[LocalTransferAnyUser, SystemProcess],
    Action::CommitFiles => &[Administration, LocalTransferAnyUser, SystemProcess],
  }
}

/// Whether `identity` may perform `action`.
pub fn allows(identity: &Identity, action: Action) -> bool {
  policy(action).iter().any(|g| g.matches(identity))
}

/// The capability summary attached to serialised profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfilePermissions {
  pub can_create:            bool,
  pub can_update:            bool,
  pub can_delete:            bool,
  pub can_set_content_files: bool,
  pub can_commit_files:      bool,
  pub can_update_files:      bool,
  pub can_delete_files:      bool,
}

impl ProfilePermissions {
  pub fn for_identity(identity: &Identity) -> Self {
    Self {
      can_create:            allows(identity, Action::Create),
      can_update:            allows(identity, Action::Update),
      can_delete:            allows(identity, Action::Delete),
      can_set_content_files: allows(identity, Action::SetContentFiles),
      can_commit_files:      allows(identity, Action::CommitFiles),
      can_update_files:      allows(identity, Action::UpdateFiles),
      can_delete_files:      allows(identity, Action::DeleteFiles),
    }
  }
}
