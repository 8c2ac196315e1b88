//! HTTP layer for faculty profiles.
//!
//! Exposes an axum [`Router`] over a [`ProfileService`], backed by any
//! [`ProfileStore`] and [`RecordIndex`]. Callers authenticate with HTTP Basic
//! credentials; requests without credentials run anonymously.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`, `POST` | `/faculty-profiles` | search / create |
//! | `GET`, `PUT`, `DELETE` | `/faculty-profiles/{id}` | |
//! | `GET`, `PUT`, `DELETE` | `/faculty-profiles/{id}/photo` | raw bytes |
//! | `GET`, `PUT`, `DELETE` | `/faculty-profiles/{id}/cv` | raw bytes |
//! | `GET` | `/faculty-profiles/{id}/records` | related research records |
//! | `GET` | `/config/faculty-profiles-search-config` | search UI config |

pub mod auth;
pub mod config;
pub mod error;
pub mod etag;
pub mod files;
pub mod links;
pub mod profiles;
pub mod records;
pub mod search_config;

pub use error::ApiError;

use std::sync::Arc;

use axum::{Router, routing::get};
use faculty_profiles_core::{
  service::ProfileService,
  store::{ProfileStore, RecordIndex},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{auth::AuthConfig, config::SearchOptions, links::Links};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, R> {
  pub service:      ProfileService<S, R>,
  pub auth:         Arc<AuthConfig>,
  pub links:        Arc<Links>,
  pub search:       Arc<SearchOptions>,
  /// Request body ceiling in bytes.
  pub upload_limit: usize,
}

impl<S, R> Clone for AppState<S, R> {
  fn clone(&self) -> Self {
    Self {
      service:      self.service.clone(),
      auth:         Arc::clone(&self.auth),
      links:        Arc::clone(&self.links),
      search:       Arc::clone(&self.search),
      upload_limit: self.upload_limit,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the faculty profiles [`Router`].
pub fn router<S, R>(state: AppState<S, R>) -> Router
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  let upload_limit = state.upload_limit;
  Router::new()
    .route(
      "/faculty-profiles",
      get(profiles::search::<S, R>).post(profiles::create::<S, R>),
    )
    .route(
      "/faculty-profiles/{id}",
      get(profiles::read::<S, R>)
        .put(profiles::update::<S, R>)
        .delete(profiles::delete::<S, R>),
    )
    .route(
      "/faculty-profiles/{id}/photo",
      get(files::read_photo::<S, R>)
        .put(files::update_photo::<S, R>)
        .delete(files::delete_photo::<S, R>),
    )
    .route(
      "/faculty-profiles/{id}/cv",
      get(files::read_cv::<S, R>)
        .put(files::update_cv::<S, R>)
        .delete(files::delete_cv::<S, R>),
    )
    .route("/faculty-profiles/{id}/records", get(records::search::<S, R>))
    .route(
      "/config/faculty-profiles-search-config",
      get(search_config::handler::<S, R>),
    )
    .layer(RequestBodyLimitLayer::new(upload_limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
