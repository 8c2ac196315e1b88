//! Handlers for the `photo` and `cv` file slots.
//!
//! Uploads are raw request bodies. The `X-Filename` header supplies the
//! extension the stored key is derived from, and `Content-Length` is checked
//! against the photo size limit before the body is read.

use axum::{
  Json,
  body::Body,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use faculty_profiles_core::{
  identity::Identity,
  profile::{FileEntry, Slot},
  store::{ProfileStore, RecordIndex},
};
use serde::Serialize;

use crate::{
  AppState,
  auth::Caller,
  error::ApiError,
  etag::file_etag,
  links::FileLinks,
};

pub const FILENAME_HEADER: &str = "x-filename";

/// A file's metadata as returned after an upload.
#[derive(Debug, Serialize)]
pub struct FileItem<'a> {
  #[serde(flatten)]
  pub entry: &'a FileEntry,
  pub links: FileLinks,
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
  headers
    .get(header::CONTENT_LENGTH)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.trim().parse().ok())
}

// ── Slot operations ──────────────────────────────────────────────────────────

async fn read_slot<S, R>(
  state: &AppState<S, R>,
  identity: &Identity,
  id: &str,
  slot: Slot,
) -> Result<Response, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  let file = state.service.read_slot(identity, id, slot).await?;
  let headers = [
    (header::CONTENT_TYPE, file.entry.mimetype.clone()),
    (header::CONTENT_LENGTH, file.entry.size.to_string()),
    (header::ETAG, file_etag(&file.entry)),
  ];
  Ok((headers, file.content).into_response())
}

async fn update_slot<S, R>(
  state: &AppState<S, R>,
  identity: &Identity,
  id: &str,
  slot: Slot,
  headers: &HeaderMap,
  body: Body,
) -> Result<Response, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  let filename = headers
    .get(FILENAME_HEADER)
    .and_then(|v| v.to_str().ok());

  let entry = state
    .service
    .update_slot(identity, id, slot, filename, body.into_data_stream(), content_length(headers))
    .await?;

  let item = FileItem { entry: &entry, links: state.links.file(id, slot) };
  Ok(([(header::ETAG, file_etag(&entry))], Json(item)).into_response())
}

async fn delete_slot<S, R>(
  state: &AppState<S, R>,
  identity: &Identity,
  id: &str,
  slot: Slot,
) -> Result<StatusCode, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  state.service.delete_slot(identity, id, slot).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Photo ────────────────────────────────────────────────────────────────────

/// `GET /faculty-profiles/{id}/photo`
pub async fn read_photo<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<Response, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  read_slot(&state, &identity, &id, Slot::Photo).await
}

/// `PUT /faculty-profiles/{id}/photo`
pub async fn update_photo<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  headers: HeaderMap,
  body: Body,
) -> Result<Response, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  update_slot(&state, &identity, &id, Slot::Photo, &headers, body).await
}

/// `DELETE /faculty-profiles/{id}/photo` → 204
pub async fn delete_photo<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  delete_slot(&state, &identity, &id, Slot::Photo).await
}

// ─── CV ───────────────────────────────────────────────────────────────────────

/// `GET /faculty-profiles/{id}/cv`
pub async fn read_cv<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<Response, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  read_slot(&state, &identity, &id, Slot::Cv).await
}

/// `PUT /faculty-profiles/{id}/cv`
pub async fn update_cv<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  headers: HeaderMap,
  body: Body,
) -> Result<Response, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  update_slot(&state, &identity, &id, Slot::Cv, &headers, body).await
}

/// `DELETE /faculty-profiles/{id}/cv` → 204
pub async fn delete_cv<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  delete_slot(&state, &identity, &id, Slot::Cv).await
}
