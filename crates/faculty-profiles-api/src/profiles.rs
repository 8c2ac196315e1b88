//! Handlers for `/faculty-profiles` and `/faculty-profiles/{id}`.

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use faculty_profiles_core::{
  identity::Identity,
  permissions::ProfilePermissions,
  profile::Profile,
  search::SearchParams,
  store::{ProfileStore, RecordIndex},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::Caller,
  error::ApiError,
  etag::profile_etag,
  links::{Links, ProfileLinks},
};

/// A profile as returned to clients.
#[derive(Debug, Serialize)]
pub struct ProfileItem<'a> {
  #[serde(flatten)]
  pub profile:     &'a Profile,
  pub links:       ProfileLinks,
  pub permissions: ProfilePermissions,
}

impl<'a> ProfileItem<'a> {
  pub fn new(profile: &'a Profile, links: &Links, identity: &Identity) -> Self {
    Self {
      links: links.profile(profile.id),
      permissions: ProfilePermissions::for_identity(identity),
      profile,
    }
  }
}

fn item_response<S, R>(
  state: &AppState<S, R>,
  identity: &Identity,
  status: StatusCode,
  profile: &Profile,
) -> Response {
  let item = ProfileItem::new(profile, &state.links, identity);
  (status, [(header::ETAG, profile_etag(profile))], Json(item)).into_response()
}

// ─── Search ───────────────────────────────────────────────────────────────────

/// `GET /faculty-profiles[?q=&sort=&type=&page=&size=]`
pub async fn search<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  let Query(params) = params?;
  let page = state.service.search(&identity, params).await?;

  let hits: Vec<_> = page
    .hits
    .iter()
    .map(|p| ProfileItem::new(p, &state.links, &identity))
    .collect();

  Ok(Json(json!({
    "hits": {
      "hits":  hits,
      "total": page.total,
    },
    "aggregations": {
      "type": { "buckets": page.type_facet },
    },
    "sortBy": page.query.sort.as_str(),
    "page":   page.query.page,
    "size":   page.query.size,
  })))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /faculty-profiles`
pub async fn create<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  let Json(data) = body?;
  let profile = state.service.create(&identity, data).await?;
  Ok(item_response(&state, &identity, StatusCode::CREATED, &profile))
}

// ─── Item ─────────────────────────────────────────────────────────────────────

/// `GET /faculty-profiles/{id}`
pub async fn read<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<Response, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  let profile = state.service.read(&identity, &id).await?;
  Ok(item_response(&state, &identity, StatusCode::OK, &profile))
}

/// `PUT /faculty-profiles/{id}`
pub async fn update<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  let Json(data) = body?;
  let profile = state.service.update(&identity, &id, data).await?;
  Ok(item_response(&state, &identity, StatusCode::OK, &profile))
}

/// `DELETE /faculty-profiles/{id}` → 204
pub async fn delete<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  state.service.delete(&identity, &id).await?;
  Ok(StatusCode::NO_CONTENT)
}
