//! Handler for `/faculty-profiles/{id}/records`.

use axum::{
  Json,
  extract::{Path, Query, State, rejection::QueryRejection},
};
use faculty_profiles_core::{
  search::RecordSearchParams,
  store::{ProfileStore, RecordIndex},
};
use serde_json::{Value, json};

use crate::{AppState, auth::Caller, error::ApiError};

/// `GET /faculty-profiles/{id}/records[?q=&page=&size=]`
///
/// Research records whose creators carry one of the profile's identifiers or
/// its `"Family, Given"` name, newest first.
pub async fn search<S, R>(
  State(state): State<AppState<S, R>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  params: Result<Query<RecordSearchParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  let Query(params) = params?;
  let page = state.service.search_records(&identity, &id, params).await?;

  Ok(Json(json!({
    "hits": {
      "hits":  page.hits,
      "total": page.total,
    },
    "page": page.page,
    "size": page.size,
  })))
}
