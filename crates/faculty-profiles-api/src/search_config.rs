//! `GET /config/faculty-profiles-search-config`: the configuration the search
//! UI boots from.
//!
//! Key order is part of the contract, so the payload is built from structs
//! rather than a JSON map.

use axum::{Json, extract::State};
use faculty_profiles_core::{
  search::SortOption,
  store::{ProfileStore, RecordIndex},
};
use serde::Serialize;

use crate::{AppState, config::SearchOptions};

pub const APP_ID: &str = "search";
const ACCEPT: &str = "application/vnd.inveniordm.v1+json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAppConfig {
  pub app_id:                               &'static str,
  pub initial_query_state:                  InitialQueryState,
  pub search_api:                           SearchApi,
  pub sort_options:                         Vec<SortOptionItem>,
  pub aggs:                                 Vec<Aggregation>,
  pub layout_options:                       LayoutOptions,
  pub sort_order_disabled:                  bool,
  pub pagination_options:                   PaginationOptions,
  pub default_sorting_on_empty_query_string: DefaultSorting,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialQueryState {
  pub query_string:  String,
  pub sort_by:       &'static str,
  pub sort_order:    &'static str,
  pub page:          usize,
  pub size:          usize,
  pub hidden_params: Option<Vec<String>>,
  pub layout:        &'static str,
}

#[derive(Debug, Serialize)]
pub struct SearchApi {
  pub axios:   Axios,
  pub invenio: Invenio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axios {
  pub headers:          AxiosHeaders,
  pub url:              String,
  pub with_credentials: bool,
}

#[derive(Debug, Serialize)]
pub struct AxiosHeaders {
  #[serde(rename = "Accept")]
  pub accept: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invenio {
  pub request_serializer: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOptionItem {
  pub sort_by: &'static str,
  pub text:    &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
  pub title:    &'static str,
  pub agg_name: &'static str,
  pub field:    &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
  pub list_view: bool,
  pub grid_view: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOptions {
  pub default_value:    usize,
  pub results_per_page: Vec<ResultsPerPage>,
}

#[derive(Debug, Serialize)]
pub struct ResultsPerPage {
  pub text:  String,
  pub value: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultSorting {
  pub sort_by: &'static str,
}

impl SearchAppConfig {
  /// Build the UI config for a search endpoint at `url`.
  pub fn new(url: String, options: &SearchOptions) -> Self {
    let default_size = options
      .pagination_options
      .first()
      .copied()
      .unwrap_or(faculty_profiles_core::search::DEFAULT_PAGE_SIZE);

    Self {
      app_id: APP_ID,
      initial_query_state: InitialQueryState {
        query_string:  String::new(),
        sort_by:       options.sort_default_no_query.as_str(),
        sort_order:    "asc",
        page:          1,
        size:          default_size,
        hidden_params: None,
        layout:        "list",
      },
      search_api: SearchApi {
        axios:   Axios {
          headers:          AxiosHeaders { accept: ACCEPT },
          url,
          with_credentials: true,
        },
        invenio: Invenio { request_serializer: "InvenioRecordsResourcesRequestSerializer" },
      },
      sort_options: SortOption::ALL
        .into_iter()
        .map(|o| SortOptionItem { sort_by: o.as_str(), text: o.title() })
        .collect(),
      aggs: vec![Aggregation { title: "Type", agg_name: "type", field: "type" }],
      layout_options: LayoutOptions { list_view: true, grid_view: false },
      sort_order_disabled: true,
      pagination_options: PaginationOptions {
        default_value:    default_size,
        results_per_page: options
          .pagination_options
          .iter()
          .map(|n| ResultsPerPage { text: n.to_string(), value: *n })
          .collect(),
      },
      default_sorting_on_empty_query_string: DefaultSorting {
        sort_by: options.sort_default_no_query.as_str(),
      },
    }
  }
}

/// `GET /config/faculty-profiles-search-config`
pub async fn handler<S, R>(State(state): State<AppState<S, R>>) -> Json<SearchAppConfig>
where
  S: ProfileStore + 'static,
  R: RecordIndex + 'static,
{
  Json(SearchAppConfig::new(state.links.collection(), &state.search))
}
