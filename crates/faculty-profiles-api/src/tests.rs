//! Router tests driven through `oneshot` against an in-memory SQLite store.

use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  body::Body,
  http::{HeaderName, Request, StatusCode, header},
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{TimeZone, Utc};
use faculty_profiles_core::{
  identity::ADMINISTRATION_ROLE,
  record::{Creator, ResearchRecord},
  service::{ProfileService, ServiceConfig},
  store::RecordIndex,
};
use faculty_profiles_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{
  AppState,
  auth::{AuthConfig, UserCredentials},
  config::{DEFAULT_MAX_UPLOAD_SIZE, SearchOptions},
  files::FILENAME_HEADER,
  links::Links,
  router,
};

type State = AppState<SqliteStore, SqliteStore>;

const PASSWORD: &str = "secret";

async fn make_state_with(config: ServiceConfig) -> (State, Arc<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let salt  = SaltString::generate(&mut OsRng);
  let hash  = Argon2::default()
    .hash_password(PASSWORD.as_bytes(), &salt)
    .unwrap()
    .to_string();

  let state = AppState {
    service:      ProfileService::new(Arc::clone(&store), Arc::clone(&store), config),
    auth:         Arc::new(AuthConfig {
      users: vec![
        UserCredentials {
          username:      "admin".to_string(),
          password_hash: hash.clone(),
          roles:         vec![ADMINISTRATION_ROLE.to_string()],
        },
        UserCredentials {
          username:      "pubres".to_string(),
          password_hash: hash,
          roles:         vec![],
        },
      ],
    }),
    links:        Arc::new(Links::new("https://127.0.0.1:5000/api", "https://127.0.0.1:5000")),
    search:       Arc::new(SearchOptions::default()),
    upload_limit: DEFAULT_MAX_UPLOAD_SIZE,
  };
  (state, store)
}

async fn make_state() -> (State, Arc<SqliteStore>) {
  make_state_with(ServiceConfig::default()).await
}

fn auth_header(user: &str, pass: &str) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

fn admin() -> Vec<(HeaderName, String)> {
  vec![(header::AUTHORIZATION, auth_header("admin", PASSWORD))]
}

async fn oneshot_raw(
  state:   State,
  method:  &str,
  uri:     &str,
  headers: Vec<(HeaderName, String)>,
  body:    Body,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  let req = builder.body(body).unwrap();
  router(state).oneshot(req).await.unwrap()
}

async fn send_json(
  state:   State,
  method:  &str,
  uri:     &str,
  mut headers: Vec<(HeaderName, String)>,
  body:    &Value,
) -> Response {
  headers.push((header::CONTENT_TYPE, "application/json".to_string()));
  oneshot_raw(state, method, uri, headers, Body::from(body.to_string())).await
}

async fn upload(
  state:    State,
  uri:      &str,
  headers:  Vec<(HeaderName, String)>,
  filename: &str,
  content:  Vec<u8>,
) -> Response {
  let mut headers = headers;
  headers.push((header::CONTENT_TYPE, "application/octet-stream".to_string()));
  headers.push((header::CONTENT_LENGTH, content.len().to_string()));
  headers.push((HeaderName::from_static(FILENAME_HEADER), filename.to_string()));
  oneshot_raw(state, "PUT", uri, headers, Body::from(content)).await
}

async fn read_body(resp: Response) -> Vec<u8> {
  axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap()
    .to_vec()
}

async fn read_json(resp: Response) -> Value {
  serde_json::from_slice(&read_body(resp).await).unwrap()
}

fn profile_data(family: &str) -> Value {
  json!({
    "metadata": {
      "preferred_pronouns": "Mr",
      "family_name": family,
      "given_names": "John",
      "identifiers": [{ "identifier": "0000-0002-1825-0097" }],
      "type": { "id": "faculty" },
      "biography": "John Doe is a software engineer.",
      "department": "Biology",
      "email_address": "johndoe@example.com"
    }
  })
}

async fn create(state: &State, family: &str) -> String {
  let resp = send_json(state.clone(), "POST", "/faculty-profiles", admin(), &profile_data(family)).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  read_json(resp).await["id"].as_str().unwrap().to_string()
}

// ── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_read_update_delete() {
  let (state, _) = make_state().await;

  let resp = send_json(state.clone(), "POST", "/faculty-profiles", admin(), &profile_data("Doe")).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  assert_eq!(resp.headers().get(header::ETAG).unwrap(), "\"1\"");
  let created = read_json(resp).await;
  let id = created["id"].as_str().unwrap().to_string();
  assert_eq!(created["metadata"]["identifiers"][0]["scheme"], "orcid");
  assert_eq!(created["active"], true);
  assert_eq!(created["files"]["enabled"], true);
  assert_eq!(
    created["links"]["self"],
    format!("https://127.0.0.1:5000/api/faculty-profiles/{id}")
  );
  assert_eq!(
    created["links"]["edit_html"],
    format!("https://127.0.0.1:5000/faculty-profiles/{id}/edit")
  );
  assert_eq!(created["permissions"]["can_update"], true);

  let resp = oneshot_raw(state.clone(), "GET", &format!("/faculty-profiles/{id}"), vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let read = read_json(resp).await;
  assert_eq!(read["metadata"]["family_name"], "Doe");
  assert_eq!(read["permissions"]["can_update"], false);

  let mut data = profile_data("Roe");
  data["active"] = json!(false);
  let resp = send_json(state.clone(), "PUT", &format!("/faculty-profiles/{id}"), admin(), &data).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let updated = read_json(resp).await;
  assert_eq!(updated["metadata"]["family_name"], "Roe");
  assert_eq!(updated["active"], false);
  assert_eq!(updated["revision_id"], 2);

  let resp = oneshot_raw(state.clone(), "DELETE", &format!("/faculty-profiles/{id}"), admin(), Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = oneshot_raw(state, "GET", &format!("/faculty-profiles/{id}"), vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let body = read_json(resp).await;
  assert_eq!(body["status"], 404);
  assert_eq!(body["message"], "The persistent identifier does not exist.");
}

#[tokio::test]
async fn read_result_can_be_submitted_back() {
  let (state, _) = make_state().await;
  let id = create(&state, "Doe").await;

  let resp = oneshot_raw(state.clone(), "GET", &format!("/faculty-profiles/{id}"), vec![], Body::empty()).await;
  let read = read_json(resp).await;
  let resp = send_json(state, "PUT", &format!("/faculty-profiles/{id}"), admin(), &read).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_and_plain_users_cannot_create() {
  let (state, _) = make_state().await;

  let resp = send_json(state.clone(), "POST", "/faculty-profiles", vec![], &profile_data("Doe")).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  assert_eq!(read_json(resp).await["message"], "Permission denied.");

  let user = vec![(header::AUTHORIZATION, auth_header("pubres", PASSWORD))];
  let resp = send_json(state, "POST", "/faculty-profiles", user, &profile_data("Doe")).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
  let (state, _) = make_state().await;
  let headers = vec![(header::AUTHORIZATION, auth_header("admin", "wrong"))];
  let resp = oneshot_raw(state, "GET", "/faculty-profiles", headers, Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn invalid_metadata_is_400_with_field_errors() {
  let (state, _) = make_state().await;
  let mut data = profile_data("Doe");
  data["metadata"]["telephone"] = json!("not a phone");
  data["metadata"]["website"] = json!("nope");

  let resp = send_json(state, "POST", "/faculty-profiles", admin(), &data).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = read_json(resp).await;
  assert_eq!(body["status"], 400);
  let fields: Vec<_> = body["errors"]
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["field"].as_str().unwrap().to_string())
    .collect();
  assert!(fields.contains(&"metadata.telephone".to_string()), "{fields:?}");
  assert!(fields.contains(&"metadata.website".to_string()), "{fields:?}");
}

#[tokio::test]
async fn malformed_json_is_400() {
  let (state, _) = make_state().await;
  let mut headers = admin();
  headers.push((header::CONTENT_TYPE, "application/json".to_string()));
  let resp = oneshot_raw(state, "POST", "/faculty-profiles", headers, Body::from("{not json")).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(read_json(resp).await["status"], 400);
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_404() {
  let (state, _) = make_state().await;
  for id in [uuid::Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
    let resp = oneshot_raw(state.clone(), "GET", &format!("/faculty-profiles/{id}"), vec![], Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}

// ── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_lists_profiles_with_type_facet() {
  let (state, _) = make_state().await;
  create(&state, "Zed").await;
  create(&state, "Abe").await;

  let resp = oneshot_raw(state.clone(), "GET", "/faculty-profiles", vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = read_json(resp).await;
  assert_eq!(body["hits"]["total"], 2);
  assert_eq!(body["hits"]["hits"][0]["metadata"]["family_name"], "Abe");
  assert_eq!(body["sortBy"], "family-name-asc");
  assert_eq!(body["aggregations"]["type"]["buckets"], json!([{ "key": "faculty", "doc_count": 2 }]));

  let resp = oneshot_raw(state, "GET", "/faculty-profiles?q=zed&size=1", vec![], Body::empty()).await;
  let body = read_json(resp).await;
  assert_eq!(body["hits"]["total"], 1);
  assert_eq!(body["sortBy"], "bestmatch");
  assert_eq!(body["size"], 1);
}

#[tokio::test]
async fn search_rejects_bad_parameters() {
  let (state, _) = make_state().await;
  let resp = oneshot_raw(state.clone(), "GET", "/faculty-profiles?sort=shuffle", vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = read_json(resp).await;
  assert_eq!(body["errors"][0]["field"], "sort");

  let resp = oneshot_raw(state, "GET", "/faculty-profiles?page=first", vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn huge_page_number_is_an_empty_page() {
  let (state, _) = make_state().await;
  let id = create(&state, "Doe").await;

  let uri = format!("/faculty-profiles?page={}", i64::MAX);
  let resp = oneshot_raw(state.clone(), "GET", &uri, vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = read_json(resp).await;
  assert_eq!(body["hits"]["total"], 1);
  assert_eq!(body["hits"]["hits"], json!([]));

  let uri = format!("/faculty-profiles/{id}/records?page={}", usize::MAX);
  let resp = oneshot_raw(state, "GET", &uri, vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_config_keys_are_ordered() {
  let (state, _) = make_state().await;
  let resp = oneshot_raw(state, "GET", "/config/faculty-profiles-search-config", vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let raw = String::from_utf8(read_body(resp).await).unwrap();

  let keys = [
    "appId",
    "initialQueryState",
    "searchApi",
    "sortOptions",
    "aggs",
    "layoutOptions",
    "sortOrderDisabled",
    "paginationOptions",
    "defaultSortingOnEmptyQueryString",
  ];
  let positions: Vec<usize> = keys
    .iter()
    .map(|k| raw.find(&format!("\"{k}\":")).unwrap_or_else(|| panic!("missing {k}")))
    .collect();
  assert!(positions.windows(2).all(|w| w[0] < w[1]), "{raw}");

  let body: Value = serde_json::from_str(&raw).unwrap();
  assert_eq!(body["appId"], "search");
  assert_eq!(body["searchApi"]["axios"]["url"], "https://127.0.0.1:5000/api/faculty-profiles");
  assert_eq!(body["defaultSortingOnEmptyQueryString"]["sortBy"], "family-name-asc");
}

// ── Files ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn photo_upload_read_and_replace() {
  let (state, _) = make_state().await;
  let id = create(&state, "Doe").await;
  let photo_uri = format!("/faculty-profiles/{id}/photo");

  let resp = upload(state.clone(), &photo_uri, admin(), "me.jpg", b"photo".to_vec()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let entry = read_json(resp).await;
  assert_eq!(entry["key"], "photo.jpg");
  assert_eq!(entry["size"], 5);
  assert_eq!(entry["mimetype"], "image/jpeg");
  assert_eq!(entry["links"]["self"], format!("https://127.0.0.1:5000/api{photo_uri}"));

  let resp = oneshot_raw(state.clone(), "GET", &photo_uri, vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/jpeg");
  assert_eq!(resp.headers().get(header::CONTENT_LENGTH).unwrap(), "5");
  assert_eq!(read_body(resp).await, b"photo");

  let resp = upload(state.clone(), &photo_uri, admin(), "me.png", b"new photo".to_vec()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(read_json(resp).await["key"], "photo.png");

  let resp = oneshot_raw(state.clone(), "GET", &photo_uri, vec![], Body::empty()).await;
  assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
  assert_eq!(read_body(resp).await, b"new photo");

  let resp = oneshot_raw(state, "GET", &format!("/faculty-profiles/{id}"), vec![], Body::empty()).await;
  let profile = read_json(resp).await;
  let keys: Vec<_> = profile["files"]["entries"].as_object().unwrap().keys().cloned().collect();
  assert_eq!(keys, ["photo.png"]);
  assert_eq!(profile["revision_id"], 3);
}

#[tokio::test]
async fn photo_size_limit() {
  let (state, _) = make_state().await;
  let id = create(&state, "Doe").await;
  let photo_uri = format!("/faculty-profiles/{id}/photo");

  let big = vec![b'x'; 1_000_005];
  let resp = upload(state.clone(), &photo_uri, admin(), "big.jpg", big).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(
    read_json(resp).await["message"],
    "Picture size limit exceeded. Limit: 1000000 bytes Given: 1000005 bytes"
  );

  let resp = oneshot_raw(state.clone(), "GET", &photo_uri, vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = upload(state, &photo_uri, admin(), "small.jpg", b"photo".to_vec()).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn configured_limit_applies_to_photo_only() {
  let (state, _) = make_state_with(ServiceConfig::with_photo_max_file_size(4)).await;
  let id = create(&state, "Doe").await;

  let resp = upload(state.clone(), &format!("/faculty-profiles/{id}/photo"), admin(), "p.jpg", b"photo".to_vec()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = upload(state, &format!("/faculty-profiles/{id}/cv"), admin(), "cv.pdf", b"%PDF-1.7 cv".to_vec()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(read_json(resp).await["key"], "cv.pdf");
}

#[tokio::test]
async fn body_over_upload_limit_is_refused() {
  let (state, _) = make_state().await;
  let id = create(&state, "Doe").await;
  let cv_uri = format!("/faculty-profiles/{id}/cv");
  let small = AppState { upload_limit: 16, ..state.clone() };

  let resp = upload(small.clone(), &cv_uri, admin(), "cv.pdf", vec![b'x'; 17]).await;
  assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

  // Without a declared length the body is cut off while streaming.
  let chunks = futures::stream::iter(vec![Ok::<_, std::io::Error>(vec![b'x'; 32])]);
  let mut headers = admin();
  headers.push((HeaderName::from_static(FILENAME_HEADER), "cv.pdf".to_string()));
  let resp = oneshot_raw(small.clone(), "PUT", &cv_uri, headers, Body::from_stream(chunks)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = oneshot_raw(state, "GET", &cv_uri, vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = upload(small, &cv_uri, admin(), "cv.pdf", vec![b'x'; 16]).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn photo_and_cv_are_independent() {
  let (state, _) = make_state().await;
  let id = create(&state, "Doe").await;

  upload(state.clone(), &format!("/faculty-profiles/{id}/photo"), admin(), "p.jpg", b"photo".to_vec()).await;
  upload(state.clone(), &format!("/faculty-profiles/{id}/cv"), admin(), "c.pdf", b"cv".to_vec()).await;

  let resp = oneshot_raw(state.clone(), "DELETE", &format!("/faculty-profiles/{id}/cv"), admin(), Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = oneshot_raw(state.clone(), "GET", &format!("/faculty-profiles/{id}/cv"), vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(read_json(resp).await["message"], "No file exists for this faculty profile.");

  let resp = oneshot_raw(state, "GET", &format!("/faculty-profiles/{id}/photo"), vec![], Body::empty()).await;
  assert_eq!(read_body(resp).await, b"photo");
}

#[tokio::test]
async fn anonymous_cannot_change_files() {
  let (state, _) = make_state().await;
  let id = create(&state, "Doe").await;
  let photo_uri = format!("/faculty-profiles/{id}/photo");
  upload(state.clone(), &photo_uri, admin(), "p.jpg", b"photo".to_vec()).await;

  let resp = oneshot_raw(state.clone(), "DELETE", &photo_uri, vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = upload(state.clone(), &photo_uri, vec![], "p.png", b"other".to_vec()).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = oneshot_raw(state, "GET", &photo_uri, vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(read_body(resp).await, b"photo");
}

#[tokio::test]
async fn delete_empty_slot_is_404() {
  let (state, _) = make_state().await;
  let id = create(&state, "Doe").await;
  let resp = oneshot_raw(state, "DELETE", &format!("/faculty-profiles/{id}/photo"), admin(), Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn records_are_matched_by_identifier_or_name() {
  let (state, store) = make_state().await;
  let id = create(&state, "Doe").await;

  let record = |rid: &str, secs: i64, creator: Creator| ResearchRecord {
    id:       rid.into(),
    title:    format!("Record {rid}"),
    creators: vec![creator],
    created:  Utc.timestamp_opt(secs, 0).unwrap(),
  };
  store
    .index_record(record("by-orcid", 100, Creator {
      name:        "Someone, Else".into(),
      identifiers: vec!["0000-0002-1825-0097".into()],
    }))
    .await
    .unwrap();
  store
    .index_record(record("by-name", 200, Creator { name: "Doe, John".into(), identifiers: vec![] }))
    .await
    .unwrap();
  store
    .index_record(record("unrelated", 300, Creator { name: "Roe, Jane".into(), identifiers: vec![] }))
    .await
    .unwrap();

  let resp = oneshot_raw(state.clone(), "GET", &format!("/faculty-profiles/{id}/records"), vec![], Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = read_json(resp).await;
  assert_eq!(body["hits"]["total"], 2);
  assert_eq!(body["hits"]["hits"][0]["id"], "by-name");
  assert_eq!(body["hits"]["hits"][1]["id"], "by-orcid");

  let resp = oneshot_raw(
    state.clone(),
    "GET",
    &format!("/faculty-profiles/{}/records", uuid::Uuid::new_v4()),
    vec![],
    Body::empty(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
