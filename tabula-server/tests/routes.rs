use std::sync::Arc;

use serde_json::{json, Value};
use tabula_data::BackendError;
use tabula_server::{app, AppState};
use tabula_test::{MockBackend, TestApp};

const BASE: &str = "/api/v1/supabase";

fn setup(backend: MockBackend) -> (TestApp, Arc<MockBackend>, AppState<MockBackend>) {
    let backend = Arc::new(backend);
    let state = AppState::new(backend.clone());
    let app = TestApp::new(app(state.clone(), "/api/v1"));
    (app, backend, state)
}

fn members() -> MockBackend {
    MockBackend::new().with_rows(
        "members",
        vec![
            json!({"id": 1, "name": "Ada", "team": "core"}),
            json!({"id": 2, "name": "Grace", "team": "infra"}),
            json!({"id": 3, "name": "Linus", "team": "core"}),
        ],
    )
}

// ─── Root and fallback ───

#[tokio::test]
async fn test_welcome_message() {
    let (app, _, _) = setup(MockBackend::new());
    app.get("/")
        .send()
        .await
        .assert_ok()
        .assert_json_path("message", "Welcome to the Tabula API");
}

#[tokio::test]
async fn test_unknown_route_is_404_envelope() {
    let (app, _, _) = setup(MockBackend::new());
    app.get("/api/v1/nothing")
        .send()
        .await
        .assert_not_found()
        .assert_failure("Cannot GET /api/v1/nothing");
}

#[tokio::test]
async fn test_unknown_route_under_mount_keeps_full_path() {
    let (app, _, _) = setup(MockBackend::new());
    app.post(&format!("{BASE}/views"))
        .send()
        .await
        .assert_not_found()
        .assert_failure("Cannot POST /api/v1/supabase/views");
}

#[tokio::test]
async fn test_custom_prefix() {
    let backend = Arc::new(MockBackend::new().with_table("a"));
    let app = TestApp::new(app(AppState::new(backend), "/v2/"));
    app.get("/v2/supabase/tables")
        .send()
        .await
        .assert_ok()
        .assert_json_path("data", json!(["a"]));
}

// ─── Table lifecycle ───

#[tokio::test]
async fn test_create_table() {
    let (app, backend, _) = setup(MockBackend::new());
    app.post(&format!("{BASE}/tables"))
        .json(&json!({
            "tableName": "orgs",
            "schema": {
                "name": "orgs",
                "columns": [
                    {"name": "id", "type": "uuid"},
                    {"name": "title", "type": "text", "constraints": ["NOT NULL"]}
                ],
                "primaryKey": "id"
            }
        }))
        .send()
        .await
        .assert_created()
        .assert_success()
        .assert_json_path("data.tableName", "orgs");

    assert!(backend.has_table("orgs"));
    let (function, args) = backend.rpcs().pop().unwrap();
    assert_eq!(function, "execute_sql");
    let sql = args["query"].as_str().unwrap();
    assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS orgs"));
    assert!(sql.contains("id uuid PRIMARY KEY"));
}

#[tokio::test]
async fn test_create_table_requires_name_and_schema() {
    let (app, backend, _) = setup(MockBackend::new());
    let path = format!("{BASE}/tables");

    app.post(&path)
        .json(&json!({"tableName": "orgs"}))
        .send()
        .await
        .assert_bad_request()
        .assert_failure("Table name and schema are required");
    app.post(&path)
        .json(&json!({"tableName": "", "schema": {"name": "orgs", "columns": []}}))
        .send()
        .await
        .assert_bad_request()
        .assert_failure("Table name and schema are required");
    app.post(&path)
        .send()
        .await
        .assert_bad_request()
        .assert_failure("Table name and schema are required");

    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_create_table_with_malformed_body_is_500() {
    let (app, _, _) = setup(MockBackend::new());
    let resp = app
        .post(&format!("{BASE}/tables"))
        .header(tabula_core::http::header::CONTENT_TYPE, "application/json")
        .body("{\"tableName\": ")
        .send()
        .await
        .assert_internal_error();
    assert!(!resp.json_path::<bool>("success"));
}

#[tokio::test]
async fn test_list_tables_does_not_touch_registry() {
    let (app, _, state) = setup(MockBackend::new().with_table("b").with_table("a"));
    app.get(&format!("{BASE}/tables"))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data", json!(["a", "b"]));
    assert!(state.registry.is_empty());
}

#[tokio::test]
async fn test_drop_table_evicts_repository() {
    let (app, backend, state) = setup(members());
    app.get(&format!("{BASE}/tables/members/exists"))
        .send()
        .await
        .assert_ok();
    assert!(state.registry.contains("members"));

    app.delete(&format!("{BASE}/tables/members"))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.tableName", "members");

    assert!(!state.registry.contains("members"));
    assert!(!backend.has_table("members"));
}

#[tokio::test]
async fn test_failed_drop_keeps_repository() {
    let (app, backend, state) = setup(members());
    state.registry.resolve("members");
    backend.fail_next(
        BackendError::new("permission denied for table members").with_code("42501"),
    );

    app.delete(&format!("{BASE}/tables/members"))
        .send()
        .await
        .assert_internal_error()
        .assert_failure("permission denied for table members");
    assert!(state.registry.contains("members"));
}

#[tokio::test]
async fn test_exists_reflects_row_presence() {
    let (app, _, _) = setup(members().with_table("empty"));
    app.get(&format!("{BASE}/tables/members/exists"))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.exists", true);
    app.get(&format!("{BASE}/tables/empty/exists"))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.exists", false);
}

#[tokio::test]
async fn test_blank_table_name_is_rejected() {
    let (app, backend, _) = setup(MockBackend::new());
    app.get(&format!("{BASE}/tables/%20/exists"))
        .send()
        .await
        .assert_bad_request()
        .assert_failure("Table name is required");
    assert!(backend.calls().is_empty());
}

// ─── Rows ───

#[tokio::test]
async fn test_query_with_filter_and_pagination() {
    let (app, backend, _) = setup(members());
    let resp = app
        .get(&format!("{BASE}/tables/members/data"))
        .query_json("filter", &json!({"team": "core"}))
        .query_json(
            "pagination",
            &json!({"limit": 1, "orderBy": {"column": "id", "ascending": false}}),
        )
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.len()", 1)
        .assert_json_path("data[0].name", "Linus");
    assert_eq!(resp.data()[0]["id"], json!(3));

    let query = backend.last_query().unwrap();
    assert_eq!(query.table(), "members");
    assert_eq!(query.filters(), &[("team".to_string(), json!("core"))]);
    assert_eq!(query.limit_value(), Some(1));
}

#[tokio::test]
async fn test_query_without_params_returns_all_rows() {
    let (app, backend, _) = setup(members());
    app.get(&format!("{BASE}/tables/members/data"))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.len()", 3);
    let query = backend.last_query().unwrap();
    assert!(query.filters().is_empty());
    assert!(query.ordering().is_none());
    assert_eq!(query.window(), (None, None));
}

#[tokio::test]
async fn test_query_offset_uses_default_page() {
    let (app, backend, _) = setup(members());
    app.get(&format!("{BASE}/tables/members/data"))
        .query_json("pagination", &json!({"offset": 3}))
        .send()
        .await
        .assert_ok();
    let range = backend.last_query().unwrap().range_value().unwrap();
    assert_eq!((range.from, range.to), (3, 12));
}

#[tokio::test]
async fn test_huge_offset_saturates_instead_of_failing() {
    let (app, backend, _) = setup(members());
    app.get(&format!("{BASE}/tables/members/data"))
        .query_json("pagination", &json!({"offset": u64::MAX}))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.len()", 0);
    let range = backend.last_query().unwrap().range_value().unwrap();
    assert_eq!((range.from, range.to), (u64::MAX, u64::MAX));

    app.get(&format!("{BASE}/tables/members/data"))
        .query_json("pagination", &json!({"offset": 1, "limit": u64::MAX}))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.len()", 2);
    let range = backend.last_query().unwrap().range_value().unwrap();
    assert_eq!((range.from, range.to), (1, u64::MAX));
}

#[tokio::test]
async fn test_malformed_filter_is_500() {
    let (app, backend, _) = setup(members());
    app.get(&format!("{BASE}/tables/members/data"))
        .query("filter", "{team:")
        .send()
        .await
        .assert_internal_error();
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_count_with_filter() {
    let (app, _, _) = setup(members());
    app.get(&format!("{BASE}/tables/members/count"))
        .query_json("filter", &json!({"team": "core"}))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.count", 2);
}

#[tokio::test]
async fn test_count_is_zero_without_backend_count() {
    let (app, _, _) = setup(members().without_counts());
    app.get(&format!("{BASE}/tables/members/count"))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.count", 0);
}

#[tokio::test]
async fn test_upsert_inserts_then_merges() {
    let (app, backend, _) = setup(members());
    let path = format!("{BASE}/tables/members/data");

    app.post(&path)
        .json(&json!({"id": 4, "name": "Barbara", "team": "core"}))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.name", "Barbara");
    app.post(&path)
        .json(&json!({"id": 4, "team": "infra"}))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.name", "Barbara")
        .assert_json_path("data.team", "infra");

    assert_eq!(backend.rows("members").unwrap().len(), 4);
}

#[tokio::test]
async fn test_upsert_requires_body() {
    let (app, backend, _) = setup(members());
    let path = format!("{BASE}/tables/members/data");
    app.post(&path)
        .send()
        .await
        .assert_bad_request()
        .assert_failure("Table name and data are required");
    app.post(&path)
        .json(&Value::Null)
        .send()
        .await
        .assert_bad_request()
        .assert_failure("Table name and data are required");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_upsert_of_non_object_is_500() {
    let (app, _, _) = setup(members());
    app.post(&format!("{BASE}/tables/members/data"))
        .json(&json!([1, 2]))
        .send()
        .await
        .assert_internal_error();
}

#[tokio::test]
async fn test_patch_updates_matching_row() {
    let (app, backend, _) = setup(members());
    app.patch(&format!("{BASE}/tables/members/data"))
        .query_json("filter", &json!({"id": 2}))
        .json(&json!({"team": "core"}))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data.name", "Grace")
        .assert_json_path("data.team", "core");

    let rows = backend.rows("members").unwrap();
    assert_eq!(rows[1]["team"], json!("core"));
}

#[tokio::test]
async fn test_patch_requires_filter_and_body() {
    let (app, backend, _) = setup(members());
    let path = format!("{BASE}/tables/members/data");
    app.patch(&path)
        .json(&json!({"team": "core"}))
        .send()
        .await
        .assert_bad_request()
        .assert_failure("Table name and filter are required");
    app.patch(&path)
        .query_json("filter", &json!({}))
        .json(&json!({"team": "core"}))
        .send()
        .await
        .assert_bad_request()
        .assert_failure("Table name and filter are required");
    app.patch(&path)
        .query_json("filter", &json!({"id": 1}))
        .send()
        .await
        .assert_bad_request()
        .assert_failure("Table name and data are required");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_patch_matching_nothing_surfaces_backend_error() {
    let (app, _, _) = setup(members());
    app.patch(&format!("{BASE}/tables/members/data"))
        .query_json("filter", &json!({"id": 42}))
        .json(&json!({"team": "core"}))
        .send()
        .await
        .assert_internal_error()
        .assert_json_path("success", false);
}

#[tokio::test]
async fn test_delete_row_by_id() {
    let (app, backend, _) = setup(members());
    app.delete(&format!("{BASE}/tables/members/data/2"))
        .send()
        .await
        .assert_ok()
        .assert_success()
        .assert_json_path("data", Value::Null);

    let remaining: Vec<i64> = backend
        .rows("members")
        .unwrap()
        .iter()
        .map(|row| row["id"].as_i64().unwrap())
        .collect();
    assert_eq!(remaining, vec![1, 3]);
}

#[tokio::test]
async fn test_delete_of_missing_row_still_succeeds() {
    let (app, _, _) = setup(members());
    app.delete(&format!("{BASE}/tables/members/data/99"))
        .send()
        .await
        .assert_ok()
        .assert_json_path("data", Value::Null);
}

#[tokio::test]
async fn test_delete_requires_id() {
    let (app, _, _) = setup(members());
    app.delete(&format!("{BASE}/tables/members/data/%20"))
        .send()
        .await
        .assert_bad_request()
        .assert_failure("Table name and ID are required");
}

// ─── Backend failures ───

#[tokio::test]
async fn test_backend_message_is_returned_unaltered() {
    let (app, backend, _) = setup(members());
    backend.fail_next(BackendError::new("Test error"));
    app.get(&format!("{BASE}/tables/members/data"))
        .send()
        .await
        .assert_internal_error()
        .assert_failure("Test error");
}

#[tokio::test]
async fn test_unknown_table_is_500_with_backend_message() {
    let (app, _, _) = setup(MockBackend::new());
    app.get(&format!("{BASE}/tables/ghosts/data"))
        .send()
        .await
        .assert_internal_error()
        .assert_failure("relation \"public.ghosts\" does not exist");
}
