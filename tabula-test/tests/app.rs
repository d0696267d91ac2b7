use serde_json::{json, Value};
use tabula_core::http::routing::{get, post};
use tabula_core::http::{Json, Router, StatusCode};
use tabula_test::{resolve_path, TestApp};

#[test]
fn test_resolve_envelope_fields() {
    let v = json!({"success": true, "data": {"name": "Ada"}});
    assert_eq!(resolve_path(&v, "success"), json!(true));
    assert_eq!(resolve_path(&v, "data.name"), json!("Ada"));
}

#[test]
fn test_resolve_array_index() {
    let v = json!({"data": [{"id": 1}, {"id": 2, "tags": ["a", "b"]}]});
    assert_eq!(resolve_path(&v, "data[0].id"), json!(1));
    assert_eq!(resolve_path(&v, "data[1].tags[1]"), json!("b"));
}

#[test]
fn test_resolve_len() {
    let v = json!({"data": [1, 2, 3], "meta": {"a": 1, "b": 2}});
    assert_eq!(resolve_path(&v, "data.len()"), json!(3));
    assert_eq!(resolve_path(&v, "meta.len()"), json!(2));
}

#[test]
fn test_resolve_missing_segments() {
    let v = json!({"data": []});
    assert_eq!(resolve_path(&v, "error"), Value::Null);
    assert_eq!(resolve_path(&v, "data[4].id"), Value::Null);
}

fn echo_router() -> Router {
    Router::new()
        .route(
            "/ok",
            get(|| async { Json(json!({"success": true, "data": [1, 2]})) }),
        )
        .route(
            "/fail",
            get(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"success": false, "error": "Table name is required"})),
                )
            }),
        )
        .route(
            "/echo",
            post(|body: String| async move { body }),
        )
        .route(
            "/query",
            get(|uri: tabula_core::http::Uri| async move {
                uri.query().unwrap_or_default().to_string()
            }),
        )
}

#[tokio::test]
async fn test_success_envelope_assertions() {
    let app = TestApp::new(echo_router());
    let resp = app
        .get("/ok")
        .send()
        .await
        .assert_ok()
        .assert_success()
        .assert_json_path("data.len()", 2);
    assert_eq!(resp.data(), json!([1, 2]));
}

#[tokio::test]
async fn test_failure_envelope_assertions() {
    let app = TestApp::new(echo_router());
    app.get("/fail")
        .send()
        .await
        .assert_bad_request()
        .assert_failure("Table name is required");
}

#[tokio::test]
async fn test_json_body_is_sent() {
    let app = TestApp::new(echo_router());
    let resp = app.post("/echo").json(&json!({"id": 7})).send().await.assert_ok();
    assert_eq!(resp.json::<Value>(), json!({"id": 7}));
}

#[tokio::test]
async fn test_query_json_is_percent_encoded() {
    let app = TestApp::new(echo_router());
    let resp = app
        .get("/query")
        .query_json("filter", &json!({"team": "core"}))
        .send()
        .await;
    assert_eq!(resp.text(), "filter=%7B%22team%22%3A%22core%22%7D");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new(echo_router());
    app.get("/nope").send().await.assert_not_found();
}
