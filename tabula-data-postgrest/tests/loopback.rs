//! Drives `PostgrestClient` against a loopback axum server that speaks just
//! enough PostgREST for each scenario.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tabula_data::prelude::*;
use tabula_data::BackendError;
use tabula_data_postgrest::{ClientOptions, Credentials, PostgrestClient};

#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    table: String,
    params: HashMap<String, String>,
    headers: HeaderMap,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct Fake {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Fake {
    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

async fn table_handler(
    State(fake): State<Fake>,
    method: Method,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> axum::response::Response {
    let body_json = serde_json::from_str::<Value>(&body).ok();
    fake.seen.lock().unwrap().push(Seen {
        method: method.clone(),
        table: table.clone(),
        params: params.clone(),
        headers: headers.clone(),
        body: body_json.clone(),
    });

    match table.as_str() {
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "code": "42P01",
                "details": null,
                "hint": null,
                "message": "relation \"public.missing\" does not exist"
            })),
        )
            .into_response(),
        "gateway" => (StatusCode::BAD_GATEWAY, "upstream timed out").into_response(),
        _ if method == Method::HEAD => {
            (StatusCode::OK, [("content-range", "*/42")]).into_response()
        }
        _ if method == Method::GET => Json(json!([
            {"id": 1, "name": "Ada"},
            {"id": 2, "name": "Bob"}
        ]))
        .into_response(),
        _ if method == Method::DELETE => StatusCode::NO_CONTENT.into_response(),
        _ => {
            let mut row = body_json.unwrap_or(Value::Null);
            if let Value::Object(map) = &mut row {
                map.entry("id").or_insert(json!(99));
            }
            (StatusCode::CREATED, Json(row)).into_response()
        }
    }
}

async fn rpc_handler(
    State(fake): State<Fake>,
    Path(function): Path<String>,
    headers: HeaderMap,
    Json(args): Json<Value>,
) -> Json<Value> {
    fake.seen.lock().unwrap().push(Seen {
        method: Method::POST,
        table: format!("rpc/{function}"),
        params: HashMap::new(),
        headers,
        body: Some(args.clone()),
    });
    Json(json!([{"echo": args["query"]}]))
}

async fn start() -> (Arc<PostgrestClient>, Fake) {
    let fake = Fake::default();
    let app = Router::new()
        .route(
            "/rest/v1/{table}",
            get(table_handler)
                .post(table_handler)
                .patch(table_handler)
                .delete(table_handler),
        )
        .route("/rest/v1/rpc/{function}", post(rpc_handler))
        .with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let client = PostgrestClient::new(
        &Credentials::new(format!("http://{addr}"), "test-key"),
        &ClientOptions::default(),
    )
    .unwrap();
    (Arc::new(client), fake)
}

#[tokio::test]
async fn test_get_sends_filters_and_auth() {
    let (client, fake) = start().await;
    let repo = GenericRepository::<_, Row>::new("users", client);
    let rows = repo
        .get(
            &FilterMap::new().eq("team", "core"),
            &QueryOptions::new().limit(5).offset(20).order_by("name", true),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let seen = fake.last();
    assert_eq!(seen.method, Method::GET);
    assert_eq!(seen.table, "users");
    assert_eq!(seen.params["select"], "*");
    assert_eq!(seen.params["team"], "eq.core");
    assert_eq!(seen.params["order"], "name.asc");
    assert_eq!(seen.params["offset"], "20");
    assert_eq!(seen.params["limit"], "5");
    assert_eq!(seen.headers["apikey"], "test-key");
    assert_eq!(seen.headers["authorization"], "Bearer test-key");
    assert_eq!(seen.headers["accept-profile"], "public");
}

#[tokio::test]
async fn test_count_reads_content_range() {
    let (client, fake) = start().await;
    let repo = GenericRepository::<_, Row>::new("users", client);
    assert_eq!(repo.count(&FilterMap::new()).await.unwrap(), 42);
    assert!(repo.exists(&FilterMap::new()).await.unwrap());
    let seen = fake.last();
    assert_eq!(seen.method, Method::HEAD);
    assert_eq!(seen.headers["prefer"], "count=exact");
}

#[tokio::test]
async fn test_create_returns_representation() {
    let (client, fake) = start().await;
    let repo = GenericRepository::<_, Row>::new("users", client);
    let row: Row = serde_json::from_value(json!({"name": "Eve"})).unwrap();
    let created = repo.create(&row).await.unwrap();
    assert_eq!(created["id"], json!(99));
    let seen = fake.last();
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.body, Some(json!({"name": "Eve"})));
    assert_eq!(seen.headers["accept"], "application/vnd.pgrst.object+json");
    assert_eq!(seen.headers["content-profile"], "public");
}

#[tokio::test]
async fn test_delete_with_empty_reply() {
    let (client, fake) = start().await;
    let repo = GenericRepository::<_, Row>::new("users", client);
    assert!(repo.delete(&FilterMap::new().eq("id", 2)).await.unwrap());
    assert_eq!(fake.last().params["id"], "eq.2");
}

#[tokio::test]
async fn test_backend_error_surfaces_message_and_code() {
    let (client, _) = start().await;
    let repo = GenericRepository::<_, Row>::new("missing", client);
    let err = repo.find_all().await.unwrap_err();
    assert_eq!(err.to_string(), "relation \"public.missing\" does not exist");
    let backend: &BackendError = err.as_backend().unwrap();
    assert_eq!(backend.code.as_deref(), Some("42P01"));
    assert_eq!(backend.status, Some(404));
}

#[tokio::test]
async fn test_plain_text_error() {
    let (client, _) = start().await;
    let repo = GenericRepository::<_, Row>::new("gateway", client);
    let err = repo.find_all().await.unwrap_err();
    assert_eq!(err.to_string(), "upstream timed out");
}

#[tokio::test]
async fn test_raw_query_goes_through_rpc() {
    let (client, fake) = start().await;
    let repo = GenericRepository::<_, Row>::new("users", client);
    let rows = repo.query("SELECT 1", &[json!(5)]).await.unwrap();
    assert_eq!(rows[0]["echo"], json!("SELECT 1"));
    let seen = fake.last();
    assert_eq!(seen.table, "rpc/execute_sql");
    assert_eq!(seen.body, Some(json!({"query": "SELECT 1", "params": [5]})));
}

#[tokio::test]
async fn test_unreachable_backend_is_backend_error() {
    let client = PostgrestClient::new(
        &Credentials::new("http://127.0.0.1:1", "k"),
        &ClientOptions::default(),
    )
    .unwrap();
    let repo = GenericRepository::<_, Row>::new("users", Arc::new(client));
    let err = repo.find_all().await.unwrap_err();
    assert!(err.as_backend().is_some());
}
