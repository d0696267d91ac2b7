//! Route handlers for the dynamic table API.
//!
//! Each handler validates its own inputs (400), resolves the repository for
//! the named table through the registry, and lets data-layer failures surface
//! as 500s carrying the backend's message.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tabula_core::http::{Bytes, Json, Path, Query, State, StatusCode};
use tabula_core::{ApiError, ApiResponse, ApiResult};
use tabula_data::{Backend, FilterMap, QueryOptions, Row, TableSchema};

use crate::state::AppState;

pub const WELCOME: &str = "Welcome to the Tabula API";

const TABLE_REQUIRED: &str = "Table name is required";
const SCHEMA_REQUIRED: &str = "Table name and schema are required";
const DATA_REQUIRED: &str = "Table name and data are required";
const ID_REQUIRED: &str = "Table name and ID are required";
const FILTER_REQUIRED: &str = "Table name and filter are required";

/// JSON-encoded read parameters: `?filter=<json>&pagination=<json>`.
#[derive(Debug, Default, Deserialize)]
pub struct ReadParams {
    pub filter: Option<String>,
    pub pagination: Option<String>,
}

impl ReadParams {
    fn filter(&self) -> Result<FilterMap, ApiError> {
        decode_param(self.filter.as_deref())
    }

    fn options(&self) -> Result<QueryOptions, ApiError> {
        decode_param(self.pagination.as_deref())
    }
}

/// An empty or absent parameter means "not given".
fn decode_param<T: DeserializeOwned + Default>(raw: Option<&str>) -> Result<T, ApiError> {
    match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => Ok(serde_json::from_str(raw)?),
        _ => Ok(T::default()),
    }
}

/// An empty body decodes as `null`.
fn decode_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(body)?)
}

fn require_table<'a>(name: &'a str, message: &str) -> Result<&'a str, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest(message.to_string()));
    }
    Ok(name)
}

fn require_data(data: Value, message: &str) -> Result<Value, ApiError> {
    if data.is_null() {
        return Err(ApiError::BadRequest(message.to_string()));
    }
    Ok(data)
}

pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": WELCOME }))
}

/// `GET /tables`
pub async fn list_tables<B: Backend>(State(state): State<AppState<B>>) -> ApiResult<Vec<String>> {
    let tables = state.catalog.list_tables().await?;
    tracing::debug!(count = tables.len(), "listed tables");
    Ok(ApiResponse::success(tables))
}

/// `POST /tables` with `{tableName, schema}`.
pub async fn create_table<B: Backend>(
    State(state): State<AppState<B>>,
    body: Bytes,
) -> Result<(StatusCode, ApiResponse<Value>), ApiError> {
    let body = decode_body(&body)?;
    let table_name = match body.get("tableName").and_then(Value::as_str) {
        Some(name) => require_table(name, SCHEMA_REQUIRED)?.to_string(),
        None => return Err(ApiError::BadRequest(SCHEMA_REQUIRED.into())),
    };
    let schema = require_data(
        body.get("schema").cloned().unwrap_or(Value::Null),
        SCHEMA_REQUIRED,
    )?;
    let schema: TableSchema = serde_json::from_value(schema)?;

    state.registry.resolve(&table_name).create_table(&schema).await?;
    tracing::info!(table = %table_name, "table created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::success(json!({ "tableName": table_name })),
    ))
}

/// `DELETE /tables/{table_name}`
pub async fn drop_table<B: Backend>(
    State(state): State<AppState<B>>,
    Path(table_name): Path<String>,
) -> ApiResult<Value> {
    let table_name = require_table(&table_name, TABLE_REQUIRED)?;
    state.registry.resolve(table_name).drop_table().await?;
    state.registry.evict(table_name);
    tracing::info!(table = %table_name, "table dropped");
    Ok(ApiResponse::success(json!({ "tableName": table_name })))
}

/// `GET /tables/{table_name}/exists`
///
/// True when the table holds at least one row.
pub async fn table_exists<B: Backend>(
    State(state): State<AppState<B>>,
    Path(table_name): Path<String>,
) -> ApiResult<Value> {
    let table_name = require_table(&table_name, TABLE_REQUIRED)?;
    let exists = state.registry.resolve(table_name).exists(&FilterMap::new()).await?;
    Ok(ApiResponse::success(json!({ "exists": exists })))
}

/// `GET /tables/{table_name}/count?filter=<json>`
pub async fn count_rows<B: Backend>(
    State(state): State<AppState<B>>,
    Path(table_name): Path<String>,
    Query(params): Query<ReadParams>,
) -> ApiResult<Value> {
    let table_name = require_table(&table_name, TABLE_REQUIRED)?;
    let filter = params.filter()?;
    let count = state.registry.resolve(table_name).count(&filter).await?;
    Ok(ApiResponse::success(json!({ "count": count })))
}

/// `POST /tables/{table_name}/data` with a row body.
pub async fn upsert_row<B: Backend>(
    State(state): State<AppState<B>>,
    Path(table_name): Path<String>,
    body: Bytes,
) -> ApiResult<Row> {
    let table_name = require_table(&table_name, DATA_REQUIRED)?;
    let data = require_data(decode_body(&body)?, DATA_REQUIRED)?;
    let row: Row = serde_json::from_value(data)?;
    let saved = state.registry.resolve(table_name).upsert(&row, None).await?;
    tracing::debug!(table = %table_name, "row upserted");
    Ok(ApiResponse::success(saved))
}

/// `GET /tables/{table_name}/data?filter=<json>&pagination=<json>`
pub async fn query_rows<B: Backend>(
    State(state): State<AppState<B>>,
    Path(table_name): Path<String>,
    Query(params): Query<ReadParams>,
) -> ApiResult<Vec<Row>> {
    let table_name = require_table(&table_name, TABLE_REQUIRED)?;
    let filter = params.filter()?;
    let options = params.options()?;
    let rows = state.registry.resolve(table_name).get(&filter, &options).await?;
    Ok(ApiResponse::success(rows))
}

/// `PATCH /tables/{table_name}/data?filter=<json>` with a partial row body.
///
/// A filter without predicates is rejected rather than patching every row.
pub async fn patch_rows<B: Backend>(
    State(state): State<AppState<B>>,
    Path(table_name): Path<String>,
    Query(params): Query<ReadParams>,
    body: Bytes,
) -> ApiResult<Option<Row>> {
    let table_name = require_table(&table_name, FILTER_REQUIRED)?;
    let filter = params.filter()?;
    if filter.predicates().next().is_none() {
        return Err(ApiError::BadRequest(FILTER_REQUIRED.into()));
    }
    let data = require_data(decode_body(&body)?, DATA_REQUIRED)?;
    let patch: Row = serde_json::from_value(data)?;
    let updated = state.registry.resolve(table_name).patch(&patch, &filter).await?;
    tracing::debug!(table = %table_name, matched = updated.is_some(), "rows patched");
    Ok(ApiResponse::success(updated))
}

/// `DELETE /tables/{table_name}/data/{id}`
pub async fn delete_row<B: Backend>(
    State(state): State<AppState<B>>,
    Path((table_name, id)): Path<(String, String)>,
) -> ApiResult<()> {
    let table_name = require_table(&table_name, ID_REQUIRED)?;
    if id.trim().is_empty() {
        return Err(ApiError::BadRequest(ID_REQUIRED.into()));
    }
    state
        .registry
        .resolve(table_name)
        .delete(&FilterMap::new().eq("id", id))
        .await?;
    Ok(ApiResponse::success(()))
}
