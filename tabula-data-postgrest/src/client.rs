use crate::credentials::Credentials;
use crate::error::{from_error_body, PostgrestResult, ReqwestErrorExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Method, Request, Response};
use serde_json::Value;
use std::time::Duration;
use tabula_data::query::operand;
use tabula_data::{Action, Backend, BackendResponse, CountMode, DataError, Returning, TableQuery};

/// Media type asking PostgREST for one row as a bare object.
pub const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Tuning knobs for [`PostgrestClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Schema selected through the `Accept-Profile` / `Content-Profile` headers.
    pub schema: String,
    /// Whole-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            request_timeout: None,
        }
    }
}

impl ClientOptions {
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Stateless PostgREST client.
///
/// Holds no cookie store or session: every request carries the API key as
/// both `apikey` and bearer token. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    http: reqwest::Client,
    rest_url: String,
    auth: HeaderMap,
    schema: HeaderValue,
}

impl PostgrestClient {
    pub fn new(credentials: &Credentials, options: &ClientOptions) -> PostgrestResult<Self> {
        let invalid_key =
            || DataError::Configuration("SUPABASE_KEY is not a valid header value".into());
        let mut key = HeaderValue::from_str(&credentials.key).map_err(|_| invalid_key())?;
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credentials.key))
            .map_err(|_| invalid_key())?;
        key.set_sensitive(true);
        bearer.set_sensitive(true);

        let mut auth = HeaderMap::new();
        auth.insert(HeaderName::from_static("apikey"), key);
        auth.insert(AUTHORIZATION, bearer);

        let schema = HeaderValue::from_str(&options.schema).map_err(|_| {
            DataError::Configuration(format!("invalid schema name: {}", options.schema))
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| DataError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", credentials.url.trim_end_matches('/')),
            auth,
            schema,
        })
    }

    /// Base URL of the REST endpoint (`<project url>/rest/v1`).
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    /// Translate a table statement into the HTTP request PostgREST expects.
    ///
    /// | Statement | Request |
    /// |-----------|---------|
    /// | select | `GET /{table}?select=..` (`HEAD` + `Prefer: count=exact` when counting) |
    /// | insert | `POST /{table}` |
    /// | update | `PATCH /{table}?<filters>` |
    /// | upsert | `POST /{table}?on_conflict=..` + `Prefer: resolution=merge-duplicates` |
    /// | delete | `DELETE /{table}?<filters>` |
    pub fn request_for(&self, query: &TableQuery) -> PostgrestResult<Request> {
        let mut params: Vec<(String, String)> = Vec::new();
        let mut prefer: Vec<&str> = Vec::new();

        let (method, body) = match query.action() {
            Action::Select { columns, count } => {
                params.push(("select".into(), columns.clone()));
                match count {
                    Some(CountMode::ExactHead) => {
                        prefer.push("count=exact");
                        (Method::HEAD, None)
                    }
                    None => (Method::GET, None),
                }
            }
            Action::Insert { row } => (Method::POST, Some(Value::Object(row.clone()))),
            Action::Update { patch } => (Method::PATCH, Some(Value::Object(patch.clone()))),
            Action::Upsert { row, on_conflict } => {
                if let Some(columns) = on_conflict {
                    params.push(("on_conflict".into(), columns.clone()));
                }
                prefer.push("resolution=merge-duplicates");
                (Method::POST, Some(Value::Object(row.clone())))
            }
            Action::Delete => (Method::DELETE, None),
        };

        for (column, value) in query.filters() {
            params.push((column.clone(), format!("eq.{}", operand(value))));
        }
        if let Some(order) = query.ordering() {
            let direction = if order.is_ascending() { "asc" } else { "desc" };
            params.push(("order".into(), format!("{}.{direction}", order.column)));
        }
        let (offset, limit) = query.window();
        if let Some(limit) = limit {
            params.push(("limit".into(), limit.to_string()));
        }
        if let Some(offset) = offset {
            params.push(("offset".into(), offset.to_string()));
        }

        if !query.is_read() && query.returning() != Returning::Minimal {
            prefer.push("return=representation");
        }

        let profile = if method == Method::GET || method == Method::HEAD {
            "accept-profile"
        } else {
            "content-profile"
        };

        let url = format!("{}/{}", self.rest_url, query.table());
        let mut builder = self
            .http
            .request(method, url)
            .headers(self.auth.clone())
            .header(HeaderName::from_static(profile), self.schema.clone())
            .query(&params);
        if !prefer.is_empty() {
            builder = builder.header("Prefer", prefer.join(","));
        }
        if query.returning() == Returning::Single {
            builder = builder.header(ACCEPT, SINGLE_OBJECT);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        builder.build().map_err(ReqwestErrorExt::into_data_error)
    }

    /// `POST /rpc/{function}` with `args` as the JSON body.
    pub fn rpc_request(&self, function: &str, args: &Value) -> PostgrestResult<Request> {
        self.http
            .post(format!("{}/rpc/{function}", self.rest_url))
            .headers(self.auth.clone())
            .header(HeaderName::from_static("content-profile"), self.schema.clone())
            .json(args)
            .build()
            .map_err(ReqwestErrorExt::into_data_error)
    }

    async fn send(&self, request: Request) -> PostgrestResult<Response> {
        tracing::debug!(
            method = %request.method(),
            path = request.url().path(),
            "sending PostgREST request"
        );
        let response = self
            .http
            .execute(request)
            .await
            .map_err(ReqwestErrorExt::into_data_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(from_error_body(status, &body))
    }
}

impl Backend for PostgrestClient {
    async fn execute(&self, query: TableQuery) -> Result<BackendResponse, DataError> {
        let head_only = matches!(
            query.action(),
            Action::Select {
                count: Some(CountMode::ExactHead),
                ..
            }
        );
        let request = self.request_for(&query)?;
        let response = self.send(request).await?;
        let count = content_range_total(response.headers());
        let body = if head_only {
            Value::Null
        } else {
            read_json(response).await?
        };
        Ok(BackendResponse { body, count })
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, DataError> {
        let request = self.rpc_request(function, &args)?;
        let response = self.send(request).await?;
        read_json(response).await
    }
}

/// Empty bodies (e.g. `return=minimal` writes) read as `null`.
async fn read_json(response: Response) -> PostgrestResult<Value> {
    let text = response
        .text()
        .await
        .map_err(ReqwestErrorExt::into_data_error)?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

/// Total from a `Content-Range: 0-24/3573` header; `*` totals are absent.
fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()?
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}
