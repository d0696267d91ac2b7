//! HTTP types re-exported so downstream crates need not name `axum` directly.

pub use axum::body::{Body, Bytes};
pub use axum::extract::{OriginalUri, Path, Query, RawQuery, State};
pub use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
pub use axum::response::{IntoResponse, Response};
pub use axum::{routing, serve, Json, Router};
