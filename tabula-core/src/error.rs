use crate::http::{IntoResponse, Json, Method, OriginalUri, Response, StatusCode};
use crate::response::ApiResponse;

/// Error returned by request handlers, rendered as a failure envelope.
///
/// ```json
/// { "success": false, "error": "Table name is required" }
/// ```
pub enum ApiError {
    /// Missing or unusable request input. 400.
    BadRequest(String),
    /// No such route. 404.
    NotFound(String),
    /// Any data-layer or decoding failure. 500, message passed through.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the client.
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.message(), "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self.message(), "request rejected");
        }
        let body: ApiResponse<()> = ApiResponse::failure(self.message());
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            ApiError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            ApiError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for ApiError {}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Fallback for unmatched routes.
///
/// Reports the path as the client sent it, nest prefixes included.
pub async fn route_not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("Cannot {method} {}", uri.path()))
}

/// Generate `From<E> for ApiError` implementations that map error types to
/// a specific `ApiError` variant, keeping the error's `Display` text.
///
/// # Example
///
/// ```ignore
/// tabula_core::map_error! {
///     std::io::Error => Internal,
///     std::num::ParseIntError => BadRequest,
/// }
/// ```
#[macro_export]
macro_rules! map_error {
    ( $( $err_ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$err_ty> for $crate::ApiError {
                fn from(err: $err_ty) -> Self {
                    $crate::ApiError::$variant(err.to_string())
                }
            }
        )*
    };
}

map_error! {
    std::io::Error => Internal,
    crate::config::ConfigError => Internal,
}
