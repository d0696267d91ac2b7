use crate::http::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

/// The `{success, data}` / `{success, error}` envelope every route answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    // Listed first so a failure body never deserializes as a success with null data.
    Failure { success: bool, error: String },
    Success { success: bool, data: T },
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse::Success {
            success: true,
            data,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ApiResponse::Failure {
            success: false,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success { .. })
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Handler result: a success envelope or an [`ApiError`](crate::ApiError).
pub type ApiResult<T> = Result<ApiResponse<T>, crate::ApiError>;
