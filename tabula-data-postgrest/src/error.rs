use tabula_data::{BackendError, DataError};

/// Extension trait for converting `reqwest::Error` into `DataError`.
///
/// Due to Rust's orphan rules, we can't implement `From<reqwest::Error> for DataError`
/// in this crate. Use `.into_data_error()` instead.
pub trait ReqwestErrorExt {
    fn into_data_error(self) -> DataError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_data_error(self) -> DataError {
        let mut err = BackendError::new(self.to_string());
        if let Some(status) = self.status() {
            err = err.with_status(status.as_u16());
        }
        DataError::Backend(err)
    }
}

/// Convenience alias for backend results using `DataError`.
pub type PostgrestResult<T> = Result<T, DataError>;

/// Turn a non-2xx PostgREST reply into a `DataError`.
///
/// JSON bodies of the `{message, code, details, hint}` shape are kept field by
/// field; anything else becomes the message as-is, or the status reason when
/// the body is empty.
pub(crate) fn from_error_body(status: reqwest::StatusCode, body: &str) -> DataError {
    let err = match serde_json::from_str::<BackendError>(body) {
        Ok(parsed) => parsed,
        Err(_) if body.trim().is_empty() => {
            BackendError::new(status.canonical_reason().unwrap_or("Request failed"))
        }
        Err(_) => BackendError::new(body.trim()),
    };
    DataError::Backend(err.with_status(status.as_u16()))
}
