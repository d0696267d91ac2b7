use serde::{Deserialize, Serialize};

/// Errors that can occur in the data layer.
#[derive(Debug, Clone)]
pub enum DataError {
    /// Credentials for the backend are missing or unusable. Fatal at startup.
    Configuration(String),
    /// The backend rejected or failed an operation.
    Backend(BackendError),
    /// A row could not be converted to or from its JSON form.
    Decode(String),
}

impl DataError {
    /// Construct a `Backend` variant carrying only a message.
    ///
    /// Used by backend crates (e.g. `tabula-data-postgrest`) to wrap transport
    /// failures that never reached the backend.
    pub fn backend(message: impl Into<String>) -> Self {
        DataError::Backend(BackendError::new(message))
    }

    /// The backend payload, if this is a backend failure.
    pub fn as_backend(&self) -> Option<&BackendError> {
        match self {
            DataError::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Configuration(msg) => f.write_str(msg),
            DataError::Backend(err) => std::fmt::Display::fmt(err, f),
            DataError::Decode(msg) => write!(f, "Malformed row: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Decode(err.to_string())
    }
}

impl From<BackendError> for DataError {
    fn from(err: BackendError) -> Self {
        DataError::Backend(err)
    }
}

/// Every data-layer failure is a 500 carrying the error's own message.
impl From<DataError> for tabula_core::ApiError {
    fn from(err: DataError) -> Self {
        tabula_core::ApiError::Internal(err.to_string())
    }
}

/// Error payload reported by the backend store.
///
/// Mirrors the PostgREST error body (`message`, `code`, `details`, `hint`).
/// The core never classifies it further; `Display` yields `message` verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// HTTP status of the failed call, when one was received.
    #[serde(skip)]
    pub status: Option<u16>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            details: None,
            hint: None,
            status: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendError {}
