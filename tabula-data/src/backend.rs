use crate::error::DataError;
use crate::query::TableQuery;
use serde_json::Value;
use std::future::Future;

/// Raw outcome of a table-scoped statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendResponse {
    /// Response payload: an array of rows, a single row object, or `Null`.
    pub body: Value,
    /// Exact count, when one was requested and reported.
    pub count: Option<u64>,
}

impl BackendResponse {
    pub fn rows(body: Value) -> Self {
        Self { body, count: None }
    }

    pub fn counted(count: Option<u64>) -> Self {
        Self {
            body: Value::Null,
            count,
        }
    }
}

/// Capability contract the repository requires from a backend client.
///
/// Uses RPITIT (return-position `impl Trait` in traits), so no `async-trait`.
pub trait Backend: Send + Sync + 'static {
    /// Run one table-scoped statement.
    fn execute(
        &self,
        query: TableQuery,
    ) -> impl Future<Output = Result<BackendResponse, DataError>> + Send;

    /// Invoke a backend-side function with JSON arguments.
    fn rpc(
        &self,
        function: &str,
        args: Value,
    ) -> impl Future<Output = Result<Value, DataError>> + Send;
}
