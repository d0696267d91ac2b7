use crate::backend::{Backend, BackendResponse};
use crate::error::DataError;
use crate::filter::{FilterMap, Row};
use crate::page::QueryOptions;
use crate::query::TableQuery;
use crate::schema::{drop_table_sql, TableSchema, LIST_TABLES_SQL, TABLE_EXISTS_SQL};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::marker::PhantomData;
use std::sync::Arc;

/// Backend function that executes a raw SQL statement with positional params.
pub const EXECUTE_SQL: &str = "execute_sql";

/// A generic repository bound to one table.
///
/// `T` is the row view handed to and returned from callers; it defaults to the
/// type-erased [`Row`]. The repository keeps no state besides its table name
/// and a shared handle to the backend.
///
/// # Example
///
/// ```ignore
/// let repo = GenericRepository::<_, Row>::new("users", backend.clone());
/// let active = repo
///     .get(&FilterMap::new().eq("status", "active"), &QueryOptions::new().limit(20))
///     .await?;
/// ```
pub struct GenericRepository<B, T = Row> {
    table: String,
    backend: Arc<B>,
    _marker: PhantomData<fn() -> T>,
}

impl<B, T> GenericRepository<B, T> {
    pub fn new(table: impl Into<String>, backend: Arc<B>) -> Self {
        Self {
            table: table.into(),
            backend,
            _marker: PhantomData,
        }
    }

    /// The bound table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Get the shared backend handle.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Build the read statement `get` issues for `filter` and `options`.
    ///
    /// Order of application: projection, equality filters, ordering, limit,
    /// then the offset range.
    pub fn read_query(&self, filter: &FilterMap, options: &QueryOptions) -> TableQuery {
        let mut query = TableQuery::from(&self.table)
            .select(options.projection())
            .filter(filter);
        if let Some(order) = &options.order_by {
            query = query.order(&order.column, order.is_ascending());
        }
        if let Some(limit) = options.limit.filter(|l| *l > 0) {
            query = query.limit(limit);
        }
        if let Some(range) = options.range() {
            query = query.range(range.from, range.to);
        }
        query
    }
}

impl<B, T> Clone for GenericRepository<B, T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            backend: self.backend.clone(),
            _marker: PhantomData,
        }
    }
}

impl<B, T> GenericRepository<B, T>
where
    B: Backend,
    T: Serialize + DeserializeOwned + Send,
{
    /// Read rows matching `filter`, shaped by `options`.
    pub async fn get(
        &self,
        filter: &FilterMap,
        options: &QueryOptions,
    ) -> Result<Vec<T>, DataError> {
        let query = self.read_query(filter, options);
        let response = self.execute("get", query).await?;
        rows_from(response.body)
    }

    /// Read every row with backend-default projection and order.
    pub async fn find_all(&self) -> Result<Vec<T>, DataError> {
        self.get(&FilterMap::new(), &QueryOptions::default()).await
    }

    /// Insert one row and return the stored representation.
    pub async fn create(&self, row: &T) -> Result<T, DataError> {
        let query = TableQuery::from(&self.table).insert(to_row(row)?).single();
        let response = self.execute("create", query).await?;
        required_row(response.body, "create")
    }

    /// Apply a partial update to the rows matching `filter`.
    ///
    /// Asks the backend for a single resulting row; what happens when the
    /// filter matches zero or several rows is up to the backend.
    pub async fn patch<P: Serialize>(
        &self,
        data: &P,
        filter: &FilterMap,
    ) -> Result<Option<T>, DataError> {
        let query = TableQuery::from(&self.table)
            .update(to_row(data)?)
            .filter(filter)
            .single();
        let response = self.execute("patch", query).await?;
        optional_row(response.body)
    }

    /// Insert `row`, or merge it into the row conflicting on `on_conflict`.
    pub async fn upsert(&self, row: &T, on_conflict: Option<&str>) -> Result<T, DataError> {
        let query = TableQuery::from(&self.table)
            .upsert(to_row(row)?, on_conflict)
            .single();
        let response = self.execute("upsert", query).await?;
        required_row(response.body, "upsert")
    }

    /// Delete the rows matching `filter`. Succeeds whether or not any matched.
    pub async fn delete(&self, filter: &FilterMap) -> Result<bool, DataError> {
        let query = TableQuery::from(&self.table).delete().filter(filter);
        self.execute("delete", query).await?;
        Ok(true)
    }

    /// Run a raw statement through the backend's SQL function.
    ///
    /// `raw` is passed through untouched; values belong in `params` and are
    /// bound positionally (`$1`, `$2`, ...) by the backend.
    pub async fn query(&self, raw: &str, params: &[Value]) -> Result<Vec<T>, DataError> {
        let data = self.execute_sql(raw, params).await?;
        rows_from(data)
    }

    /// Exact number of rows matching `filter`; `0` when the backend reports none.
    pub async fn count(&self, filter: &FilterMap) -> Result<u64, DataError> {
        let query = TableQuery::from(&self.table).count_exact().filter(filter);
        let response = self.execute("count", query).await?;
        Ok(response.count.unwrap_or(0))
    }

    pub async fn exists(&self, filter: &FilterMap) -> Result<bool, DataError> {
        Ok(self.count(filter).await? > 0)
    }

    /// Create the table described by `schema` if it does not exist.
    ///
    /// The statement names `schema.name`, not the bound table.
    pub async fn create_table(&self, schema: &TableSchema) -> Result<(), DataError> {
        self.execute_sql(&schema.create_table_sql(), &[]).await?;
        Ok(())
    }

    /// Drop the bound table if it exists. Registry eviction is the caller's job.
    pub async fn drop_table(&self) -> Result<(), DataError> {
        self.execute_sql(&drop_table_sql(&self.table), &[]).await?;
        Ok(())
    }

    /// Names of every table in the `public` schema.
    pub async fn list_tables(&self) -> Result<Vec<String>, DataError> {
        let data = self.execute_sql(LIST_TABLES_SQL, &[]).await?;
        let rows: Vec<Row> = rows_from(data)?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| match row.remove("table_name") {
                Some(Value::String(name)) => Some(name),
                _ => None,
            })
            .collect())
    }

    /// Whether the bound table is present in the catalog.
    pub async fn table_exists(&self) -> Result<bool, DataError> {
        let data = self
            .execute_sql(TABLE_EXISTS_SQL, &[Value::String(self.table.clone())])
            .await?;
        Ok(data
            .get(0)
            .and_then(|row| row.get("exists"))
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn execute(
        &self,
        op: &'static str,
        query: TableQuery,
    ) -> Result<BackendResponse, DataError> {
        tracing::debug!(table = %self.table, op, "executing table statement");
        self.backend.execute(query).await.inspect_err(|err| {
            tracing::warn!(table = %self.table, op, error = %err, "backend rejected statement");
        })
    }

    async fn execute_sql(&self, raw: &str, params: &[Value]) -> Result<Value, DataError> {
        tracing::debug!(table = %self.table, params = params.len(), "executing raw statement");
        self.backend
            .rpc(EXECUTE_SQL, json!({ "query": raw, "params": params }))
            .await
            .inspect_err(|err| {
                tracing::warn!(table = %self.table, error = %err, "raw statement failed");
            })
    }
}

fn to_row<V: Serialize + ?Sized>(value: &V) -> Result<Row, DataError> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(DataError::Decode(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn rows_from<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, DataError> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => Ok(serde_json::from_value(body)?),
        other => Err(DataError::Decode(format!(
            "expected an array of rows, got {}",
            json_kind(&other)
        ))),
    }
}

fn optional_row<T: DeserializeOwned>(body: Value) -> Result<Option<T>, DataError> {
    match body {
        Value::Null => Ok(None),
        other => Ok(Some(serde_json::from_value(other)?)),
    }
}

fn required_row<T: DeserializeOwned>(body: Value, op: &str) -> Result<T, DataError> {
    optional_row(body)?.ok_or_else(|| DataError::Decode(format!("{op} returned no row")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
