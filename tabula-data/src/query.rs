use crate::filter::{FilterMap, Row};
use crate::page::{OrderBy, RowRange};
use serde_json::Value;

/// A fluent, backend-agnostic description of one table-scoped statement.
///
/// Backends translate it into their native call; the repository only ever
/// builds it.
///
/// # Example
///
/// ```ignore
/// let q = TableQuery::from("users")
///     .select("id, email")
///     .eq("status", "active")
///     .order("id", true)
///     .range(20, 24);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    table: String,
    action: Action,
    filters: Vec<(String, Value)>,
    order: Option<OrderBy>,
    limit_val: Option<u64>,
    range_val: Option<RowRange>,
    returning: Returning,
}

/// The statement kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Select { columns: String, count: Option<CountMode> },
    Insert { row: Row },
    Update { patch: Row },
    Upsert { row: Row, on_conflict: Option<String> },
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// Exact row count, no rows transferred.
    ExactHead,
}

/// What the backend should send back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returning {
    /// Nothing (or whatever the backend returns by default for reads).
    Minimal,
    /// Exactly one affected row as an object.
    Single,
}

impl TableQuery {
    /// Start a query against `table`. Defaults to `SELECT *`.
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            action: Action::Select {
                columns: "*".to_string(),
                count: None,
            },
            filters: Vec::new(),
            order: None,
            limit_val: None,
            range_val: None,
            returning: Returning::Minimal,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.action = Action::Select {
            columns: columns.to_string(),
            count: None,
        };
        self
    }

    /// Select with an exact count and no row payload.
    pub fn count_exact(mut self) -> Self {
        self.action = Action::Select {
            columns: "*".to_string(),
            count: Some(CountMode::ExactHead),
        };
        self
    }

    pub fn insert(mut self, row: Row) -> Self {
        self.action = Action::Insert { row };
        self
    }

    pub fn update(mut self, patch: Row) -> Self {
        self.action = Action::Update { patch };
        self
    }

    pub fn upsert(mut self, row: Row, on_conflict: Option<&str>) -> Self {
        self.action = Action::Upsert {
            row,
            on_conflict: on_conflict.map(str::to_string),
        };
        self
    }

    pub fn delete(mut self) -> Self {
        self.action = Action::Delete;
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    /// Add one `eq` predicate per defined filter entry.
    pub fn filter(mut self, filter: &FilterMap) -> Self {
        for (column, value) in filter.predicates() {
            self.filters.push((column.to_string(), value.clone()));
        }
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            ascending: Some(ascending),
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    /// Restrict to the inclusive window `[from, to]`. Takes precedence over
    /// `limit` when both are set.
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.range_val = Some(RowRange::new(from, to));
        self
    }

    /// Ask for exactly one row back, as an object.
    pub fn single(mut self) -> Self {
        self.returning = Returning::Single;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&OrderBy> {
        self.order.as_ref()
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit_val
    }

    pub fn range_value(&self) -> Option<RowRange> {
        self.range_val
    }

    pub fn returning(&self) -> Returning {
        self.returning
    }

    /// Whether this statement only reads.
    pub fn is_read(&self) -> bool {
        matches!(self.action, Action::Select { .. })
    }

    /// Effective `(offset, limit)` window after applying `range` over `limit`.
    pub fn window(&self) -> (Option<u64>, Option<u64>) {
        match self.range_val {
            Some(range) => (Some(range.from), Some(range.len())),
            None => (None, self.limit_val),
        }
    }
}

/// Render a filter value the way PostgREST-style backends expect it in
/// `eq.<value>` operands: strings unquoted, everything else as JSON text.
pub fn operand(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
