use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tabula_data::query::operand;
use tabula_data::schema::{LIST_TABLES_SQL, TABLE_EXISTS_SQL};
use tabula_data::{
    Action, Backend, BackendError, BackendResponse, CountMode, DataError, Returning, Row,
    TableQuery, EXECUTE_SQL,
};

/// One call received by a [`MockBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Execute(TableQuery),
    Rpc { function: String, args: Value },
}

/// In-memory [`Backend`] that evaluates statements against seeded tables.
///
/// Equality filters compare the rendered operands, so `"1"` matches `1` the
/// way a text-typed query parameter does against PostgREST. The raw SQL
/// function only understands the statements the repository itself issues;
/// anything else must be scripted with [`push_rpc_result`](Self::push_rpc_result).
///
/// ```ignore
/// let backend = Arc::new(MockBackend::new().with_rows("users", vec![json!({"id": 1})]));
/// backend.fail_next(BackendError::new("boom"));
/// ```
pub struct MockBackend {
    state: Mutex<MockState>,
}

struct MockState {
    tables: BTreeMap<String, Vec<Row>>,
    calls: Vec<Call>,
    failures: VecDeque<BackendError>,
    rpc_results: VecDeque<Value>,
    report_counts: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                tables: BTreeMap::new(),
                calls: Vec::new(),
                failures: VecDeque::new(),
                rpc_results: VecDeque::new(),
                report_counts: true,
            }),
        }
    }

    /// Create `table` holding `rows`. Non-object values are skipped.
    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.seed(table, rows);
        self
    }

    /// Create an empty `table`.
    pub fn with_table(self, table: &str) -> Self {
        self.seed(table, Vec::new());
        self
    }

    /// Never report exact counts, as a backend without count support would.
    pub fn without_counts(self) -> Self {
        self.state().report_counts = false;
        self
    }

    /// Replace the contents of `table`, creating it if needed.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect();
        self.state().tables.insert(table.to_string(), rows);
    }

    /// Current contents of `table`, or `None` when it does not exist.
    pub fn rows(&self, table: &str) -> Option<Vec<Value>> {
        self.state()
            .tables
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.state().tables.contains_key(table)
    }

    /// Fail the next call, whichever kind it is, with `error`.
    pub fn fail_next(&self, error: BackendError) {
        self.state().failures.push_back(error);
    }

    /// Answer the next raw SQL call with `result` instead of interpreting it.
    pub fn push_rpc_result(&self, result: Value) {
        self.state().rpc_results.push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Table statements received so far, oldest first.
    pub fn queries(&self) -> Vec<TableQuery> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Execute(q) => Some(q.clone()),
                Call::Rpc { .. } => None,
            })
            .collect()
    }

    /// Function calls received so far as `(function, args)`, oldest first.
    pub fn rpcs(&self) -> Vec<(String, Value)> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Rpc { function, args } => Some((function.clone(), args.clone())),
                Call::Execute(_) => None,
            })
            .collect()
    }

    pub fn last_query(&self) -> Option<TableQuery> {
        self.queries().pop()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Backend for MockBackend {
    async fn execute(&self, query: TableQuery) -> Result<BackendResponse, DataError> {
        let mut state = self.state();
        state.calls.push(Call::Execute(query.clone()));
        if let Some(err) = state.failures.pop_front() {
            return Err(err.into());
        }
        state.execute(&query).map_err(DataError::from)
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, DataError> {
        let mut state = self.state();
        state.calls.push(Call::Rpc {
            function: function.to_string(),
            args: args.clone(),
        });
        if let Some(err) = state.failures.pop_front() {
            return Err(err.into());
        }
        if let Some(result) = state.rpc_results.pop_front() {
            return Ok(result);
        }
        if function != EXECUTE_SQL {
            return Err(BackendError::new(format!(
                "Could not find the function public.{function} in the schema cache"
            ))
            .with_code("PGRST202")
            .with_status(404)
            .into());
        }
        state.interpret(&args).map_err(DataError::from)
    }
}

impl MockState {
    fn table_mut(&mut self, table: &str) -> Result<&mut Vec<Row>, BackendError> {
        self.tables.get_mut(table).ok_or_else(|| {
            BackendError::new(format!("relation \"public.{table}\" does not exist"))
                .with_code("42P01")
                .with_status(404)
        })
    }

    fn execute(&mut self, query: &TableQuery) -> Result<BackendResponse, BackendError> {
        let report_counts = self.report_counts;
        let filters = query.filters();
        let rows = self.table_mut(query.table())?;

        match query.action() {
            Action::Select { columns, count } => {
                let mut matched: Vec<Row> = rows
                    .iter()
                    .filter(|row| matches(row, filters))
                    .cloned()
                    .collect();
                if count == &Some(CountMode::ExactHead) {
                    let total = matched.len() as u64;
                    return Ok(BackendResponse::counted(report_counts.then_some(total)));
                }
                if let Some(order) = query.ordering() {
                    matched.sort_by(|a, b| {
                        let ord = compare(a.get(&order.column), b.get(&order.column));
                        if order.is_ascending() { ord } else { ord.reverse() }
                    });
                }
                let (offset, limit) = query.window();
                let projected = matched
                    .into_iter()
                    .skip(offset.unwrap_or(0) as usize)
                    .take(limit.map_or(usize::MAX, |l| l as usize))
                    .map(|row| Value::Object(project(row, columns)))
                    .collect::<Vec<_>>();
                respond(projected, query.returning(), true)
            }
            Action::Insert { row } => {
                rows.push(row.clone());
                respond(vec![Value::Object(row.clone())], query.returning(), false)
            }
            Action::Update { patch } => {
                let hits = rows.iter().filter(|row| matches(row, filters)).count();
                if query.returning() == Returning::Single && hits != 1 {
                    return Err(singular_violation(hits));
                }
                let mut updated = Vec::new();
                for row in rows.iter_mut().filter(|row| matches(row, filters)) {
                    for (k, v) in patch {
                        row.insert(k.clone(), v.clone());
                    }
                    updated.push(Value::Object(row.clone()));
                }
                respond(updated, query.returning(), false)
            }
            Action::Upsert { row, on_conflict } => {
                let keys: Vec<&str> = on_conflict
                    .as_deref()
                    .unwrap_or("id")
                    .split(',')
                    .map(str::trim)
                    .collect();
                let existing = rows.iter_mut().find(|stored| {
                    keys.iter().all(|k| match (stored.get(*k), row.get(*k)) {
                        (Some(a), Some(b)) => operand(a) == operand(b),
                        _ => false,
                    })
                });
                let stored = match existing {
                    Some(stored) => {
                        for (k, v) in row {
                            stored.insert(k.clone(), v.clone());
                        }
                        stored.clone()
                    }
                    None => {
                        rows.push(row.clone());
                        row.clone()
                    }
                };
                respond(vec![Value::Object(stored)], query.returning(), false)
            }
            Action::Delete => {
                let mut removed = Vec::new();
                rows.retain(|row| {
                    if matches(row, filters) {
                        removed.push(Value::Object(row.clone()));
                        false
                    } else {
                        true
                    }
                });
                respond(removed, query.returning(), false)
            }
        }
    }

    fn interpret(&mut self, args: &Value) -> Result<Value, BackendError> {
        let sql = args.get("query").and_then(Value::as_str).unwrap_or_default();
        let params = args
            .get("params")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        if let Some(rest) = sql.strip_prefix("CREATE TABLE IF NOT EXISTS ") {
            let name = rest
                .split(|c: char| c.is_whitespace() || c == '(')
                .next()
                .unwrap_or_default();
            self.tables.entry(name.to_string()).or_default();
            return Ok(Value::Null);
        }
        if let Some(name) = sql.strip_prefix("DROP TABLE IF EXISTS ") {
            self.tables.remove(name.trim());
            return Ok(Value::Null);
        }
        if sql == LIST_TABLES_SQL {
            let names = self
                .tables
                .keys()
                .map(|name| json!({ "table_name": name }))
                .collect();
            return Ok(Value::Array(names));
        }
        if sql == TABLE_EXISTS_SQL {
            let exists = params
                .first()
                .and_then(Value::as_str)
                .is_some_and(|name| self.tables.contains_key(name));
            return Ok(json!([{ "exists": exists }]));
        }
        Err(BackendError::new(format!("syntax error at or near \"{}\"", first_word(sql)))
            .with_code("42601")
            .with_status(400))
    }
}

fn matches(row: &Row, filters: &[(String, Value)]) -> bool {
    filters.iter().all(|(column, expected)| match row.get(column) {
        Some(actual) => operand(actual) == operand(expected),
        None => expected.is_null(),
    })
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => operand(x).cmp(&operand(y)),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn project(row: Row, columns: &str) -> Row {
    if columns.trim() == "*" {
        return row;
    }
    let wanted: Vec<&str> = columns.split(',').map(str::trim).collect();
    row.into_iter()
        .filter(|(k, _)| wanted.contains(&k.as_str()))
        .collect()
}

fn respond(
    rows: Vec<Value>,
    returning: Returning,
    read: bool,
) -> Result<BackendResponse, BackendError> {
    match returning {
        Returning::Minimal if read => Ok(BackendResponse::rows(Value::Array(rows))),
        Returning::Minimal => Ok(BackendResponse::default()),
        Returning::Single => match <[Value; 1]>::try_from(rows) {
            Ok([row]) => Ok(BackendResponse::rows(row)),
            Err(rows) => Err(singular_violation(rows.len())),
        },
    }
}

fn singular_violation(rows: usize) -> BackendError {
    BackendError::new("JSON object requested, multiple (or no) rows returned")
        .with_code("PGRST116")
        .with_status(406)
        .with_details(format!("The result contains {rows} rows"))
}

fn first_word(sql: &str) -> &str {
    sql.split_whitespace().next().unwrap_or_default()
}
