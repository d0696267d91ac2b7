use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A type-erased table row: column name to JSON value.
pub type Row = Map<String, Value>;

/// Column-to-value equality filter.
///
/// Entries are combined with AND. An entry whose value is `None` is kept in
/// the map but never turns into a predicate; a present JSON `null` does.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterMap(BTreeMap<String, Option<Value>>);

impl FilterMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add an equality entry.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), Some(value.into()));
        self
    }

    /// Add an entry that only filters when `value` is `Some`.
    pub fn maybe<V: Into<Value>>(mut self, column: impl Into<String>, value: Option<V>) -> Self {
        self.0.insert(column.into(), value.map(Into::into));
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Option<Value>) {
        self.0.insert(column.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The entries that take part in filtering, in column order.
    pub fn predicates(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter_map(|(column, value)| value.as_ref().map(|v| (column.as_str(), v)))
    }
}

impl From<Row> for FilterMap {
    fn from(row: Row) -> Self {
        Self(row.into_iter().map(|(k, v)| (k, Some(v))).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FilterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for FilterMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // JSON has no "undefined": every key that is present filters, null included.
        Row::deserialize(deserializer).map(FilterMap::from)
    }
}
