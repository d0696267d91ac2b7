use serde::{Deserialize, Serialize};

/// Limit used to compute the upper bound of a row range when only `offset`
/// was supplied.
pub const DEFAULT_RANGE_LIMIT: u64 = 10;

/// Read options, extractable from the `pagination` query parameter.
///
/// Every field is optional; `None` means "backend default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order_by = Some(OrderBy {
            column: column.into(),
            ascending: Some(ascending),
        });
        self
    }

    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = Some(columns.into());
        self
    }

    /// Projection expression, `*` when none was given.
    pub fn projection(&self) -> &str {
        match self.select.as_deref() {
            Some(select) if !select.is_empty() => select,
            _ => "*",
        }
    }

    /// Row range implied by `offset`, if any.
    ///
    /// `[offset, offset + (limit or 10) - 1]`. A zero offset is treated as
    /// unset, as is a zero-width range. The upper bound saturates at `u64::MAX`.
    pub fn range(&self) -> Option<RowRange> {
        let offset = self.offset.filter(|o| *o > 0)?;
        let limit = self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_RANGE_LIMIT);
        Some(RowRange {
            from: offset,
            to: offset.saturating_add(limit - 1),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascending: Option<bool>,
}

impl OrderBy {
    pub fn is_ascending(&self) -> bool {
        self.ascending.unwrap_or(true)
    }
}

/// Zero-based, inclusive row window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub from: u64,
    pub to: u64,
}

impl RowRange {
    pub fn new(from: u64, to: u64) -> Self {
        Self { from, to }
    }

    /// Number of rows covered by the window; `0` when inverted.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        (self.to - self.from).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.to < self.from
    }
}
