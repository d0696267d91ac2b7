//! Table descriptors and the DDL synthesized from them.
//!
//! Identifiers and types are interpolated as given; the backend is the only
//! line of validation for them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub references: ColumnRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.columns.push(ColumnDef::new(name, data_type));
        self
    }

    pub fn column_def(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn foreign_key(
        mut self,
        column: impl Into<String>,
        table: impl Into<String>,
        references: impl Into<String>,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.into(),
            references: ColumnRef {
                table: table.into(),
                column: references.into(),
            },
        });
        self
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this schema.
    ///
    /// The primary key column gets a trailing `PRIMARY KEY` constraint; foreign
    /// key clauses follow the column list only when there are any.
    pub fn create_table_sql(&self) -> String {
        let mut items: Vec<String> = self
            .columns
            .iter()
            .map(|col| col.definition(self.primary_key.as_deref() == Some(col.name.as_str())))
            .collect();
        items.extend(self.foreign_keys.iter().map(ForeignKey::clause));
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            items.join(", ")
        )
    }
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            constraints: Vec::new(),
        }
    }

    pub fn constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    fn definition(&self, primary_key: bool) -> String {
        let mut parts = vec![self.name.as_str(), self.data_type.as_str()];
        parts.extend(
            self.constraints
                .iter()
                .map(String::as_str)
                .filter(|c| !c.trim().is_empty()),
        );
        if primary_key {
            parts.push("PRIMARY KEY");
        }
        parts.join(" ")
    }
}

impl ForeignKey {
    fn clause(&self) -> String {
        format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            self.column, self.references.table, self.references.column
        )
    }
}

/// `DROP TABLE IF EXISTS` statement for `table`.
pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {table}")
}

/// Catalog query listing every table of the `public` schema.
pub const LIST_TABLES_SQL: &str =
    "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'";

/// Catalog query answering whether `$1` names a table of the `public` schema.
pub const TABLE_EXISTS_SQL: &str = "SELECT EXISTS (SELECT FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_name = $1)";
