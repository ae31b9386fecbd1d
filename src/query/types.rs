//! Query result types for athena-query.
//!
//! Values are kept in the service's string encoding; no type coercion is done.

use serde::{Deserialize, Serialize};

/// Represents the result of executing a SQL query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column metadata for the result set.
    pub columns: Vec<Column>,

    /// Rows of data, header row excluded.
    pub rows: Vec<Row>,

    /// Number of rows in `rows`.
    pub row_count: usize,
}

impl QueryResult {
    /// Creates a query result with the given columns and rows.
    pub fn with_data(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared type name (e.g., "varchar", "integer").
    #[serde(rename = "type")]
    pub data_type: String,
}

impl Column {
    /// Creates a new column with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data. `None` is SQL NULL, distinct from an empty string.
pub type Row = Vec<Option<String>>;
