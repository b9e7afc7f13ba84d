//! Structured schema and result types

use serde::{Deserialize, Serialize};

/// A single column of a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared SQL type (as reported by the store)
    pub data_type: String,
    /// Whether the column carries NOT NULL
    pub not_null: bool,
    /// Whether the column is part of the primary key
    pub primary_key: bool,
}

/// A foreign key relationship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referencing column in this table
    pub column: String,
    /// Referenced table
    pub referenced_table: String,
    /// Referenced column
    pub referenced_column: String,
}

/// Structured description of one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnInfo>,
    /// Outgoing foreign keys
    pub foreign_keys: Vec<ForeignKey>,
}

/// An ordered query result
///
/// Row and column order are exactly what the store returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names in select order
    pub columns: Vec<String>,
    /// Rows, each value aligned with `columns`
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl ResultSet {
    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows as (column, value) pairs in column order
    pub fn iter_named(&self) -> impl Iterator<Item = Vec<(&str, &serde_json::Value)>> {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .map(|c| c.as_str())
                .zip(row.iter())
                .collect()
        })
    }
}
