//! SchemaStore — pooled, read-only SQLite access
//!
//! One store per process; every workflow call borrows a connection from the
//! pool and releases it when the call returns.

use crate::error::{Error, Result};
use crate::types::{ColumnInfo, ForeignKey, ResultSet, TableInfo};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo};
use std::path::Path;
use tracing::{debug, info};

/// Quote an identifier for interpolation into a PRAGMA or sampling query.
///
/// Identifiers come from `sqlite_master`, not from user input; quoting guards
/// against names that contain reserved words or spaces.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite-backed schema store.
#[derive(Clone)]
pub struct SchemaStore {
    pool: SqlitePool,
}

impl SchemaStore {
    /// Open a store for an existing database file.
    ///
    /// # Errors
    /// Fails if the file's directory cannot be created or the pool cannot
    /// connect.
    pub async fn from_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        info!("Schema store opened at {}", db_path.display());
        Ok(Self { pool })
    }

    /// In-memory store (for tests).
    ///
    /// A single connection is used so that every caller sees the same
    /// in-memory database.
    ///
    /// # Errors
    /// Fails if the pool cannot connect.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        debug!("In-memory schema store initialized");
        Ok(Self { pool })
    }

    /// Underlying pool, for maintenance tasks (seeding, test fixtures).
    ///
    /// Workflow code goes through the typed methods below.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// List user tables in name order.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(Error::from))
            .collect()
    }

    /// Structured description of one table: columns, keys, foreign keys.
    pub async fn table_info(&self, table: &str) -> Result<TableInfo> {
        let ident = quote_ident(table);

        let column_rows = sqlx::query(&format!("PRAGMA table_info({ident})"))
            .fetch_all(&self.pool)
            .await?;

        let mut columns = Vec::with_capacity(column_rows.len());
        for row in &column_rows {
            columns.push(ColumnInfo {
                name: row.try_get::<String, _>("name")?,
                data_type: row.try_get::<String, _>("type")?,
                not_null: row.try_get::<i64, _>("notnull")? != 0,
                primary_key: row.try_get::<i64, _>("pk")? != 0,
            });
        }

        let fk_rows = sqlx::query(&format!("PRAGMA foreign_key_list({ident})"))
            .fetch_all(&self.pool)
            .await?;

        let mut foreign_keys = Vec::with_capacity(fk_rows.len());
        for row in &fk_rows {
            foreign_keys.push(ForeignKey {
                column: row.try_get::<String, _>("from")?,
                referenced_table: row.try_get::<String, _>("table")?,
                referenced_column: row.try_get::<String, _>("to")?,
            });
        }

        Ok(TableInfo {
            name: table.to_string(),
            columns,
            foreign_keys,
        })
    }

    /// Sample distinct non-null values of a column, rendered as strings.
    ///
    /// Values longer than 50 characters are dropped; they make poor examples.
    pub async fn sample_values(
        &self,
        table: &str,
        column: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {col} FROM {tbl} WHERE {col} IS NOT NULL LIMIT {limit}",
            col = quote_ident(column),
            tbl = quote_ident(table),
        );

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let values = rows
            .iter()
            .map(|row| match decode_value(row, 0) {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .filter(|v| v.len() < 50)
            .collect();

        Ok(values)
    }

    /// Ask the store for a query plan without running the statement.
    ///
    /// No rows are fetched and nothing can be mutated; a plan error is
    /// returned with the store's message verbatim (`Error::Sql`).
    pub async fn plan(&self, sql: &str) -> Result<()> {
        debug!("Requesting query plan");
        sqlx::query(&format!("EXPLAIN QUERY PLAN {sql}"))
            .fetch_all(&self.pool)
            .await?;
        Ok(())
    }

    /// Run a single statement and return its ordered result.
    ///
    /// On failure the store's message is returned verbatim (`Error::Sql`);
    /// interpretation belongs to the caller.
    pub async fn run(&self, sql: &str) -> Result<ResultSet> {
        debug!("Executing query");
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;

        let columns = match rows.first() {
            Some(first) => first
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            None => Vec::new(),
        };

        let decoded = rows
            .iter()
            .map(|row| {
                (0..row.columns().len())
                    .map(|idx| decode_value(row, idx))
                    .collect()
            })
            .collect();

        Ok(ResultSet {
            columns,
            rows: decoded,
        })
    }
}

/// Decode one column of a row into a JSON value.
///
/// SQLite reports a type per value; computed columns can come back with no
/// declared type, so an untyped fallback chain is kept at the end.
fn decode_value(row: &SqliteRow, idx: usize) -> serde_json::Value {
    use serde_json::Value;

    let type_name = row.columns()[idx].type_info().name().to_uppercase();

    match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => row
            .try_get::<Option<f64>, _>(idx)
            .ok()
            .flatten()
            .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
            .unwrap_or(Value::Null),
        "TEXT" | "VARCHAR" | "DATE" | "DATETIME" => row
            .try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|bytes| Value::String(format!("<{} bytes>", bytes.len())))
            .unwrap_or(Value::Null),
        _ => {
            if let Ok(Some(i)) = row.try_get::<Option<i64>, _>(idx) {
                Value::from(i)
            } else if let Ok(Some(f)) = row.try_get::<Option<f64>, _>(idx) {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            } else if let Ok(Some(s)) = row.try_get::<Option<String>, _>(idx) {
                Value::String(s)
            } else {
                Value::Null
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded_store() -> SchemaStore {
        let store = SchemaStore::in_memory().await.unwrap();
        sqlx::query(
            "CREATE TABLE customers (
                customer_id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                city TEXT
            )",
        )
        .execute(store.pool())
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE orders (
                order_id INTEGER PRIMARY KEY,
                customer_id INTEGER NOT NULL,
                total_amount REAL NOT NULL,
                FOREIGN KEY (customer_id) REFERENCES customers(customer_id)
            )",
        )
        .execute(store.pool())
        .await
        .unwrap();
        sqlx::query("INSERT INTO customers VALUES (1, 'Alice', 'Chicago'), (2, 'Bob', NULL)")
            .execute(store.pool())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_from_path_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("test.db");
        let store = SchemaStore::from_path(&path).await.unwrap();

        assert!(path.exists());
        assert!(store.list_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_tables_sorted() {
        let store = seeded_store().await;
        let tables = store.list_tables().await.unwrap();
        assert_eq!(tables, vec!["customers", "orders"]);
    }

    #[tokio::test]
    async fn test_table_info_columns_and_keys() {
        let store = seeded_store().await;
        let info = store.table_info("orders").await.unwrap();

        assert_eq!(info.columns.len(), 3);
        assert!(info.columns[0].primary_key);
        assert!(info.columns[1].not_null);
        assert_eq!(info.foreign_keys.len(), 1);
        assert_eq!(info.foreign_keys[0].column, "customer_id");
        assert_eq!(info.foreign_keys[0].referenced_table, "customers");
    }

    #[tokio::test]
    async fn test_plan_accepts_valid_select() {
        let store = seeded_store().await;
        assert!(store.plan("SELECT * FROM customers").await.is_ok());
    }

    #[tokio::test]
    async fn test_plan_reports_missing_table() {
        let store = seeded_store().await;
        let err = store.plan("SELECT * FROM custmers").await.unwrap_err();
        assert!(err.is_sql());
        assert!(err.to_string().contains("no such table"));
    }

    #[tokio::test]
    async fn test_run_preserves_order() {
        let store = seeded_store().await;
        let rs = store
            .run("SELECT first_name, city FROM customers ORDER BY customer_id")
            .await
            .unwrap();

        assert_eq!(rs.columns, vec!["first_name", "city"]);
        assert_eq!(rs.rows[0], vec![json!("Alice"), json!("Chicago")]);
        assert_eq!(rs.rows[1], vec![json!("Bob"), serde_json::Value::Null]);
    }

    #[tokio::test]
    async fn test_run_empty_result() {
        let store = seeded_store().await;
        let rs = store
            .run("SELECT * FROM customers WHERE customer_id = 99")
            .await
            .unwrap();
        assert!(rs.is_empty());
    }

    #[tokio::test]
    async fn test_sample_values_distinct_non_null() {
        let store = seeded_store().await;
        let values = store.sample_values("customers", "city", 5).await.unwrap();
        assert_eq!(values, vec!["Chicago"]);
    }
}
