//! Query execution
//!
//! Runs exactly one statement against the store and normalizes the result.
//! Carries its own read-only check, independent of the validator: when the
//! correction budget runs out the orchestrator executes whatever candidate it
//! has, and this is the last gate a mutating statement can hit.

use crate::error::Result;
use crate::session::ExecutionOutcome;
use sqlsage_schema::SchemaStore;
use tracing::{debug, instrument, warn};

/// Leading keywords of statements this executor will run
const READ_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES"];

/// Whether the statement is clearly a read query
fn is_read_statement(sql: &str) -> bool {
    let first = sql.trim_start().split_whitespace().next().unwrap_or("");
    READ_KEYWORDS
        .iter()
        .any(|kw| first.eq_ignore_ascii_case(kw))
}

/// Executes validated (or attempt-exhausted) candidates.
pub struct QueryExecutor {
    store: SchemaStore,
}

impl QueryExecutor {
    /// Create an executor over the given store
    #[must_use]
    pub fn new(store: SchemaStore) -> Self {
        Self { store }
    }

    /// Execute one statement.
    ///
    /// Non-read statements are refused without touching the store. Store
    /// rejections come back verbatim in the outcome for downstream
    /// classification; no retries happen at this layer.
    ///
    /// # Errors
    /// Only store connection failures are returned as `Err`.
    #[instrument(skip(self, sql))]
    pub async fn execute(&self, sql: &str) -> Result<ExecutionOutcome> {
        if !is_read_statement(sql) {
            warn!("Refusing to execute a non-read statement");
            return Ok(ExecutionOutcome::failed(
                "refused to execute: statement is not a read query",
            ));
        }

        match self.store.run(sql).await {
            Ok(rows) => {
                debug!(rows = rows.len(), "Query executed");
                Ok(ExecutionOutcome::succeeded(rows))
            }
            Err(e) if e.is_sql() => Ok(ExecutionOutcome::failed(e.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
