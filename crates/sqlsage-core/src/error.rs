//! Error types for sqlsage-core
//!
//! Only infrastructure failures surface here: a broken provider, a broken
//! store connection, a timed-out or cancelled call. SQL-quality failures
//! (bad syntax, missing tables, failed execution) never become an `Error`;
//! they stay inside the session and feed the correction loop instead, because
//! retrying a broken collaborator with the correction budget would waste
//! attempts on a problem correction cannot fix.

use thiserror::Error;

/// Core workflow error type
#[derive(Debug, Error)]
pub enum Error {
    /// Generation collaborator failed at the infrastructure level
    #[error("llm error: {0}")]
    Llm(#[from] sqlsage_llm::Error),

    /// Store connection failed (not a store-reported statement error)
    #[error("store error: {0}")]
    Store(sqlsage_schema::Error),

    /// An external call exceeded its deadline
    #[error("{stage} timed out after {secs}s")]
    StageTimeout {
        /// Stage that was running
        stage: &'static str,
        /// Configured deadline in seconds
        secs: u64,
    },

    /// The workflow was cancelled by the caller
    #[error("workflow cancelled")]
    Cancelled,
}

impl From<sqlsage_schema::Error> for Error {
    fn from(err: sqlsage_schema::Error) -> Self {
        Error::Store(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
