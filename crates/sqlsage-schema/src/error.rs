//! Error types for sqlsage-schema

use thiserror::Error;

/// Schema/store error type
///
/// `Sql` carries the store-reported message verbatim so downstream
/// classification (missing table, missing column, ambiguity) can match on it.
/// Everything else is an infrastructure failure of the connection itself.
#[derive(Debug, Error)]
pub enum Error {
    /// The store rejected the statement; message is verbatim
    #[error("{0}")]
    Sql(String),

    /// Connection or pool level failure
    #[error("database connection error: {0}")]
    Connection(sqlx::Error),

    /// Filesystem error while opening the database
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => Error::Sql(db.message().to_string()),
            other => Error::Connection(other),
        }
    }
}

impl Error {
    /// Whether this error was reported by the store for the statement itself
    /// (as opposed to a failure of the connection infrastructure).
    #[must_use]
    pub fn is_sql(&self) -> bool {
        matches!(self, Error::Sql(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
