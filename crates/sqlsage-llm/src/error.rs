//! Error types for sqlsage-llm

use thiserror::Error;

/// LLM error type
///
/// Every variant is an infrastructure-level failure of the generation
/// collaborator. None of them describe the quality of generated SQL; callers
/// must not retry them with the correction budget.
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// API error
    #[error("api error: {0}")]
    Api(String),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
