//! Error types for aircheck.

use thiserror::Error;

/// Result type alias using aircheck's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for aircheck operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Persistence layer failed or unreachable (wraps sqlx::Error).
    ///
    /// A raw database error only surfaces here after uniqueness
    /// violations have been split off into [`Error::Conflict`], so what
    /// remains means the storage layer itself is in trouble.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    /// Uniqueness violation on create (already bridged, duplicate row
    /// under a concurrent-writer race).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Recording not found
    #[error("Recording not found: {0}")]
    RecordingNotFound(i64),

    /// Identity bridge not found
    #[error("Bridge not found: {0}")]
    BridgeNotFound(i64),

    /// Vector index unreachable or timed out. Non-fatal: the matcher
    /// skips the strategy and records the degradation in the trace.
    #[error("Search degraded: {0}")]
    SearchDegraded(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a uniqueness conflict.
    ///
    /// The grouper and bridge store use this as the reliable "already
    /// exists" signal for retry-as-lookup.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Whether this error is a non-fatal search degradation.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Error::SearchDegraded(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("serialization: {e}"))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
