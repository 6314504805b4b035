//! Store adapter error types.
//!
//! Adapter failures compose their backend errors and convert into
//! [`CacheError`] with the source chain intact, so a failure surfaces to the
//! pipeline caller unchanged from its point of origin.

use cachepipe_core::{CacheError, ErrorClassification, ErrorSeverity};
use thiserror::Error;

/// Errors produced by the concrete store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Rusqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// Adapter result type.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Convert into a pipeline error, tagging the failed store operation.
    ///
    /// Connection failures become [`CacheError::StoreUnavailable`]; anything
    /// else is wrapped with its source preserved.
    pub fn into_cache(self, operation: &str) -> CacheError {
        match self {
            Self::Connection(message) => CacheError::StoreUnavailable(message),
            other => {
                CacheError::Store { operation: operation.to_string(), source: Box::new(other) }
            }
        }
    }
}

impl ErrorClassification for StoreError {
    /// SQLite BUSY and LOCKED conditions are transient; connection errors
    /// may resolve on their own. Everything else needs intervention.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Rusqlite(err) => matches!(
                err.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy)
                    | Some(rusqlite::ErrorCode::DatabaseLocked)
            ),
            Self::SerdeJson(_) => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(_) => ErrorSeverity::Warning,
            Self::Rusqlite(_) => ErrorSeverity::Error,
            Self::SerdeJson(_) => ErrorSeverity::Error,
        }
    }
}
