//! Error types for the cache pipeline.
//!
//! `CacheError` covers the three failure families the pipeline can produce:
//! contract violations at wiring time (`InvalidLayer`, `CycleDetected`),
//! construction errors (`InvalidConfig`) and store failures surfaced from the
//! terminal end of the chain (`StoreUnavailable`, `Store`).
//!
//! A read miss is NOT an error: absence is the normal `Ok(None)` outcome of
//! `read`, propagated unchanged through every stage. Only genuine adapter
//! failures travel through the error channel.

use thiserror::Error;

use crate::layer::LayerId;

/// Standard result type for all pipeline operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors produced by pipeline stages and surfaced unchanged to the caller.
///
/// No stage retries or rewrites a downstream error; whatever fails at the
/// point of failure bubbles up through the calling operation as-is.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A stage was wired in a way its contract forbids, e.g. binding a
    /// downstream onto a terminal store stage or building an empty pipeline.
    #[error("invalid layer: {0}")]
    InvalidLayer(String),

    /// Binding this link would close a loop in the chain.
    #[error("cycle detected: {id} is already part of the downstream chain")]
    CycleDetected {
        /// Identity of the stage that would have appeared twice.
        id: LayerId,
    },

    /// A stage was constructed with unusable settings.
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// The backing store could not be reached at all.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// An adapter-specific failure, preserved with its source chain.
    #[error("store operation `{operation}` failed")]
    Store {
        /// The store operation that failed (`read`, `write` or `flush`).
        operation: String,
        /// The adapter error exactly as it occurred.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Severity level for monitoring and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, expected conditions.
    Info,
    /// Degraded but operational.
    Warning,
    /// Failure requiring attention.
    Error,
    /// System integrity at risk.
    Critical,
}

/// Standard interface for classifying errors by their characteristics.
pub trait ErrorClassification {
    /// Can the failed operation be retried as-is?
    fn is_retryable(&self) -> bool;

    /// How serious is this error?
    fn severity(&self) -> ErrorSeverity;

    /// Does this error require immediate attention?
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}

impl ErrorClassification for CacheError {
    /// Wiring and configuration mistakes never succeed on retry; an
    /// unreachable store may come back.
    fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidLayer(_) | Self::InvalidConfig(_) => ErrorSeverity::Error,
            Self::CycleDetected { .. } => ErrorSeverity::Error,
            Self::StoreUnavailable(_) => ErrorSeverity::Warning,
            Self::Store { .. } => ErrorSeverity::Error,
        }
    }
}
