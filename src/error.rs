//! Error handling for umbra operations.
//!
//! All public APIs return `Result<T, AccessError>`. The taxonomy separates
//! connection-level failures (the pool stays usable) from engine rejections,
//! row-mapping failures, and metadata resolution problems, so callers can
//! react to each without string-matching messages.

use std::time::Duration;
use thiserror::Error;

/// Result type for umbra operations.
pub type Result<T> = std::result::Result<T, AccessError>;

/// Boxed error type accepted from row readers.
///
/// Readers may fail with any error type; the template wraps the failure
/// together with the index of the offending row.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while executing data-access operations.
#[derive(Debug, Error)]
pub enum AccessError {
    /// A connection could not be created, borrowed, or validated.
    ///
    /// The factory (and pool, if any) remains usable after this error.
    #[error("connection error: {0}")]
    Connection(String),

    /// The pool had no free connection within the configured wait window.
    ///
    /// Surfaced distinctly from [`AccessError::Connection`] because this is
    /// the one transient condition a caller might reasonably retry.
    #[error("connection pool exhausted after waiting {waited:?}")]
    PoolExhausted {
        /// How long the borrow attempt waited before giving up.
        waited: Duration,
    },

    /// The engine rejected a statement or failed during execution.
    #[error("engine error: {0}")]
    Engine(String),

    /// A row reader failed while converting a result row.
    ///
    /// Partial results already produced for the call are discarded.
    #[error("error mapping row {row}: {source}")]
    Mapping {
        /// Zero-based index of the row that failed to map.
        row: usize,
        /// The reader's underlying failure.
        #[source]
        source: BoxError,
    },

    /// A write statement that must read back a row returned none.
    #[error("write returned no rows: {0}")]
    EmptyWriteResult(String),

    /// An operation required an identity or endpoint field that the entity
    /// type never resolved.
    #[error("unresolved metadata: {0}")]
    UnresolvedMetadata(String),

    /// A transaction operation was attempted in an illegal state.
    #[error("invalid transaction state: {0}")]
    TransactionState(String),

    /// Invalid configuration or API usage.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
