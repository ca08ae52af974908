//! Core error types

use thiserror::Error;

/// Errors raised by core primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A one-shot signal was resolved or rejected twice
    #[error("Can't complete signal '{0}': already completed")]
    AlreadyCompleted(String),

    /// A one-shot signal was rejected by its producer
    #[error("Signal '{label}' rejected: {reason}")]
    Rejected { label: String, reason: String },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
