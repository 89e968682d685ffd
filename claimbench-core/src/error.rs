//! Core error types for claimbench

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the core domain types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier pool has no elements
    #[error("Identifier pool '{pool}' is empty")]
    EmptyPool { pool: String },

    /// A load stage violates its positivity invariant
    #[error("Invalid load stage: {0}")]
    InvalidStage(String),

    /// A textual value could not be parsed into a domain type
    #[error("Parse error: {0}")]
    Parse(String),
}
