//! Error types for summaries and thresholds

use thiserror::Error;

/// Threshold definition errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThresholdError {
    #[error("Unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("Invalid threshold '{expression}': {message}")]
    Syntax { expression: String, message: String },

    #[error("Aggregation '{aggregation}' does not apply to {kind} metric '{metric}'")]
    IncompatibleAggregation {
        metric: String,
        kind: String,
        aggregation: String,
    },
}

/// Summary export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
