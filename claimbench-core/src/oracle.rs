//! Metrics oracle capability
//!
//! The oracle answers scalar aggregation queries against an external
//! time-series backend. A query that matches no series is a legitimate zero;
//! a query that fails is an [`OracleError`] and must never be mistaken for an
//! observation.

use async_trait::async_trait;
use thiserror::Error;

/// Failure to obtain a scalar from the metrics backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The backend answered with a non-success HTTP status
    #[error("Metrics backend returned HTTP {status}")]
    Status { status: u16 },

    /// The request never produced a response
    #[error("Metrics backend unreachable: {0}")]
    Transport(String),

    /// The response body did not have the expected shape
    #[error("Malformed metrics response: {0}")]
    Malformed(String),

    /// The backend reported a query error in its envelope
    #[error("Metrics query failed: {0}")]
    Query(String),
}

/// Read-only scalar query interface
#[async_trait]
pub trait CounterOracle: Send + Sync {
    /// Evaluate `expression` and return the first result's value, or `0.0`
    /// when no series matches yet
    async fn query_scalar(&self, expression: &str) -> Result<f64, OracleError>;
}
