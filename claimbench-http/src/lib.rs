//! HTTP functionality for claimbench
//!
//! This crate provides the REST variant of the claim submitter and the
//! Prometheus client used as the counter oracle for E2E correlation.

pub mod config;
pub mod errors;
pub mod oracle;
pub mod submitter;

// Re-export main types for convenience
pub use config::HttpClientConfig;
pub use errors::HttpError;
pub use oracle::{consumer_success_query, ConsumerSource, PrometheusOracle};
pub use submitter::{HttpSubmitter, HttpSubmitterFactory};
