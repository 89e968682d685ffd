//! Error types for scenario execution

use claimbench_config::ConfigError;
use claimbench_core::CoreError;
use claimbench_grpc::GrpcError;
use claimbench_http::HttpError;
use std::time::Duration;
use thiserror::Error;

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Fatal conditions for a run. Per-iteration failures never end up here.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// An arrival was due while every virtual user up to the maximum was busy
    #[error(
        "Scheduling overload in '{phase}': all {max_vus} virtual users busy at {elapsed:?} \
         after {dispatched} iterations; raise max_vus or lower the arrival rate"
    )]
    CapacityExceeded {
        phase: String,
        max_vus: u64,
        elapsed: Duration,
        dispatched: u64,
    },

    /// Counter-based correlation cannot attribute overlapping submissions
    #[error(
        "E2E correlation needs at most {max_vus} concurrent virtual users, {vus} configured; \
         lower probe.vus or raise e2e.max_vus explicitly"
    )]
    UnsafeCorrelationConcurrency { vus: u32, max_vus: u32 },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport setup failed: {0}")]
    Transport(String),
}

impl From<ConfigError> for SchedulerError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<CoreError> for SchedulerError {
    fn from(err: CoreError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<HttpError> for SchedulerError {
    fn from(err: HttpError) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<GrpcError> for SchedulerError {
    fn from(err: GrpcError) -> Self {
        Self::Transport(err.to_string())
    }
}
