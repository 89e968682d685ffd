//! Claim submission capability
//!
//! Both transports (HTTP and the persistent gRPC channel) implement
//! [`ClaimSubmitter`]. The contract never fails: every transport problem is
//! folded into `SubmitOutcome { success: false, .. }` so that one bad
//! iteration can never abort a run.

use crate::payload::ClaimPayload;
use crate::types::Protocol;
use async_trait::async_trait;
use std::time::Duration;

/// Result of a single claim submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Wall-clock time spent on the submission
    pub latency: Duration,
    /// Whether the system under test accepted the claim
    pub success: bool,
}

impl SubmitOutcome {
    pub fn success(latency: Duration) -> Self {
        Self {
            latency,
            success: true,
        }
    }

    pub fn failure(latency: Duration) -> Self {
        Self {
            latency,
            success: false,
        }
    }

    /// Latency in fractional milliseconds, the unit every trend is recorded in
    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }
}

/// Submits claims to the system under test.
///
/// Implementations are owned by exactly one virtual user and are driven
/// sequentially, hence `&mut self`.
#[async_trait]
pub trait ClaimSubmitter: Send {
    /// Submit one claim, never returning an error past this boundary
    async fn submit(&mut self, payload: &ClaimPayload, timeout: Duration) -> SubmitOutcome;

    /// Protocol used on the wire
    fn protocol(&self) -> Protocol;
}

/// Creates one submitter per virtual user.
///
/// Called lazily when the scheduler materialises a virtual user; creating a
/// submitter must not open any connection.
pub trait SubmitterFactory: Send + Sync {
    fn create(&self, vu_id: u64) -> Box<dyn ClaimSubmitter>;

    fn protocol(&self) -> Protocol;
}
