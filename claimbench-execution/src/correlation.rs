//! End-to-end latency correlation for the event-driven pattern
//!
//! Completion of an event-driven submission is only visible as a side effect:
//! the policy and customer consumers each bump a success counter once they
//! have processed the resulting message. With no trace id in the pipeline,
//! a submission is correlated with its completion by snapshotting both
//! counters, submitting, and polling until each counter is at least one above
//! its baseline.
//!
//! The counters are aggregates, so this only attributes correctly while a
//! single correlation window is open at a time. Callers must run it under a
//! closed model with at most `e2e.max_vus` virtual users; the probe driver
//! enforces that.

use claimbench_core::{ClaimPayload, ClaimSubmitter, CounterOracle, CounterSnapshot, OracleError, SubmitOutcome};
use claimbench_http::{consumer_success_query, ConsumerSource};
use claimbench_resilience::{FixedIntervalPoller, PollOutcome};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// What happened to one correlated submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum E2eOutcome {
    /// Both counters advanced; latency runs from submission start
    Completed { latency: Duration },
    /// The submission itself failed, so nothing was polled
    SubmitFailed,
    /// The counters did not both advance before the timeout
    TimedOut { elapsed: Duration },
    /// The baseline could not be read, so nothing was submitted
    BaselineUnavailable,
}

impl E2eOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, E2eOutcome::Completed { .. })
    }

    pub fn latency(&self) -> Option<Duration> {
        match self {
            E2eOutcome::Completed { latency } => Some(*latency),
            _ => None,
        }
    }
}

/// Result of [`E2eCorrelator::correlate`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    /// `None` when the submission was skipped
    pub submit: Option<SubmitOutcome>,
    pub e2e: E2eOutcome,
}

/// Snapshot, submit, then poll both consumer counters
pub struct E2eCorrelator {
    oracle: Arc<dyn CounterOracle>,
    policy_query: String,
    customer_query: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl E2eCorrelator {
    pub fn new(
        oracle: Arc<dyn CounterOracle>,
        metrics_namespace: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            oracle,
            policy_query: consumer_success_query(metrics_namespace, ConsumerSource::Policy),
            customer_query: consumer_success_query(metrics_namespace, ConsumerSource::Customer),
            timeout,
            poll_interval,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Current value of both counters
    pub async fn snapshot(&self) -> Result<CounterSnapshot, OracleError> {
        let (policy, customer) = tokio::join!(
            self.oracle.query_scalar(&self.policy_query),
            self.oracle.query_scalar(&self.customer_query),
        );
        Ok(CounterSnapshot::new(to_count(policy?), to_count(customer?)))
    }

    /// Submit `payload` and wait for both consumers to report it
    pub async fn correlate(
        &self,
        submitter: &mut dyn ClaimSubmitter,
        payload: &ClaimPayload,
        submit_timeout: Duration,
    ) -> Correlation {
        let baseline = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Could not capture counter baseline, skipping submission");
                return Correlation {
                    submit: None,
                    e2e: E2eOutcome::BaselineUnavailable,
                };
            }
        };
        debug!(
            policy = baseline.policy_consumed,
            customer = baseline.customer_consumed,
            "Captured counter baseline"
        );

        let submit_start = Instant::now();
        let submit = submitter.submit(payload, submit_timeout).await;
        if !submit.success {
            return Correlation {
                submit: Some(submit),
                e2e: E2eOutcome::SubmitFailed,
            };
        }

        let remaining = self.timeout.saturating_sub(submit_start.elapsed());
        let baseline = Mutex::new(baseline);
        let poller = FixedIntervalPoller::new(self.poll_interval, remaining);

        let outcome = poller
            .poll_until(|_| {
                let baseline = &baseline;
                async move {
                    let (policy, customer) = tokio::join!(
                        self.oracle.query_scalar(&self.policy_query),
                        self.oracle.query_scalar(&self.customer_query),
                    );
                    // taken after the queries, never held across an await
                    let mut baseline = baseline.lock().unwrap_or_else(PoisonError::into_inner);
                    let policy_done = advanced(&mut baseline.policy_consumed, policy, ConsumerSource::Policy);
                    let customer_done =
                        advanced(&mut baseline.customer_consumed, customer, ConsumerSource::Customer);
                    (policy_done && customer_done).then_some(())
                }
            })
            .await;

        let e2e = match outcome {
            PollOutcome::Ready { attempts, .. } => {
                let latency = submit_start.elapsed();
                debug!(latency_ms = latency.as_millis() as u64, polls = attempts, "E2E completed");
                E2eOutcome::Completed { latency }
            }
            PollOutcome::TimedOut { attempts, .. } => {
                let elapsed = submit_start.elapsed();
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    polls = attempts,
                    "E2E correlation timed out"
                );
                E2eOutcome::TimedOut { elapsed }
            }
        };

        Correlation {
            submit: Some(submit),
            e2e,
        }
    }
}

/// Whether `observed` is at least one above `baseline`.
///
/// A value below the baseline means the counter was reset, so the baseline
/// drops to it and the submission has to show up on top of the new value. A
/// failed query is no progress and leaves the baseline alone.
fn advanced(baseline: &mut u64, observed: Result<f64, OracleError>, source: ConsumerSource) -> bool {
    match observed {
        Ok(value) => {
            let value = to_count(value);
            if value < *baseline {
                warn!(%source, baseline = *baseline, observed = value, "Counter reset detected, lowering baseline");
                *baseline = value;
                return false;
            }
            value > *baseline
        }
        Err(e) => {
            warn!(%source, error = %e, "Counter query failed, treating as no progress");
            false
        }
    }
}

fn to_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}
