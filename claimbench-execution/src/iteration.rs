//! Iteration functions run by the schedulers

use crate::correlation::{E2eCorrelator, E2eOutcome};
use crate::pool::VirtualUser;
use async_trait::async_trait;
use claimbench_core::{Measurement, MetricName, MetricsSink, PayloadGenerator, SubmitOutcome, Tags, VuIdentity};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Work done by one virtual user for one dispatched iteration
#[async_trait]
pub trait Iteration: Send + Sync + 'static {
    async fn run(&self, vu: &mut VirtualUser, identity: &VuIdentity);
}

/// Build a payload, submit it, record submit latency and failure
pub struct SubmitIteration {
    generator: PayloadGenerator,
    sink: Arc<dyn MetricsSink>,
    tags: Tags,
    timeout: Duration,
}

impl SubmitIteration {
    pub fn new(generator: PayloadGenerator, sink: Arc<dyn MetricsSink>, tags: Tags, timeout: Duration) -> Self {
        Self {
            generator,
            sink,
            tags,
            timeout,
        }
    }
}

#[async_trait]
impl Iteration for SubmitIteration {
    async fn run(&self, vu: &mut VirtualUser, identity: &VuIdentity) {
        let payload = self.generator.build(identity);
        let outcome = vu.submitter.submit(&payload, self.timeout).await;
        trace!(
            vu = identity.vu_id,
            iteration = identity.iteration_in_test,
            success = outcome.success,
            latency_ms = outcome.latency_ms(),
            "Iteration finished"
        );
        record_submit(self.sink.as_ref(), &self.tags, &outcome);
    }
}

/// Submit and measure end-to-end latency.
///
/// For synchronous patterns E2E latency is the submit latency. For the
/// event-driven pattern with correlation enabled it comes from the
/// [`E2eCorrelator`]; with correlation disabled only submit metrics are
/// recorded.
pub struct ProbeIteration {
    generator: PayloadGenerator,
    sink: Arc<dyn MetricsSink>,
    tags: Tags,
    timeout: Duration,
    correlator: Option<E2eCorrelator>,
}

impl ProbeIteration {
    pub fn new(
        generator: PayloadGenerator,
        sink: Arc<dyn MetricsSink>,
        tags: Tags,
        timeout: Duration,
        correlator: Option<E2eCorrelator>,
    ) -> Self {
        Self {
            generator,
            sink,
            tags,
            timeout,
            correlator,
        }
    }

    pub fn correlates(&self) -> bool {
        self.correlator.is_some()
    }

    fn record_e2e(&self, success: bool, latency: Option<Duration>) {
        if let Some(latency) = latency {
            self.sink.record(Measurement::trend(
                MetricName::E2eLatency,
                latency.as_secs_f64() * 1000.0,
                self.tags.clone(),
            ));
        }
        self.sink
            .record(Measurement::rate(MetricName::E2eFailure, !success, self.tags.clone()));
    }
}

#[async_trait]
impl Iteration for ProbeIteration {
    async fn run(&self, vu: &mut VirtualUser, identity: &VuIdentity) {
        let payload = self.generator.build(identity);

        match &self.correlator {
            Some(correlator) => {
                let correlation = correlator
                    .correlate(vu.submitter.as_mut(), &payload, self.timeout)
                    .await;
                if let Some(submit) = &correlation.submit {
                    record_submit(self.sink.as_ref(), &self.tags, submit);
                }
                if let E2eOutcome::TimedOut { elapsed } = correlation.e2e {
                    debug!(vu = identity.vu_id, elapsed_ms = elapsed.as_millis() as u64, "No E2E completion");
                }
                self.record_e2e(correlation.e2e.is_success(), correlation.e2e.latency());
            }
            None if self.tags.communication_pattern.is_asynchronous() => {
                let outcome = vu.submitter.submit(&payload, self.timeout).await;
                record_submit(self.sink.as_ref(), &self.tags, &outcome);
            }
            None => {
                let outcome = vu.submitter.submit(&payload, self.timeout).await;
                record_submit(self.sink.as_ref(), &self.tags, &outcome);
                self.record_e2e(outcome.success, outcome.success.then_some(outcome.latency));
            }
        }
    }
}

fn record_submit(sink: &dyn MetricsSink, tags: &Tags, outcome: &SubmitOutcome) {
    sink.record(Measurement::trend(
        MetricName::SubmitLatency,
        outcome.latency_ms(),
        tags.clone(),
    ));
    sink.record(Measurement::rate(MetricName::SubmitFailure, !outcome.success, tags.clone()));
}
