//! Test doubles shared by the unit tests of this crate

use async_trait::async_trait;
use claimbench_core::{
    ClaimPayload, ClaimSubmitter, CommunicationPattern, CounterOracle, Measurement, MetricName, MetricsSink,
    OracleError, PayloadGenerator, Protocol, SubmitOutcome, SubmitterFactory, VuIdentity,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn generator() -> PayloadGenerator {
    PayloadGenerator::new(
        vec!["p-1".to_string(), "p-2".to_string()],
        vec!["c-1".to_string()],
        CommunicationPattern::EventDriven,
    )
    .unwrap()
}

pub fn payload() -> ClaimPayload {
    generator().build(&VuIdentity::new(1, 0, "test"))
}

/// Submitters that sleep for a fixed latency and count what they did
#[derive(Default)]
pub struct CountingFactory {
    created: AtomicU64,
    submissions: Arc<AtomicU64>,
    latency: Duration,
    fail: bool,
}

impl CountingFactory {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }
}

struct CountingSubmitter {
    submissions: Arc<AtomicU64>,
    latency: Duration,
    fail: bool,
}

#[async_trait]
impl ClaimSubmitter for CountingSubmitter {
    async fn submit(&mut self, _payload: &ClaimPayload, _timeout: Duration) -> SubmitOutcome {
        tokio::time::sleep(self.latency).await;
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            SubmitOutcome::failure(self.latency)
        } else {
            SubmitOutcome::success(self.latency)
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::Http
    }
}

impl SubmitterFactory for CountingFactory {
    fn create(&self, _vu_id: u64) -> Box<dyn ClaimSubmitter> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::new(CountingSubmitter {
            submissions: Arc::clone(&self.submissions),
            latency: self.latency,
            fail: self.fail,
        })
    }

    fn protocol(&self) -> Protocol {
        Protocol::Http
    }
}

/// Oracle answering each query from its own script; the last entry repeats
#[derive(Default)]
pub struct ScriptedOracle {
    scripts: Mutex<HashMap<String, VecDeque<Result<f64, OracleError>>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedOracle {
    pub fn script(self, query: &str, values: &[f64]) -> Self {
        self.script_results(query, values.iter().copied().map(Ok).collect())
    }

    pub fn script_results(self, query: &str, results: Vec<Result<f64, OracleError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(query.to_string(), results.into_iter().collect());
        self
    }

    pub fn calls(&self, query: &str) -> usize {
        self.calls.lock().unwrap().get(query).copied().unwrap_or(0)
    }
}

#[async_trait]
impl CounterOracle for ScriptedOracle {
    async fn query_scalar(&self, expression: &str) -> Result<f64, OracleError> {
        *self.calls.lock().unwrap().entry(expression.to_string()).or_default() += 1;

        let mut scripts = self.scripts.lock().unwrap();
        let Some(script) = scripts.get_mut(expression) else {
            return Ok(0.0);
        };
        if script.len() > 1 {
            script.pop_front().unwrap_or(Ok(0.0))
        } else {
            script.front().cloned().unwrap_or(Ok(0.0))
        }
    }
}

/// Sink that keeps every measurement
#[derive(Default)]
pub struct RecordingSink {
    measurements: Mutex<Vec<Measurement>>,
}

impl RecordingSink {
    pub fn values(&self, name: MetricName) -> Vec<f64> {
        self.measurements
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.name == name)
            .map(|m| m.value)
            .collect()
    }

    pub fn all(&self) -> Vec<Measurement> {
        self.measurements.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingSink {
    fn record(&self, measurement: Measurement) {
        self.measurements.lock().unwrap().push(measurement);
    }
}
