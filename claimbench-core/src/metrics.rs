//! Measurements and the sink they are written to

use crate::types::{CommunicationPattern, Protocol, TestKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Operation tag attached to every claim submission measurement
pub const SUBMIT_CLAIM_OPERATION: &str = "submitClaim";

/// Service tag attached to every measurement
pub const SERVICE_NAME: &str = "claim-service";

/// How a metric aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Distribution of millisecond values
    Trend,
    /// Fraction of non-zero samples
    Rate,
}

/// The four measurements every iteration can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricName {
    #[serde(rename = "submit_ms")]
    SubmitLatency,
    #[serde(rename = "submit_fail_rate")]
    SubmitFailure,
    #[serde(rename = "e2e_ms")]
    E2eLatency,
    #[serde(rename = "e2e_fail_rate")]
    E2eFailure,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SubmitLatency => "submit_ms",
            MetricName::SubmitFailure => "submit_fail_rate",
            MetricName::E2eLatency => "e2e_ms",
            MetricName::E2eFailure => "e2e_fail_rate",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricName::SubmitLatency | MetricName::E2eLatency => MetricKind::Trend,
            MetricName::SubmitFailure | MetricName::E2eFailure => MetricKind::Rate,
        }
    }

    pub fn all() -> &'static [MetricName] {
        &[
            MetricName::SubmitLatency,
            MetricName::SubmitFailure,
            MetricName::E2eLatency,
            MetricName::E2eFailure,
        ]
    }

    /// Look a metric up by its reported name
    pub fn from_name(name: &str) -> Option<MetricName> {
        Self::all().iter().copied().find(|m| m.as_str() == name)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tags attached to a measurement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tags {
    pub communication_pattern: CommunicationPattern,
    pub protocol: Protocol,
    pub operation: String,
    pub test_run: String,
    pub test_kind: TestKind,
    pub service: String,
}

impl Tags {
    /// Tags for a claim submission of the given pattern
    pub fn submit_claim(
        pattern: CommunicationPattern,
        test_run: impl Into<String>,
        test_kind: TestKind,
    ) -> Self {
        Self {
            communication_pattern: pattern,
            protocol: pattern.protocol(),
            operation: SUBMIT_CLAIM_OPERATION.to_string(),
            test_run: test_run.into(),
            test_kind,
            service: SERVICE_NAME.to_string(),
        }
    }
}

/// One recorded sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: MetricName,
    /// Milliseconds for trends, `1.0`/`0.0` for rates
    pub value: f64,
    pub tags: Tags,
}

impl Measurement {
    /// A trend sample in milliseconds
    pub fn trend(name: MetricName, millis: f64, tags: Tags) -> Self {
        debug_assert_eq!(name.kind(), MetricKind::Trend);
        Self {
            name,
            value: millis,
            tags,
        }
    }

    /// A rate sample; `hit` is the condition the rate counts (a failure for
    /// the `*_fail_rate` metrics)
    pub fn rate(name: MetricName, hit: bool, tags: Tags) -> Self {
        debug_assert_eq!(name.kind(), MetricKind::Rate);
        Self {
            name,
            value: if hit { 1.0 } else { 0.0 },
            tags,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.value != 0.0
    }
}

/// Append-only destination for measurements
pub trait MetricsSink: Send + Sync {
    fn record(&self, measurement: Measurement);
}

impl<T: MetricsSink + ?Sized> MetricsSink for Arc<T> {
    fn record(&self, measurement: Measurement) {
        (**self).record(measurement)
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn record(&self, _measurement: Measurement) {}
}
