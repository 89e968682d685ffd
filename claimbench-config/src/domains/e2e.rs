//! End-to-end correlation configuration

use crate::error::ConfigResult;
use crate::validation::{validate_duration, validate_positive, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Settings for counter-based E2E correlation of event-driven submissions.
///
/// Correlation compares aggregate counters before and after a submission, so
/// it is only sound while a single submission is in flight. `max_vus` is the
/// concurrency the probe driver will accept with correlation enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    pub enabled: bool,

    /// Prometheus base URL (`GET {url}/api/v1/query`)
    pub prometheus_url: String,

    /// Metric namespace of the consumer counters
    pub metrics_namespace: String,

    /// Give up on a correlation window after this long
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Interval between counter polls
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Highest probe concurrency allowed with correlation enabled
    pub max_vus: u32,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prometheus_url: "http://prometheus:9090".to_string(),
            metrics_namespace: "claims".to_string(),
            timeout: Duration::from_millis(120_000),
            poll_interval: Duration::from_millis(1_000),
            max_vus: 1,
        }
    }
}

impl Validatable for E2eConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();
        validate_url(&self.prometheus_url, "prometheus_url", domain)?;
        validate_duration(self.timeout, "timeout", domain)?;
        validate_duration(self.poll_interval, "poll_interval", domain)?;
        validate_positive(self.max_vus, "max_vus", domain)?;

        let namespace_ok = !self.metrics_namespace.is_empty()
            && self
                .metrics_namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !self.metrics_namespace.starts_with(|c: char| c.is_ascii_digit());
        if !namespace_ok {
            return Err(self.validation_error(format!(
                "metrics_namespace '{}' is not a valid metric name prefix",
                self.metrics_namespace
            )));
        }

        if self.poll_interval > self.timeout {
            return Err(self.validation_error("poll_interval must not exceed timeout"));
        }

        if self.max_vus > 1 {
            warn!(
                max_vus = self.max_vus,
                "E2E correlation above one VU cannot attribute overlapping submissions"
            );
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "e2e"
    }
}
