//! Threshold overrides

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use claimbench_core::MetricName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pass/fail criteria keyed by metric name, e.g. `submit_ms: ["p(95)<500"]`.
///
/// Metrics listed here replace the scenario's default criteria for that
/// metric; unlisted metrics keep their defaults. Expressions are parsed when
/// the run is assembled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdsConfig {
    pub overrides: BTreeMap<String, Vec<String>>,
}

impl ThresholdsConfig {
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl Validatable for ThresholdsConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (metric, expressions) in &self.overrides {
            if MetricName::from_name(metric).is_none() {
                let known: Vec<&str> = MetricName::all().iter().map(|m| m.as_str()).collect();
                return Err(self.validation_error(format!(
                    "unknown metric '{}'. Valid metrics: {}",
                    metric,
                    known.join(", ")
                )));
            }
            for expression in expressions {
                validate_required_string(expression, metric, self.domain_name())?;
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "thresholds"
    }
}
