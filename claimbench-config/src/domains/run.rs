//! Run-level configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by every scenario of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Label attached to every measurement and payload description
    pub test_run: String,

    /// Grace window for in-flight iterations once the run deadline passes
    #[serde(with = "humantime_serde")]
    pub graceful_stop: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            test_run: "local".to_string(),
            graceful_stop: Duration::from_secs(30),
        }
    }
}

impl Validatable for RunConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.test_run, "test_run", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "run"
    }
}
