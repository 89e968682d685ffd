//! Domain-specific configuration modules

pub mod data;
pub mod e2e;
pub mod load;
pub mod logging;
pub mod run;
pub mod target;
pub mod thresholds;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main claimbench configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClaimbenchConfig {
    /// System under test and transport selection
    pub target: target::TargetConfig,

    /// Run label and graceful stop
    pub run: run::RunConfig,

    /// Identifier pools for payload generation
    pub data: data::DataConfig,

    /// Constant arrival-rate scenario
    pub constant_load: load::ArrivalRateConfig,

    /// Warmup plus ramping arrival-rate scenario
    pub breakpoint: load::BreakpointConfig,

    /// Closed-model E2E probe scenario
    pub probe: load::ProbeConfig,

    /// Counter-based correlation for the event-driven pattern
    pub e2e: e2e::E2eConfig,

    /// Logging configuration
    pub logging: logging::LoggingConfig,

    /// Threshold overrides
    #[serde(skip_serializing_if = "thresholds::ThresholdsConfig::is_empty")]
    pub thresholds: thresholds::ThresholdsConfig,
}

impl ClaimbenchConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.run.validate()?;
        self.data.validate()?;
        self.constant_load.validate()?;
        self.breakpoint.validate()?;
        self.probe.validate()?;
        self.e2e.validate()?;
        self.logging.validate()?;
        self.thresholds.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = ClaimbenchConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
