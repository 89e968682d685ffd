//! Load-shape configuration for the three scenario drivers

use crate::error::{ConfigError, ConfigResult};
use crate::validation::{validate_duration, validate_positive, Validatable};
use claimbench_core::LoadStage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Open-model load at a fixed arrival rate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrivalRateConfig {
    /// Iterations started per `time_unit`
    pub rate: f64,

    #[serde(with = "humantime_serde")]
    pub time_unit: Duration,

    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Virtual users created before the first iteration is due
    pub preallocated_vus: u32,

    /// Upper bound the pool may grow to under back-pressure
    pub max_vus: u32,
}

impl ArrivalRateConfig {
    fn constant_load_default() -> Self {
        Self {
            rate: 80.0,
            time_unit: default_time_unit(),
            duration: Duration::from_secs(20 * 60),
            preallocated_vus: 50,
            max_vus: 200,
        }
    }

    fn warmup_default() -> Self {
        Self {
            rate: 20.0,
            time_unit: default_time_unit(),
            duration: Duration::from_secs(5 * 60),
            preallocated_vus: 20,
            max_vus: 50,
        }
    }

    fn validate_in(&self, domain: &str) -> ConfigResult<()> {
        validate_positive(self.rate, "rate", domain)?;
        if !self.rate.is_finite() {
            return Err(ConfigError::DomainError {
                domain: domain.to_string(),
                message: "rate must be finite".to_string(),
            });
        }
        validate_duration(self.time_unit, "time_unit", domain)?;
        validate_duration(self.duration, "duration", domain)?;
        validate_pool(self.preallocated_vus, self.max_vus, domain)
    }
}

impl Default for ArrivalRateConfig {
    fn default() -> Self {
        Self::constant_load_default()
    }
}

impl Validatable for ArrivalRateConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.validate_in(self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "constant_load"
    }
}

/// How the active rate moves between ramp stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RampMode {
    /// The stage target holds for the whole stage
    #[default]
    Step,
    /// The rate interpolates from the previous target to the stage target
    Linear,
}

impl RampMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RampMode::Step => "step",
            RampMode::Linear => "linear",
        }
    }
}

impl fmt::Display for RampMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RampMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "step" => Ok(RampMode::Step),
            "linear" => Ok(RampMode::Linear),
            _ => Err(format!("Invalid ramp mode: {}", s)),
        }
    }
}

/// One `target:duration` stage of a ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub target: f64,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl StageConfig {
    pub fn to_load_stage(&self) -> ConfigResult<LoadStage> {
        Ok(LoadStage::new(self.target, self.duration)?)
    }
}

/// Staged ramping arrival rate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RampConfig {
    /// Rate before the first stage begins, and the origin of a linear ramp
    pub start_rate: f64,

    #[serde(with = "humantime_serde")]
    pub time_unit: Duration,

    pub preallocated_vus: u32,

    pub max_vus: u32,

    pub mode: RampMode,

    pub stages: Vec<StageConfig>,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            start_rate: 20.0,
            time_unit: default_time_unit(),
            preallocated_vus: 50,
            max_vus: 200,
            mode: RampMode::Step,
            stages: [20.0, 40.0, 60.0, 80.0, 100.0, 120.0]
                .into_iter()
                .map(|target| StageConfig {
                    target,
                    duration: Duration::from_secs(5 * 60),
                })
                .collect(),
        }
    }
}

impl RampConfig {
    /// Stages as validated core values, in order
    pub fn load_stages(&self) -> ConfigResult<Vec<LoadStage>> {
        self.stages.iter().map(StageConfig::to_load_stage).collect()
    }

    /// Sum of all stage durations
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }
}

impl Validatable for RampConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();
        if !(self.start_rate >= 0.0 && self.start_rate.is_finite()) {
            return Err(self.validation_error(format!(
                "start_rate must be a finite non-negative number, got {}",
                self.start_rate
            )));
        }
        validate_duration(self.time_unit, "time_unit", domain)?;
        validate_pool(self.preallocated_vus, self.max_vus, domain)?;
        if self.stages.is_empty() {
            return Err(self.validation_error("at least one stage is required"));
        }
        self.load_stages().map_err(|e| self.validation_error(e.to_string()))?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "breakpoint.ramp"
    }
}

/// Breakpoint scenario: constant-rate warmup followed by the ramp
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakpointConfig {
    pub warmup: ArrivalRateConfig,
    pub ramp: RampConfig,
}

impl Default for BreakpointConfig {
    fn default() -> Self {
        Self {
            warmup: ArrivalRateConfig::warmup_default(),
            ramp: RampConfig::default(),
        }
    }
}

impl Validatable for BreakpointConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.warmup.validate_in("breakpoint.warmup")?;
        self.ramp.validate()
    }

    fn domain_name(&self) -> &'static str {
        "breakpoint"
    }
}

/// Closed-model probe: a fixed number of VUs, each loop paced best effort
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub vus: u32,

    /// Target iterations per second per VU; `0` disables pacing
    pub rate: f64,

    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            vus: 1,
            rate: 1.0,
            duration: Duration::from_secs(10 * 60),
        }
    }
}

impl ProbeConfig {
    /// Period the pacing sleep aims for, if pacing is enabled
    pub fn pacing_period(&self) -> Option<Duration> {
        (self.rate > 0.0).then(|| Duration::from_secs_f64(1.0 / self.rate))
    }
}

impl Validatable for ProbeConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.vus, "vus", self.domain_name())?;
        validate_duration(self.duration, "duration", self.domain_name())?;
        if !(self.rate >= 0.0 && self.rate.is_finite()) {
            return Err(self.validation_error(format!(
                "rate must be a finite non-negative number, got {}",
                self.rate
            )));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "probe"
    }
}

fn validate_pool(preallocated: u32, max: u32, domain: &str) -> ConfigResult<()> {
    validate_positive(preallocated, "preallocated_vus", domain)?;
    if max < preallocated {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!(
                "max_vus ({}) must be at least preallocated_vus ({})",
                max, preallocated
            ),
        });
    }
    Ok(())
}

fn default_time_unit() -> Duration {
    Duration::from_secs(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults_are_valid() {
        assert!(ArrivalRateConfig::default().validate().is_ok());
        assert!(BreakpointConfig::default().validate().is_ok());
        assert!(ProbeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_ramp_shape() {
        let ramp = RampConfig::default();
        assert_eq!(ramp.stages.len(), 6);
        assert_eq!(ramp.stages[5].target, 120.0);
        assert_eq!(ramp.total_duration(), Duration::from_secs(30 * 60));
        assert_eq!(ramp.mode, RampMode::Step);
    }

    #[test]
    fn test_arrival_rate_validation() {
        let mut config = ArrivalRateConfig::default();
        config.rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = ArrivalRateConfig::default();
        config.max_vus = 10;
        assert!(config.validate().is_err());

        let mut config = ArrivalRateConfig::default();
        config.duration = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ramp_rejects_bad_stage() {
        let mut ramp = RampConfig::default();
        ramp.stages.push(StageConfig {
            target: 0.0,
            duration: Duration::from_secs(60),
        });
        assert!(ramp.validate().is_err());

        ramp.stages.clear();
        assert!(ramp.validate().is_err());
    }

    #[test]
    fn test_ramp_mode_from_str() {
        assert_eq!(RampMode::from_str("Linear").unwrap(), RampMode::Linear);
        assert_eq!(RampMode::from_str("step").unwrap(), RampMode::Step);
        assert!(RampMode::from_str("cubic").is_err());
    }

    #[test]
    fn test_probe_pacing_period() {
        let mut probe = ProbeConfig::default();
        assert_eq!(probe.pacing_period(), Some(Duration::from_secs(1)));
        probe.rate = 4.0;
        assert_eq!(probe.pacing_period(), Some(Duration::from_millis(250)));
        probe.rate = 0.0;
        assert_eq!(probe.pacing_period(), None);
    }
}
