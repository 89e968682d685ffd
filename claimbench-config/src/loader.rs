//! Configuration loading and environment variable handling

use crate::domains::utils::{parse_csv, parse_duration, parse_flag, parse_stages};
use crate::domains::{data, e2e, load, logging, run, target, ClaimbenchConfig};
use crate::error::{ConfigError, ConfigResult};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Configuration loader with environment variable support.
///
/// Keys are read unprefixed (`RATE`, `BP_STAGES`, ...) unless a prefix is
/// set, in which case `<PREFIX>_RATE` is read instead.
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader reading unprefixed keys
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<ClaimbenchConfig> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration file");
        let content = std::fs::read_to_string(path)?;
        let mut config: ClaimbenchConfig = serde_yaml::from_str(&content)?;

        // Apply environment variable overrides
        self.apply_env_overrides(&mut config)?;

        // Validate all domains
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<ClaimbenchConfig> {
        let mut config = ClaimbenchConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<ClaimbenchConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut ClaimbenchConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target)?;
        self.apply_run_overrides(&mut config.run)?;
        self.apply_data_overrides(&mut config.data)?;
        self.apply_load_overrides(&mut config.constant_load, &mut config.probe)?;
        self.apply_breakpoint_overrides(&mut config.breakpoint)?;
        self.apply_e2e_overrides(&mut config.e2e)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    /// Apply target config overrides
    fn apply_target_overrides(&self, config: &mut target::TargetConfig) -> ConfigResult<()> {
        if let Some(pattern) = self.parse_env_var("PATTERN")? {
            config.pattern = pattern;
        }
        if let Some(base_url) = self.get_env_var("BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(grpc_target) = self.get_env_var("GRPC_TARGET") {
            config.grpc_target = grpc_target;
        }
        if let Some(timeout) = self.duration_env_var("HTTP_TIMEOUT")? {
            config.http_timeout = timeout;
        }
        if let Some(timeout) = self.duration_env_var("GRPC_TIMEOUT")? {
            config.grpc_timeout = timeout;
        }
        if let Some(capture) = self.flag_env_var("CAPTURE_IDS")? {
            config.capture_response_bodies = capture;
        }
        Ok(())
    }

    /// Apply run config overrides
    fn apply_run_overrides(&self, config: &mut run::RunConfig) -> ConfigResult<()> {
        if let Some(test_run) = self.get_env_var("TEST_RUN") {
            config.test_run = test_run;
        }
        if let Some(graceful_stop) = self.duration_env_var("GRACEFUL_STOP")? {
            config.graceful_stop = graceful_stop;
        }
        Ok(())
    }

    /// Apply identifier pool overrides
    fn apply_data_overrides(&self, config: &mut data::DataConfig) -> ConfigResult<()> {
        if let Some(ids) = self.get_env_var("POLICY_IDS") {
            config.policy_ids = parse_csv(&ids);
        }
        if let Some(ids) = self.get_env_var("CUSTOMER_IDS") {
            config.customer_ids = parse_csv(&ids);
        }
        Ok(())
    }

    /// `RATE`, `DURATION` and `VUS` drive both the constant-load scenario and
    /// the probe; `MAX_VUS` only bounds the constant-load pool
    fn apply_load_overrides(
        &self,
        constant: &mut load::ArrivalRateConfig,
        probe: &mut load::ProbeConfig,
    ) -> ConfigResult<()> {
        if let Some(rate) = self.parse_env_var::<f64>("RATE")? {
            constant.rate = rate;
            probe.rate = rate;
        }
        if let Some(duration) = self.duration_env_var("DURATION")? {
            constant.duration = duration;
            probe.duration = duration;
        }
        if let Some(vus) = self.parse_env_var::<u32>("VUS")? {
            constant.preallocated_vus = vus;
            probe.vus = vus;
        }
        if let Some(max_vus) = self.parse_env_var("MAX_VUS")? {
            constant.max_vus = max_vus;
        }
        Ok(())
    }

    /// Apply breakpoint warmup and ramp overrides
    fn apply_breakpoint_overrides(&self, config: &mut load::BreakpointConfig) -> ConfigResult<()> {
        if let Some(rate) = self.parse_env_var("WARMUP_RATE")? {
            config.warmup.rate = rate;
        }
        if let Some(duration) = self.duration_env_var("WARMUP_DURATION")? {
            config.warmup.duration = duration;
        }
        if let Some(vus) = self.parse_env_var("WARMUP_VUS")? {
            config.warmup.preallocated_vus = vus;
        }
        if let Some(max_vus) = self.parse_env_var("WARMUP_MAX_VUS")? {
            config.warmup.max_vus = max_vus;
        }

        let ramp = &mut config.ramp;
        if let Some(rate) = self.parse_env_var("BP_START_RATE")? {
            ramp.start_rate = rate;
        }
        if let Some(time_unit) = self.duration_env_var("BP_TIME_UNIT")? {
            ramp.time_unit = time_unit;
        }
        if let Some(vus) = self.parse_env_var("BP_PREALLOC_VUS")? {
            ramp.preallocated_vus = vus;
        }
        if let Some(max_vus) = self.parse_env_var("BP_MAX_VUS")? {
            ramp.max_vus = max_vus;
        }
        if let Some(stages) = self.get_env_var("BP_STAGES") {
            ramp.stages = parse_stages(&stages)?;
        }
        if let Some(mode) = self.parse_env_var("RAMP_MODE")? {
            ramp.mode = mode;
        }
        Ok(())
    }

    /// Apply E2E correlation overrides
    fn apply_e2e_overrides(&self, config: &mut e2e::E2eConfig) -> ConfigResult<()> {
        if let Some(enabled) = self.flag_env_var("E2E_ENABLED")? {
            config.enabled = enabled;
        }
        if let Some(url) = self.get_env_var("PROM_URL") {
            config.prometheus_url = url;
        }
        if let Some(namespace) = self.get_env_var("METRICS_NAMESPACE") {
            config.metrics_namespace = namespace;
        }
        if let Some(ms) = self.parse_env_var::<u64>("E2E_TIMEOUT_MS")? {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.parse_env_var::<u64>("E2E_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(max_vus) = self.parse_env_var("E2E_MAX_VUS")? {
            config.max_vus = max_vus;
        }
        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(&self, config: &mut logging::LoggingConfig) -> ConfigResult<()> {
        if let Some(level) = self.parse_env_var("LOG_LEVEL")? {
            config.level = level;
        }
        if let Some(format) = self.parse_env_var("LOG_FORMAT")? {
            config.format = format;
        }
        if let Some(level) = self.parse_env_var("LOG_TRANSPORT_LEVEL")? {
            config.transport_level = level;
        }
        Ok(())
    }

    /// Full variable name for `name`
    pub fn env_key(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, name),
            None => name.to_string(),
        }
    }

    /// Get environment variable with prefix; unset and blank are the same
    fn get_env_var(&self, name: &str) -> Option<String> {
        std::env::var(self.env_key(name))
            .ok()
            .filter(|value| !value.trim().is_empty())
    }

    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get_env_var(name)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| {
                    ConfigError::EnvError(format!("Invalid {}: {}", self.env_key(name), e))
                })
            })
            .transpose()
    }

    fn duration_env_var(&self, name: &str) -> ConfigResult<Option<Duration>> {
        self.get_env_var(name)
            .map(|raw| {
                parse_duration(&raw).map_err(|e| {
                    ConfigError::EnvError(format!("Invalid {}: {}", self.env_key(name), e))
                })
            })
            .transpose()
    }

    fn flag_env_var(&self, name: &str) -> ConfigResult<Option<bool>> {
        self.get_env_var(name)
            .map(|raw| {
                parse_flag(&raw).map_err(|e| {
                    ConfigError::EnvError(format!("Invalid {}: {}", self.env_key(name), e))
                })
            })
            .transpose()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
