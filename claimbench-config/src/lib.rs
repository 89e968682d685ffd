//! Domain-driven configuration management for claimbench
//!
//! Configuration is split by functional domain (target, run, data, load
//! shapes, end-to-end correlation, logging). Every domain carries serde
//! defaults and validation; [`ConfigLoader`] layers an optional YAML file and
//! environment overrides on top of the defaults.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    data::DataConfig,
    e2e::E2eConfig,
    load::{ArrivalRateConfig, BreakpointConfig, ProbeConfig, RampConfig, RampMode, StageConfig},
    logging::{filter_directives, LogFormat, LogLevel, LoggingConfig, TRANSPORT_TARGETS},
    run::RunConfig,
    target::TargetConfig,
    thresholds::ThresholdsConfig,
    ClaimbenchConfig,
};

// Re-export utilities
pub use domains::utils::{parse_csv, parse_duration, parse_flag, parse_stages};
