//! Configuration error types

use thiserror::Error;

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
///
/// Every variant is fatal at startup: no iteration runs with an invalid
/// configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading configuration file
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvError(String),

    /// Malformed ramp stage specification
    #[error("Invalid stage specification '{spec}': {message}")]
    StageError { spec: String, message: String },

    /// Domain-specific configuration error
    #[error("Domain configuration error in {domain}: {message}")]
    DomainError { domain: String, message: String },
}

impl From<claimbench_core::CoreError> for ConfigError {
    fn from(err: claimbench_core::CoreError) -> Self {
        Self::ValidationError(err.to_string())
    }
}
