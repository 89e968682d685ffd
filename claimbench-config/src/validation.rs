//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};
use std::time::Duration;

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    // `!(v > 0)` also rejects NaN
    if !(value > T::default()) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a non-zero duration
pub fn validate_duration(value: Duration, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.is_zero() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be a non-zero duration", field_name),
        });
    }
    Ok(())
}

/// Validate a URL
pub fn validate_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }

    let parsed = url::Url::parse(url).map_err(|e| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} has invalid URL format: {}", field_name, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} scheme '{}' not supported (only http/https)", field_name, scheme),
        }),
    }
}

/// Validate a `host:port` address
pub fn validate_host_port(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    let invalid = || ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} must be host:port, got '{}'", field_name, value),
    };

    let (host, port) = value.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() {
        return Err(invalid());
    }
    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(1.5, "rate", "load").is_ok());
        assert!(validate_positive(0u32, "vus", "load").is_err());
        assert!(validate_positive(-3.0, "rate", "load").is_err());
        assert!(validate_positive(f64::NAN, "rate", "load").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("http://claim-service:8080", "base_url", "target").is_ok());
        assert!(validate_url("", "base_url", "target").is_err());
        assert!(validate_url("not a url", "base_url", "target").is_err());
        assert!(validate_url("ftp://host/x", "base_url", "target").is_err());
    }

    #[test]
    fn test_validate_host_port() {
        assert!(validate_host_port("claim-service:9090", "grpc_target", "target").is_ok());
        assert!(validate_host_port("claim-service", "grpc_target", "target").is_err());
        assert!(validate_host_port(":9090", "grpc_target", "target").is_err());
        assert!(validate_host_port("host:0", "grpc_target", "target").is_err());
        assert!(validate_host_port("host:http", "grpc_target", "target").is_err());
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration(Duration::from_secs(1), "duration", "load").is_ok());
        assert!(validate_duration(Duration::ZERO, "duration", "load").is_err());
    }
}
