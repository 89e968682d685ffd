//! System-under-test configuration

use crate::error::ConfigResult;
use crate::validation::{validate_duration, validate_host_port, validate_url, Validatable};
use claimbench_core::CommunicationPattern;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where and how claims are submitted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Communication pattern under test; selects the transport once per run
    pub pattern: CommunicationPattern,

    /// Base URL of the REST API (`POST {base_url}/claims`)
    pub base_url: String,

    /// `host:port` of the gRPC endpoint
    pub grpc_target: String,

    /// Per-request HTTP timeout
    #[serde(with = "humantime_serde")]
    pub http_timeout: Duration,

    /// Per-call gRPC timeout
    #[serde(with = "humantime_serde")]
    pub grpc_timeout: Duration,

    /// Read HTTP response bodies and log the created claim id
    pub capture_response_bodies: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            pattern: CommunicationPattern::Rest,
            base_url: default_base_url(),
            grpc_target: default_grpc_target(),
            http_timeout: Duration::from_secs(60),
            grpc_timeout: Duration::from_secs(30),
            capture_response_bodies: false,
        }
    }
}

impl TargetConfig {
    /// Timeout for the transport the pattern selects
    pub fn submit_timeout(&self) -> Duration {
        match self.pattern {
            CommunicationPattern::Grpc => self.grpc_timeout,
            CommunicationPattern::Rest | CommunicationPattern::EventDriven => self.http_timeout,
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "base_url", self.domain_name())?;
        validate_host_port(&self.grpc_target, "grpc_target", self.domain_name())?;
        validate_duration(self.http_timeout, "http_timeout", self.domain_name())?;
        validate_duration(self.grpc_timeout, "grpc_timeout", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

fn default_base_url() -> String {
    "http://claim-service:8080".to_string()
}

fn default_grpc_target() -> String {
    "claim-service:9090".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_defaults() {
        let config = TargetConfig::default();
        assert_eq!(config.pattern, CommunicationPattern::Rest);
        assert_eq!(config.grpc_timeout, Duration::from_secs(30));
        assert!(!config.capture_response_bodies);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_submit_timeout_follows_pattern() {
        let mut config = TargetConfig::default();
        assert_eq!(config.submit_timeout(), Duration::from_secs(60));
        config.pattern = CommunicationPattern::Grpc;
        assert_eq!(config.submit_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_target_validation() {
        let mut config = TargetConfig::default();
        config.grpc_target = "claim-service".to_string();
        assert!(config.validate().is_err());

        let mut config = TargetConfig::default();
        config.base_url = "claim-service:8080/api".to_string();
        assert!(config.validate().is_err());
    }
}
