//! HTTP client configuration

use crate::errors::HttpError;
use claimbench_config::TargetConfig;
use reqwest::Client;
use std::time::Duration;

/// Settings for the shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Upper bound for any request made through the client
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Read response bodies of accepted claims and log the created id
    pub capture_response_bodies: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: default_user_agent(),
            capture_response_bodies: false,
        }
    }
}

impl From<&TargetConfig> for HttpClientConfig {
    fn from(config: &TargetConfig) -> Self {
        Self {
            timeout: config.http_timeout,
            user_agent: default_user_agent(),
            capture_response_bodies: config.capture_response_bodies,
        }
    }
}

impl HttpClientConfig {
    /// Build the client shared by every virtual user
    pub fn build_client(&self) -> Result<Client, HttpError> {
        Ok(Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?)
    }
}

fn default_user_agent() -> String {
    format!("claimbench/{}", env!("CARGO_PKG_VERSION"))
}
