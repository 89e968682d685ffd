//! Logging configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Crates whose debug output drowns the load generator's own events
pub const TRANSPORT_TARGETS: [&str; 5] = ["hyper", "h2", "tower", "reqwest", "tonic"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for claimbench's own events (`LOG_LEVEL`)
    pub level: LogLevel,

    /// Output format (`LOG_FORMAT`)
    pub format: LogFormat,

    /// Level for the HTTP and gRPC transport crates (`LOG_TRANSPORT_LEVEL`)
    pub transport_level: LogLevel,

    /// Attach file and line to every event
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            transport_level: LogLevel::Warn,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directives, e.g. `info,hyper=warn,...`. The transport
    /// crates are never more verbose than `level`.
    pub fn directives(&self) -> String {
        filter_directives(self.level, self.transport_level.min(self.level))
    }
}

/// Directives for `level` with the transport crates held at `transport_level`
pub fn filter_directives(level: LogLevel, transport_level: LogLevel) -> String {
    std::iter::once(level.to_string())
        .chain(TRANSPORT_TARGETS.iter().map(|t| format!("{}={}", t, transport_level)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Ordered from least to most verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "warning" {
            return Ok(LogLevel::Warn);
        }
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == lower)
            .ok_or_else(|| format!("Invalid log level '{}'. Valid levels: error, warn, info, debug, trace", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event, for log shippers
    Json,
    Text,
    Compact,
    /// Multi-line, for local debugging
    Pretty,
}

impl LogFormat {
    pub const ALL: [LogFormat; 4] = [LogFormat::Json, LogFormat::Text, LogFormat::Compact, LogFormat::Pretty];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Text => "text",
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        LogFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == lower)
            .ok_or_else(|| format!("Invalid log format '{}'. Valid formats: json, text, compact, pretty", s))
    }
}

impl Validatable for LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "logging"
    }
}
