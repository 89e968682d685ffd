//! Core type definitions for claimbench

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Communication pattern of the claims service under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CommunicationPattern {
    /// Synchronous REST over HTTP
    #[default]
    Rest,
    /// Synchronous gRPC
    Grpc,
    /// Asynchronous, message-queue mediated processing behind `POST /claims`
    EventDriven,
}

impl CommunicationPattern {
    /// Get the string representation of the pattern
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationPattern::Rest => "rest",
            CommunicationPattern::Grpc => "grpc",
            CommunicationPattern::EventDriven => "event-driven",
        }
    }

    /// Transport protocol used to submit claims for this pattern
    pub fn protocol(&self) -> Protocol {
        match self {
            CommunicationPattern::Grpc => Protocol::Grpc,
            CommunicationPattern::Rest | CommunicationPattern::EventDriven => Protocol::Http,
        }
    }

    /// Whether completion is only observable asynchronously
    pub fn is_asynchronous(&self) -> bool {
        matches!(self, CommunicationPattern::EventDriven)
    }
}

impl fmt::Display for CommunicationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CommunicationPattern {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rest" => Ok(CommunicationPattern::Rest),
            "grpc" => Ok(CommunicationPattern::Grpc),
            "event-driven" | "event_driven" | "eventdriven" => Ok(CommunicationPattern::EventDriven),
            _ => Err(CoreError::Parse(format!(
                "Invalid communication pattern: '{}'. Supported patterns are: rest, grpc, event-driven",
                s
            ))),
        }
    }
}

/// Wire protocol of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Grpc,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Grpc => "grpc",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of test a scenario driver runs, used as the `test_kind` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Breakpoint,
    Constant,
    E2e,
}

impl TestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::Breakpoint => "breakpoint",
            TestKind::Constant => "constant",
            TestKind::E2e => "e2e",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of one virtual user for the duration of a single iteration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VuIdentity {
    /// 1-based virtual user id, unique within a scenario
    pub vu_id: u64,
    /// Iteration number within the scenario, assigned at dispatch
    pub iteration_in_test: u64,
    /// Label of the test run
    pub test_run: String,
}

impl VuIdentity {
    pub fn new(vu_id: u64, iteration_in_test: u64, test_run: impl Into<String>) -> Self {
        Self {
            vu_id,
            iteration_in_test,
            test_run: test_run.into(),
        }
    }
}

/// One stage of a ramping arrival-rate profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadStage {
    /// Target arrival rate, in iterations per time unit
    pub target: f64,
    /// How long the stage lasts
    pub duration: Duration,
}

impl LoadStage {
    /// Create a stage, enforcing that target and duration are positive
    pub fn new(target: f64, duration: Duration) -> Result<Self, CoreError> {
        if !target.is_finite() || target <= 0.0 {
            return Err(CoreError::InvalidStage(format!(
                "target must be a positive number, got {}",
                target
            )));
        }
        if duration.is_zero() {
            return Err(CoreError::InvalidStage(
                "duration must be greater than 0".to_string(),
            ));
        }
        Ok(Self { target, duration })
    }
}

/// Values of the two downstream success counters captured before a submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterSnapshot {
    pub policy_consumed: u64,
    pub customer_consumed: u64,
    pub captured_at: DateTime<Utc>,
}

impl CounterSnapshot {
    pub fn new(policy_consumed: u64, customer_consumed: u64) -> Self {
        Self {
            policy_consumed,
            customer_consumed,
            captured_at: Utc::now(),
        }
    }
}
