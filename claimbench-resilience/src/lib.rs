//! Resilience patterns for claimbench
//!
//! This crate provides graceful stop coordination (run deadline, grace
//! window, external interrupt) and bounded fixed-interval polling.

pub mod poll;
pub mod shutdown;

// Re-export commonly used types
pub use poll::{FixedIntervalPoller, PollOutcome};
pub use shutdown::{DrainReport, ShutdownError, StopCoordinator, StopListener, StopSignal};
