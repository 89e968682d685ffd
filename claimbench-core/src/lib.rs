//! Core domain types for claimbench
//!
//! This crate defines the language shared by every other claimbench crate:
//! the claim payload and its deterministic generator, virtual-user identity,
//! counter snapshots, measurements, and the capability traits that the
//! transports, the metrics oracle and the metrics sinks implement.

pub mod error;
pub mod metrics;
pub mod oracle;
pub mod payload;
pub mod submit;
pub mod types;

// Re-export commonly used types at the crate root
pub use error::{CoreError, Result};
pub use metrics::{Measurement, MetricKind, MetricName, MetricsSink, NullSink, Tags};
pub use oracle::{CounterOracle, OracleError};
pub use payload::{select, ClaimPayload, PayloadGenerator, DEFAULT_REPORTED_AMOUNT};
pub use submit::{ClaimSubmitter, SubmitOutcome, SubmitterFactory};
pub use types::{CommunicationPattern, CounterSnapshot, LoadStage, Protocol, TestKind, VuIdentity};
