//! Claimbench execution engine
//!
//! This crate turns configuration into load: rate profiles and the two
//! scheduling models, the virtual-user pool, the iteration functions, the
//! end-to-end correlation engine for the event-driven pattern, and the three
//! scenario drivers composing them.

pub mod correlation;
pub mod error;
pub mod iteration;
pub mod pool;
pub mod profile;
pub mod scenario;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use correlation::{Correlation, E2eCorrelator, E2eOutcome};
pub use error::{SchedulerError, SchedulerResult};
pub use iteration::{Iteration, ProbeIteration, SubmitIteration};
pub use pool::{VirtualUser, VuPool, VuReturn};
pub use profile::RateProfile;
pub use scenario::{build_submitter_factory, PhaseReport, Scenario, ScenarioReport, ScenarioRunner};
pub use scheduler::{ArrivalRateScheduler, ClosedModelScheduler, RunStats};
