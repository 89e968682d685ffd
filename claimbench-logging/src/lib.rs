//! Logging initialisation for claimbench
//!
//! All crates log through `tracing`; this crate installs the global
//! subscriber once, from the `logging` configuration domain.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing};
