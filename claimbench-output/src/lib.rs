//! # Claimbench Output
//!
//! Aggregates the measurements a run records, evaluates pass/fail thresholds
//! over them, and renders or exports the resulting summary.
//!
//! ## Example
//!
//! ```rust
//! use claimbench_config::ThresholdsConfig;
//! use claimbench_core::{CommunicationPattern, Measurement, MetricName, MetricsSink, Tags, TestKind};
//! use claimbench_output::{SummarySink, ThresholdSet};
//!
//! let sink = SummarySink::new();
//! let tags = Tags::submit_claim(CommunicationPattern::Rest, "doc", TestKind::Constant);
//! sink.record(Measurement::trend(MetricName::SubmitLatency, 42.0, tags.clone()));
//! sink.record(Measurement::rate(MetricName::SubmitFailure, false, tags));
//!
//! let thresholds = ThresholdSet::for_test(TestKind::Constant, &ThresholdsConfig::default()).unwrap();
//! let results = thresholds.evaluate(&sink.summary());
//! assert!(results.iter().all(|r| r.passed));
//! ```

pub mod errors;
pub mod export;
pub mod render;
pub mod summary;
pub mod threshold;

pub use errors::{ExportError, ThresholdError};
pub use export::RunExport;
pub use render::render_summary;
pub use summary::{MetricSummary, RateSummary, Summary, SummarySink, TrendSummary};
pub use threshold::{
    all_passed, default_thresholds, Aggregation, Comparison, Threshold, ThresholdResult, ThresholdSet,
};
