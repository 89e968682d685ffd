//! In-memory aggregation of measurements

use claimbench_core::{Measurement, MetricKind, MetricName, MetricsSink};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// Distribution of a trend metric, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub med: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl TrendSummary {
    /// `None` for an empty series
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let sum: f64 = sorted.iter().sum();
        Some(Self {
            count: sorted.len() as u64,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            avg: sum / sorted.len() as f64,
            med: percentile(&sorted, 50.0),
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        })
    }
}

/// Fraction of samples that hit, e.g. failed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateSummary {
    pub hits: u64,
    pub total: u64,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetricSummary {
    Trend(TrendSummary),
    Rate(RateSummary),
}

/// Aggregated view of everything recorded so far
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub metrics: BTreeMap<MetricName, MetricSummary>,
}

impl Summary {
    pub fn get(&self, name: MetricName) -> Option<&MetricSummary> {
        self.metrics.get(&name)
    }

    pub fn trend(&self, name: MetricName) -> Option<&TrendSummary> {
        match self.metrics.get(&name) {
            Some(MetricSummary::Trend(trend)) => Some(trend),
            _ => None,
        }
    }

    pub fn rate(&self, name: MetricName) -> Option<&RateSummary> {
        match self.metrics.get(&name) {
            Some(MetricSummary::Rate(rate)) => Some(rate),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Series {
    Trend(Vec<f64>),
    Rate { hits: u64, total: u64 },
}

/// Metrics sink keeping every trend sample and every rate count in memory
#[derive(Debug, Default)]
pub struct SummarySink {
    series: Mutex<BTreeMap<MetricName, Series>>,
}

impl SummarySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples recorded for `name`
    pub fn count(&self, name: MetricName) -> u64 {
        let series = self.series.lock().unwrap_or_else(PoisonError::into_inner);
        match series.get(&name) {
            Some(Series::Trend(values)) => values.len() as u64,
            Some(Series::Rate { total, .. }) => *total,
            None => 0,
        }
    }

    pub fn summary(&self) -> Summary {
        let series = self.series.lock().unwrap_or_else(PoisonError::into_inner);
        let metrics = series
            .iter()
            .filter_map(|(name, series)| {
                let summary = match series {
                    Series::Trend(values) => MetricSummary::Trend(TrendSummary::from_values(values)?),
                    Series::Rate { hits, total } => MetricSummary::Rate(RateSummary {
                        hits: *hits,
                        total: *total,
                        rate: if *total == 0 { 0.0 } else { *hits as f64 / *total as f64 },
                    }),
                };
                Some((*name, summary))
            })
            .collect();

        Summary { metrics }
    }
}

impl MetricsSink for SummarySink {
    fn record(&self, measurement: Measurement) {
        trace!(metric = %measurement.name, value = measurement.value, "Measurement recorded");
        let mut series = self.series.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = series.entry(measurement.name).or_insert_with(|| match measurement.name.kind() {
            MetricKind::Trend => Series::Trend(Vec::new()),
            MetricKind::Rate => Series::Rate { hits: 0, total: 0 },
        });

        match entry {
            Series::Trend(values) => values.push(measurement.value),
            Series::Rate { hits, total } => {
                *total += 1;
                if measurement.is_hit() {
                    *hits += 1;
                }
            }
        }
    }
}

/// Linearly interpolated percentile of an ascending, non-empty slice
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}
