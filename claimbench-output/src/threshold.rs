//! Pass/fail thresholds over summarised metrics
//!
//! Expressions have the form `<aggregation> <op> <bound>`, e.g. `p(95)<500`,
//! `avg<=200`, `rate<0.01`. Trend metrics take `p(N)`, `avg`, `min`, `max`,
//! `med` and `count`; rate metrics take `rate`.

use crate::errors::ThresholdError;
use crate::summary::{MetricSummary, Summary};
use claimbench_config::ThresholdsConfig;
use claimbench_core::{MetricKind, MetricName, TestKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Aggregation {
    Percentile(f64),
    Avg,
    Min,
    Max,
    Med,
    Count,
    Rate,
}

impl Aggregation {
    fn applies_to(&self, kind: MetricKind) -> bool {
        match self {
            Aggregation::Rate => kind == MetricKind::Rate,
            _ => kind == MetricKind::Trend,
        }
    }

    /// Observed value of this aggregation in `summary`
    pub fn observe(&self, summary: &MetricSummary) -> Option<f64> {
        match (self, summary) {
            (Aggregation::Rate, MetricSummary::Rate(rate)) => Some(rate.rate),
            (Aggregation::Avg, MetricSummary::Trend(t)) => Some(t.avg),
            (Aggregation::Min, MetricSummary::Trend(t)) => Some(t.min),
            (Aggregation::Max, MetricSummary::Trend(t)) => Some(t.max),
            (Aggregation::Med, MetricSummary::Trend(t)) => Some(t.med),
            (Aggregation::Count, MetricSummary::Trend(t)) => Some(t.count as f64),
            (Aggregation::Percentile(p), MetricSummary::Trend(t)) => Some(match *p {
                p if p == 90.0 => t.p90,
                p if p == 95.0 => t.p95,
                p if p == 99.0 => t.p99,
                p if p == 50.0 => t.med,
                // only the summarised percentiles are available
                _ => return None,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Percentile(p) => write!(f, "p({})", p),
            Aggregation::Avg => f.write_str("avg"),
            Aggregation::Min => f.write_str("min"),
            Aggregation::Max => f.write_str("max"),
            Aggregation::Med => f.write_str("med"),
            Aggregation::Count => f.write_str("count"),
            Aggregation::Rate => f.write_str("rate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparison {
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
}

impl Comparison {
    pub fn holds(&self, observed: f64, bound: f64) -> bool {
        match self {
            Comparison::Less => observed < bound,
            Comparison::LessOrEqual => observed <= bound,
            Comparison::Greater => observed > bound,
            Comparison::GreaterOrEqual => observed >= bound,
        }
    }
}

/// One parsed threshold on one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Threshold {
    pub metric: MetricName,
    pub expression: String,
    #[serde(skip)]
    pub aggregation: Aggregation,
    #[serde(skip)]
    pub comparison: Comparison,
    #[serde(skip)]
    pub bound: f64,
}

impl Threshold {
    pub fn parse(metric: MetricName, expression: &str) -> Result<Self, ThresholdError> {
        let syntax = |message: &str| ThresholdError::Syntax {
            expression: expression.to_string(),
            message: message.to_string(),
        };

        let compact: String = expression.chars().filter(|c| !c.is_whitespace()).collect();
        let op_start = compact
            .find(['<', '>'])
            .ok_or_else(|| syntax("expected one of <, <=, >, >="))?;
        let (lhs, rest) = compact.split_at(op_start);

        let (comparison, rhs) = if let Some(rhs) = rest.strip_prefix("<=") {
            (Comparison::LessOrEqual, rhs)
        } else if let Some(rhs) = rest.strip_prefix(">=") {
            (Comparison::GreaterOrEqual, rhs)
        } else if let Some(rhs) = rest.strip_prefix('<') {
            (Comparison::Less, rhs)
        } else if let Some(rhs) = rest.strip_prefix('>') {
            (Comparison::Greater, rhs)
        } else {
            return Err(syntax("expected one of <, <=, >, >="));
        };

        let aggregation = lhs.parse::<Aggregation>().map_err(|message| syntax(&message))?;
        let bound = rhs
            .parse::<f64>()
            .ok()
            .filter(|b| b.is_finite())
            .ok_or_else(|| syntax("bound must be a number"))?;

        if !aggregation.applies_to(metric.kind()) {
            return Err(ThresholdError::IncompatibleAggregation {
                metric: metric.to_string(),
                kind: format!("{:?}", metric.kind()).to_lowercase(),
                aggregation: aggregation.to_string(),
            });
        }

        Ok(Self {
            metric,
            expression: expression.trim().to_string(),
            aggregation,
            comparison,
            bound,
        })
    }

    pub fn evaluate(&self, summary: &Summary) -> ThresholdResult {
        let observed = summary.get(self.metric).and_then(|s| self.aggregation.observe(s));
        ThresholdResult {
            threshold: self.clone(),
            observed,
            // metrics without samples have nothing to violate
            passed: observed.map_or(true, |value| self.comparison.holds(value, self.bound)),
        }
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avg" => Ok(Aggregation::Avg),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "med" => Ok(Aggregation::Med),
            "count" => Ok(Aggregation::Count),
            "rate" => Ok(Aggregation::Rate),
            _ => {
                let inner = s
                    .strip_prefix("p(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .ok_or_else(|| format!("unknown aggregation '{}'", s))?;
                let p: f64 = inner
                    .parse()
                    .map_err(|_| format!("invalid percentile '{}'", inner))?;
                if ![50.0, 90.0, 95.0, 99.0].contains(&p) {
                    return Err(format!("percentile must be one of 50, 90, 95, 99, got {}", inner));
                }
                Ok(Aggregation::Percentile(p))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdResult {
    pub threshold: Threshold,
    pub observed: Option<f64>,
    pub passed: bool,
}

/// Thresholds that decide whether a run passes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdSet {
    thresholds: Vec<Threshold>,
}

impl ThresholdSet {
    /// Defaults for the test kind, with configured metrics replacing the
    /// defaults of the same metric
    pub fn for_test(kind: TestKind, overrides: &ThresholdsConfig) -> Result<Self, ThresholdError> {
        let mut by_metric: BTreeMap<MetricName, Vec<String>> = BTreeMap::new();
        for (metric, expression) in default_thresholds(kind) {
            by_metric.entry(*metric).or_default().push(expression.to_string());
        }
        for (name, expressions) in &overrides.overrides {
            let metric = MetricName::from_name(name).ok_or_else(|| ThresholdError::UnknownMetric(name.clone()))?;
            by_metric.insert(metric, expressions.clone());
        }

        let thresholds = by_metric
            .into_iter()
            .flat_map(|(metric, expressions)| expressions.into_iter().map(move |e| (metric, e)))
            .map(|(metric, expression)| Threshold::parse(metric, &expression))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &[Threshold] {
        &self.thresholds
    }

    pub fn evaluate(&self, summary: &Summary) -> Vec<ThresholdResult> {
        self.thresholds.iter().map(|t| t.evaluate(summary)).collect()
    }
}

/// Built-in thresholds per test kind
pub fn default_thresholds(kind: TestKind) -> &'static [(MetricName, &'static str)] {
    match kind {
        TestKind::Breakpoint | TestKind::Constant => &[
            (MetricName::SubmitLatency, "p(95)<500"),
            (MetricName::SubmitFailure, "rate<0.01"),
        ],
        TestKind::E2e => &[
            (MetricName::SubmitFailure, "rate<0.01"),
            (MetricName::E2eFailure, "rate<0.01"),
        ],
    }
}

/// Whether every result passed
pub fn all_passed(results: &[ThresholdResult]) -> bool {
    results.iter().all(|r| r.passed)
}
