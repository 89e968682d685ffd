//! Terminal rendering of a run summary

use crate::summary::{MetricSummary, Summary};
use crate::threshold::ThresholdResult;
use claimbench_core::MetricName;
use colored::*;
use std::fmt::Write;

/// Render the metric table followed by threshold verdicts
pub fn render_summary(summary: &Summary, results: &[ThresholdResult]) -> String {
    let mut out = String::new();

    if summary.metrics.is_empty() {
        let _ = writeln!(out, "{} No measurements recorded", "ℹ".bright_blue().bold());
    }

    let width = MetricName::all().iter().map(|m| m.as_str().len()).max().unwrap_or(0);
    for (name, metric) in &summary.metrics {
        let mark = match verdict(*name, results) {
            Some(true) => "✓".bright_green().bold(),
            Some(false) => "✗".bright_red().bold(),
            None => " ".normal(),
        };
        let label = format!("{:width$}", name.as_str(), width = width);
        let _ = writeln!(out, "{} {} {}", mark, label.bright_cyan(), describe(metric));
    }

    if !results.is_empty() {
        let _ = writeln!(out);
        for result in results {
            let observed = result
                .observed
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "no samples".to_string());
            let line = format!(
                "{} {} (observed {})",
                result.threshold.metric, result.threshold.expression, observed
            );
            if result.passed {
                let _ = writeln!(out, "{} {}", "✓".bright_green().bold(), line);
            } else {
                let _ = writeln!(out, "{} {}", "✗".bright_red().bold(), line.bright_red());
            }
        }
    }

    out
}

fn verdict(name: MetricName, results: &[ThresholdResult]) -> Option<bool> {
    let mut relevant = results.iter().filter(|r| r.threshold.metric == name).peekable();
    relevant.peek()?;
    Some(relevant.all(|r| r.passed))
}

fn describe(metric: &MetricSummary) -> String {
    match metric {
        MetricSummary::Trend(t) => format!(
            "avg={:.2}ms min={:.2}ms med={:.2}ms max={:.2}ms p(90)={:.2}ms p(95)={:.2}ms p(99)={:.2}ms count={}",
            t.avg, t.min, t.med, t.max, t.p90, t.p95, t.p99, t.count
        ),
        MetricSummary::Rate(r) => format!("{:.2}% {} out of {}", r.rate * 100.0, r.hits, r.total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::SummarySink;
    use crate::threshold::Threshold;
    use claimbench_core::{CommunicationPattern, Measurement, MetricsSink, Tags, TestKind};

    fn tags() -> Tags {
        Tags::submit_claim(CommunicationPattern::Grpc, "render", TestKind::Breakpoint)
    }

    #[test]
    fn test_render_metrics_and_verdicts() {
        let sink = SummarySink::new();
        sink.record(Measurement::trend(MetricName::SubmitLatency, 120.0, tags()));
        sink.record(Measurement::rate(MetricName::SubmitFailure, true, tags()));
        let summary = sink.summary();

        let results = vec![
            Threshold::parse(MetricName::SubmitLatency, "p(95)<500")
                .unwrap()
                .evaluate(&summary),
            Threshold::parse(MetricName::SubmitFailure, "rate<0.01")
                .unwrap()
                .evaluate(&summary),
        ];

        let text = render_summary(&summary, &results);
        assert!(text.contains("submit_ms"));
        assert!(text.contains("count=1"));
        assert!(text.contains("100.00% 1 out of 1"));
        assert!(text.contains("p(95)<500 (observed 120.0000)"));
        assert!(text.contains("rate<0.01 (observed 1.0000)"));
    }

    #[test]
    fn test_render_empty_summary() {
        let text = render_summary(&Summary::default(), &[]);
        assert!(text.contains("No measurements recorded"));
    }
}
