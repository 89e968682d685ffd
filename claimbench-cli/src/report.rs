//! Run statistics rendering

use claimbench_execution::{PhaseReport, ScenarioReport};
use colored::*;
use std::fmt::Write;
use std::time::Duration;

/// One line per phase, then totals when there is more than one phase
pub fn render_report(report: &ScenarioReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "scenario".bright_cyan().bold(), report.scenario);

    for phase in &report.phases {
        let _ = writeln!(out, "  {}", describe_phase(phase));
    }

    if report.phases.len() > 1 {
        let _ = writeln!(
            out,
            "  {:8} dispatched={} completed={} interrupted={}",
            "total",
            report.dispatched(),
            report.completed(),
            report.interrupted()
        );
    }

    if report.was_interrupted() {
        let _ = writeln!(out, "{} {}", "⚠".bright_yellow().bold(), "Run interrupted".bright_yellow());
    }
    out
}

fn describe_phase(phase: &PhaseReport) -> String {
    let stats = &phase.stats;
    format!(
        "{:8} dispatched={} completed={} interrupted={} vus={} elapsed={} stopped_by={}",
        phase.name,
        stats.dispatched,
        stats.completed,
        stats.interrupted,
        stats.vus_allocated,
        humantime::format_duration(truncate_to_millis(stats.elapsed)),
        stats.stopped_by
    )
}

fn truncate_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}
