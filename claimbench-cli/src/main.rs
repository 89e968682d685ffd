use anyhow::{Context, Result};
use clap::Parser;
use claimbench_config::{ClaimbenchConfig, ConfigLoader, LogLevel};
use claimbench_core::{MetricsSink, TestKind};
use claimbench_execution::{Scenario, ScenarioRunner};
use claimbench_output::{all_passed, render_summary, RunExport, SummarySink, ThresholdSet};
use claimbench_resilience::StopCoordinator;
use colored::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

mod cli;
mod report;

use cli::{Cli, Commands, ConfigCommands, RunArgs};
use report::render_report;

/// Exit status of a run whose thresholds failed
const THRESHOLDS_FAILED: u8 = 99;

/// Load configuration from file or from the environment
fn load_config(config_path: Option<&PathBuf>) -> Result<ClaimbenchConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            loader
                .from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

/// Install the subscriber, letting `--log-level` win over the configured level
fn init_logging(config: &ClaimbenchConfig, log_level: Option<&String>) -> Result<()> {
    let mut logging = config.logging.clone();
    if let Some(level) = log_level {
        logging.level = level
            .parse::<LogLevel>()
            .map_err(anyhow::Error::msg)
            .context("Invalid --log-level")?;
    }
    claimbench_logging::init_logging_from_config(&logging)
}

async fn run_scenario(scenario: Scenario, args: &RunArgs, mut config: ClaimbenchConfig) -> Result<ExitCode> {
    if let Some(label) = &args.test_run {
        config.run.test_run = label.clone();
    }
    let test_kind = scenario.test_kind();
    let test_run = config.run.test_run.clone();
    let thresholds =
        ThresholdSet::for_test(test_kind, &config.thresholds).context("Invalid threshold configuration")?;

    let sink = Arc::new(SummarySink::new());
    let stop = Arc::new(StopCoordinator::new(config.run.graceful_stop));
    let runner = ScenarioRunner::new(config, sink.clone() as Arc<dyn MetricsSink>, stop.clone())
        .context("Failed to set up the system under test")?;

    let ctrl_c = stop.stop_on_ctrl_c();
    let outcome = runner.run(scenario).await;
    ctrl_c.abort();
    let report = outcome.with_context(|| format!("Scenario {} aborted", scenario))?;

    for phase in &report.phases {
        info!(
            phase = %phase.name,
            dispatched = phase.stats.dispatched,
            completed = phase.stats.completed,
            interrupted = phase.stats.interrupted,
            vus = phase.stats.vus_allocated,
            elapsed_ms = phase.stats.elapsed.as_millis() as u64,
            stopped_by = %phase.stats.stopped_by,
            "Phase finished"
        );
    }

    let summary = sink.summary();
    let results = thresholds.evaluate(&summary);

    print!("{}", render_report(&report));
    println!();
    print!("{}", render_summary(&summary, &results));

    if let Some(path) = &args.summary_export {
        export_summary(path, RunExport::new(test_kind, test_run, summary, results.clone()))?;
    }

    if all_passed(&results) {
        Ok(ExitCode::SUCCESS)
    } else {
        let failed = results.iter().filter(|r| !r.passed).count();
        warn!(failed, "Thresholds crossed");
        Ok(ExitCode::from(THRESHOLDS_FAILED))
    }
}

fn export_summary(path: &Path, export: RunExport) -> Result<()> {
    export
        .write_to(path)
        .with_context(|| format!("Failed to export summary to {}", path.display()))
}

/// Handle configuration validation
fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!(path = %config_file.display(), "Validating configuration file");

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {}",
            config_file.display()
        ));
    }

    let config = load_config(Some(config_file))?;
    for kind in [TestKind::Breakpoint, TestKind::Constant, TestKind::E2e] {
        ThresholdSet::for_test(kind, &config.thresholds)
            .with_context(|| format!("Invalid thresholds for {} tests", kind))?;
    }

    println!("{} Configuration file is valid", "✓".bright_green().bold());
    Ok(())
}

/// Handle configuration display
fn handle_config_show(config_file: Option<&PathBuf>, format: &str) -> Result<()> {
    let config = load_config(config_file)?;

    match format.to_lowercase().as_str() {
        "yaml" | "yml" => {
            let yaml = serde_yaml::to_string(&config).context("Failed to serialize to YAML")?;
            println!("{}", yaml);
        }
        "json" => {
            let json = serde_json::to_string_pretty(&config).context("Failed to serialize to JSON")?;
            println!("{}", json);
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown output format: {}. Valid formats: yaml, json",
                format
            ));
        }
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let command = match cli.command {
        Some(command) => command,
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().context("Failed to print help")?;
            println!();
            return Ok(ExitCode::SUCCESS);
        }
    };

    // config subcommands read their own file and only need plain logging
    if let Commands::Config { config_cmd } = &command {
        claimbench_logging::init_simple_tracing(cli.log_level.as_deref().unwrap_or("warn"))?;
        match config_cmd {
            ConfigCommands::Validate { config_file } => handle_config_validate(config_file)?,
            ConfigCommands::Show { config_file, format } => {
                handle_config_show(config_file.as_ref().or(cli.config.as_ref()), format)?
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(cli.config.as_ref())?;
    init_logging(&config, cli.log_level.as_ref())?;
    info!(version = env!("CARGO_PKG_VERSION"), "claimbench starting");

    match &command {
        Commands::Breakpoint(args) => run_scenario(Scenario::Breakpoint, args, config).await,
        Commands::ConstantLoad(args) => run_scenario(Scenario::ConstantLoad, args, config).await,
        Commands::E2eProbe(args) => run_scenario(Scenario::E2eProbe, args, config).await,
        Commands::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "✗".bright_red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
