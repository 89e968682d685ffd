//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Load and end-to-end latency tests for the claim service", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ramp the arrival rate stage by stage after a constant-rate warmup
    Breakpoint(RunArgs),

    /// Hold a constant arrival rate for the configured duration
    ConstantLoad(RunArgs),

    /// Measure end-to-end latency with a small closed-model probe
    E2eProbe(RunArgs),

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

/// Options shared by the scenario commands
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Label attached to every measurement, overriding TEST_RUN
    #[arg(long, value_name = "LABEL")]
    pub test_run: Option<String>,

    /// Write the run summary and threshold verdicts as JSON
    #[arg(long, value_name = "PATH")]
    pub summary_export: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Show current configuration in use
    Show {
        /// Path to configuration file (optional, uses default loading logic)
        #[arg(long, value_name = "PATH")]
        config_file: Option<PathBuf>,

        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}
