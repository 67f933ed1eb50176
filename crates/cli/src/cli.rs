//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Update Scheduler - deduplicating, rate-limited update dispatch
#[derive(Parser, Debug)]
#[command(
    name = "update-sched",
    author,
    version,
    about = "Update scheduler toolkit",
    long_about = "Validate and inspect update scheduler configuration, or run a \n\
                  synthetic workload through the scheduler and report statistics."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "UPDATE_SCHED_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "UPDATE_SCHED_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),

    /// Drive a synthetic workload through the scheduler
    Simulate(SimulateArgs),
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "scheduler.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "scheduler.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, env = "UPDATE_SCHED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of ticks to run (0 = until Ctrl+C)
    #[arg(long, default_value = "300")]
    pub ticks: u64,

    /// Tick frequency in Hz
    #[arg(long, default_value = "60.0")]
    pub tick_hz: f64,

    /// Register a handler that always fails on this channel
    #[arg(long)]
    pub fail_channel: Option<String>,

    /// Advance a simulated clock instead of sleeping between ticks
    #[arg(long)]
    pub virtual_time: bool,

    /// Seed for the synthetic producer
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "UPDATE_SCHED_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
