//! # CLI Interface
//!
//! Defines the command-line argument structure for `gavel-node` using
//! `clap` derive. Two subcommands: `run` and `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Gavel auction node.
///
/// Hosts one auction-and-escrow engine over in-memory ledgers, serves the
/// REST and WebSocket API, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "gavel-node",
    about = "Gavel auction-and-escrow node",
    version,
    propagate_version = true
)]
pub struct GavelNodeCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// JSON file overriding the auction rules (durations, increments,
    /// anti-snipe window). Missing fields keep their defaults.
    #[arg(long, short = 'c', env = "GAVEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port for the REST and WebSocket API.
    #[arg(long, env = "GAVEL_API_PORT", default_value_t = 9841)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "GAVEL_METRICS_PORT", default_value_t = 9842)]
    pub metrics_port: u16,

    /// Milliseconds between clock ticks. One tick is one time unit.
    #[arg(long, env = "GAVEL_BLOCK_TIME_MS", default_value_t = 1_000)]
    pub block_time_ms: u64,

    /// Principal that holds listed assets and escrowed funds.
    /// Overrides the value from `--config`.
    #[arg(long, env = "GAVEL_CUSTODY")]
    pub custody: Option<String>,

    #[arg(long, env = "GAVEL_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,

    /// Default filter when `RUST_LOG` is unset.
    #[arg(long, env = "GAVEL_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// `--log-format` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
