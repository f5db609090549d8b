use crate::core::engine::DEFAULT_PAYER_TIP;
use crate::core::BillingConfig;
use crate::strategy::{BatchConfig, RunOptions};
use crate::types::Cents;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Settle shared living expenses from an operation log
#[derive(Parser, Debug)]
#[command(name = "settlement-engine")]
#[command(about = "Settle shared living expenses from an operation log", long_about = None)]
pub struct CliArgs {
    /// Operation log to replay
    #[arg(value_name = "INPUT", help = "Path to the operation log")]
    pub input_file: PathBuf,

    /// Reading strategy to use for the replay
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Reading strategy: 'sync' for line by line or 'async' for batched background reading"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of batches read ahead (async mode only)
    #[arg(
        long = "max-in-flight",
        value_name = "COUNT",
        help = "Maximum number of batches read ahead of the engine (default: 4)"
    )]
    pub max_in_flight: Option<usize>,

    /// How operation errors are handled
    #[arg(
        long = "mode",
        value_name = "MODE",
        default_value = "strict",
        help = "'strict' stops at the first failing operation, 'validate' reports every failure"
    )]
    pub mode: ReplayMode,

    /// Report written after the replay
    #[arg(
        long = "report",
        value_name = "REPORT",
        default_value = "ledger",
        help = "'ledger' for who owes whom, 'presence' for who is currently there"
    )]
    pub report: ReportKind,

    /// Ledger report encoding
    #[arg(
        long = "format",
        value_name = "FORMAT",
        default_value = "text",
        help = "Ledger report format: 'text' or 'csv' (the presence report is always text)"
    )]
    pub format: ReportFormat,

    /// Cents added to each per-participant charge
    #[arg(
        long = "payer-tip",
        value_name = "CENTS",
        default_value_t = DEFAULT_PAYER_TIP,
        help = "Cents added to each per-participant charge of PAY and BUY"
    )]
    pub payer_tip: Cents,

    /// Insert an operation into the log instead of replaying it
    #[arg(
        long = "insert",
        value_name = "LINE",
        help = "Print the log with LINE inserted in timestamp order"
    )]
    pub insert: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short = 'v', long = "verbose", help = "Log debug output to stderr")]
    pub verbose: bool,
}

/// Available reading strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Error handling during a replay
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReplayMode {
    /// Abort on the first failing operation
    Strict,
    /// Log and skip failing operations, then report how many failed
    Validate,
}

/// Report selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Ledger,
    Presence,
}

/// Ledger report encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Csv,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values take their defaults; zero values fall back to the
    /// defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_in_flight.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_in_flight.unwrap_or(default.max_in_flight),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Collect the options shared by every strategy
    pub fn to_run_options(&self) -> RunOptions {
        RunOptions {
            mode: self.mode,
            report: self.report,
            format: self.format,
            billing: BillingConfig {
                payer_tip: self.payer_tip,
            },
        }
    }
}
