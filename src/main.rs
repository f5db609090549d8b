//! Rust Settlement Engine CLI
//!
//! Command-line interface for settling shared living expenses from an
//! operation log.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- expenses.log
//! cargo run -- --strategy async --batch-size 2000 expenses.log
//! cargo run -- --report presence expenses.log
//! cargo run -- --mode validate expenses.log
//! cargo run -- --format csv expenses.log > ledger.csv
//! cargo run -- --insert "PAUSE 2024-03-02 alice" expenses.log > expenses.new.log
//! ```
//!
//! The program replays the log with the selected strategy and writes the
//! report to stdout. Diagnostics go to stderr; set `RUST_LOG` or pass `-v`
//! to see more of them.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, failing operation, validation failures, etc.)

use rust_settlement_engine::cli::{self, CliArgs};
use rust_settlement_engine::io::insert_operation;
use rust_settlement_engine::strategy;
use rust_settlement_engine::types::SettlementError;
use std::fs::File;
use std::io::BufReader;
use std::process;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &CliArgs) -> Result<(), SettlementError> {
    let mut output = std::io::stdout().lock();

    if let Some(line) = &args.insert {
        let file = File::open(&args.input_file)
            .map_err(|e| SettlementError::opening(&args.input_file, e))?;
        return insert_operation(BufReader::new(file), line, &mut output);
    }

    let config = matches!(args.strategy, cli::StrategyType::Async).then(|| args.to_batch_config());
    let strategy = strategy::create_strategy(args.strategy, config, args.to_run_options());

    strategy.process(&args.input_file, &mut output)
}

fn main() {
    let args = cli::parse_args();
    init_tracing(args.verbose);

    tracing::debug!(input = %args.input_file.display(), strategy = ?args.strategy, "starting");

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
