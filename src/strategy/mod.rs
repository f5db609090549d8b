//! Processing strategy module for operation log replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! encompassing log reading, operation application and report output. This
//! allows different reading implementations (synchronous, asynchronous batch)
//! to be selected at runtime while the engine always sees operations one at a
//! time in file order.

use crate::cli::{ReplayMode, ReportFormat, ReportKind, StrategyType};
use crate::core::{BillingConfig, BillingEngine, LedgerState};
use crate::io::{write_ledger_csv, write_ledger_text, write_presence};
use crate::types::{ErrorKind, OperationRecord, SettlementError};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Options shared by every strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Abort on the first failing operation, or skip and count failures
    pub mode: ReplayMode,

    /// Which report to write after a successful replay
    pub report: ReportKind,

    /// Encoding of the ledger report
    pub format: ReportFormat,

    /// Billing parameters handed to the engine
    pub billing: BillingConfig,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            mode: ReplayMode::Strict,
            report: ReportKind::Ledger,
            format: ReportFormat::Text,
            billing: BillingConfig::default(),
        }
    }
}

/// Applies records to a billing engine according to the replay mode
///
/// In strict mode the first error is returned. In validate mode every failing
/// operation is logged and skipped, and `finish` reports how many failed. I/O
/// errors end the replay in both modes.
pub struct Replay {
    engine: BillingEngine,
    mode: ReplayMode,
    failures: usize,
}

impl Replay {
    /// Start a replay with an empty state
    pub fn new(options: &RunOptions) -> Self {
        Replay {
            engine: BillingEngine::with_config(options.billing),
            mode: options.mode,
            failures: 0,
        }
    }

    /// Apply one reader result
    ///
    /// # Errors
    ///
    /// Returns the error that ends the replay, if any.
    pub fn apply(
        &mut self,
        item: Result<OperationRecord, SettlementError>,
    ) -> Result<(), SettlementError> {
        let error = match item.and_then(|record| self.engine.process(record)) {
            Ok(()) => return Ok(()),
            Err(error) => error,
        };

        if self.mode == ReplayMode::Validate && error.kind() != ErrorKind::Io {
            tracing::warn!(%error, "skipping operation");
            self.failures += 1;
            return Ok(());
        }

        tracing::error!(%error, "replay aborted");
        Err(error)
    }

    /// Finish the replay
    ///
    /// # Returns
    ///
    /// * `Ok(LedgerState)` - If every operation was applied
    /// * `Err(SettlementError::Validation)` - If operations were skipped in validate mode
    pub fn finish(self) -> Result<LedgerState, SettlementError> {
        if self.failures > 0 {
            return Err(SettlementError::Validation {
                count: self.failures,
            });
        }

        Ok(self.engine.into_state())
    }
}

/// Write the report selected by `options`
///
/// The presence report is always text.
pub fn write_report(
    state: &LedgerState,
    options: &RunOptions,
    output: &mut dyn Write,
) -> Result<(), SettlementError> {
    match options.report {
        ReportKind::Ledger => {
            let debts = state.debts()?;
            match options.format {
                ReportFormat::Text => write_ledger_text(&debts, output),
                ReportFormat::Csv => write_ledger_csv(&debts, output),
            }
        }
        ReportKind::Presence => write_presence(&state.presence(), output),
    }
}

/// Processing strategy trait for complete replay pipelines
///
/// Each strategy reads operation records from a log file, applies them in
/// file order, and writes the selected report.
pub trait ProcessingStrategy: Send + Sync {
    /// Options this strategy was created with
    fn options(&self) -> &RunOptions;

    /// Replay the log at `input_path` and return the final state
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened or read
    /// - An operation fails in strict mode
    /// - Any operation failed in validate mode (`Validation`)
    fn replay(&self, input_path: &Path) -> Result<LedgerState, SettlementError>;

    /// Replay the log and write the report to `output`
    ///
    /// Nothing is written when the replay fails.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), SettlementError> {
        let state = self.replay(input_path)?;
        write_report(&state, self.options(), output)
    }
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional batch configuration (ignored for sync)
/// * `options` - Replay mode, report selection and billing parameters
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    options: RunOptions,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(options)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, options))
        }
    }
}
