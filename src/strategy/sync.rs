//! Synchronous processing strategy
//!
//! This module provides a synchronous, single-threaded implementation of the
//! ProcessingStrategy trait. It coordinates the SyncReader (log input) with a
//! `Replay` (billing engine plus replay mode).
//!
//! # Design
//!
//! The SyncProcessingStrategy only orchestrates:
//! - Log parsing is done by `SyncReader` (iterator interface)
//! - Operations are applied by `BillingEngine` through `Replay`
//! - Reports are written by `strategy::write_report`
//!
//! # Memory Efficiency
//!
//! Operations are streamed one line at a time. Memory grows with the number
//! of participants and stored intervals, not with the length of the log.

use crate::core::LedgerState;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ProcessingStrategy, Replay, RunOptions};
use crate::types::SettlementError;
use std::path::Path;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use rust_settlement_engine::strategy::{ProcessingStrategy, RunOptions, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(RunOptions::default());
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("expenses.log"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncProcessingStrategy {
    options: RunOptions,
}

impl SyncProcessingStrategy {
    /// Create a synchronous strategy with the given run options
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Replay the log line by line
    ///
    /// 1. Opens a SyncReader on the log
    /// 2. Feeds every record (or read error) to the replay in file order
    /// 3. Returns the final state once the reader is exhausted
    fn replay(&self, input_path: &Path) -> Result<LedgerState, SettlementError> {
        let reader = SyncReader::new(input_path)?;
        let mut replay = Replay::new(&self.options);

        for result in reader {
            replay.apply(result)?;
        }

        replay.finish()
    }
}
