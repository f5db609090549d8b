//! Synchronous operation log reader with iterator interface
//!
//! Provides a streaming iterator over operation records from a log file.
//! Delegates format concerns to the log_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<OperationRecord, SettlementError>` for each operation line. Comment
//! and blank lines are consumed silently.
//!
//! ```no_run
//! use rust_settlement_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("expenses.log")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(record) => println!("{} at line {}", record.op, record.line),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Malformed lines are yielded as Err variants tagged with their line
//!   number; iteration continues with the next line
//! - Lines are counted here rather than by the tokenizer, so numbers stay
//!   exact across skipped comment and blank lines

use crate::io::log_format::parse_log_line;
use crate::types::{OperationRecord, SettlementError};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Synchronous operation log reader
///
/// Reads one line at a time; memory use does not grow with the file.
#[derive(Debug)]
pub struct SyncReader {
    lines: Lines<BufReader<File>>,
    line_num: u64,
    failed: bool,
}

impl SyncReader {
    /// Open a log file for streaming iteration
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the operation log
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if the file opened successfully
    /// * `Err(SettlementError)` if it could not be opened
    pub fn new(path: &Path) -> Result<Self, SettlementError> {
        let file = File::open(path).map_err(|e| SettlementError::opening(path, e))?;

        Ok(Self {
            lines: BufReader::with_capacity(8 * 1024, file).lines(),
            line_num: 0,
            failed: false,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<OperationRecord, SettlementError>;

    /// Get the next operation record from the log
    ///
    /// An I/O error is yielded once and ends the iteration.
    ///
    /// # Returns
    ///
    /// * `Some(Ok(OperationRecord))` - Successfully parsed operation
    /// * `Some(Err(SettlementError))` - Tokenization, conversion or I/O error
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(SettlementError::from(e)));
                }
            };
            self.line_num += 1;

            if let Some(result) = parse_log_line(&text, self.line_num) {
                return Some(result);
            }
        }
    }
}
