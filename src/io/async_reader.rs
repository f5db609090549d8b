//! Asynchronous operation log reader with batch interface
//!
//! Provides batch reading over operation records for the async pipeline.
//!
//! # Architecture
//!
//! ```text
//! tokio file → line stream → AsyncReader → batches of Result<OperationRecord>
//!                                ↓
//!                        log_format module
//!                        (parse_log_line)
//! ```
//!
//! Malformed lines stay in the batch as errors; the consumer decides whether
//! they abort the run or are skipped.

use crate::io::log_format::parse_log_line;
use crate::types::{OperationRecord, SettlementError};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

/// Asynchronous operation log reader
pub struct AsyncReader<R> {
    lines: Lines<R>,
    line_num: u64,
    failed: bool,
}

impl AsyncReader<BufReader<tokio::fs::File>> {
    /// Open a log file for batch reading
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` or `IoError` if the file cannot be opened.
    pub async fn open(path: &Path) -> Result<Self, SettlementError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| SettlementError::opening(path, e))?;

        Ok(Self::new(BufReader::with_capacity(8 * 1024, file)))
    }
}

impl<R: AsyncBufRead + Unpin> AsyncReader<R> {
    /// Create a new AsyncReader from a buffered async reader
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
            failed: false,
        }
    }

    /// Read a batch of operation records
    ///
    /// Reads lines until `batch_size` operations (or errors) are collected.
    /// Comment and blank lines do not count towards the batch. An I/O error is
    /// pushed as the last entry and ends the stream.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - Maximum number of entries to return
    ///
    /// # Returns
    ///
    /// The converted records in file order. An empty vector means the end of
    /// the log was reached.
    pub async fn read_batch(
        &mut self,
        batch_size: usize,
    ) -> Vec<Result<OperationRecord, SettlementError>> {
        let mut batch = Vec::with_capacity(batch_size);

        while !self.failed && batch.len() < batch_size {
            match self.lines.next_line().await {
                Ok(Some(text)) => {
                    self.line_num += 1;
                    if let Some(result) = parse_log_line(&text, self.line_num) {
                        batch.push(result);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    self.failed = true;
                    batch.push(Err(SettlementError::from(e)));
                }
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OpCode;

    fn reader(content: &'static str) -> AsyncReader<BufReader<&'static [u8]>> {
        AsyncReader::new(BufReader::new(content.as_bytes()))
    }

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let mut async_reader = reader(
            "START 2024-01-01 a\nSTART 2024-01-01 b\nSTART 2024-01-01 c\n",
        );

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].as_ref().unwrap().line, 1);
        assert_eq!(batch[1].as_ref().unwrap().line, 2);

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch[0].as_ref().unwrap().op,
            OpCode::Start { name: "c".to_string() }
        );

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_log() {
        let mut async_reader = reader("");

        assert!(async_reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_comments_do_not_fill_batches() {
        let mut async_reader = reader("# one\n\n# two\nSTART 2024-01-01 a\n# three\nSTOP 2024-02-01 a\n");

        let batch = async_reader.read_batch(2).await;

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].as_ref().unwrap().line, 4);
        assert_eq!(batch[1].as_ref().unwrap().line, 6);
    }

    #[tokio::test]
    async fn test_async_reader_keeps_malformed_lines() {
        let mut async_reader = reader("JUMP 2024-01-01 a\nSTART 2024-01-01 a\n");

        let batch = async_reader.read_batch(10).await;

        assert_eq!(batch.len(), 2);
        assert!(matches!(
            batch[0],
            Err(SettlementError::AtLine { line: 1, .. })
        ));
        assert!(batch[1].is_ok());
    }

    #[tokio::test]
    async fn test_async_reader_open_missing_file() {
        let result = AsyncReader::open(Path::new("nonexistent.log")).await;

        assert!(matches!(result, Err(SettlementError::FileNotFound { .. })));
    }
}
