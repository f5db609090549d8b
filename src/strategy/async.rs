//! Asynchronous batch processing strategy
//!
//! This module provides an asynchronous implementation of the
//! ProcessingStrategy trait. Reading and applying are decoupled: a producer
//! task reads the log in batches while the consumer applies the previous
//! ones.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_in_flight)
//!     ├── producer task: AsyncReader ──batches──▶ bounded mpsc channel
//!     └── consumer: Replay (BillingEngine, one operation at a time)
//! ```
//!
//! # Ordering
//!
//! Every operation depends on the state left by all earlier ones, so there is
//! exactly one consumer and batches are applied in the order they were read.
//! The channel capacity bounds how far the reader may run ahead.

use crate::core::LedgerState;
use crate::io::async_reader::AsyncReader;
use crate::strategy::{ProcessingStrategy, Replay, RunOptions};
use crate::types::SettlementError;
use std::path::Path;
use tokio::sync::mpsc;

/// Configuration for batch processing
///
/// Controls how many operations are read per batch and how many batches may
/// wait in the channel before the reader is throttled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Maximum number of batches read ahead of the consumer
    pub max_in_flight: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_in_flight: 4,
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, max_in_flight: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_in_flight = if max_in_flight == 0 {
            tracing::warn!(
                max_in_flight,
                default = default.max_in_flight,
                "invalid in-flight batch limit, using default"
            );
            default.max_in_flight
        } else {
            max_in_flight
        };

        Self {
            batch_size,
            max_in_flight,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// # Configuration
///
/// The strategy accepts a BatchConfig with:
/// - `batch_size`: Number of operations per batch (default: 1000)
/// - `max_in_flight`: Batches buffered between reader and engine (default: 4)
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    options: RunOptions,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy
    ///
    /// # Arguments
    ///
    /// * `config` - BatchConfig with batch_size and max_in_flight
    /// * `options` - Replay mode, report selection and billing parameters
    pub fn new(config: BatchConfig, options: RunOptions) -> Self {
        Self { config, options }
    }

    /// The batch configuration in use
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    async fn replay_async(&self, input_path: &Path) -> Result<LedgerState, SettlementError> {
        let mut reader = AsyncReader::open(input_path).await?;
        let (sender, mut receiver) = mpsc::channel(self.config.max_in_flight);
        let batch_size = self.config.batch_size;

        let producer = tokio::spawn(async move {
            loop {
                let batch = reader.read_batch(batch_size).await;
                if batch.is_empty() {
                    break;
                }

                tracing::debug!(size = batch.len(), "batch read");
                // The consumer hung up after a fatal error
                if sender.send(batch).await.is_err() {
                    break;
                }
            }
        });

        let mut replay = Replay::new(&self.options);
        let mut failure = None;

        'batches: while let Some(batch) = receiver.recv().await {
            for result in batch {
                if let Err(error) = replay.apply(result) {
                    failure = Some(error);
                    break 'batches;
                }
            }
        }

        drop(receiver);
        producer.await.map_err(|e| SettlementError::IoError {
            message: format!("log reader task failed: {}", e),
        })?;

        match failure {
            Some(error) => Err(error),
            None => replay.finish(),
        }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Replay the log with a background reader
    ///
    /// 1. Creates a tokio multi-threaded runtime
    /// 2. Spawns a producer reading batches into a bounded channel
    /// 3. Applies operations from the channel in order on this task
    /// 4. Stops the producer early when the replay aborts
    ///
    /// # Errors
    ///
    /// Fatal errors (runtime creation, file not found, I/O errors) are
    /// returned immediately. Operation errors follow the replay mode.
    fn replay(&self, input_path: &Path) -> Result<LedgerState, SettlementError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .build()
            .map_err(|e| SettlementError::IoError {
                message: format!("failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(self.replay_async(input_path))
    }
}
