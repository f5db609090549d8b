//! Error types for the Rust Settlement Engine
//!
//! This module defines all error types that can occur while replaying an
//! operation log. Errors are designed to be descriptive and user-friendly for
//! CLI output.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: File not found, permission denied, etc.
//! - **Malformed Input**: Bad opcode, wrong arity, bad timestamp or amount
//! - **Unknown Participants**: References to names or ids never registered
//! - **Interval State Errors**: Closing an interval that is not open, etc.
//! - **Coverage Errors**: Nobody present or resident to charge for a bill
//! - **Arithmetic Errors**: Overflow in ledger or proration arithmetic
//!
//! Every variant is fatal in strict mode. In validate mode the failing
//! operation is skipped and counted instead.

use super::participant::ParticipantId;
use super::timestamp::Timestamp;
use super::IntervalKind;
use thiserror::Error;

/// Coarse classification of a `SettlementError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input: bad opcode, arity, timestamp or amount
    Malformed,
    /// Reference to a participant that was never registered
    UnknownParticipant,
    /// Nobody present or resident to charge during a window
    NoCoverage,
    /// Ledger or proration arithmetic overflow
    Overflow,
    /// Operation is inconsistent with the current interval state
    InvalidState,
    /// File could not be opened, read or written
    Io,
    /// One or more operations failed in validate mode
    Validation,
}

/// Main error type for the settlement engine
///
/// This enum represents all possible errors that can occur during log
/// replay. Each variant includes relevant context to help diagnose the
/// offending log line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettlementError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// Tokenization of the log failed
    #[error("Log parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Unrecognized operation mnemonic
    #[error("Invalid operation '{opcode}'")]
    InvalidOpCode {
        /// The mnemonic as written in the log
        opcode: String,
    },

    /// Operation has the wrong number of arguments
    #[error("{opcode} expects {expected} argument(s), found {found}")]
    WrongArity {
        /// The operation mnemonic
        opcode: String,
        /// Human readable expected count (e.g. "3", "at least 2")
        expected: String,
        /// Number of arguments found
        found: usize,
    },

    /// Timestamp field is not in a supported format
    #[error("Invalid timestamp '{value}'")]
    InvalidTimestamp {
        /// The offending field
        value: String,
    },

    /// Amount field is not a decimal number representable in cents
    #[error("Invalid amount '{amount}'")]
    InvalidAmount {
        /// The offending field
        amount: String,
    },

    /// A name was referenced before being registered
    #[error("Unknown participant '{name}'")]
    UnknownParticipant {
        /// The name as written in the log
        name: String,
    },

    /// An id was referenced that the registry never allocated
    #[error("Unknown participant id {id}")]
    UnknownParticipantId {
        /// The unallocated id
        id: ParticipantId,
    },

    /// A name was registered twice
    #[error("Participant '{name}' is already registered")]
    DuplicateParticipant {
        /// The duplicated name
        name: String,
    },

    /// No open interval exists to close
    #[error("Participant {participant} has no open {kind} interval")]
    NoOpenInterval {
        /// Owner of the interval
        participant: ParticipantId,
        /// Store that was searched
        kind: IntervalKind,
    },

    /// An open interval already exists
    #[error("Participant {participant} already has an open {kind} interval")]
    IntervalAlreadyOpen {
        /// Owner of the interval
        participant: ParticipantId,
        /// Store that holds the open interval
        kind: IntervalKind,
    },

    /// Closing an interval before it started
    #[error("Interval for participant {participant} cannot end at {max} before its start {min}")]
    InvalidInterval {
        /// Owner of the interval
        participant: ParticipantId,
        /// Start of the interval
        min: Timestamp,
        /// Requested end
        max: Timestamp,
    },

    /// Billing window is empty or reversed
    #[error("Invalid billing window [{min}, {max}]")]
    InvalidWindow {
        /// Window start
        min: Timestamp,
        /// Window end
        max: Timestamp,
    },

    /// Nobody is present or resident during part of a billing window
    #[error("Nobody present or resident during [{min}, {max}]")]
    NoCoverage {
        /// Start of the uncovered span
        min: Timestamp,
        /// End of the uncovered span
        max: Timestamp,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that would overflow
        operation: String,
    },

    /// Validate mode found failing operations
    #[error("{count} operation(s) failed validation")]
    Validation {
        /// Number of failing operations
        count: usize,
    },

    /// Adds log line context to another error
    #[error("Line {line}: {source}")]
    AtLine {
        /// 1-based line in the log
        line: u64,
        /// The underlying error
        source: Box<SettlementError>,
    },
}

// Conversion from io::Error to SettlementError
impl From<std::io::Error> for SettlementError {
    fn from(error: std::io::Error) -> Self {
        SettlementError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to SettlementError
impl From<csv::Error> for SettlementError {
    fn from(error: csv::Error) -> Self {
        // Extract line number if available
        let line = error.position().map(|pos| pos.line());

        SettlementError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl SettlementError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettlementError::FileNotFound { .. } | SettlementError::IoError { .. } => {
                ErrorKind::Io
            }
            SettlementError::ParseError { .. }
            | SettlementError::InvalidOpCode { .. }
            | SettlementError::WrongArity { .. }
            | SettlementError::InvalidTimestamp { .. }
            | SettlementError::InvalidAmount { .. }
            | SettlementError::InvalidWindow { .. } => ErrorKind::Malformed,
            SettlementError::UnknownParticipant { .. }
            | SettlementError::UnknownParticipantId { .. } => ErrorKind::UnknownParticipant,
            SettlementError::DuplicateParticipant { .. }
            | SettlementError::NoOpenInterval { .. }
            | SettlementError::IntervalAlreadyOpen { .. }
            | SettlementError::InvalidInterval { .. } => ErrorKind::InvalidState,
            SettlementError::NoCoverage { .. } => ErrorKind::NoCoverage,
            SettlementError::Overflow { .. } => ErrorKind::Overflow,
            SettlementError::Validation { .. } => ErrorKind::Validation,
            SettlementError::AtLine { source, .. } => source.kind(),
        }
    }

    /// Attach a log line to the error
    pub fn at_line(self, line: u64) -> Self {
        match self {
            // Keep the innermost line
            SettlementError::AtLine { .. } => self,
            other => SettlementError::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }

    /// Map a failure to open `path`, distinguishing a missing file
    pub fn opening(path: &std::path::Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => SettlementError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => SettlementError::from(error),
        }
    }

    /// Create a WrongArity error
    pub fn wrong_arity(opcode: &str, expected: &str, found: usize) -> Self {
        SettlementError::WrongArity {
            opcode: opcode.to_string(),
            expected: expected.to_string(),
            found,
        }
    }

    /// Create an InvalidOpCode error
    pub fn invalid_opcode(opcode: &str) -> Self {
        SettlementError::InvalidOpCode {
            opcode: opcode.to_string(),
        }
    }

    /// Create an InvalidTimestamp error
    pub fn invalid_timestamp(value: &str) -> Self {
        SettlementError::InvalidTimestamp {
            value: value.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: &str) -> Self {
        SettlementError::InvalidAmount {
            amount: amount.to_string(),
        }
    }

    /// Create an UnknownParticipant error
    pub fn unknown_participant(name: &str) -> Self {
        SettlementError::UnknownParticipant {
            name: name.to_string(),
        }
    }

    /// Create a DuplicateParticipant error
    pub fn duplicate_participant(name: &str) -> Self {
        SettlementError::DuplicateParticipant {
            name: name.to_string(),
        }
    }

    /// Create an Overflow error
    pub fn overflow(operation: &str) -> Self {
        SettlementError::Overflow {
            operation: operation.to_string(),
        }
    }

    /// Create a NoCoverage error
    pub fn no_coverage(min: Timestamp, max: Timestamp) -> Self {
        SettlementError::NoCoverage { min, max }
    }
}
