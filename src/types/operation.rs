//! Operation-related types for the Rust Settlement Engine
//!
//! This module defines the closed set of operations that can appear in the
//! log and the record type handed from the log reader to the billing engine.

use super::timestamp::Timestamp;
use std::fmt;

/// Amount in minor currency units (cents)
pub type Cents = i64;

/// Operations supported by the settlement engine
///
/// Participants are referenced by name; the billing engine resolves names
/// through the identity registry. `Pause` and `Resume` also accept a numeric
/// participant id in place of a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpCode {
    /// Move in: opens a present and a resident interval
    Start { name: String },

    /// Move out: closes both open intervals, or records a stay that began
    /// before the log when the name has never been seen
    Stop { name: String },

    /// Leave temporarily: closes the present interval only
    Pause { who: String },

    /// Come back: opens a new present interval
    Resume { who: String },

    /// Direct payment from `from` to `to`; `to` now owes `from` the amount
    Transfer {
        from: String,
        to: String,
        amount: Cents,
    },

    /// Period bill paid by `payer`, prorated over `[window_start, window_end]`
    Pay {
        payer: String,
        amount: Cents,
        window_start: Timestamp,
        window_end: Timestamp,
    },

    /// Point-in-time purchase split among everyone resident at the time
    Buy {
        buyer: String,
        amount: Cents,
        description: Option<String>,
    },
}

impl OpCode {
    /// Mnemonic used in the log for this operation
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Start { .. } => "START",
            OpCode::Stop { .. } => "STOP",
            OpCode::Pause { .. } => "PAUSE",
            OpCode::Resume { .. } => "RESUME",
            OpCode::Transfer { .. } => "TRANSFER",
            OpCode::Pay { .. } => "PAY",
            OpCode::Buy { .. } => "BUY",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A single parsed line of the operation log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    /// 1-based line number in the source log
    pub line: u64,

    /// When the operation happened
    pub timestamp: Timestamp,

    /// What happened
    pub op: OpCode,
}

impl OperationRecord {
    /// Create a new operation record
    pub fn new(line: u64, timestamp: Timestamp, op: OpCode) -> Self {
        OperationRecord {
            line,
            timestamp,
            op,
        }
    }
}
