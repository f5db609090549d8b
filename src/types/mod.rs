//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `timestamp`: Points in time with infinite sentinels
//! - `participant`: Participant identity types
//! - `interval`: Stored intervals and ephemeral splits
//! - `operation`: Operation log records
//! - `summary`: Resolved debts and presence status for reports
//! - `error`: Error types for the settlement engine

pub mod error;
pub mod interval;
pub mod operation;
pub mod participant;
pub mod summary;
pub mod timestamp;

pub use error::{ErrorKind, SettlementError};
pub use interval::{Interval, IntervalKind, Split};
pub use operation::{Cents, OpCode, OperationRecord};
pub use participant::{Participant, ParticipantId};
pub use summary::{Debt, PresenceEntry, PresenceStatus};
pub use timestamp::Timestamp;
