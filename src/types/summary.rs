//! Settlement summary types
//!
//! This module defines the values the billing engine hands to the report
//! writers once a log has been replayed: resolved debts and the current
//! presence status of each participant.

use super::operation::Cents;
use std::fmt;

/// A non-zero net debt between two participants
///
/// Names are resolved from the identity registry, and the amount is always
/// positive: the direction is carried by which name is the debtor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debt {
    /// The participant who owes
    pub debtor: String,

    /// The participant who is owed
    pub creditor: String,

    /// Amount owed in cents (> 0)
    pub amount: Cents,
}

/// Current whereabouts of a participant who has not moved out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    /// Has an open present interval
    Present,

    /// Still resident but paused
    Absent,
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceStatus::Present => write!(f, "P"),
            PresenceStatus::Absent => write!(f, "A"),
        }
    }
}

/// One line of the presence report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    pub name: String,
    pub status: PresenceStatus,
}
