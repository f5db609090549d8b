//! Interval-related types for the Rust Settlement Engine
//!
//! This module defines the stored `Interval`, the ephemeral `Split` produced by
//! the split engine, and `IntervalKind`, which names the two interval stores.

use super::participant::ParticipantId;
use super::timestamp::Timestamp;
use std::collections::BTreeSet;
use std::fmt;

/// Which of the two interval stores an interval belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalKind {
    /// Spans during which the participant is physically there
    Present,

    /// Spans during which the participant holds residency (may be absent)
    Resident,
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalKind::Present => write!(f, "present"),
            IntervalKind::Resident => write!(f, "resident"),
        }
    }
}

/// A `[min, max)` span owned by one participant
///
/// `max == Timestamp::PlusInfinity` marks the interval as still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Start of the span
    pub min: Timestamp,

    /// End of the span (`PlusInfinity` while open)
    pub max: Timestamp,

    /// The participant this span belongs to
    pub owner: ParticipantId,
}

impl Interval {
    /// Create a new interval
    pub fn new(owner: ParticipantId, min: Timestamp, max: Timestamp) -> Self {
        Interval { min, max, owner }
    }

    /// Whether the interval has not been closed yet
    pub fn is_open(&self) -> bool {
        self.max == Timestamp::PlusInfinity
    }

    /// Whether the interval covers no time at all
    pub fn is_empty(&self) -> bool {
        self.min >= self.max
    }

    /// Half-open overlap test used by interval store queries
    ///
    /// Matches when `self.max >= min && self.min < max`. A point query passes
    /// the same instant as both bounds.
    pub fn overlaps(&self, min: Timestamp, max: Timestamp) -> bool {
        self.max >= min && self.min < max
    }

    /// Clamp the interval to `[min, max]`
    pub fn clamp(&self, min: Timestamp, max: Timestamp) -> Interval {
        Interval {
            min: self.min.max(min).min(max),
            max: self.max.min(max).max(min),
            owner: self.owner,
        }
    }
}

/// A maximal sub-interval with a constant set of covering owners
///
/// Produced by the split engine for a single query; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Start of the sub-interval
    pub min: Timestamp,

    /// End of the sub-interval
    pub max: Timestamp,

    /// Owners whose input intervals cover the whole sub-interval
    pub present: BTreeSet<ParticipantId>,
}

impl Split {
    /// Create a new split
    pub fn new(min: Timestamp, max: Timestamp, present: BTreeSet<ParticipantId>) -> Self {
        Split { min, max, present }
    }
}
