//! Core traits for interval lookups
//!
//! The split engine and gap filler only need to query intervals by overlap,
//! so they are written against this trait rather than a concrete store.

use crate::types::{Interval, Timestamp};

/// Trait for querying stored intervals by overlap with a window
pub trait IntervalQuery {
    /// Every stored interval `i` with `i.max >= min && i.min < max`
    ///
    /// Pass the same instant as both bounds for a point query.
    fn intersect(&self, min: Timestamp, max: Timestamp) -> Vec<Interval>;
}
