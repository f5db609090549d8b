//! Interval storage for presence and residency
//!
//! This module provides the IntervalStore component that records, per
//! participant, the `[min, max)` spans during which they were present (or
//! resident). Two independent instances are kept by the billing engine.
//!
//! # Indexing
//!
//! Intervals live in a slab addressed by `IntervalHandle` and are indexed
//! two ways:
//! - an ordered set keyed by `(max, handle)`, scanned from the query start
//!   for overlap queries
//! - a side table from owner to the handle of their single open interval,
//!   so closing an interval is an O(1) deterministic lookup
//!
//! Adjacent or overlapping intervals of the same owner are never merged.

use crate::core::traits::IntervalQuery;
use crate::types::{Interval, IntervalKind, ParticipantId, SettlementError, Timestamp};
use std::collections::{BTreeSet, HashMap};

/// Index of an interval inside its store
pub type IntervalHandle = usize;

/// Interval store for one kind of span
pub struct IntervalStore {
    /// Which store this is (used in error reports)
    kind: IntervalKind,

    /// All intervals ever inserted, addressed by handle
    intervals: Vec<Interval>,

    /// Ordered index on interval end
    by_max: BTreeSet<(Timestamp, IntervalHandle)>,

    /// Handle of the currently open interval per owner
    open: HashMap<ParticipantId, IntervalHandle>,
}

impl IntervalStore {
    /// Create an empty store
    ///
    /// # Arguments
    ///
    /// * `kind` - Whether this store tracks presence or residency
    pub fn new(kind: IntervalKind) -> Self {
        IntervalStore {
            kind,
            intervals: Vec::new(),
            by_max: BTreeSet::new(),
            open: HashMap::new(),
        }
    }

    /// Which kind of span this store tracks
    pub fn kind(&self) -> IntervalKind {
        self.kind
    }

    /// Store a new interval
    ///
    /// An interval whose `max` is `PlusInfinity` becomes the owner's open
    /// interval; each owner has at most one.
    ///
    /// # Arguments
    ///
    /// * `owner` - The participant the span belongs to
    /// * `min` - Start of the span
    /// * `max` - End of the span, `PlusInfinity` for an open span
    ///
    /// # Returns
    ///
    /// * `Ok(IntervalHandle)` - Handle of the stored interval
    /// * `Err(SettlementError)` - If `min > max`, or the owner already has an open interval
    pub fn insert(
        &mut self,
        owner: ParticipantId,
        min: Timestamp,
        max: Timestamp,
    ) -> Result<IntervalHandle, SettlementError> {
        if min > max {
            return Err(SettlementError::InvalidInterval {
                participant: owner,
                min,
                max,
            });
        }

        let interval = Interval::new(owner, min, max);
        if interval.is_open() && self.open.contains_key(&owner) {
            return Err(SettlementError::IntervalAlreadyOpen {
                participant: owner,
                kind: self.kind,
            });
        }

        let handle = self.intervals.len();
        self.intervals.push(interval);
        self.by_max.insert((max, handle));
        if interval.is_open() {
            self.open.insert(owner, handle);
        }

        tracing::debug!(kind = %self.kind, owner, %min, %max, "interval inserted");
        Ok(handle)
    }

    /// Close the owner's open interval at `end`
    ///
    /// # Arguments
    ///
    /// * `owner` - The participant whose open interval is closed
    /// * `end` - The new `max` of the interval
    ///
    /// # Returns
    ///
    /// * `Ok(Interval)` - The interval as closed
    /// * `Err(SettlementError)` - If the owner has no open interval, or `end` precedes its start
    pub fn finish_last(
        &mut self,
        owner: ParticipantId,
        end: Timestamp,
    ) -> Result<Interval, SettlementError> {
        let handle = *self
            .open
            .get(&owner)
            .ok_or(SettlementError::NoOpenInterval {
                participant: owner,
                kind: self.kind,
            })?;

        let current = self.intervals[handle];
        if end < current.min {
            return Err(SettlementError::InvalidInterval {
                participant: owner,
                min: current.min,
                max: end,
            });
        }

        // Re-key the end index before mutating the interval
        self.by_max.remove(&(current.max, handle));
        self.by_max.insert((end, handle));
        self.intervals[handle].max = end;
        self.open.remove(&owner);

        let closed = self.intervals[handle];
        tracing::debug!(kind = %self.kind, owner, min = %closed.min, max = %closed.max, "interval closed");
        Ok(closed)
    }

    /// The owner's open interval, if any
    pub fn open_interval(&self, owner: ParticipantId) -> Option<&Interval> {
        self.open.get(&owner).map(|&handle| &self.intervals[handle])
    }

    /// Whether the owner currently has an open interval
    pub fn is_open(&self, owner: ParticipantId) -> bool {
        self.open.contains_key(&owner)
    }
}

impl IntervalQuery for IntervalStore {
    /// Scan the end index from `min` upwards, keeping intervals starting before `max`
    ///
    /// Results are ordered by ascending `max`, ties broken by insertion order.
    fn intersect(&self, min: Timestamp, max: Timestamp) -> Vec<Interval> {
        self.by_max
            .range((min, 0)..)
            .map(|&(_, handle)| self.intervals[handle])
            .filter(|interval| interval.min < max)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> Timestamp {
        Timestamp::At(secs)
    }

    fn owners(intervals: &[Interval]) -> Vec<ParticipantId> {
        intervals.iter().map(|i| i.owner).collect()
    }

    #[test]
    fn test_insert_and_finish_last() {
        let mut store = IntervalStore::new(IntervalKind::Present);
        store.insert(0, t(10), Timestamp::PlusInfinity).unwrap();
        assert!(store.is_open(0));

        let closed = store.finish_last(0, t(20)).unwrap();

        assert_eq!(closed, Interval::new(0, t(10), t(20)));
        assert!(!store.is_open(0));
        assert_eq!(store.intersect(t(15), t(15)), vec![closed]);
    }

    #[test]
    fn test_finish_last_without_open_interval() {
        let mut store = IntervalStore::new(IntervalKind::Resident);
        store.insert(1, Timestamp::MinusInfinity, t(5)).unwrap();

        let result = store.finish_last(1, t(9));

        assert_eq!(
            result,
            Err(SettlementError::NoOpenInterval {
                participant: 1,
                kind: IntervalKind::Resident
            })
        );
    }

    #[test]
    fn test_finish_last_before_start_is_rejected() {
        let mut store = IntervalStore::new(IntervalKind::Present);
        store.insert(0, t(10), Timestamp::PlusInfinity).unwrap();

        let result = store.finish_last(0, t(5));

        assert!(matches!(result, Err(SettlementError::InvalidInterval { .. })));
        assert!(store.is_open(0));
    }

    #[test]
    fn test_second_open_interval_is_rejected() {
        let mut store = IntervalStore::new(IntervalKind::Present);
        store.insert(0, t(0), Timestamp::PlusInfinity).unwrap();

        let result = store.insert(0, t(5), Timestamp::PlusInfinity);

        assert_eq!(
            result,
            Err(SettlementError::IntervalAlreadyOpen {
                participant: 0,
                kind: IntervalKind::Present
            })
        );
        assert_eq!(
            store.intersect(Timestamp::MinusInfinity, Timestamp::PlusInfinity).len(),
            1
        );
    }

    #[test]
    fn test_finish_last_picks_the_open_interval() {
        let mut store = IntervalStore::new(IntervalKind::Present);
        store.insert(0, t(0), Timestamp::PlusInfinity).unwrap();
        store.finish_last(0, t(10)).unwrap();
        store.insert(0, t(20), Timestamp::PlusInfinity).unwrap();

        store.finish_last(0, t(30)).unwrap();

        let spans: Vec<_> = store
            .intersect(t(0), t(100))
            .iter()
            .map(|i| (i.min, i.max))
            .collect();
        assert_eq!(spans, vec![(t(0), t(10)), (t(20), t(30))]);
    }

    #[test]
    fn test_intersect_half_open_bounds() {
        let mut store = IntervalStore::new(IntervalKind::Present);
        store.insert(0, t(0), t(10)).unwrap(); // ends at query start: matches
        store.insert(1, t(20), t(30)).unwrap(); // starts at query end: excluded
        store.insert(2, t(5), t(25)).unwrap(); // straddles
        store.insert(3, t(0), t(9)).unwrap(); // ends before query

        let matches = store.intersect(t(10), t(20));

        assert_eq!(owners(&matches), vec![0, 2]);
    }

    #[test]
    fn test_intersect_orders_by_end() {
        let mut store = IntervalStore::new(IntervalKind::Resident);
        store.insert(0, t(0), Timestamp::PlusInfinity).unwrap();
        store.insert(1, Timestamp::MinusInfinity, t(50)).unwrap();
        store.insert(2, t(10), t(40)).unwrap();

        let matches = store.intersect(t(20), t(30));

        assert_eq!(owners(&matches), vec![2, 1, 0]);
    }

    #[test]
    fn test_point_query_excludes_interval_starting_at_point() {
        let mut store = IntervalStore::new(IntervalKind::Resident);
        store.insert(0, t(0), Timestamp::PlusInfinity).unwrap();
        store.insert(1, t(100), Timestamp::PlusInfinity).unwrap();

        assert_eq!(owners(&store.intersect(t(100), t(100))), vec![0]);
        assert_eq!(owners(&store.intersect(t(101), t(101))), vec![0, 1]);
    }

    #[test]
    fn test_open_interval_lookup() {
        let mut store = IntervalStore::new(IntervalKind::Present);
        assert!(store.open_interval(0).is_none());

        store.insert(0, t(3), Timestamp::PlusInfinity).unwrap();

        assert_eq!(store.open_interval(0).map(|i| i.min), Some(t(3)));
        assert_eq!(store.kind(), IntervalKind::Present);
    }
}
