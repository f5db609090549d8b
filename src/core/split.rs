//! Interval split engine
//!
//! Decomposes a set of possibly overlapping intervals into maximal,
//! non-overlapping sub-intervals, each tagged with the exact set of owners
//! whose input interval covers it.
//!
//! # Algorithm
//!
//! A sweep line over boundary events:
//! 1. Every interval `(min, max, owner)` yields a `Start` event at `min` and an
//!    `End` event at `max`.
//! 2. Events are sorted by timestamp, `Start` before `End` at equal
//!    timestamps, so an owner starting where another ends is active at that
//!    instant before the other is removed.
//! 3. Walking the events, the active-owner multiset is updated; between two
//!    consecutive distinct timestamps a split is emitted with the active set
//!    as it stands after every event at the earlier timestamp.
//!
//! Runs in O(n log n) for n intervals, dominated by the sort.

use crate::types::{Interval, ParticipantId, Split, Timestamp};
use std::collections::{BTreeMap, BTreeSet};

/// Kind of a sweep-line boundary
///
/// Declaration order defines the tie-break: `Start` sorts before `End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BoundaryKind {
    Start,
    End,
}

/// A sweep-line boundary event
#[derive(Debug, Clone, Copy)]
struct Boundary {
    ts: Timestamp,
    kind: BoundaryKind,
    owner: ParticipantId,
}

/// Split intervals into maximal sub-intervals with constant owner sets
///
/// Zero-length intervals cover no time and are ignored. The result is sorted,
/// pairwise disjoint (adjacent splits share an endpoint) and spans from the
/// earliest start to the latest end of the input. Stretches covered by no
/// input interval appear as splits with an empty owner set.
///
/// # Arguments
///
/// * `intervals` - The intervals to decompose, typically already clipped to a query window
///
/// # Returns
///
/// The ordered list of splits; empty when no interval covers any time.
pub fn split_intervals(intervals: &[Interval]) -> Vec<Split> {
    let mut boundaries: Vec<Boundary> = intervals
        .iter()
        .filter(|interval| !interval.is_empty())
        .flat_map(|interval| {
            [
                Boundary {
                    ts: interval.min,
                    kind: BoundaryKind::Start,
                    owner: interval.owner,
                },
                Boundary {
                    ts: interval.max,
                    kind: BoundaryKind::End,
                    owner: interval.owner,
                },
            ]
        })
        .collect();

    boundaries.sort_by_key(|boundary| (boundary.ts, boundary.kind));

    // Counted so that two intervals of the same owner meeting at a boundary
    // keep the owner active
    let mut active: BTreeMap<ParticipantId, usize> = BTreeMap::new();
    let mut splits = Vec::new();

    for pair in boundaries.windows(2) {
        let (current, next) = (pair[0], pair[1]);

        match current.kind {
            BoundaryKind::Start => *active.entry(current.owner).or_insert(0) += 1,
            BoundaryKind::End => {
                if let Some(count) = active.get_mut(&current.owner) {
                    *count -= 1;
                    if *count == 0 {
                        active.remove(&current.owner);
                    }
                }
            }
        }

        if current.ts == next.ts {
            continue;
        }

        let present: BTreeSet<ParticipantId> = active.keys().copied().collect();
        tracing::trace!(min = %current.ts, max = %next.ts, ?present, "split");
        splits.push(Split::new(current.ts, next.ts, present));
    }

    splits
}
