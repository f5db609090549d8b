//! Gap filler
//!
//! Completes a presence split list into a cover of the whole billing window.
//! Wherever nobody is marked present, the sub-window is re-split over the
//! residency store instead, so absent residents still carry their share.
//!
//! The filled list is then checked: every instant of the window must be
//! attributed to a non-empty owner set, otherwise the window cannot be billed
//! and `SettlementError::NoCoverage` names the first uncovered stretch.

use crate::core::split::split_intervals;
use crate::core::traits::IntervalQuery;
use crate::types::{SettlementError, Split, Timestamp};

/// Splits of the residency store over `[min, max]`
///
/// Resident intervals are clamped to the sub-window before splitting, so the
/// result never extends past either bound.
pub fn resident_cover<Q: IntervalQuery + ?Sized>(
    resident: &Q,
    min: Timestamp,
    max: Timestamp,
) -> Vec<Split> {
    let clamped: Vec<_> = resident
        .intersect(min, max)
        .iter()
        .map(|interval| interval.clamp(min, max))
        .collect();

    split_intervals(&clamped)
}

/// Fill the gaps of a presence split list with residency splits
///
/// # Arguments
///
/// * `splits` - Ordered presence splits, already clipped to the window
/// * `win_min` - Start of the billing window
/// * `win_max` - End of the billing window
/// * `resident` - The residency store used as fallback coverage
///
/// # Returns
///
/// * `Ok(Vec<Split>)` - Ordered splits tiling `[win_min, win_max]`, each with a non-empty owner set
/// * `Err(SettlementError::NoCoverage)` - If some stretch has neither present nor resident owners
pub fn fill_gaps<Q: IntervalQuery + ?Sized>(
    splits: Vec<Split>,
    win_min: Timestamp,
    win_max: Timestamp,
    resident: &Q,
) -> Result<Vec<Split>, SettlementError> {
    if splits.is_empty() {
        tracing::debug!(%win_min, %win_max, "nobody present, using residency for the whole window");
        let filled = resident_cover(resident, win_min, win_max);
        ensure_tiled(&filled, win_min, win_max)?;
        return Ok(filled);
    }

    let mut filled = Vec::with_capacity(splits.len());

    let first_min = splits[0].min;
    if first_min > win_min {
        tracing::debug!(min = %win_min, max = %first_min, "filling prefix from residency");
        filled.extend(resident_cover(resident, win_min, first_min));
    }

    let mut last_max = first_min;
    for split in splits {
        last_max = split.max;
        if split.present.is_empty() {
            tracing::debug!(min = %split.min, max = %split.max, "filling empty split from residency");
            filled.extend(resident_cover(resident, split.min, split.max));
        } else {
            filled.push(split);
        }
    }

    if last_max < win_max {
        tracing::debug!(min = %last_max, max = %win_max, "filling suffix from residency");
        filled.extend(resident_cover(resident, last_max, win_max));
    }

    ensure_tiled(&filled, win_min, win_max)?;
    Ok(filled)
}

/// Check that `splits` tile `[win_min, win_max]` with non-empty owner sets
fn ensure_tiled(
    splits: &[Split],
    win_min: Timestamp,
    win_max: Timestamp,
) -> Result<(), SettlementError> {
    let mut cursor = win_min;

    for split in splits {
        if split.min > cursor {
            return Err(SettlementError::no_coverage(cursor, split.min));
        }
        if split.present.is_empty() {
            return Err(SettlementError::no_coverage(split.min, split.max));
        }
        cursor = split.max;
    }

    if cursor < win_max {
        return Err(SettlementError::no_coverage(cursor, win_max));
    }

    Ok(())
}
