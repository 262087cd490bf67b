//! Temporal index mapping between two sorted timelines.
//!
//! Both operations share the same matching rule: a source time `s` maps to
//! the first target sample whose timestamp is not earlier than `s`, clamped
//! to the last target sample once `s` runs past the target range.

use contracts::{AlignError, IndexMap};

/// Whether the cursor still has to move past `target_t` to reach `source_t`.
#[inline]
fn precedes(target_t: f64, source_t: f64) -> bool {
    target_t < source_t
}

/// Map every source index to a target index for one offset.
///
/// Single forward sweep; the target cursor never resets, so the cost is
/// O(len(source) + len(target)) and the result is non-decreasing.
/// `offset` is added to source timestamps before comparing.
///
/// # Errors
/// `EmptyStream` if either timeline has no samples.
pub fn build_index_map(
    source_timestamps: &[f64],
    target_timestamps: &[f64],
    offset: f64,
) -> Result<IndexMap, AlignError> {
    if source_timestamps.is_empty() {
        return Err(AlignError::empty_stream("source"));
    }
    if target_timestamps.is_empty() {
        return Err(AlignError::empty_stream("target"));
    }

    let last = target_timestamps.len() - 1;
    let mut j = 0;
    let mut indices = Vec::with_capacity(source_timestamps.len());

    for &t in source_timestamps {
        let shifted = t + offset;
        while j < last && precedes(target_timestamps[j], shifted) {
            j += 1;
        }
        indices.push(j);
    }

    Ok(IndexMap::new(indices, offset))
}

/// Target index matched to a single time.
///
/// Same rule as [`build_index_map`], answered by binary search so anchor
/// lookups do not pay for a full sweep.
pub fn map_single_index(target_timestamps: &[f64], time: f64) -> Result<usize, AlignError> {
    if target_timestamps.is_empty() {
        return Err(AlignError::empty_stream("target"));
    }
    let first_not_before = target_timestamps.partition_point(|&t| precedes(t, time));
    Ok(first_not_before.min(target_timestamps.len() - 1))
}
