//! SearchResult - Sync Engine output
//!
//! Offset candidates, index maps and search results.

use serde::{Deserialize, Serialize};

use crate::{MetricKind, RigidTransform, StreamSummary};

/// Offset hypothesis
///
/// Seconds added to device timestamps before comparing with the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncCandidate {
    /// Position in the candidate grid (tie-break order)
    pub index: usize,

    /// Offset in seconds
    pub offset: f64,
}

/// Per-index correspondence between two timelines for one offset
///
/// `indices[i]` is the target index matched to source index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMap {
    indices: Vec<usize>,
    offset: f64,
}

impl IndexMap {
    pub fn new(indices: Vec<usize>, offset: f64) -> Self {
        Self { indices, offset }
    }

    /// Target index matched to `source_index`
    #[inline]
    pub fn get(&self, source_index: usize) -> Option<usize> {
        self.indices.get(source_index).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Offset the map was built for
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.indices
    }
}

/// One point of the score curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsetScore {
    pub offset: f64,

    /// `None` when the candidate was skipped
    pub score: Option<f64>,

    /// Tracker anchor index that produced the score (position-error only)
    pub anchor_index: Option<usize>,
}

/// Winning candidate of a sync search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Metric that produced the score (defines its polarity)
    pub metric: MetricKind,

    /// Best offset (seconds added to device timestamps)
    pub offset: f64,

    /// Best score
    pub score: f64,

    /// Device → tracker transform; only metrics with position correspondence recover one
    pub transform: Option<RigidTransform>,

    /// Tracker anchor index tied to the winning transform
    pub anchor_index: Option<usize>,

    /// Index of the winning candidate in the grid
    pub candidate_index: usize,

    /// Number of candidates evaluated
    pub candidates: usize,

    /// Spacing between candidates (seconds)
    pub step: f64,

    /// Candidates skipped because of recoverable numeric conditions
    pub skipped: usize,

    /// Full per-offset score curve (diagnostics)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_curve: Option<Vec<OffsetScore>>,
}

/// Per-device alignment report (dispatcher input)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Device input name
    pub device: String,

    /// Tracker stream summary (after origin shift, if enabled)
    pub tracker: StreamSummary,

    /// Device stream summary (after origin shift, if enabled)
    pub device_stream: StreamSummary,

    /// Search result
    pub result: SearchResult,

    /// Offset between the raw device and tracker clocks (seconds)
    ///
    /// Equals `result.offset` when origin shifting is off.
    pub clock_offset: f64,

    /// Transformed trajectory destination, if one was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Wall-clock search time (milliseconds)
    pub elapsed_ms: f64,
}
