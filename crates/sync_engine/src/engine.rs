//! Alignment engine: origin shift, search, and trajectory transform.

use std::borrow::Cow;
use std::time::Instant;

use contracts::{
    AlignError, PoseStream, RigidTransform, SearchResult, StreamSummary, SyncSearchConfig,
};
use metrics::counter;
use tracing::{info, instrument, warn};

use crate::metric::{metric_for, AlignmentMetric};
use crate::search::SyncSearch;
use crate::transformer::TrajectoryTransformer;

/// Output of one tracker/device alignment
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Tracker summary as searched (after origin shift, if enabled)
    pub tracker: StreamSummary,
    /// Device summary as searched
    pub device: StreamSummary,
    pub result: SearchResult,
    /// Offset from the raw device clock to the raw tracker clock
    pub clock_offset: f64,
    /// Transform applied to `transformed`; identity for metrics that recover none
    pub transform: RigidTransform,
    /// Raw device stream on the tracker clock and in the tracker frame
    pub transformed: PoseStream,
    pub elapsed_ms: f64,
}

/// Aligns device recordings against one tracker recording
pub struct AlignmentEngine {
    search: SyncSearch,
    metric: Box<dyn AlignmentMetric>,
}

impl AlignmentEngine {
    /// Engine with the metric named in `config`
    pub fn new(config: SyncSearchConfig) -> Self {
        let metric = metric_for(&config);
        Self::with_metric(config, metric)
    }

    /// Engine with a caller supplied metric
    pub fn with_metric(config: SyncSearchConfig, metric: Box<dyn AlignmentMetric>) -> Self {
        Self {
            search: SyncSearch::new(config),
            metric,
        }
    }

    pub fn config(&self) -> &SyncSearchConfig {
        self.search.config()
    }

    pub fn metric(&self) -> &dyn AlignmentMetric {
        self.metric.as_ref()
    }

    /// Align `device` against `tracker`.
    ///
    /// The returned trajectory is built from the raw device stream, so its
    /// timestamps read on the tracker's original clock whether or not the
    /// search ran on origin-shifted copies.
    #[instrument(
        name = "alignment_engine_align",
        skip(self, tracker, device),
        fields(tracker = tracker.name(), device = device.name())
    )]
    pub fn align(&self, tracker: &PoseStream, device: &PoseStream) -> Result<Alignment, AlignError> {
        let started = Instant::now();

        let (searched_tracker, searched_device) = if self.config().shift_to_origin {
            (
                Cow::Owned(tracker.shift_to_origin()),
                Cow::Owned(device.shift_to_origin()),
            )
        } else {
            (Cow::Borrowed(tracker), Cow::Borrowed(device))
        };

        let result = self
            .search
            .search(&searched_tracker, &searched_device, self.metric.as_ref())?;

        let clock_offset = if self.config().shift_to_origin {
            let origin_gap = tracker.first_timestamp().unwrap_or(0.0)
                - device.first_timestamp().unwrap_or(0.0);
            result.offset + origin_gap
        } else {
            result.offset
        };

        let transform = match result.transform {
            Some(transform) => transform,
            None => {
                warn!(
                    metric = %result.metric,
                    "metric recovers no transform, exporting with identity"
                );
                RigidTransform::identity()
            }
        };

        let transformed = TrajectoryTransformer::apply(device, clock_offset, &transform)?;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        counter!("vio_align_alignments_total", "metric" => result.metric.as_str()).increment(1);

        info!(
            offset = result.offset,
            clock_offset,
            score = result.score,
            elapsed_ms,
            "alignment complete"
        );

        Ok(Alignment {
            tracker: searched_tracker.summary(),
            device: searched_device.summary(),
            result,
            clock_offset,
            transform,
            transformed,
            elapsed_ms,
        })
    }
}

impl std::fmt::Debug for AlignmentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignmentEngine")
            .field("config", self.config())
            .field("metric", &self.metric.kind())
            .finish()
    }
}
