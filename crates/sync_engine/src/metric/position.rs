use contracts::{AlignError, MetricKind, PoseStream};
use tracing::{trace, warn};

use super::{AlignmentMetric, CandidateEvaluator, CandidateScore};
use crate::evaluator::AlignmentEvaluator;
use crate::index_map::{build_index_map, map_single_index};

/// Mean position residual after anchor-based rigid alignment
///
/// For each offset, a transform is estimated at every anchor and the anchor
/// with the lowest residual represents the offset.
#[derive(Debug, Clone)]
pub struct PositionErrorMetric {
    anchor_fractions: Vec<f64>,
    evaluator: AlignmentEvaluator,
}

impl PositionErrorMetric {
    pub fn new(anchor_fractions: Vec<f64>, test_samples: usize) -> Self {
        Self {
            anchor_fractions,
            evaluator: AlignmentEvaluator::new(test_samples),
        }
    }

    /// Device anchor indices, deduplicated, in configuration order
    pub fn device_anchors(&self, device_len: usize) -> Vec<usize> {
        if device_len == 0 {
            return Vec::new();
        }
        let last = (device_len - 1) as f64;
        let mut anchors = Vec::with_capacity(self.anchor_fractions.len());
        for fraction in &self.anchor_fractions {
            let index = (fraction.clamp(0.0, 1.0) * last).round() as usize;
            if !anchors.contains(&index) {
                anchors.push(index);
            }
        }
        anchors
    }
}

impl AlignmentMetric for PositionErrorMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::PositionError
    }

    fn prepare<'a>(
        &self,
        tracker: &'a PoseStream,
        device: &'a PoseStream,
    ) -> Result<Box<dyn CandidateEvaluator + 'a>, AlignError> {
        if tracker.is_empty() {
            return Err(AlignError::empty_stream(tracker.name()));
        }
        if device.is_empty() {
            return Err(AlignError::empty_stream(device.name()));
        }
        let anchors = self.device_anchors(device.len());
        if anchors.is_empty() {
            return Err(AlignError::config_validation(
                "search.anchor_fractions",
                "at least one anchor is required",
            ));
        }

        Ok(Box::new(PositionEvaluator {
            tracker,
            device,
            anchors,
            evaluator: self.evaluator,
        }))
    }
}

struct PositionEvaluator<'a> {
    tracker: &'a PoseStream,
    device: &'a PoseStream,
    anchors: Vec<usize>,
    evaluator: AlignmentEvaluator,
}

impl CandidateEvaluator for PositionEvaluator<'_> {
    fn evaluate(&self, offset: f64) -> Result<CandidateScore, AlignError> {
        let tracker_times = self.tracker.timestamps();
        let device_times = self.device.timestamps();
        let tracker_to_device = build_index_map(tracker_times, device_times, -offset)?;

        let mut best: Option<CandidateScore> = None;
        let mut last_error = None;

        for &device_anchor in &self.anchors {
            let anchor = map_single_index(tracker_times, device_times[device_anchor] + offset)?;
            match self
                .evaluator
                .score(offset, anchor, self.tracker, self.device, &tracker_to_device)
            {
                Ok((residual, transform)) if residual.is_finite() => {
                    if best.as_ref().is_none_or(|b| residual < b.score) {
                        best = Some(CandidateScore {
                            score: residual,
                            transform: Some(transform),
                            anchor_index: Some(anchor),
                        });
                    }
                }
                Ok((residual, _)) => {
                    trace!(offset, anchor, residual, "non-finite residual, anchor skipped");
                }
                Err(err) if err.is_recoverable() => {
                    trace!(offset, anchor, error = %err, "anchor skipped");
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        match (best, last_error) {
            (Some(best), _) => Ok(best),
            (None, Some(err)) => {
                warn!(offset, anchors = self.anchors.len(), error = %err, "every anchor failed");
                Err(err)
            }
            (None, None) => Err(AlignError::NoOverlap { offset }),
        }
    }
}
