//! Position-residual evaluation of one (offset, anchor) hypothesis.
//!
//! The residual also absorbs any constant lever arm between the tracker and
//! device mounting points, so it is a monotone proxy for alignment quality
//! rather than a ground-truth error.

use contracts::{AlignError, IndexMap, PoseStream, RigidTransform};
use tracing::instrument;

use crate::rigid::RigidTransformEstimator;

/// Scores a hypothesis by mean position residual (meters, lower is better)
#[derive(Debug, Clone, Copy)]
pub struct AlignmentEvaluator {
    /// Target number of tracker test samples
    test_samples: usize,
}

impl AlignmentEvaluator {
    pub fn new(test_samples: usize) -> Self {
        Self {
            test_samples: test_samples.max(1),
        }
    }

    /// Stride between tracker test samples for a window of `len` samples.
    ///
    /// A stride rather than a fixed count, so long overlap windows keep
    /// roughly `test_samples` test points spread over their whole length.
    pub fn test_stride(&self, len: usize) -> usize {
        (len / self.test_samples).max(1)
    }

    /// Mean residual and the transform estimated at `anchor_index`.
    ///
    /// `tracker_to_device` maps tracker indices to device indices for this
    /// offset. Test samples are drawn only from tracker indices inside the
    /// shifted device time span, with the stride taken over that window so
    /// a short device against a long tracker still gets `test_samples`
    /// residuals per candidate.
    ///
    /// # Errors
    /// - `MissingOrientation` / `SingularMatrix` from the anchor poses
    /// - `NoOverlap` when no test sample falls inside the device span
    #[instrument(
        name = "alignment_evaluator_score",
        level = "trace",
        skip(self, tracker, device, tracker_to_device),
        fields(offset = offset, anchor = anchor_index)
    )]
    pub fn score(
        &self,
        offset: f64,
        anchor_index: usize,
        tracker: &PoseStream,
        device: &PoseStream,
        tracker_to_device: &IndexMap,
    ) -> Result<(f64, RigidTransform), AlignError> {
        let device_anchor = tracker_to_device
            .get(anchor_index)
            .ok_or_else(|| AlignError::empty_stream(tracker.name()))?;
        let transform =
            RigidTransformEstimator::estimate_at(tracker, anchor_index, device, device_anchor)?;

        let (Some(device_first), Some(device_last)) =
            (device.first_timestamp(), device.last_timestamp())
        else {
            return Err(AlignError::empty_stream(device.name()));
        };
        let start = device_first + offset;
        let end = device_last + offset;

        let tracker_times = tracker.timestamps();
        let tracker_positions = tracker.positions();
        let device_positions = device.positions();

        let lo = tracker_times.partition_point(|&t| t < start);
        let hi = tracker_times.partition_point(|&t| t <= end);
        if lo >= hi {
            return Err(AlignError::NoOverlap { offset });
        }

        let mut total = 0.0;
        let mut count = 0usize;
        for tracker_index in (lo..hi).step_by(self.test_stride(hi - lo)) {
            let Some(device_index) = tracker_to_device.get(tracker_index) else {
                continue;
            };
            let in_tracker_space = transform.transform_point(&device_positions[device_index]);
            total += (in_tracker_space - tracker_positions[tracker_index]).norm();
            count += 1;
        }

        if count == 0 {
            return Err(AlignError::NoOverlap { offset });
        }
        Ok((total / count as f64, transform))
    }
}

impl Default for AlignmentEvaluator {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_map::{build_index_map, map_single_index};
    use crate::synthetic::{self, TRUE_OFFSET};

    fn tracker_anchor(tracker: &PoseStream, device: &PoseStream, device_index: usize, offset: f64) -> usize {
        map_single_index(tracker.timestamps(), device.timestamps()[device_index] + offset).unwrap()
    }

    #[test]
    fn test_stride_scales_with_length() {
        let evaluator = AlignmentEvaluator::new(100);
        assert_eq!(evaluator.test_stride(50), 1);
        assert_eq!(evaluator.test_stride(1000), 10);
        assert_eq!(evaluator.test_stride(100_000), 1000);
    }

    #[test]
    fn test_zero_residual_at_true_offset() {
        let tracker = synthetic::tracker_stream();
        let device = synthetic::device_stream();
        let map = build_index_map(tracker.timestamps(), device.timestamps(), -TRUE_OFFSET).unwrap();
        let anchor = tracker_anchor(&tracker, &device, 64, TRUE_OFFSET);

        let evaluator = AlignmentEvaluator::new(128);
        let (residual, transform) = evaluator
            .score(TRUE_OFFSET, anchor, &tracker, &device, &map)
            .unwrap();

        assert!(residual < 1e-9, "residual {residual}");
        assert!(transform.max_abs_diff(&synthetic::known_transform()) < 1e-9);
    }

    #[test]
    fn test_wrong_offset_scores_worse() {
        let tracker = synthetic::tracker_stream();
        let device = synthetic::device_stream();
        let evaluator = AlignmentEvaluator::new(128);

        let score_at = |offset: f64| {
            let map = build_index_map(tracker.timestamps(), device.timestamps(), -offset).unwrap();
            let anchor = tracker_anchor(&tracker, &device, 128, offset);
            evaluator.score(offset, anchor, &tracker, &device, &map).unwrap().0
        };

        let best = score_at(TRUE_OFFSET);
        assert!(score_at(TRUE_OFFSET + 0.5) > best);
        assert!(score_at(TRUE_OFFSET - 0.25) > best);
    }

    #[test]
    fn test_short_device_against_long_tracker_scores_every_offset() {
        // 1008 s tracker, 8 s device: a whole-tracker stride of 1008 samples
        // would step clean over the 512-sample overlap window.
        let tracker = synthetic::tracker_stream_of(64_513);
        let device = synthetic::device_stream_at(129, 401.0, |_, p| p);
        let evaluator = AlignmentEvaluator::new(64);

        let score_at = |offset: f64| {
            let map = build_index_map(tracker.timestamps(), device.timestamps(), -offset).unwrap();
            let anchor = tracker_anchor(&tracker, &device, 64, offset);
            evaluator.score(offset, anchor, &tracker, &device, &map)
        };

        let (best, transform) = score_at(401.0).expect("true offset overlaps");
        assert!(best < 1e-9, "residual at true offset {best}");
        assert!(transform.max_abs_diff(&synthetic::known_transform()) < 1e-9);
        for offset in [396.0, 399.0, 400.0, 402.0, 403.5, 407.0] {
            let (residual, _) = score_at(offset)
                .unwrap_or_else(|e| panic!("offset {offset} should overlap, got {e:?}"));
            assert!(residual > best, "offset {offset} scored {residual} <= {best}");
        }
    }

    #[test]
    fn test_missing_anchor_orientation_is_recoverable() {
        use contracts::PoseSample;
        use nalgebra::Vector3;

        let tracker = PoseStream::new(
            "tracker",
            (0..10)
                .map(|i| PoseSample::new(i as f64, Vector3::zeros()))
                .collect(),
        )
        .unwrap();
        let device = tracker.clone();
        let map = build_index_map(tracker.timestamps(), device.timestamps(), 0.0).unwrap();

        let err = AlignmentEvaluator::default()
            .score(0.0, 3, &tracker, &device, &map)
            .unwrap_err();
        assert!(err.is_recoverable(), "got {err:?}");
    }
}
