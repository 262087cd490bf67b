use contracts::{AlignError, MetricKind, PoseStream};

use super::{AlignmentMetric, CandidateEvaluator, CandidateScore};
use crate::index_map::build_index_map;
use crate::rotation::{angular_speeds, cosine_similarity};

/// Cosine similarity between device and tracker angular-speed sequences
///
/// Independent of the frame relation, so it finds the offset even when the
/// two streams share no position reference. Never recovers a transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationCorrelationMetric {
    center: bool,
}

impl RotationCorrelationMetric {
    /// `center` subtracts each sequence's mean before the similarity
    pub fn new(center: bool) -> Self {
        Self { center }
    }
}

impl AlignmentMetric for RotationCorrelationMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::RotationCorrelation
    }

    fn prepare<'a>(
        &self,
        tracker: &'a PoseStream,
        device: &'a PoseStream,
    ) -> Result<Box<dyn CandidateEvaluator + 'a>, AlignError> {
        for stream in [tracker, device] {
            if stream.is_empty() {
                return Err(AlignError::empty_stream(stream.name()));
            }
            if stream.len() < 2 {
                return Err(AlignError::shape(
                    stream.name(),
                    0,
                    "rotation",
                    "angular speed needs at least two oriented samples",
                ));
            }
        }

        Ok(Box::new(RotationEvaluator {
            tracker,
            device,
            tracker_speeds: angular_speeds(tracker)?,
            device_speeds: angular_speeds(device)?,
            center: self.center,
        }))
    }
}

struct RotationEvaluator<'a> {
    tracker: &'a PoseStream,
    device: &'a PoseStream,
    tracker_speeds: Vec<f64>,
    device_speeds: Vec<f64>,
    center: bool,
}

impl CandidateEvaluator for RotationEvaluator<'_> {
    fn evaluate(&self, offset: f64) -> Result<CandidateScore, AlignError> {
        let device_to_tracker =
            build_index_map(self.device.timestamps(), self.tracker.timestamps(), offset)?;
        let last_speed = self.tracker_speeds.len() - 1;

        let matched: Vec<f64> = device_to_tracker.as_slice()[..self.device_speeds.len()]
            .iter()
            .map(|&j| self.tracker_speeds[j.min(last_speed)])
            .collect();

        Ok(CandidateScore::bare(cosine_similarity(
            &self.device_speeds,
            &matched,
            self.center,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{self, TRUE_OFFSET};
    use contracts::PoseSample;
    use nalgebra::Vector3;

    #[test]
    fn test_true_offset_beats_neighbours() {
        let tracker = synthetic::tracker_stream();
        let device = synthetic::device_stream();
        let evaluator = RotationCorrelationMetric::new(true)
            .prepare(&tracker, &device)
            .unwrap();

        let at_truth = evaluator.evaluate(TRUE_OFFSET).unwrap().score;
        assert!(at_truth > 0.95, "similarity at truth {at_truth}");
        for wrong in [TRUE_OFFSET - 1.0, TRUE_OFFSET + 1.0, TRUE_OFFSET + 4.0] {
            let score = evaluator.evaluate(wrong).unwrap().score;
            assert!(score < at_truth, "offset {wrong} scored {score} >= {at_truth}");
        }
    }

    #[test]
    fn test_requires_orientation() {
        let tracker = synthetic::tracker_stream();
        let device = PoseStream::new(
            "device",
            (0..5)
                .map(|i| PoseSample::new(i as f64 * 0.1, Vector3::zeros()))
                .collect(),
        )
        .unwrap();

        let err = RotationCorrelationMetric::default()
            .prepare(&tracker, &device)
            .err()
            .expect("orientation-less device must be rejected");
        assert!(matches!(err, AlignError::MissingOrientation { .. }), "got {err:?}");
    }

    #[test]
    fn test_single_sample_device_is_shape_error() {
        let tracker = synthetic::tracker_stream();
        let device = PoseStream::new(
            "device",
            vec![PoseSample::with_orientation(
                0.0,
                Vector3::zeros(),
                nalgebra::Matrix3::identity(),
            )],
        )
        .unwrap();

        assert!(matches!(
            RotationCorrelationMetric::default().prepare(&tracker, &device),
            Err(AlignError::Shape { .. })
        ));
    }
}
