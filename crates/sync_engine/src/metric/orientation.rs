use contracts::{AlignError, MetricKind, PoseStream};

use super::{AlignmentMetric, CandidateEvaluator, CandidateScore};
use crate::index_map::build_index_map;
use crate::rotation::angle_between_rotations;

/// Variance of the device/tracker relative orientation angle (degrees²)
///
/// With a constant mounting rotation the relative angle stays fixed at the
/// true offset, so its population variance bottoms out there.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrientationVarianceMetric;

impl AlignmentMetric for OrientationVarianceMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::OrientationVariance
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
            if !stream.has_full_orientation() {
                // report the first sample without one
                for index in 0..stream.len() {
                    stream.require_orientation(index)?;
                }
            }
        }
        Ok(Box::new(OrientationEvaluator { tracker, device }))
    }
}

struct OrientationEvaluator<'a> {
    tracker: &'a PoseStream,
    device: &'a PoseStream,
}

impl CandidateEvaluator for OrientationEvaluator<'_> {
    fn evaluate(&self, offset: f64) -> Result<CandidateScore, AlignError> {
        let device_to_tracker =
            build_index_map(self.device.timestamps(), self.tracker.timestamps(), offset)?;

        let mut angles = Vec::with_capacity(self.device.len());
        for (device_index, &tracker_index) in device_to_tracker.as_slice().iter().enumerate() {
            let device_rotation = self.device.require_orientation(device_index)?;
            let tracker_rotation = self.tracker.require_orientation(tracker_index)?;
            angles.push(angle_between_rotations(device_rotation, tracker_rotation).to_degrees());
        }

        let n = angles.len() as f64;
        let mean = angles.iter().sum::<f64>() / n;
        let variance = angles.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
        Ok(CandidateScore::bare(variance))
    }
}
