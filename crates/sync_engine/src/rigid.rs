//! Single-correspondence rigid transform recovery.

use contracts::{AlignError, PoseStream, RigidTransform};
use nalgebra::{Matrix3, Matrix4};
use thiserror::Error;

/// Max entry of `RᵀR - I` accepted as orthonormal.
const ORTHONORMAL_TOLERANCE: f64 = 1e-3;

/// Device pose that cannot be inverted as a rigid motion
#[derive(Debug, Error)]
#[error("device pose is not invertible: {reason}")]
pub struct SingularPose {
    pub reason: &'static str,
}

/// Device → tracker transform from one pose pair
///
/// Both inputs are camera matrices (columns 0-2 orientation, column 3
/// position) of the same physical moment, each in its own stream's frame.
/// `device_to_tracker = tracker_pose · device_pose⁻¹`. No averaging: noise
/// at the anchor sample goes straight into the result.
pub struct RigidTransformEstimator;

impl RigidTransformEstimator {
    /// Estimate from two homogeneous pose matrices.
    pub fn estimate(
        tracker_pose: &Matrix4<f64>,
        device_pose: &Matrix4<f64>,
    ) -> Result<RigidTransform, SingularPose> {
        let device_inverse = rigid_inverse(device_pose)?;
        Ok(RigidTransform::from_matrix(*tracker_pose).compose(&device_inverse))
    }

    /// Estimate from samples of two streams, reporting failures by stream and index.
    pub fn estimate_at(
        tracker: &PoseStream,
        tracker_index: usize,
        device: &PoseStream,
        device_index: usize,
    ) -> Result<RigidTransform, AlignError> {
        let tracker_pose = tracker.pose_matrix(tracker_index)?;
        let device_pose = device.pose_matrix(device_index)?;
        Self::estimate(&tracker_pose, &device_pose).map_err(|_| AlignError::SingularMatrix {
            stream: device.name().to_string(),
            index: device_index,
        })
    }
}

/// Rigid inverse of a camera matrix, refusing non-orthonormal rotation blocks.
fn rigid_inverse(pose: &Matrix4<f64>) -> Result<RigidTransform, SingularPose> {
    if pose.iter().any(|v| !v.is_finite()) {
        return Err(SingularPose {
            reason: "non-finite entries",
        });
    }

    let rotation: Matrix3<f64> = pose.fixed_view::<3, 3>(0, 0).into_owned();
    let gram_error = (rotation.transpose() * rotation - Matrix3::identity()).amax();
    if gram_error > ORTHONORMAL_TOLERANCE {
        return Err(SingularPose {
            reason: "rotation block is not orthonormal",
        });
    }

    Ok(RigidTransform::from_matrix(*pose).inverse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{axis_angle, known_transform};
    use nalgebra::Vector3;

    fn camera_matrix(rotation: Matrix3<f64>, position: Vector3<f64>) -> Matrix4<f64> {
        *RigidTransform::from_parts(rotation, position).matrix()
    }

    #[test]
    fn test_recovers_known_transform() {
        let truth = known_transform();
        let device_pose = camera_matrix(
            axis_angle(&Vector3::new(0.3, -1.0, 0.2), 0.7),
            Vector3::new(0.4, 1.1, -2.0),
        );
        let tracker_pose = truth.matrix() * device_pose;

        let estimated = RigidTransformEstimator::estimate(&tracker_pose, &device_pose).unwrap();
        assert!(
            estimated.max_abs_diff(&truth) < 1e-12,
            "estimated {estimated:?}"
        );
    }

    #[test]
    fn test_estimate_undoes_device_motion() {
        // Mapping the device pose through the estimate lands on the tracker pose
        let device = RigidTransform::from_parts(
            axis_angle(&Vector3::new(1.0, 0.0, 1.0), -0.4),
            Vector3::new(3.0, 0.0, -1.0),
        );
        let tracker = RigidTransform::from_parts(
            axis_angle(&Vector3::new(0.0, 1.0, 0.0), 1.3),
            Vector3::new(-0.5, 2.0, 0.25),
        );

        let estimated = RigidTransformEstimator::estimate(tracker.matrix(), device.matrix()).unwrap();
        let mapped = estimated.compose(&device);
        assert!(mapped.max_abs_diff(&tracker) < 1e-12, "mapped {mapped:?}");
    }

    #[test]
    fn test_identity_poses_give_identity() {
        let id = Matrix4::identity();
        let estimated = RigidTransformEstimator::estimate(&id, &id).unwrap();
        assert_eq!(estimated, RigidTransform::identity());
    }

    #[test]
    fn test_rejects_degenerate_device_pose() {
        let mut device_pose = Matrix4::identity();
        device_pose[(1, 1)] = 0.0;
        assert!(RigidTransformEstimator::estimate(&Matrix4::identity(), &device_pose).is_err());

        let mut scaled = Matrix4::identity();
        scaled[(0, 0)] = 2.0;
        assert!(RigidTransformEstimator::estimate(&Matrix4::identity(), &scaled).is_err());
    }

    #[test]
    fn test_estimate_at_reports_stream_context() {
        use contracts::PoseSample;

        let tracker = PoseStream::new(
            "tracker",
            vec![PoseSample::with_orientation(
                0.0,
                Vector3::zeros(),
                Matrix3::identity(),
            )],
        )
        .unwrap();
        let device = PoseStream::new(
            "device",
            vec![
                PoseSample::with_orientation(0.0, Vector3::zeros(), Matrix3::identity()),
                PoseSample::with_orientation(0.1, Vector3::zeros(), Matrix3::zeros()),
            ],
        )
        .unwrap();

        match RigidTransformEstimator::estimate_at(&tracker, 0, &device, 1) {
            Err(AlignError::SingularMatrix { stream, index }) => {
                assert_eq!(stream, "device");
                assert_eq!(index, 1);
            }
            other => panic!("expected singular matrix error, got {other:?}"),
        }
    }
}
