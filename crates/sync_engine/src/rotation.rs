//! Rotation-angle helpers for the orientation based metrics.

use std::f64::consts::PI;

use contracts::{AlignError, PoseStream};
use nalgebra::Matrix3;

/// Entry-wise tolerance under which a relative rotation counts as identity
pub const IDENTITY_TOLERANCE: f64 = 1e-3;

/// Angle of the relative rotation `A Bᵀ`, folded into `[0, π]`.
///
/// Returns exactly zero near the identity, where `acos` is numerically unstable.
pub fn angle_between_rotations(a: &Matrix3<f64>, b: &Matrix3<f64>) -> f64 {
    let r = a * b.transpose();
    if (r - Matrix3::identity()).amax() < IDENTITY_TOLERANCE {
        return 0.0;
    }
    let cos_theta = ((r.trace() - 1.0) / 2.0).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();
    theta.min(2.0 * PI - theta)
}

/// Angles between consecutive orientations (`len - 1` values).
///
/// # Errors
/// `MissingOrientation` for the first sample without orientation.
pub fn angular_speeds(stream: &PoseStream) -> Result<Vec<f64>, AlignError> {
    let mut speeds = Vec::with_capacity(stream.len().saturating_sub(1));
    for i in 1..stream.len() {
        let previous = stream.require_orientation(i - 1)?;
        let current = stream.require_orientation(i)?;
        speeds.push(angle_between_rotations(previous, current));
    }
    Ok(speeds)
}

/// Cosine similarity of two equally long sequences.
///
/// Zero when either sequence has zero norm (no rotation, no information).
pub fn cosine_similarity(a: &[f64], b: &[f64], center: bool) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mean = |v: &[f64]| {
        if center && !v.is_empty() {
            v.iter().sum::<f64>() / v.len() as f64
        } else {
            0.0
        }
    };
    let (mean_a, mean_b) = (mean(a), mean(b));

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (x - mean_a, y - mean_b);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a <= f64::EPSILON || norm_b <= f64::EPSILON {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn rot_z_90() -> Matrix3<f64> {
        Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0)
    }

    #[test]
    fn test_identity_angle_is_zero() {
        let id = Matrix3::identity();
        assert_eq!(angle_between_rotations(&id, &id), 0.0);
    }

    #[test]
    fn test_quarter_turn() {
        let angle = angle_between_rotations(&Matrix3::identity(), &rot_z_90());
        assert!((angle - FRAC_PI_2).abs() < 1e-12, "got {angle}");
    }

    #[test]
    fn test_half_turn_stays_in_range() {
        let half = Matrix3::new(-1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0);
        let angle = angle_between_rotations(&Matrix3::identity(), &half);
        assert!((angle - PI).abs() < 1e-9, "got {angle}");
    }

    #[test]
    fn test_angle_is_symmetric() {
        let a = rot_z_90();
        let b = crate::synthetic::axis_angle(&nalgebra::Vector3::new(1.0, 1.0, 0.0), 0.4);
        let ab = angle_between_rotations(&a, &b);
        let ba = angle_between_rotations(&b, &a);
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0], false) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0], false).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0], false), 0.0);

        // Centering removes the common level
        let c = cosine_similarity(&[1.0, 2.0, 3.0], &[11.0, 12.0, 13.0], true);
        assert!((c - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_angular_speeds_need_orientation() {
        use contracts::PoseSample;
        use nalgebra::Vector3;

        let stream = PoseStream::new(
            "device",
            vec![
                PoseSample::with_orientation(0.0, Vector3::zeros(), Matrix3::identity()),
                PoseSample::new(0.1, Vector3::zeros()),
            ],
        )
        .unwrap();
        assert!(matches!(
            angular_speeds(&stream),
            Err(AlignError::MissingOrientation { index: 1, .. })
        ));
    }
}
