//! Synthetic tracker/device recordings for tests.
//!
//! Timestamps live on dyadic grids (1/64 s tracker, 1/16 s device) and the
//! true offset sits on the candidate grid, so matched samples coincide
//! exactly and recovery can be checked to floating-point tolerance.

use contracts::{PoseSample, PoseStream, RigidTransform, SyncSearchConfig};
use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

pub const TRUE_OFFSET: f64 = 3.75;
pub const TRACKER_RATE: f64 = 64.0;
pub const DEVICE_RATE: f64 = 16.0;
pub const TRACKER_SAMPLES: usize = 2049;
pub const DEVICE_SAMPLES: usize = 257;

pub fn axis_angle(axis: &Vector3<f64>, angle: f64) -> Matrix3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle).into_inner()
}

/// Device → tracker ground truth
pub fn known_transform() -> RigidTransform {
    RigidTransform::from_parts(
        axis_angle(&Vector3::new(1.0, 2.0, 3.0), 1.1),
        Vector3::new(0.5, -1.2, 2.0),
    )
}

/// Rig motion in the device frame at tracker time `tau`
pub fn motion(tau: f64) -> (Matrix3<f64>, Vector3<f64>) {
    let theta = 3.0 * (0.02 * tau * tau).sin();
    let rotation = axis_angle(&Vector3::new(0.2, 1.0, 0.3), theta)
        * axis_angle(&Vector3::x(), 0.2 * tau.sin());
    let position = Vector3::new(
        2.0 * (0.7 * tau).cos(),
        1.5 * (0.5 * tau).sin(),
        0.3 * tau + 0.2 * (1.3 * tau).sin(),
    );
    (rotation, position)
}

pub fn tracker_stream() -> PoseStream {
    tracker_stream_of(TRACKER_SAMPLES)
}

/// Tracker stream of `len` samples at [`TRACKER_RATE`]
pub fn tracker_stream_of(len: usize) -> PoseStream {
    let truth = known_transform();
    let samples = (0..len)
        .map(|j| {
            let tau = j as f64 / TRACKER_RATE;
            let (rotation, position) = motion(tau);
            PoseSample::with_orientation(
                tau,
                truth.transform_point(&position),
                truth.rotation() * rotation,
            )
        })
        .collect();
    PoseStream::new("tracker", samples).expect("synthetic tracker stream")
}

pub fn device_stream() -> PoseStream {
    device_stream_with(|_, p| p)
}

/// Device stream with a per-sample position perturbation
pub fn device_stream_with(
    perturb: impl FnMut(usize, Vector3<f64>) -> Vector3<f64>,
) -> PoseStream {
    device_stream_at(DEVICE_SAMPLES, TRUE_OFFSET, perturb)
}

/// `len` device samples at [`DEVICE_RATE`], lagging the tracker by `offset`
pub fn device_stream_at(
    len: usize,
    offset: f64,
    mut perturb: impl FnMut(usize, Vector3<f64>) -> Vector3<f64>,
) -> PoseStream {
    let samples = (0..len)
        .map(|i| {
            let t = i as f64 / DEVICE_RATE;
            let (rotation, position) = motion(t + offset);
            PoseSample::with_orientation(t, perturb(i, position), rotation)
        })
        .collect();
    PoseStream::new("device", samples).expect("synthetic device stream")
}

/// Grid with a 1/64 s step that contains [`TRUE_OFFSET`], stride 16 test samples
pub fn exact_config() -> SyncSearchConfig {
    SyncSearchConfig {
        num_candidates: 1025,
        test_samples: 128,
        ..Default::default()
    }
}

/// Candidate spacing of [`exact_config`]
pub fn exact_step() -> f64 {
    let duration_gap = (TRACKER_SAMPLES - 1) as f64 / TRACKER_RATE
        - (DEVICE_SAMPLES - 1) as f64 / DEVICE_RATE;
    duration_gap / (exact_config().num_candidates - 1) as f64
}
