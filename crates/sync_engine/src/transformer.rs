//! Apply a recovered (offset, transform) pair to a device trajectory.

use contracts::{AlignError, PoseSample, PoseStream, RigidTransform};

pub struct TrajectoryTransformer;

impl TrajectoryTransformer {
    /// Device stream re-timed by `offset` and re-expressed in the tracker frame.
    ///
    /// Positions get the full rigid motion, orientation columns only the
    /// rotation. Samples without orientation stay without one. The input is
    /// left untouched and the output keeps its name, length and order.
    pub fn apply(
        device: &PoseStream,
        offset: f64,
        transform: &RigidTransform,
    ) -> Result<PoseStream, AlignError> {
        let rotation = transform.rotation();
        let samples = device
            .iter()
            .map(|sample| PoseSample {
                timestamp: sample.timestamp + offset,
                position: transform.transform_point(&sample.position),
                orientation: sample.orientation.map(|r| rotation * r),
            })
            .collect();
        PoseStream::new(device.name(), samples)
    }
}
