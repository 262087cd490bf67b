//! PoseStream - Ingestion output
//!
//! Timestamped 3-D poses of a single recording (tracker or device).

use nalgebra::{Matrix3, Matrix3x4, Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use crate::AlignError;

/// Single pose sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    /// Timestamp (seconds, arbitrary origin)
    pub timestamp: f64,

    /// Position in the stream's reference frame
    pub position: Vector3<f64>,

    /// Orientation basis vectors as columns, `None` when not recorded
    pub orientation: Option<Matrix3<f64>>,
}

impl PoseSample {
    /// Position-only sample
    pub fn new(timestamp: f64, position: Vector3<f64>) -> Self {
        Self {
            timestamp,
            position,
            orientation: None,
        }
    }

    /// Sample with orientation
    pub fn with_orientation(
        timestamp: f64,
        position: Vector3<f64>,
        orientation: Matrix3<f64>,
    ) -> Self {
        Self {
            timestamp,
            position,
            orientation: Some(orientation),
        }
    }

    /// Sample from a 3×4 pose block: columns 0-2 orientation, column 3 position
    pub fn from_pose_block(timestamp: f64, block: &Matrix3x4<f64>) -> Self {
        Self::with_orientation(
            timestamp,
            block.column(3).into_owned(),
            block.fixed_columns::<3>(0).into_owned(),
        )
    }
}

/// Ordered, immutable sequence of pose samples
///
/// Stored column-wise so the timestamp slice can be handed to the index
/// mapper directly. All three arrays always have the same length and
/// timestamps never decrease.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseStream {
    name: String,
    timestamps: Vec<f64>,
    positions: Vec<Vector3<f64>>,
    orientations: Vec<Option<Matrix3<f64>>>,
}

impl PoseStream {
    /// Build a stream from ordered samples
    ///
    /// # Errors
    /// - `Shape` if a timestamp, position or orientation entry is not finite
    /// - `NonMonotonic` if timestamps decrease
    pub fn new(name: impl Into<String>, samples: Vec<PoseSample>) -> Result<Self, AlignError> {
        let name = name.into();
        let n = samples.len();
        let mut timestamps = Vec::with_capacity(n);
        let mut positions = Vec::with_capacity(n);
        let mut orientations = Vec::with_capacity(n);

        for (index, sample) in samples.into_iter().enumerate() {
            if !sample.timestamp.is_finite() {
                return Err(AlignError::shape(
                    &name,
                    index,
                    "time",
                    format!("timestamp must be finite, got {}", sample.timestamp),
                ));
            }
            if let Some(&previous) = timestamps.last() {
                if sample.timestamp < previous {
                    return Err(AlignError::NonMonotonic {
                        stream: name,
                        index,
                        previous,
                        current: sample.timestamp,
                    });
                }
            }
            if sample.position.iter().any(|v| !v.is_finite()) {
                return Err(AlignError::shape(
                    &name,
                    index,
                    "position",
                    "position components must be finite",
                ));
            }
            if let Some(orientation) = &sample.orientation {
                if orientation.iter().any(|v| !v.is_finite()) {
                    return Err(AlignError::shape(
                        &name,
                        index,
                        "rotation",
                        "orientation entries must be finite",
                    ));
                }
            }

            timestamps.push(sample.timestamp);
            positions.push(sample.position);
            orientations.push(sample.orientation);
        }

        Ok(Self {
            name,
            timestamps,
            positions,
            orientations,
        })
    }

    /// Stream name (used in error context and logs)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Sample at `index`
    pub fn get(&self, index: usize) -> Option<PoseSample> {
        Some(PoseSample {
            timestamp: *self.timestamps.get(index)?,
            position: self.positions[index],
            orientation: self.orientations[index],
        })
    }

    /// Iterate samples in order
    pub fn iter(&self) -> impl Iterator<Item = PoseSample> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    pub fn orientations(&self) -> &[Option<Matrix3<f64>>] {
        &self.orientations
    }

    /// Orientation at `index`, failing instead of assuming identity
    pub fn require_orientation(&self, index: usize) -> Result<&Matrix3<f64>, AlignError> {
        self.orientations
            .get(index)
            .and_then(|o| o.as_ref())
            .ok_or_else(|| AlignError::MissingOrientation {
                stream: self.name.clone(),
                index,
            })
    }

    /// Whether every sample carries an orientation
    pub fn has_full_orientation(&self) -> bool {
        self.orientations.iter().all(Option::is_some)
    }

    /// 4×4 camera matrix at `index`: columns 0-2 orientation, column 3 position
    pub fn pose_matrix(&self, index: usize) -> Result<Matrix4<f64>, AlignError> {
        let orientation = self.require_orientation(index)?;
        let position = self.positions[index];

        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(orientation);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&position);
        Ok(matrix)
    }

    pub fn first_timestamp(&self) -> Option<f64> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.timestamps.last().copied()
    }

    /// `last - first`, zero for empty or single-sample streams
    pub fn duration(&self) -> f64 {
        match (self.first_timestamp(), self.last_timestamp()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// New stream with `timestamp[i] -= timestamp[0]`
    pub fn shift_to_origin(&self) -> Self {
        let origin = self.first_timestamp().unwrap_or(0.0);
        Self {
            name: self.name.clone(),
            timestamps: self.timestamps.iter().map(|t| t - origin).collect(),
            positions: self.positions.clone(),
            orientations: self.orientations.clone(),
        }
    }

    /// Diagnostic summary
    pub fn summary(&self) -> StreamSummary {
        let with_orientation = self.orientations.iter().filter(|o| o.is_some()).count();
        let mean_interval = if self.len() > 1 {
            Some(self.duration() / (self.len() - 1) as f64)
        } else {
            None
        };

        StreamSummary {
            name: self.name.clone(),
            samples: self.len(),
            first_timestamp: self.first_timestamp(),
            last_timestamp: self.last_timestamp(),
            duration: self.duration(),
            with_orientation,
            mean_interval,
        }
    }
}

/// Stream summary (for diagnostics)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub name: String,
    pub samples: usize,
    pub first_timestamp: Option<f64>,
    pub last_timestamp: Option<f64>,
    pub duration: f64,
    /// Number of samples carrying an orientation
    pub with_orientation: usize,
    /// Mean sampling interval (seconds)
    pub mean_interval: Option<f64>,
}
