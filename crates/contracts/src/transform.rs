//! RigidTransform - rotation + translation, no scale.

use nalgebra::{Matrix3, Matrix4, Vector3};
use serde::{Deserialize, Serialize};

/// Homogeneous 4×4 rigid transform
///
/// Maps device-frame points and directions into the tracker frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    matrix: Matrix4<f64>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Wrap a homogeneous matrix; the bottom row is reset to `[0, 0, 0, 1]`.
    pub fn from_matrix(mut matrix: Matrix4<f64>) -> Self {
        matrix.set_row(3, &nalgebra::RowVector4::new(0.0, 0.0, 0.0, 1.0));
        Self { matrix }
    }

    pub fn from_parts(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        Self { matrix }
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    pub fn rotation(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// `R p + t`
    pub fn transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation() * point + self.translation()
    }

    /// Rigid inverse `[Rᵀ | -Rᵀ t]`
    pub fn inverse(&self) -> Self {
        let rt = self.rotation().transpose();
        Self::from_parts(rt, -(rt * self.translation()))
    }

    /// Composition `self ∘ other`
    pub fn compose(&self, other: &RigidTransform) -> Self {
        Self::from_matrix(self.matrix * other.matrix)
    }

    /// Largest absolute entry-wise difference to `other`
    pub fn max_abs_diff(&self, other: &RigidTransform) -> f64 {
        (self.matrix - other.matrix).amax()
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}
