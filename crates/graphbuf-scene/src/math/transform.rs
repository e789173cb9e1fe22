// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::{Mat4, Quat, Vec3};

/// A local transform kept as separate position, rotation and scale.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    /// Translation.
    pub position: Vec3,
    /// Orientation (unit quaternion).
    pub rotation: Quat,
    /// Per-axis scale; a mirrored basis shows up as a negative X scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::identity(),
        scale: Vec3::ONE,
    };

    /// Splits `matrix` into components. See [`Mat4::decompose`].
    pub fn from_matrix(matrix: &Mat4) -> Self {
        matrix.decompose()
    }

    /// Recomposes the matrix. See [`Mat4::compose`].
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::compose(self.position, self.rotation, self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
