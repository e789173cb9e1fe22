// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::{Mat4, Vec3, EPSILON};

/// Quaternion stored as `(x, y, z, w)`.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quat {
    data: [f32; 4],
}

impl Quat {
    /// Creates a quaternion from components.
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { data: [x, y, z, w] }
    }

    /// Returns the identity quaternion.
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Returns the quaternion as an array.
    pub fn to_array(self) -> [f32; 4] {
        self.data
    }

    fn component(&self, idx: usize) -> f32 {
        self.data[idx]
    }

    /// Constructs a quaternion from a rotation axis and angle in radians.
    ///
    /// Returns the identity quaternion when the axis length is ≤ `EPSILON`.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let norm_axis = axis.normalize();
        if norm_axis == Vec3::ZERO {
            return Self::identity();
        }
        let (sin_half, cos_half) = (angle * 0.5).sin_cos();
        let scaled = norm_axis.scale(sin_half);
        Self::new(scaled.x(), scaled.y(), scaled.z(), cos_half)
    }

    /// Extracts the rotation of a pure rotation matrix.
    ///
    /// Only the upper 3×3 block is read and it must be unscaled. Branches on
    /// the largest diagonal term to keep the square root well conditioned.
    pub fn from_rotation_matrix(m: &Mat4) -> Self {
        let (m11, m12, m13) = (m.at(0, 0), m.at(0, 1), m.at(0, 2));
        let (m21, m22, m23) = (m.at(1, 0), m.at(1, 1), m.at(1, 2));
        let (m31, m32, m33) = (m.at(2, 0), m.at(2, 1), m.at(2, 2));
        let trace = m11 + m22 + m33;

        if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            Self::new((m32 - m23) * s, (m13 - m31) * s, (m21 - m12) * s, 0.25 / s)
        } else if m11 > m22 && m11 > m33 {
            let s = 2.0 * (1.0 + m11 - m22 - m33).sqrt();
            Self::new(0.25 * s, (m12 + m21) / s, (m13 + m31) / s, (m32 - m23) / s)
        } else if m22 > m33 {
            let s = 2.0 * (1.0 + m22 - m11 - m33).sqrt();
            Self::new((m12 + m21) / s, 0.25 * s, (m23 + m32) / s, (m13 - m31) / s)
        } else {
            let s = 2.0 * (1.0 + m33 - m11 - m22).sqrt();
            Self::new((m13 + m31) / s, (m23 + m32) / s, 0.25 * s, (m21 - m12) / s)
        }
    }

    /// Hamilton product of two quaternions (`self * other`).
    pub fn multiply(&self, other: &Self) -> Self {
        let [ax, ay, az, aw] = self.data;
        let [bx, by, bz, bw] = other.data;
        Self::new(
            aw * bx + ax * bw + ay * bz - az * by,
            aw * by - ax * bz + ay * bw + az * bx,
            aw * bz + ax * by - ay * bx + az * bw,
            aw * bw - ax * bx - ay * by - az * bz,
        )
    }

    /// Four-dimensional dot product.
    pub fn dot(&self, other: &Self) -> f32 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Normalises the quaternion; returns identity when norm is ~0.
    pub fn normalize(&self) -> Self {
        let len = self.dot(self).sqrt();
        if len <= EPSILON {
            return Self::identity();
        }
        let inv = 1.0 / len;
        Self::new(
            self.component(0) * inv,
            self.component(1) * inv,
            self.component(2) * inv,
            self.component(3) * inv,
        )
    }

    /// Returns true if both quaternions describe the same rotation within
    /// `tolerance` (`q` and `-q` are equivalent).
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        let a = self.normalize();
        let b = other.normalize();
        (1.0 - a.dot(&b).abs()) <= tolerance
    }

    /// Converts the quaternion to a rotation matrix (column-major 4×4).
    pub fn to_mat4(&self) -> Mat4 {
        let q = self.normalize();
        let [x, y, z, w] = q.data;

        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        Mat4::new([
            1.0 - 2.0 * (yy + zz),
            2.0 * (xy + wz),
            2.0 * (xz - wy),
            0.0,
            2.0 * (xy - wz),
            1.0 - 2.0 * (xx + zz),
            2.0 * (yz + wx),
            0.0,
            2.0 * (xz + wy),
            2.0 * (yz - wx),
            1.0 - 2.0 * (xx + yy),
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ])
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

/// Converts `(x, y, z, w)` into a `Quat` without normalising.
impl From<[f32; 4]> for Quat {
    fn from(value: [f32; 4]) -> Self {
        Self { data: value }
    }
}
