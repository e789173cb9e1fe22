// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::{Quat, Transform, Vec3, EPSILON};

/// Column-major 4×4 matrix holding a node's local transform.
///
/// - Element `i` of [`to_array`](Self::to_array) is row `i % 4`, column
///   `i / 4`. This is also the order the sixteen floats travel on the wire.
/// - Translation occupies the last column.
///
/// # Examples
/// ```
/// use graphbuf_scene::math::{Mat4, Vec3};
/// let t = Mat4::translation(5.0, -3.0, 2.0);
/// let p = Vec3::new(2.0, 4.0, -1.0);
/// assert_eq!(t.transform_point(&p).to_array(), [7.0, 1.0, 1.0]);
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mat4 {
    data: [f32; 16],
}

impl Mat4 {
    /// Returns the identity matrix.
    pub const fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // col 0
                0.0, 1.0, 0.0, 0.0, // col 1
                0.0, 0.0, 1.0, 0.0, // col 2
                0.0, 0.0, 0.0, 1.0, // col 3
            ],
        }
    }

    /// Builds a translation matrix.
    pub const fn translation(tx: f32, ty: f32, tz: f32) -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // col 0
                0.0, 1.0, 0.0, 0.0, // col 1
                0.0, 0.0, 1.0, 0.0, // col 2
                tx, ty, tz, 1.0, // col 3 (translation)
            ],
        }
    }

    /// Builds a non-uniform scale matrix.
    pub const fn scale(sx: f32, sy: f32, sz: f32) -> Self {
        Self {
            data: [
                sx, 0.0, 0.0, 0.0, // col 0
                0.0, sy, 0.0, 0.0, // col 1
                0.0, 0.0, sz, 0.0, // col 2
                0.0, 0.0, 0.0, 1.0, // col 3
            ],
        }
    }

    /// Builds a rotation matrix around the Y axis by `angle` radians.
    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new([
            c, 0.0, -s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Constructs a rotation matrix from a quaternion.
    pub fn from_quat(q: &Quat) -> Self {
        q.to_mat4()
    }

    /// Creates a matrix from column-major array data.
    pub const fn new(data: [f32; 16]) -> Self {
        Self { data }
    }

    /// Returns the matrix as a column-major array.
    pub fn to_array(self) -> [f32; 16] {
        self.data
    }

    pub(crate) fn at(&self, row: usize, col: usize) -> f32 {
        self.data[col * 4 + row]
    }

    /// Returns the first three rows of column `col`.
    pub(crate) fn column(&self, col: usize) -> Vec3 {
        Vec3::new(self.at(0, col), self.at(1, col), self.at(2, col))
    }

    /// Multiplies the matrix with another matrix (`self * rhs`).
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.at(row, k) * rhs.at(k, col);
                }
                out[col * 4 + row] = sum;
            }
        }
        Self::new(out)
    }

    /// Transforms a point (assumes `w = 1`, no perspective divide).
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        let (x, y, z) = (point.x(), point.y(), point.z());
        let row = |r: usize| {
            self.at(r, 0) * x + self.at(r, 1) * y + self.at(r, 2) * z + self.at(r, 3)
        };
        Vec3::new(row(0), row(1), row(2))
    }

    /// Determinant of the full 4×4 matrix.
    pub fn determinant(&self) -> f32 {
        let a = &self.data;
        let b00 = a[0] * a[5] - a[1] * a[4];
        let b01 = a[0] * a[6] - a[2] * a[4];
        let b02 = a[0] * a[7] - a[3] * a[4];
        let b03 = a[1] * a[6] - a[2] * a[5];
        let b04 = a[1] * a[7] - a[3] * a[5];
        let b05 = a[2] * a[7] - a[3] * a[6];
        let b06 = a[8] * a[13] - a[9] * a[12];
        let b07 = a[8] * a[14] - a[10] * a[12];
        let b08 = a[8] * a[15] - a[11] * a[12];
        let b09 = a[9] * a[14] - a[10] * a[13];
        let b10 = a[9] * a[15] - a[11] * a[13];
        let b11 = a[10] * a[15] - a[11] * a[14];
        b00 * b11 - b01 * b10 + b02 * b09 + b03 * b08 - b04 * b07 + b05 * b06
    }

    /// Builds `T * R * S` from a translation, rotation and scale.
    pub fn compose(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let r = rotation.to_mat4();
        let x = r.column(0).scale(scale.x());
        let y = r.column(1).scale(scale.y());
        let z = r.column(2).scale(scale.z());
        Self::new([
            x.x(),
            x.y(),
            x.z(),
            0.0,
            y.x(),
            y.y(),
            y.z(),
            0.0,
            z.x(),
            z.y(),
            z.z(),
            0.0,
            translation.x(),
            translation.y(),
            translation.z(),
            1.0,
        ])
    }

    /// Splits an affine matrix into translation, rotation and scale.
    ///
    /// Translation is column 3 and scale is the length of each basis column.
    /// A negative determinant means the basis is mirrored; the mirror is
    /// attributed to the X axis by negating the X scale. Rotation is taken
    /// from the basis after dividing out the scale. A zero-length axis leaves
    /// its column zeroed rather than producing NaNs.
    pub fn decompose(&self) -> Transform {
        let mut sx = self.column(0).length();
        let sy = self.column(1).length();
        let sz = self.column(2).length();
        if self.determinant() < 0.0 {
            sx = -sx;
        }

        let inv = |s: f32| if s.abs() <= EPSILON { 0.0 } else { 1.0 / s };
        let x = self.column(0).scale(inv(sx));
        let y = self.column(1).scale(inv(sy));
        let z = self.column(2).scale(inv(sz));
        let basis = Self::new([
            x.x(),
            x.y(),
            x.z(),
            0.0,
            y.x(),
            y.y(),
            y.z(),
            0.0,
            z.x(),
            z.y(),
            z.z(),
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ]);

        Transform {
            position: self.column(3),
            rotation: Quat::from_rotation_matrix(&basis).normalize(),
            scale: Vec3::new(sx, sy, sz),
        }
    }

    /// Returns true if every element is within `tolerance` of `other`.
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f32; 16]> for Mat4 {
    fn from(value: [f32; 16]) -> Self {
        Self { data: value }
    }
}

impl core::ops::Mul for Mat4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(&rhs)
    }
}
