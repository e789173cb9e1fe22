// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::EPSILON;

/// 3D vector used for node positions, scales and matrix basis columns.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    data: [f32; 3],
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// All components set to one (unit scale).
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Unit vector pointing along the positive X axis.
    pub const UNIT_X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit vector pointing along the positive Y axis.
    pub const UNIT_Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit vector pointing along the positive Z axis.
    pub const UNIT_Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Creates a vector from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { data: [x, y, z] }
    }

    /// Returns the components as an array.
    pub fn to_array(self) -> [f32; 3] {
        self.data
    }

    /// X component.
    pub fn x(&self) -> f32 {
        self.data[0]
    }

    /// Y component.
    pub fn y(&self) -> f32 {
        self.data[1]
    }

    /// Z component.
    pub fn z(&self) -> f32 {
        self.data[2]
    }

    /// Adds two vectors.
    pub fn add(&self, other: &Self) -> Self {
        Self::new(self.x() + other.x(), self.y() + other.y(), self.z() + other.z())
    }

    /// Subtracts another vector.
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x() - other.x(), self.y() - other.y(), self.z() - other.z())
    }

    /// Scales the vector by a scalar.
    pub fn scale(&self, scalar: f32) -> Self {
        Self::new(self.x() * scalar, self.y() * scalar, self.z() * scalar)
    }

    /// Dot product with another vector.
    pub fn dot(&self, other: &Self) -> f32 {
        self.x() * other.x() + self.y() * other.y() + self.z() * other.z()
    }

    /// Cross product with another vector.
    pub fn cross(&self, other: &Self) -> Self {
        let (ax, ay, az) = (self.x(), self.y(), self.z());
        let (bx, by, bz) = (other.x(), other.y(), other.z());
        Self::new(ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx)
    }

    /// Vector length (magnitude).
    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Normalises the vector, returning the zero vector if length ≤ `EPSILON`.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len <= EPSILON {
            return Self::ZERO;
        }
        self.scale(1.0 / len)
    }

    /// Returns true if every component is within `tolerance` of `other`.
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Converts `[x, y, z]` into a `Vec3`.
impl From<[f32; 3]> for Vec3 {
    fn from(value: [f32; 3]) -> Self {
        Self { data: value }
    }
}
