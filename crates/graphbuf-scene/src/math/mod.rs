// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Transform math for scene nodes: vectors, quaternions and column-major
//! 4×4 matrices, plus the translation/rotation/scale split used when a node
//! keeps its local transform in decomposed form.
//!
//! All operations use `f32` to match the precision stored on the wire.

mod mat4;
mod quat;
mod transform;
mod vec3;

pub use mat4::Mat4;
pub use quat::Quat;
pub use transform::Transform;
pub use vec3::Vec3;

/// Global epsilon used by math routines when detecting degenerate values.
pub const EPSILON: f32 = 1e-6;
