// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene graph data model for graphbuf.
//!
//! Plain data with no serialization logic: the binary encoding lives in
//! graphbuf-codec.
//!
//! - [`Node`] trees own their children. Each node carries a kind-specific
//!   [`NodeData`] payload, a column-major [`Mat4`](math::Mat4) local matrix
//!   and the usual visibility/shadow flags.
//! - [`Geometry`] is the shared resource. Drawable nodes hold it behind
//!   `Arc`, and pointer-equal geometries are one geometry.
//! - Every node and geometry has a string identity key. Constructors assign
//!   a fresh v4 UUID.
//!
//! # Crate Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for every model type.

use thiserror::Error;

pub mod geometry;
pub mod math;
pub mod node;

pub use geometry::{ArrayKind, Attribute, AttributeArray, Geometry, IndexBuffer, IndexWidth};
pub use node::{ColorRgb8, Drawable, Fog, Layers, Node, NodeData, NodeKind, SceneSettings};

/// Error type for model construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// An attribute was given zero components per vertex.
    #[error("attribute item size must be non-zero")]
    ZeroItemSize,
    /// An attribute array does not hold a whole number of vertices.
    #[error("attribute length {len} is not a multiple of item size {item_size}")]
    RaggedAttribute {
        /// Array length.
        len: usize,
        /// Components per vertex.
        item_size: u32,
    },
}

/// Generates a fresh identity key (hyphenated v4 UUID).
pub fn new_identity_key() -> String {
    uuid::Uuid::new_v4().to_string()
}
