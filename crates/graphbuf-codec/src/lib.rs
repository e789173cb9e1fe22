// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Binary codec for graphbuf scene graphs.
//!
//! Encodes a [`Node`] tree into a single table buffer and back. Shared
//! geometries (and repeated nodes) are written once and referenced by
//! offset; on decode every reference to the same geometry yields the same
//! `Arc`.
//!
//! Node kinds and attribute element types travel as small numeric tags
//! (see [`registry`]). Tags a [`TypeRegistry`] does not accept are handled
//! leniently by default:
//!
//! - encode: unsupported nodes are left out, unsupported attributes dropped;
//! - decode: unknown node tags become plain `Object3D` nodes that keep their
//!   base fields and children, unknown attribute tags are dropped.
//!
//! Each case is logged with `tracing::warn!`. With
//! [`CodecOptions::strict`] set they become errors instead. A malformed
//! buffer always fails the whole decode.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use graphbuf_scene::{Attribute, AttributeArray, Geometry, Node};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let triangle = Arc::new(Geometry::new().with_attribute(
//!     "position",
//!     Attribute::new(AttributeArray::F32(vec![0.0; 9]), 3)?,
//! ));
//! let scene = Node::group()
//!     .with_child(Node::mesh(Arc::clone(&triangle)))
//!     .with_child(Node::mesh(triangle));
//!
//! let bytes = graphbuf_codec::encode_scene(&scene)?;
//! let decoded = graphbuf_codec::decode_scene(&bytes)?;
//! let a = decoded.children[0].geometry().ok_or("missing geometry")?;
//! let b = decoded.children[1].geometry().ok_or("missing geometry")?;
//! assert!(Arc::ptr_eq(a, b));
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Features
//!
//! - `test-utils`: exposes [`fixtures`] for building sample graphs in tests.

mod cache;
mod error;
mod geometry;
mod node;
pub mod options;
pub mod registry;
mod root;
mod schema;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

use graphbuf_scene::Node;

pub use error::{DecodeError, EncodeError};
pub use options::CodecOptions;
pub use registry::{RegistryError, TypeRegistry};
pub use root::{inspect, Decoder, DocumentInfo, EncodeStats, Encoder};

/// Encodes `root` with the default registry and options.
pub fn encode_scene(root: &Node) -> Result<Vec<u8>, EncodeError> {
    Encoder::default().encode(root)
}

/// Decodes a document with the default registry and options.
pub fn decode_scene(bytes: &[u8]) -> Result<Node, DecodeError> {
    Decoder::default().decode(bytes)
}
