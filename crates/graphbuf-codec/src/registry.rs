// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Numeric type tags for polymorphic fields.
//!
//! Tags are fixed by the wire format; a [`TypeRegistry`] only decides which
//! of them a given encoder or decoder accepts. Tag `0` always means "none".

use graphbuf_scene::{ArrayKind, IndexWidth, NodeKind};
use rustc_hash::FxHashSet;
use thiserror::Error;

/// Tag written when a polymorphic field is absent.
pub const TAG_NONE: u8 = 0;

/// Geometry tag for buffer geometries.
pub const GEOMETRY_BUFFER: u8 = 1;

/// Fog tag for linear fog.
pub const FOG_LINEAR: u8 = 1;
/// Fog tag for exponential fog.
pub const FOG_EXPONENTIAL: u8 = 2;

/// Errors resolving kinds and tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The node kind has no codec or is disabled in this registry.
    #[error("node kind {0} is not supported")]
    UnsupportedNodeKind(NodeKind),
    /// The tag does not name an enabled node kind.
    #[error("unknown node tag {0}")]
    UnknownNodeTag(u8),
    /// The element type is disabled in this registry.
    #[error("attribute element type {0:?} is not supported")]
    UnsupportedArrayKind(ArrayKind),
    /// The tag does not name an enabled element type.
    #[error("unknown attribute tag {0}")]
    UnknownArrayTag(u8),
    /// The tag does not name an index width.
    #[error("unknown index tag {0}")]
    UnknownIndexTag(u8),
}

/// Wire tag of a node kind, or `None` for kinds without a codec.
pub const fn node_tag(kind: NodeKind) -> Option<u8> {
    match kind {
        NodeKind::Object3D => Some(1),
        NodeKind::Group => Some(2),
        NodeKind::Scene => Some(3),
        NodeKind::Mesh => Some(4),
        NodeKind::Line => Some(5),
        NodeKind::LineLoop => Some(6),
        NodeKind::LineSegments => Some(7),
        NodeKind::Points => Some(8),
        NodeKind::Camera | NodeKind::Light => None,
    }
}

/// Wire tag of an attribute element type.
pub const fn array_tag(kind: ArrayKind) -> u8 {
    match kind {
        ArrayKind::F32 => 1,
        ArrayKind::F64 => 2,
        ArrayKind::I8 => 3,
        ArrayKind::U8 => 4,
        ArrayKind::I16 => 5,
        ArrayKind::U16 => 6,
        ArrayKind::I32 => 7,
        ArrayKind::U32 => 8,
    }
}

/// Wire tag of an index width.
pub const fn index_tag(width: IndexWidth) -> u8 {
    match width {
        IndexWidth::U16 => 1,
        IndexWidth::U32 => 2,
    }
}

/// Index width for `tag`; `Ok(None)` for [`TAG_NONE`].
pub const fn index_width(tag: u8) -> Result<Option<IndexWidth>, RegistryError> {
    match tag {
        TAG_NONE => Ok(None),
        1 => Ok(Some(IndexWidth::U16)),
        2 => Ok(Some(IndexWidth::U32)),
        other => Err(RegistryError::UnknownIndexTag(other)),
    }
}

/// The set of node kinds and element types a codec accepts.
///
/// The default registry enables every node kind that has a codec and every
/// element type except `f64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    nodes: FxHashSet<NodeKind>,
    arrays: FxHashSet<ArrayKind>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self {
            nodes: NodeKind::ALL
                .into_iter()
                .filter(|kind| node_tag(*kind).is_some())
                .collect(),
            arrays: ArrayKind::ALL
                .into_iter()
                .filter(|kind| *kind != ArrayKind::F64)
                .collect(),
        }
    }
}

impl TypeRegistry {
    /// The default registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry accepting nothing.
    pub fn empty() -> Self {
        Self {
            nodes: FxHashSet::default(),
            arrays: FxHashSet::default(),
        }
    }

    /// Accepts `kind`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnsupportedNodeKind`] for kinds without a codec.
    pub fn enable_node(&mut self, kind: NodeKind) -> Result<&mut Self, RegistryError> {
        if node_tag(kind).is_none() {
            return Err(RegistryError::UnsupportedNodeKind(kind));
        }
        self.nodes.insert(kind);
        Ok(self)
    }

    /// Stops accepting `kind`.
    pub fn disable_node(&mut self, kind: NodeKind) -> &mut Self {
        self.nodes.remove(&kind);
        self
    }

    /// Accepts element type `kind`.
    pub fn enable_array(&mut self, kind: ArrayKind) -> &mut Self {
        self.arrays.insert(kind);
        self
    }

    /// Stops accepting element type `kind`.
    pub fn disable_array(&mut self, kind: ArrayKind) -> &mut Self {
        self.arrays.remove(&kind);
        self
    }

    /// Tag for an enabled node kind.
    pub fn tag_for_node(&self, kind: NodeKind) -> Result<u8, RegistryError> {
        node_tag(kind)
            .filter(|_| self.nodes.contains(&kind))
            .ok_or(RegistryError::UnsupportedNodeKind(kind))
    }

    /// Enabled node kind for `tag`.
    pub fn node_for_tag(&self, tag: u8) -> Result<NodeKind, RegistryError> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| node_tag(*kind) == Some(tag) && self.nodes.contains(kind))
            .ok_or(RegistryError::UnknownNodeTag(tag))
    }

    /// Tag for an enabled element type.
    pub fn tag_for_array(&self, kind: ArrayKind) -> Result<u8, RegistryError> {
        if self.arrays.contains(&kind) {
            Ok(array_tag(kind))
        } else {
            Err(RegistryError::UnsupportedArrayKind(kind))
        }
    }

    /// Enabled element type for `tag`.
    pub fn array_for_tag(&self, tag: u8) -> Result<ArrayKind, RegistryError> {
        ArrayKind::ALL
            .into_iter()
            .find(|kind| array_tag(*kind) == tag && self.arrays.contains(kind))
            .ok_or(RegistryError::UnknownArrayTag(tag))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn node_tags_are_bidirectional() {
        let registry = TypeRegistry::new();
        for kind in NodeKind::ALL {
            match registry.tag_for_node(kind) {
                Ok(tag) => assert_eq!(registry.node_for_tag(tag).unwrap(), kind),
                Err(err) => {
                    assert!(matches!(kind, NodeKind::Camera | NodeKind::Light));
                    assert_eq!(err, RegistryError::UnsupportedNodeKind(kind));
                }
            }
        }
        assert_eq!(
            registry.node_for_tag(TAG_NONE),
            Err(RegistryError::UnknownNodeTag(0))
        );
    }

    #[test]
    fn array_tags_are_bidirectional() {
        let mut registry = TypeRegistry::new();
        registry.enable_array(ArrayKind::F64);
        for kind in ArrayKind::ALL {
            let tag = registry.tag_for_array(kind).unwrap();
            assert_ne!(tag, TAG_NONE);
            assert_eq!(registry.array_for_tag(tag).unwrap(), kind);
        }
    }

    #[test]
    fn default_registry_excludes_f64() {
        let registry = TypeRegistry::default();
        assert_eq!(
            registry.tag_for_array(ArrayKind::F64),
            Err(RegistryError::UnsupportedArrayKind(ArrayKind::F64))
        );
        assert_eq!(
            registry.array_for_tag(array_tag(ArrayKind::F64)),
            Err(RegistryError::UnknownArrayTag(2))
        );
    }

    #[test]
    fn disabled_kinds_have_no_tag() {
        let mut registry = TypeRegistry::new();
        registry.disable_node(NodeKind::Mesh);
        assert!(registry.tag_for_node(NodeKind::Mesh).is_err());
        assert!(registry.node_for_tag(4).is_err());
        assert!(registry.enable_node(NodeKind::Camera).is_err());
        registry.enable_node(NodeKind::Mesh).unwrap();
        assert_eq!(registry.node_for_tag(4).unwrap(), NodeKind::Mesh);
    }

    #[test]
    fn index_tags() {
        assert_eq!(index_width(index_tag(IndexWidth::U16)), Ok(Some(IndexWidth::U16)));
        assert_eq!(index_width(index_tag(IndexWidth::U32)), Ok(Some(IndexWidth::U32)));
        assert_eq!(index_width(TAG_NONE), Ok(None));
        assert_eq!(index_width(9), Err(RegistryError::UnknownIndexTag(9)));
    }
}
