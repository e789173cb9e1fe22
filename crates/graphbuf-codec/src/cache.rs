// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-call identity caches.
//!
//! A cache lives for exactly one top-level encode or decode and maps
//! identity keys to what was already written or read, so every shared
//! resource crosses the wire once.

use std::sync::Arc;

use graphbuf_scene::{Geometry, Node};
use graphbuf_table::{marker, Offset, Table};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::DecodeError;
use crate::schema;

/// Encoded node: wire tag plus record offset.
pub(crate) type NodeRef = (u8, Offset<marker::Table>);

/// Identity key → encoded record.
#[derive(Debug, Default)]
pub(crate) struct EncodeCache {
    pub nodes: FxHashMap<String, NodeRef>,
    pub geometries: FxHashMap<String, Offset<marker::Table>>,
}

/// Identity key → decoded object.
///
/// Geometries are shared through `Arc`. Nodes are owned by their parent, so
/// a node record referenced from several parents is cloned per use; only
/// such records are kept, found by [`DecodeCache::scan`] before decoding.
#[derive(Debug, Default)]
pub(crate) struct DecodeCache {
    geometries: FxHashMap<String, Arc<Geometry>>,
    geometry_records: FxHashMap<u32, String>,
    nodes: FxHashMap<String, (Node, usize)>,
    node_records: FxHashMap<u32, String>,
    shared_nodes: FxHashSet<u32>,
}

impl DecodeCache {
    /// Builds a cache for the graph under `root`, noting which node records
    /// are referenced more than once.
    ///
    /// The walk is iterative and visits each record once, so it is linear
    /// in the number of distinct records even for hostile inputs.
    pub fn scan(root: Table<'_>) -> Result<Self, DecodeError> {
        let mut seen = FxHashSet::default();
        let mut shared = FxHashSet::default();
        let mut stack = vec![root];
        seen.insert(root.position());
        while let Some(record) = stack.pop() {
            let Some(base) = record.table(schema::node::BASE)? else {
                continue;
            };
            let Some(children) = base.tables(schema::base::CHILDREN)? else {
                continue;
            };
            for child in children.iter() {
                let child = child?;
                if seen.insert(child.position()) {
                    stack.push(child);
                } else {
                    shared.insert(child.position());
                }
            }
        }
        Ok(Self {
            shared_nodes: shared,
            ..Self::default()
        })
    }

    pub fn geometry_at(&self, position: u32) -> Result<Option<Arc<Geometry>>, DecodeError> {
        let Some(uuid) = self.geometry_records.get(&position) else {
            return Ok(None);
        };
        self.geometries
            .get(uuid)
            .cloned()
            .map(Some)
            .ok_or_else(|| DecodeError::CacheMiss { uuid: uuid.clone() })
    }

    pub fn geometry(&self, uuid: &str) -> Option<Arc<Geometry>> {
        self.geometries.get(uuid).cloned()
    }

    pub fn insert_geometry(&mut self, position: u32, geometry: Arc<Geometry>) {
        self.geometry_records.insert(position, geometry.uuid.clone());
        self.geometries.insert(geometry.uuid.clone(), geometry);
    }

    /// Cached node for a record position, with its subtree size.
    pub fn node_at(&self, position: u32) -> Result<Option<(Node, usize)>, DecodeError> {
        let Some(uuid) = self.node_records.get(&position) else {
            return Ok(None);
        };
        self.nodes
            .get(uuid)
            .cloned()
            .map(Some)
            .ok_or_else(|| DecodeError::CacheMiss { uuid: uuid.clone() })
    }

    /// Cached node for an identity key, with its subtree size.
    pub fn node(&self, uuid: &str) -> Option<(Node, usize)> {
        self.nodes.get(uuid).cloned()
    }

    /// Keeps `node` if its record is referenced again later.
    pub fn insert_node(&mut self, position: u32, node: &Node, size: usize) {
        if self.shared_nodes.contains(&position) {
            self.node_records.insert(position, node.uuid.clone());
            self.nodes.insert(node.uuid.clone(), (node.clone(), size));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use graphbuf_scene::Node;
    use graphbuf_table::Buffer;

    use super::*;
    use crate::Encoder;

    fn scene_root(bytes: &[u8]) -> Table<'_> {
        let buffer = Buffer::new(bytes).unwrap();
        buffer
            .root_table()
            .unwrap()
            .table(schema::root::ROOT)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn scan_marks_only_repeated_records() {
        let leaf = Node::object().with_name("leaf");
        let root = Node::group()
            .with_child(leaf.clone())
            .with_child(Node::object())
            .with_child(leaf);
        let bytes = Encoder::default().encode(&root).unwrap();
        let cache = DecodeCache::scan(scene_root(&bytes)).unwrap();
        assert_eq!(cache.shared_nodes.len(), 1);
    }

    #[test]
    fn unshared_nodes_are_not_kept() {
        let bytes = Encoder::default().encode(&Node::group()).unwrap();
        let root = scene_root(&bytes);
        let mut cache = DecodeCache::scan(root).unwrap();
        let node = Node::object();
        cache.insert_node(root.position(), &node, 1);
        assert!(cache.node(&node.uuid).is_none());
        assert!(cache.node_at(root.position()).unwrap().is_none());
    }

    #[test]
    fn dangling_record_is_a_cache_miss() {
        let mut cache = DecodeCache::default();
        cache.node_records.insert(64, "gone".to_owned());
        let err = cache.node_at(64).unwrap_err();
        assert!(matches!(err, DecodeError::CacheMiss { ref uuid } if uuid == "gone"));
    }
}
