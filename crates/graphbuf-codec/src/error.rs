// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use graphbuf_scene::{ModelError, NodeKind};
use graphbuf_table::TableError;
use thiserror::Error;

use crate::registry::RegistryError;

/// Errors produced while encoding a scene graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The table engine refused a write.
    #[error(transparent)]
    Table(#[from] TableError),
    /// A kind or element type was rejected in strict mode.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The root node itself has no codec, leaving nothing to encode.
    #[error("root node kind {0} cannot be encoded")]
    UnsupportedRoot(NodeKind),
    /// An attribute breaks the item-size invariant, in strict mode.
    #[error("attribute {name:?} is invalid: {source}")]
    InvalidAttribute {
        /// Attribute name.
        name: String,
        /// Underlying model error.
        source: ModelError,
    },
    /// The tree nests deeper than the configured limit.
    #[error("node tree exceeds maximum depth {max_depth}")]
    DepthExceeded {
        /// Configured limit.
        max_depth: usize,
    },
}

/// Errors produced while decoding a document.
///
/// Every variant aborts the decode; no partial tree is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The buffer is not a valid table buffer or a reference is bad.
    #[error("malformed buffer: {0}")]
    Table(#[from] TableError),
    /// A tag was rejected in strict mode, or an index tag is unknown.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A required field is absent.
    #[error("{record} record is missing {field}")]
    MissingField {
        /// Record type.
        record: &'static str,
        /// Field name.
        field: &'static str,
    },
    /// The metadata names a format this crate cannot read.
    #[error("unsupported format version {found} (supported major version {supported})")]
    UnsupportedFormatVersion {
        /// Version found in the metadata.
        found: f32,
        /// Major version this crate reads.
        supported: u32,
    },
    /// The child type and child offset vectors differ in length.
    #[error("node has {types} child tags but {offsets} child offsets")]
    ChildrenMismatch {
        /// Length of the tag vector.
        types: usize,
        /// Length of the offset vector.
        offsets: usize,
    },
    /// An attribute payload violates the attribute invariants.
    #[error("attribute {name:?} is invalid: {source}")]
    InvalidAttribute {
        /// Attribute name.
        name: String,
        /// Underlying model error.
        source: ModelError,
    },
    /// The tree nests deeper than the configured limit.
    #[error("node tree exceeds maximum depth {max_depth}")]
    DepthExceeded {
        /// Configured limit.
        max_depth: usize,
    },
    /// Reused subtrees expand to more nodes than the configured limit.
    #[error("document expands to more than {limit} nodes")]
    TooManyNodes {
        /// Configured limit.
        limit: usize,
    },
    /// A record marked as decoded has no cached object.
    #[error("identity cache has no entry for decoded record {uuid:?}")]
    CacheMiss {
        /// Identity key of the record.
        uuid: String,
    },
}

impl DecodeError {
    pub(crate) const fn missing(record: &'static str, field: &'static str) -> Self {
        Self::MissingField { record, field }
    }
}
