// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Document-level encode and decode.
//!
//! A document is a root table `{ metadata, root_type, root }`. Each call
//! creates a fresh session (builder, identity cache, counters) and drops it
//! when the call returns.

use graphbuf_scene::{Node, NodeKind};
use graphbuf_table::{Buffer, Table, TableBuilder};
use tracing::{debug, instrument};

use crate::cache::{DecodeCache, EncodeCache};
use crate::error::{DecodeError, EncodeError};
use crate::node::{decode_node, encode_node};
use crate::options::{CodecOptions, FORMAT_MAJOR};
use crate::registry::{TypeRegistry, TAG_NONE};
use crate::schema;

/// Counters collected while encoding one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Node records written.
    pub nodes_written: usize,
    /// References to a node record written earlier in the document.
    pub nodes_reused: usize,
    /// Nodes left out because their kind is unsupported. Their subtrees are
    /// dropped with them and not counted.
    pub nodes_skipped: usize,
    /// Geometry records written.
    pub geometries_written: usize,
    /// References to a geometry record written earlier in the document.
    pub geometries_reused: usize,
    /// Attributes left out because their element type is unsupported or
    /// their length does not split into whole items.
    pub attributes_skipped: usize,
}

/// Document summary readable without decoding the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    /// Format version from the metadata.
    pub format_version: f32,
    /// Generator name from the metadata, if present.
    pub generator: Option<String>,
    /// Wire tag of the root node.
    pub root_tag: u8,
    /// Kind of the root node, if the default registry knows its tag.
    pub root_kind: Option<NodeKind>,
    /// Buffer size in bytes.
    pub size: usize,
}

pub(crate) struct EncodeSession<'e> {
    pub builder: TableBuilder,
    pub cache: EncodeCache,
    pub registry: &'e TypeRegistry,
    pub options: &'e CodecOptions,
    pub stats: EncodeStats,
}

pub(crate) struct DecodeSession<'e> {
    pub cache: DecodeCache,
    pub registry: &'e TypeRegistry,
    pub options: &'e CodecOptions,
    materialized: usize,
}

impl DecodeSession<'_> {
    /// Charges `nodes` against the node budget.
    pub fn count(&mut self, nodes: usize) -> Result<(), DecodeError> {
        self.materialized = self.materialized.saturating_add(nodes);
        if self.materialized > self.options.max_nodes {
            return Err(DecodeError::TooManyNodes {
                limit: self.options.max_nodes,
            });
        }
        Ok(())
    }
}

/// Scene graph encoder.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    registry: TypeRegistry,
    options: CodecOptions,
}

impl Encoder {
    /// Creates an encoder accepting the kinds in `registry`.
    pub fn new(registry: TypeRegistry, options: CodecOptions) -> Self {
        Self { registry, options }
    }

    /// Encodes the tree under `root` into a new buffer.
    pub fn encode(&self, root: &Node) -> Result<Vec<u8>, EncodeError> {
        self.encode_with_stats(root).map(|(bytes, _)| bytes)
    }

    /// Encodes the tree under `root` and reports what was written.
    #[instrument(skip(self, root), fields(uuid = %root.uuid))]
    pub fn encode_with_stats(&self, root: &Node) -> Result<(Vec<u8>, EncodeStats), EncodeError> {
        let mut session = EncodeSession {
            builder: TableBuilder::new(),
            cache: EncodeCache::default(),
            registry: &self.registry,
            options: &self.options,
            stats: EncodeStats::default(),
        };

        let (root_tag, root_offset) =
            encode_node(&mut session, root, 1)?.ok_or(EncodeError::UnsupportedRoot(root.kind()))?;

        let builder = &mut session.builder;
        let generator = builder.create_string(&self.options.generator)?;
        let mut metadata = builder.start_table(schema::metadata::SLOTS);
        metadata.add_scalar(schema::metadata::VERSION, self.options.format_version)?;
        metadata.add_offset(schema::metadata::GENERATOR, generator)?;
        let metadata = metadata.finish()?;

        let mut document = builder.start_table(schema::root::SLOTS);
        document.add_offset(schema::root::METADATA, metadata)?;
        document.add_scalar(schema::root::ROOT_TYPE, root_tag)?;
        document.add_offset(schema::root::ROOT, root_offset)?;
        let document = document.finish()?;

        let EncodeSession { builder, stats, .. } = session;
        let bytes = builder.finish(document);
        debug!(
            bytes = bytes.len(),
            nodes = stats.nodes_written,
            geometries = stats.geometries_written,
            "document encoded"
        );
        Ok((bytes, stats))
    }

    /// The registry in use.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The options in use.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }
}

/// Scene graph decoder.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    registry: TypeRegistry,
    options: CodecOptions,
}

impl Decoder {
    /// Creates a decoder accepting the kinds in `registry`.
    pub fn new(registry: TypeRegistry, options: CodecOptions) -> Self {
        Self { registry, options }
    }

    /// Decodes a document into a fully materialized tree.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn decode(&self, bytes: &[u8]) -> Result<Node, DecodeError> {
        let document = Buffer::new(bytes)?.root_table()?;
        read_metadata(document)?;

        let root_tag = document
            .scalar::<u8>(schema::root::ROOT_TYPE)?
            .unwrap_or(TAG_NONE);
        let root = document
            .table(schema::root::ROOT)?
            .ok_or(DecodeError::missing("document", "root"))?;

        let mut session = DecodeSession {
            cache: DecodeCache::scan(root)?,
            registry: &self.registry,
            options: &self.options,
            materialized: 0,
        };
        let (node, size) = decode_node(&mut session, root_tag, root, 1)?;
        debug!(nodes = size, "document decoded");
        Ok(node)
    }

    /// The registry in use.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The options in use.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }
}

/// Returns `(format_version, generator)` after checking the major version.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked first
fn read_metadata<'a>(document: Table<'a>) -> Result<(f32, Option<&'a str>), DecodeError> {
    let metadata = document
        .table(schema::root::METADATA)?
        .ok_or(DecodeError::missing("document", "metadata"))?;
    let version = metadata
        .scalar::<f32>(schema::metadata::VERSION)?
        .ok_or(DecodeError::missing("metadata", "version"))?;
    if !version.is_finite() || version < 0.0 || version.trunc() as u32 != FORMAT_MAJOR {
        return Err(DecodeError::UnsupportedFormatVersion {
            found: version,
            supported: FORMAT_MAJOR,
        });
    }
    let generator = metadata.str(schema::metadata::GENERATOR)?;
    Ok((version, generator))
}

/// Reads the document header and root tag without decoding the graph.
pub fn inspect(bytes: &[u8]) -> Result<DocumentInfo, DecodeError> {
    let document = Buffer::new(bytes)?.root_table()?;
    let (format_version, generator) = read_metadata(document)?;
    let root_tag = document
        .scalar::<u8>(schema::root::ROOT_TYPE)?
        .unwrap_or(TAG_NONE);
    Ok(DocumentInfo {
        format_version,
        generator: generator.map(str::to_owned),
        root_tag,
        root_kind: TypeRegistry::default().node_for_tag(root_tag).ok(),
        size: bytes.len(),
    })
}
