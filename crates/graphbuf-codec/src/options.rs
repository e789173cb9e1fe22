// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Encoder and decoder configuration.

/// Format version written into document metadata.
pub const FORMAT_VERSION: f32 = 1.0;

/// Major format version this crate reads.
pub const FORMAT_MAJOR: u32 = 1;

/// Generator name written when none is configured.
pub const DEFAULT_GENERATOR: &str = concat!("graphbuf ", env!("CARGO_PKG_VERSION"));

/// Default nesting limit for node trees.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default limit on nodes materialized by one decode.
pub const DEFAULT_MAX_NODES: usize = 1 << 20;

/// Options shared by [`Encoder`](crate::Encoder) and [`Decoder`](crate::Decoder).
#[derive(Debug, Clone, PartialEq)]
pub struct CodecOptions {
    /// Version stamped into document metadata on encode.
    pub format_version: f32,
    /// Generator name stamped into document metadata on encode.
    pub generator: String,
    /// Deepest node nesting accepted (the root is depth 1).
    pub max_depth: usize,
    /// Most nodes a decode may materialize, reused subtrees counted per use.
    pub max_nodes: usize,
    /// Turn unsupported node kinds and element types into errors instead
    /// of warnings.
    pub strict: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generator: DEFAULT_GENERATOR.to_owned(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
            strict: false,
        }
    }
}

impl CodecOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the generator name.
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// Sets the metadata format version.
    pub fn with_format_version(mut self, version: f32) -> Self {
        self.format_version = version;
        self
    }

    /// Sets the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the node budget for decoding.
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Enables or disables strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
