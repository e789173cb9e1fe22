// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Slot numbers of every table in a graphbuf document.
//!
//! Slots are append-only: new fields get new slot numbers and readers treat
//! slots beyond a table's declared count as absent.

/// Document root: `{ metadata, root_type, root }`.
pub(crate) mod root {
    pub const SLOTS: u16 = 3;
    pub const METADATA: u16 = 0;
    pub const ROOT_TYPE: u16 = 1;
    pub const ROOT: u16 = 2;
}

/// Metadata: `{ version: f32, generator: string }`.
pub(crate) mod metadata {
    pub const SLOTS: u16 = 2;
    pub const VERSION: u16 = 0;
    pub const GENERATOR: u16 = 1;
}

/// Base block shared by every node kind.
pub(crate) mod base {
    pub const SLOTS: u16 = 12;
    pub const UUID: u16 = 0;
    pub const NAME: u16 = 1;
    pub const CAST_SHADOW: u16 = 2;
    pub const RECEIVE_SHADOW: u16 = 3;
    pub const FRUSTUM_CULLED: u16 = 4;
    pub const RENDER_ORDER: u16 = 5;
    pub const MATRIX: u16 = 6;
    pub const LAYERS: u16 = 7;
    pub const VISIBLE: u16 = 8;
    pub const MATRIX_AUTO_UPDATE: u16 = 9;
    pub const CHILDREN_TYPES: u16 = 10;
    pub const CHILDREN: u16 = 11;
}

/// Kind-specific node records. Slot 0 always holds the base block.
pub(crate) mod node {
    pub const BASE: u16 = 0;
    /// Object3D and Group carry nothing beyond the base block.
    pub const PLAIN_SLOTS: u16 = 1;

    pub const DRAWABLE_SLOTS: u16 = 3;
    pub const GEOMETRY_TYPE: u16 = 1;
    pub const GEOMETRY: u16 = 2;

    pub const SCENE_SLOTS: u16 = 4;
    pub const BACKGROUND: u16 = 1;
    pub const FOG_TYPE: u16 = 2;
    pub const FOG: u16 = 3;
}

/// Fog payload; which fields are present depends on the fog tag.
pub(crate) mod fog {
    pub const SLOTS: u16 = 4;
    pub const COLOR: u16 = 0;
    pub const NEAR: u16 = 1;
    pub const FAR: u16 = 2;
    pub const DENSITY: u16 = 3;
}

/// Geometry record.
pub(crate) mod geometry {
    pub const SLOTS: u16 = 5;
    pub const UUID: u16 = 0;
    pub const NAME: u16 = 1;
    pub const ATTRIBUTES: u16 = 2;
    pub const INDEX_TYPE: u16 = 3;
    pub const INDEX: u16 = 4;
}

/// One entry of a geometry's attribute vector.
pub(crate) mod attribute {
    pub const SLOTS: u16 = 3;
    pub const NAME: u16 = 0;
    pub const ATTRIBUTE_TYPE: u16 = 1;
    pub const ATTRIBUTE: u16 = 2;
}

/// Typed attribute payload.
pub(crate) mod attribute_data {
    pub const SLOTS: u16 = 3;
    pub const ARRAY: u16 = 0;
    pub const ITEM_SIZE: u16 = 1;
    pub const NORMALIZED: u16 = 2;
}

/// Index payload.
pub(crate) mod index {
    pub const SLOTS: u16 = 1;
    pub const ARRAY: u16 = 0;
}
