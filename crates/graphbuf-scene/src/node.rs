// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene graph nodes.
//!
//! A [`Node`] owns its children, so a tree built from these types is acyclic
//! by construction. Geometries are the only shared resource and are held
//! behind `Arc`.

use std::sync::Arc;

use crate::geometry::Geometry;
use crate::math::{Mat4, Transform};

/// Symbolic node kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// Plain transform node.
    Object3D,
    /// Grouping node.
    Group,
    /// Scene root with background and fog.
    Scene,
    /// Triangle mesh.
    Mesh,
    /// Line strip.
    Line,
    /// Closed line strip.
    LineLoop,
    /// Disjoint line segments.
    LineSegments,
    /// Point cloud.
    Points,
    /// Camera (engine-side only).
    Camera,
    /// Light (engine-side only).
    Light,
}

impl NodeKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Object3D,
        Self::Group,
        Self::Scene,
        Self::Mesh,
        Self::Line,
        Self::LineLoop,
        Self::LineSegments,
        Self::Points,
        Self::Camera,
        Self::Light,
    ];

    /// Kinds that reference a geometry.
    pub const fn is_drawable(self) -> bool {
        matches!(
            self,
            Self::Mesh | Self::Line | Self::LineLoop | Self::LineSegments | Self::Points
        )
    }

    /// Display name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Object3D => "Object3D",
            Self::Group => "Group",
            Self::Scene => "Scene",
            Self::Mesh => "Mesh",
            Self::Line => "Line",
            Self::LineLoop => "LineLoop",
            Self::LineSegments => "LineSegments",
            Self::Points => "Points",
            Self::Camera => "Camera",
            Self::Light => "Light",
        }
    }
}

impl core::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// 24-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorRgb8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl ColorRgb8 {
    /// Creates a color from components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpacks `0xRRGGBB`; the top byte is ignored.
    pub const fn from_hex(hex: u32) -> Self {
        let [_, r, g, b] = hex.to_be_bytes();
        Self { r, g, b }
    }

    /// Packs the color as `0xRRGGBB`.
    pub const fn to_hex(self) -> u32 {
        u32::from_be_bytes([0, self.r, self.g, self.b])
    }
}

/// Distance fog attached to a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fog {
    /// Fog density grows linearly between `near` and `far`.
    Linear {
        /// Fog color.
        color: ColorRgb8,
        /// Distance where fog starts.
        near: f32,
        /// Distance where fog is opaque.
        far: f32,
    },
    /// Fog density grows exponentially with distance.
    Exponential {
        /// Fog color.
        color: ColorRgb8,
        /// Density factor.
        density: f32,
    },
}

/// Scene-wide settings carried by a [`NodeKind::Scene`] node.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneSettings {
    /// Solid background color.
    pub background: Option<ColorRgb8>,
    /// Fog settings.
    pub fog: Option<Fog>,
}

/// Geometry slot of a drawable node.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Drawable {
    /// Shared geometry, if any.
    pub geometry: Option<Arc<Geometry>>,
}

impl Drawable {
    /// Wraps a shared geometry.
    pub fn new(geometry: Arc<Geometry>) -> Self {
        Self {
            geometry: Some(geometry),
        }
    }
}

/// Kind-specific node payload.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeData {
    /// Plain transform node.
    Object3D,
    /// Grouping node.
    Group,
    /// Scene root.
    Scene(SceneSettings),
    /// Triangle mesh.
    Mesh(Drawable),
    /// Line strip.
    Line(Drawable),
    /// Closed line strip.
    LineLoop(Drawable),
    /// Disjoint line segments.
    LineSegments(Drawable),
    /// Point cloud.
    Points(Drawable),
    /// Camera; no payload is modelled.
    Camera,
    /// Light; no payload is modelled.
    Light,
}

impl NodeData {
    /// Symbolic kind of this payload.
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Object3D => NodeKind::Object3D,
            Self::Group => NodeKind::Group,
            Self::Scene(_) => NodeKind::Scene,
            Self::Mesh(_) => NodeKind::Mesh,
            Self::Line(_) => NodeKind::Line,
            Self::LineLoop(_) => NodeKind::LineLoop,
            Self::LineSegments(_) => NodeKind::LineSegments,
            Self::Points(_) => NodeKind::Points,
            Self::Camera => NodeKind::Camera,
            Self::Light => NodeKind::Light,
        }
    }

    /// Empty payload for `kind`.
    pub fn empty(kind: NodeKind) -> Self {
        Self::drawable(kind, Drawable::default())
    }

    /// Payload for `kind` carrying `drawable`. Non-drawable kinds ignore it.
    pub fn drawable(kind: NodeKind, drawable: Drawable) -> Self {
        match kind {
            NodeKind::Object3D => Self::Object3D,
            NodeKind::Group => Self::Group,
            NodeKind::Scene => Self::Scene(SceneSettings::default()),
            NodeKind::Mesh => Self::Mesh(drawable),
            NodeKind::Line => Self::Line(drawable),
            NodeKind::LineLoop => Self::LineLoop(drawable),
            NodeKind::LineSegments => Self::LineSegments(drawable),
            NodeKind::Points => Self::Points(drawable),
            NodeKind::Camera => Self::Camera,
            NodeKind::Light => Self::Light,
        }
    }

    /// Geometry slot of drawable kinds.
    pub fn as_drawable(&self) -> Option<&Drawable> {
        match self {
            Self::Mesh(d)
            | Self::Line(d)
            | Self::LineLoop(d)
            | Self::LineSegments(d)
            | Self::Points(d) => Some(d),
            _ => None,
        }
    }

    /// Scene settings of scene nodes.
    pub fn as_scene(&self) -> Option<&SceneSettings> {
        match self {
            Self::Scene(settings) => Some(settings),
            _ => None,
        }
    }
}

/// Render layer membership bitmask (32 layers).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layers(pub u32);

impl Layers {
    /// Member of layer 0 only.
    pub const DEFAULT: Self = Self(1);
    /// Member of no layer.
    pub const NONE: Self = Self(0);

    /// Raw mask.
    pub const fn mask(self) -> u32 {
        self.0
    }

    /// Adds membership of `layer` (0..32; larger values wrap).
    pub fn enable(&mut self, layer: u32) {
        self.0 |= 1u32.wrapping_shl(layer);
    }

    /// Removes membership of `layer`.
    pub fn disable(&mut self, layer: u32) {
        self.0 &= !1u32.wrapping_shl(layer);
    }

    /// Returns true if `layer` is enabled.
    pub const fn is_enabled(self, layer: u32) -> bool {
        self.0 & 1u32.wrapping_shl(layer) != 0
    }

    /// Returns true if the two masks share any layer.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for Layers {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One element of the scene hierarchy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Identity key, unique per node instance.
    pub uuid: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Kind-specific payload.
    pub data: NodeData,
    /// Local transform, column-major.
    pub matrix: Mat4,
    /// Decomposed local transform. Filled from `matrix` when the node was
    /// decoded with `matrix_auto_update` set.
    pub transform: Option<Transform>,
    /// Drawn when true.
    pub visible: bool,
    /// Casts shadows.
    pub cast_shadow: bool,
    /// Receives shadows.
    pub receive_shadow: bool,
    /// Culled against the view frustum.
    pub frustum_culled: bool,
    /// Local matrix is recomputed from `transform` by the engine.
    pub matrix_auto_update: bool,
    /// Draw order override.
    pub render_order: i32,
    /// Layer membership.
    pub layers: Layers,
    /// Ordered children.
    pub children: Vec<Node>,
}

impl Node {
    /// Creates a node with a fresh identity key and default flags.
    pub fn new(data: NodeData) -> Self {
        Self::with_uuid(crate::new_identity_key(), data)
    }

    /// Creates a node with a caller-chosen identity key.
    pub fn with_uuid(uuid: impl Into<String>, data: NodeData) -> Self {
        Self {
            uuid: uuid.into(),
            name: None,
            data,
            matrix: Mat4::identity(),
            transform: None,
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            frustum_culled: true,
            matrix_auto_update: true,
            render_order: 0,
            layers: Layers::DEFAULT,
            children: Vec::new(),
        }
    }

    /// A plain transform node.
    pub fn object() -> Self {
        Self::new(NodeData::Object3D)
    }

    /// A grouping node.
    pub fn group() -> Self {
        Self::new(NodeData::Group)
    }

    /// A scene root.
    pub fn scene(settings: SceneSettings) -> Self {
        Self::new(NodeData::Scene(settings))
    }

    /// A mesh drawing `geometry`.
    pub fn mesh(geometry: Arc<Geometry>) -> Self {
        Self::new(NodeData::Mesh(Drawable::new(geometry)))
    }

    /// Symbolic kind.
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Geometry of drawable nodes.
    pub fn geometry(&self) -> Option<&Arc<Geometry>> {
        self.data.as_drawable().and_then(|d| d.geometry.as_ref())
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the local matrix and clears any decomposed transform.
    pub fn with_matrix(mut self, matrix: Mat4) -> Self {
        self.matrix = matrix;
        self.transform = None;
        self
    }

    /// Sets the decomposed transform and the matching matrix.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.matrix = transform.to_matrix();
        self.transform = Some(transform);
        self
    }

    /// Appends a child.
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several children in order.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Sets the visibility flag.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Sets both shadow flags.
    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    /// Sets the render order.
    pub fn with_render_order(mut self, render_order: i32) -> Self {
        self.render_order = render_order;
        self
    }

    /// Sets the layer mask.
    pub fn with_layers(mut self, layers: Layers) -> Self {
        self.layers = layers;
        self
    }

    /// Visits this node and its descendants depth-first, parents first.
    pub fn traverse<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        for child in &self.children {
            child.traverse(&mut *visit);
        }
    }

    /// Number of nodes in the subtree, this node included.
    pub fn count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |_| count += 1);
        count
    }

    /// First node in traversal order whose name is `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&Self> {
        self.find(|n| n.name.as_deref() == Some(name))
    }

    /// First node in traversal order whose identity key is `uuid`.
    pub fn find_by_uuid(&self, uuid: &str) -> Option<&Self> {
        self.find(|n| n.uuid == uuid)
    }

    fn find(&self, predicate: impl Fn(&Self) -> bool + Copy) -> Option<&Self> {
        if predicate(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(predicate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_defaults() {
        let node = Node::object();
        assert!(node.visible);
        assert!(node.frustum_culled);
        assert!(node.matrix_auto_update);
        assert!(!node.cast_shadow);
        assert_eq!(node.layers, Layers::DEFAULT);
        assert_eq!(node.matrix, Mat4::identity());
    }

    #[test]
    fn color_hex_roundtrip() {
        let c = ColorRgb8::from_hex(0x00_12_34_56);
        assert_eq!(c, ColorRgb8::new(0x12, 0x34, 0x56));
        assert_eq!(c.to_hex(), 0x12_34_56);
        assert_eq!(ColorRgb8::from_hex(0xFF_00_00_01).to_hex(), 1);
    }

    #[test]
    fn layers_toggle() {
        let mut layers = Layers::NONE;
        layers.enable(3);
        assert!(layers.is_enabled(3));
        assert!(!layers.is_enabled(0));
        layers.disable(3);
        assert_eq!(layers, Layers::NONE);
    }

    #[test]
    fn traversal_is_preorder() {
        let root = Node::group()
            .with_name("a")
            .with_child(Node::object().with_name("b").with_child(Node::object().with_name("c")))
            .with_child(Node::object().with_name("d"));
        let mut names = Vec::new();
        root.traverse(&mut |n| names.push(n.name.clone().unwrap_or_default()));
        assert_eq!(names, ["a", "b", "c", "d"]);
        assert_eq!(root.count(), 4);
        assert_eq!(root.find_by_name("c").map(Node::kind), Some(NodeKind::Object3D));
        assert!(root.find_by_name("z").is_none());
    }

    #[test]
    fn data_kind_roundtrip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeData::empty(kind).kind(), kind);
            assert_eq!(NodeData::empty(kind).as_drawable().is_some(), kind.is_drawable());
        }
    }
}
