// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sample graphs and comparison helpers for tests.
//!
//! Enabled by the `test-utils` feature.

use std::sync::Arc;

use graphbuf_scene::math::{Mat4, Quat, Transform, Vec3};
use graphbuf_scene::{
    Attribute, AttributeArray, ColorRgb8, Fog, Geometry, IndexBuffer, Layers, Node, NodeData,
    NodeKind, SceneSettings,
};
use rustc_hash::FxHashMap;

use crate::schema;

fn attribute(array: AttributeArray, item_size: u32) -> Attribute {
    match Attribute::new(array, item_size) {
        Ok(attribute) => attribute,
        Err(err) => unreachable!("fixture attribute is well formed: {err}"),
    }
}

/// A named triangle with positions, normals and a 16-bit index.
pub fn triangle(name: &str) -> Geometry {
    Geometry::new()
        .with_name(name)
        .with_attribute(
            "position",
            attribute(
                AttributeArray::F32(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
                3,
            ),
        )
        .with_attribute(
            "normal",
            attribute(AttributeArray::F32(vec![0.0, 0.0, 1.0].repeat(3)), 3),
        )
        .with_index(IndexBuffer::U16(vec![0, 1, 2]))
}

/// A quad strip whose index needs 32 bits.
pub fn wide_index_quad() -> Geometry {
    Geometry::new()
        .with_name("wide")
        .with_attribute(
            "position",
            attribute(AttributeArray::F32(vec![0.5; 12]), 3),
        )
        .with_attribute(
            "color",
            attribute(AttributeArray::U8(vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 9, 9, 9]), 3)
                .with_normalized(true),
        )
        .with_index(IndexBuffer::U32(vec![0, 1, 2, 70_000]))
}

/// A scene exercising every codec node kind with one geometry shared by
/// two meshes.
///
/// Returns the scene and the shared geometry.
pub fn sample_scene() -> (Node, Arc<Geometry>) {
    let shared = Arc::new(triangle("shared"));
    let wide = Arc::new(wide_index_quad());

    let mut layers = Layers::DEFAULT;
    layers.enable(5);

    let left = Node::mesh(Arc::clone(&shared))
        .with_name("left")
        .with_matrix(Mat4::translation(-1.0, 0.0, 0.0))
        .with_shadows(true, false);
    let right = Node::mesh(Arc::clone(&shared))
        .with_name("right")
        .with_transform(Transform {
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::from_axis_angle(Vec3::UNIT_Y, 0.5),
            scale: Vec3::new(-1.0, 2.0, 1.0),
        })
        .with_render_order(7)
        .with_layers(layers);
    let mut frozen = Node::new(NodeData::Points(graphbuf_scene::Drawable::new(wide)))
        .with_name("points")
        .with_visible(false)
        .with_matrix(Mat4::scale(2.0, 2.0, 2.0));
    frozen.matrix_auto_update = false;
    frozen.frustum_culled = false;

    let lines = Node::new(NodeData::empty(NodeKind::Line))
        .with_name("empty line")
        .with_child(Node::new(NodeData::empty(NodeKind::LineLoop)))
        .with_child(Node::new(NodeData::empty(NodeKind::LineSegments)));

    let scene = Node::scene(SceneSettings {
        background: Some(ColorRgb8::from_hex(0x20_30_40)),
        fog: Some(Fog::Linear {
            color: ColorRgb8::new(200, 200, 210),
            near: 1.0,
            far: 250.0,
        }),
    })
    .with_name("scene")
    .with_child(
        Node::group()
            .with_name("pair")
            .with_child(left)
            .with_child(right),
    )
    .with_child(frozen)
    .with_child(lines)
    .with_child(Node::object().with_name("marker"));
    (scene, shared)
}

/// A single chain of `depth` nested nodes.
pub fn chain(depth: usize) -> Node {
    let mut node = Node::object().with_name(format!("n{}", depth.saturating_sub(1)));
    for level in (0..depth.saturating_sub(1)).rev() {
        node = Node::group().with_name(format!("n{level}")).with_child(node);
    }
    node
}

/// Overwrites the root node tag of an encoded document.
///
/// Returns `None` if the bytes do not look like a document.
pub fn patch_root_tag(bytes: &mut [u8], tag: u8) -> Option<()> {
    let read_u32 = |bytes: &[u8], at: usize| -> Option<usize> {
        let raw: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
        usize::try_from(u32::from_le_bytes(raw)).ok()
    };
    let root = read_u32(bytes, 8)?;
    let rel = read_u32(bytes, root + 4 + usize::from(schema::root::ROOT_TYPE) * 4)?;
    *bytes.get_mut(root + rel)? = tag;
    Some(())
}

/// Checks that `actual` matches `expected` field by field, and that
/// geometries sharing an identity key in `actual` share one allocation.
///
/// Decoded nodes carry a decomposed transform where the source may not;
/// that field is compared only through the matrix.
pub fn compare_graphs(expected: &Node, actual: &Node) -> Result<(), String> {
    let mut seen = FxHashMap::default();
    compare_nodes(expected, actual, &mut seen, "root")
}

fn compare_nodes(
    expected: &Node,
    actual: &Node,
    seen: &mut FxHashMap<String, Arc<Geometry>>,
    path: &str,
) -> Result<(), String> {
    let check = |ok: bool, what: &str| -> Result<(), String> {
        if ok {
            Ok(())
        } else {
            Err(format!("{path}: {what} differs"))
        }
    };
    check(expected.uuid == actual.uuid, "uuid")?;
    check(expected.name == actual.name, "name")?;
    check(expected.kind() == actual.kind(), "kind")?;
    check(expected.matrix == actual.matrix, "matrix")?;
    check(expected.visible == actual.visible, "visible")?;
    check(expected.cast_shadow == actual.cast_shadow, "cast_shadow")?;
    check(expected.receive_shadow == actual.receive_shadow, "receive_shadow")?;
    check(expected.frustum_culled == actual.frustum_culled, "frustum_culled")?;
    check(expected.matrix_auto_update == actual.matrix_auto_update, "matrix_auto_update")?;
    check(expected.render_order == actual.render_order, "render_order")?;
    check(expected.layers == actual.layers, "layers")?;
    check(expected.data.as_scene() == actual.data.as_scene(), "scene settings")?;

    match (expected.geometry(), actual.geometry()) {
        (None, None) => {}
        (Some(want), Some(got)) => {
            check(**want == **got, "geometry")?;
            check(want.attributes.keys().eq(got.attributes.keys()), "attribute order")?;
            if let Some(first) = seen.get(&got.uuid) {
                check(Arc::ptr_eq(first, got), "geometry sharing")?;
            } else {
                seen.insert(got.uuid.clone(), Arc::clone(got));
            }
        }
        _ => check(false, "geometry presence")?,
    }

    check(expected.children.len() == actual.children.len(), "child count")?;
    for (i, (want, got)) in expected.children.iter().zip(&actual.children).enumerate() {
        compare_nodes(want, got, seen, &format!("{path}/{i}"))?;
    }
    Ok(())
}
