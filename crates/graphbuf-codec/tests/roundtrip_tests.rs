// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used)]

use std::sync::Arc;

use graphbuf_codec::fixtures::{compare_graphs, sample_scene, triangle, wide_index_quad};
use graphbuf_codec::{
    decode_scene, encode_scene, inspect, CodecOptions, Decoder, Encoder, TypeRegistry,
};
use graphbuf_scene::math::{Quat, Vec3};
use graphbuf_scene::{
    ColorRgb8, Fog, IndexBuffer, IndexWidth, Node, NodeData, NodeKind, SceneSettings,
};

#[test]
fn sample_scene_roundtrips() {
    let (scene, _) = sample_scene();
    let decoded = decode_scene(&encode_scene(&scene).unwrap()).unwrap();
    compare_graphs(&scene, &decoded).unwrap();
}

#[test]
fn shared_geometry_decodes_to_one_instance() {
    let (scene, shared) = sample_scene();
    let decoded = decode_scene(&encode_scene(&scene).unwrap()).unwrap();

    let left = decoded.find_by_name("left").unwrap().geometry().unwrap();
    let right = decoded.find_by_name("right").unwrap().geometry().unwrap();
    assert!(Arc::ptr_eq(left, right));
    assert_eq!(**left, *shared);

    let points = decoded.find_by_name("points").unwrap().geometry().unwrap();
    assert!(!Arc::ptr_eq(left, points));
}

#[test]
fn shared_geometry_is_written_once() {
    let (scene, _) = sample_scene();
    let (_, stats) = Encoder::default().encode_with_stats(&scene).unwrap();
    assert_eq!(stats.geometries_written, 2);
    assert_eq!(stats.geometries_reused, 1);
    assert_eq!(stats.nodes_written, scene.count());

    // Two meshes over one geometry are smaller than two over copies.
    let geometry = Arc::new(triangle("t"));
    let shared = Node::group()
        .with_child(Node::mesh(Arc::clone(&geometry)))
        .with_child(Node::mesh(Arc::clone(&geometry)));
    let copied = Node::group()
        .with_child(Node::mesh(Arc::clone(&geometry)))
        .with_child(Node::mesh(Arc::new(triangle("t"))));
    let (shared_bytes, shared_stats) = Encoder::default().encode_with_stats(&shared).unwrap();
    let (copied_bytes, copied_stats) = Encoder::default().encode_with_stats(&copied).unwrap();
    assert_eq!(shared_stats.geometries_written, 1);
    assert_eq!(copied_stats.geometries_written, 2);
    assert!(shared_bytes.len() < copied_bytes.len());
}

#[test]
fn index_width_is_preserved() {
    let small_u32 = Arc::new(triangle("small").with_index(IndexBuffer::U32(vec![0, 1, 2])));
    let root = Node::group()
        .with_child(Node::mesh(Arc::new(triangle("u16"))).with_name("u16"))
        .with_child(Node::mesh(Arc::new(wide_index_quad())).with_name("u32"))
        .with_child(Node::mesh(small_u32).with_name("small"));
    let decoded = decode_scene(&encode_scene(&root).unwrap()).unwrap();

    let width = |name: &str| {
        decoded
            .find_by_name(name)
            .and_then(Node::geometry)
            .and_then(|g| g.index.as_ref())
            .map(IndexBuffer::width)
    };
    assert_eq!(width("u16"), Some(IndexWidth::U16));
    assert_eq!(width("u32"), Some(IndexWidth::U32));
    // Small values declared as 32-bit stay 32-bit.
    assert_eq!(width("small"), Some(IndexWidth::U32));
}

#[test]
fn empty_root_roundtrips() {
    let root = Node::object();
    let decoded = decode_scene(&encode_scene(&root).unwrap()).unwrap();
    assert_eq!(decoded.kind(), NodeKind::Object3D);
    assert_eq!(decoded.uuid, root.uuid);
    assert!(decoded.children.is_empty());
    assert!(decoded.geometry().is_none());
    compare_graphs(&root, &decoded).unwrap();
}

#[test]
fn drawable_without_geometry_roundtrips() {
    let root = Node::new(NodeData::empty(NodeKind::Points)).with_name("bare");
    let decoded = decode_scene(&encode_scene(&root).unwrap()).unwrap();
    assert_eq!(decoded.kind(), NodeKind::Points);
    assert!(decoded.geometry().is_none());
}

#[test]
fn auto_update_nodes_get_decomposed_transform() {
    let (scene, _) = sample_scene();
    let decoded = decode_scene(&encode_scene(&scene).unwrap()).unwrap();

    let right = decoded.find_by_name("right").unwrap();
    let transform = right.transform.unwrap();
    assert!(transform.position.approx_eq(&Vec3::new(1.0, 0.0, 0.0), 1e-5));
    assert!(transform.scale.approx_eq(&Vec3::new(-1.0, 2.0, 1.0), 1e-5));
    assert!(transform
        .rotation
        .approx_eq(&Quat::from_axis_angle(Vec3::UNIT_Y, 0.5), 1e-5));

    let frozen = decoded.find_by_name("points").unwrap();
    assert!(!frozen.matrix_auto_update);
    assert!(frozen.transform.is_none());
}

#[test]
fn repeated_node_is_written_once_and_reused() {
    let leaf = Node::mesh(Arc::new(triangle("leaf"))).with_name("leaf");
    let root = Node::group()
        .with_child(leaf.clone())
        .with_child(Node::object().with_name("middle"))
        .with_child(leaf);
    let (bytes, stats) = Encoder::default().encode_with_stats(&root).unwrap();
    assert_eq!(stats.nodes_written, 3);
    assert_eq!(stats.nodes_reused, 1);

    let decoded = decode_scene(&bytes).unwrap();
    assert_eq!(decoded.children.len(), 3);
    assert_eq!(decoded.children[0].uuid, decoded.children[2].uuid);
    assert!(Arc::ptr_eq(
        decoded.children[0].geometry().unwrap(),
        decoded.children[2].geometry().unwrap()
    ));
    compare_graphs(&root, &decoded).unwrap();
}

#[test]
fn child_order_is_preserved() {
    let names = ["d", "a", "c", "b", "e"];
    let root = Node::group().with_children(names.iter().map(|n| Node::object().with_name(*n)));
    let decoded = decode_scene(&encode_scene(&root).unwrap()).unwrap();
    let got: Vec<_> = decoded
        .children
        .iter()
        .map(|c| c.name.as_deref().unwrap())
        .collect();
    assert_eq!(got, names);
}

#[test]
fn scene_settings_roundtrip() {
    for settings in [
        SceneSettings::default(),
        SceneSettings {
            background: Some(ColorRgb8::new(1, 2, 3)),
            fog: None,
        },
        SceneSettings {
            background: None,
            fog: Some(Fog::Exponential {
                color: ColorRgb8::new(9, 8, 7),
                density: 0.025,
            }),
        },
    ] {
        let root = Node::scene(settings);
        let decoded = decode_scene(&encode_scene(&root).unwrap()).unwrap();
        assert_eq!(decoded.data.as_scene(), Some(&settings));
    }
}

#[test]
fn inspect_reads_metadata_without_decoding() {
    let (scene, _) = sample_scene();
    let encoder = Encoder::new(
        TypeRegistry::default(),
        CodecOptions::default().with_generator("unit-test"),
    );
    let bytes = encoder.encode(&scene).unwrap();
    let info = inspect(&bytes).unwrap();
    assert_eq!(info.generator.as_deref(), Some("unit-test"));
    assert!((info.format_version - 1.0).abs() < f32::EPSILON);
    assert_eq!(info.root_kind, Some(NodeKind::Scene));
    assert_eq!(info.size, bytes.len());
}

#[test]
fn minor_format_versions_are_accepted() {
    let encoder = Encoder::new(
        TypeRegistry::default(),
        CodecOptions::default().with_format_version(1.5),
    );
    let bytes = encoder.encode(&Node::group()).unwrap();
    assert!(Decoder::default().decode(&bytes).is_ok());
}
