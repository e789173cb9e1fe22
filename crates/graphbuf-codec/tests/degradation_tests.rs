// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used)]

use std::sync::Arc;

use graphbuf_codec::fixtures::{patch_root_tag, triangle};
use graphbuf_codec::{
    decode_scene, encode_scene, CodecOptions, DecodeError, Decoder, EncodeError, Encoder,
    RegistryError, TypeRegistry,
};
use graphbuf_scene::math::Mat4;
use graphbuf_scene::{
    ArrayKind, Attribute, AttributeArray, IndexBuffer, Node, NodeData, NodeKind,
};

fn strict() -> CodecOptions {
    CodecOptions::default().with_strict(true)
}

fn mesh_root() -> Node {
    Node::mesh(Arc::new(triangle("tri")))
        .with_name("mesh")
        .with_matrix(Mat4::translation(3.0, 2.0, 1.0))
        .with_shadows(true, true)
        .with_render_order(-4)
        .with_child(Node::object().with_name("child"))
}

#[test]
fn unknown_root_tag_decodes_as_generic_node() {
    let root = mesh_root();
    let mut bytes = encode_scene(&root).unwrap();
    patch_root_tag(&mut bytes, 200).unwrap();

    let decoded = decode_scene(&bytes).unwrap();
    assert_eq!(decoded.kind(), NodeKind::Object3D);
    assert_eq!(decoded.uuid, root.uuid);
    assert_eq!(decoded.name.as_deref(), Some("mesh"));
    assert_eq!(decoded.matrix, root.matrix);
    assert!(decoded.cast_shadow && decoded.receive_shadow);
    assert_eq!(decoded.render_order, -4);
    assert!(decoded.geometry().is_none());
    assert_eq!(decoded.children.len(), 1);
    assert_eq!(decoded.children[0].name.as_deref(), Some("child"));
}

#[test]
fn unknown_tag_is_an_error_in_strict_mode() {
    let mut bytes = encode_scene(&mesh_root()).unwrap();
    patch_root_tag(&mut bytes, 200).unwrap();
    let err = Decoder::new(TypeRegistry::default(), strict())
        .decode(&bytes)
        .unwrap_err();
    assert_eq!(err, DecodeError::Registry(RegistryError::UnknownNodeTag(200)));
}

#[test]
fn kind_disabled_in_decoder_degrades_nested_nodes() {
    let root = Node::group().with_child(mesh_root());
    let bytes = encode_scene(&root).unwrap();
    let mut registry = TypeRegistry::default();
    registry.disable_node(NodeKind::Mesh);

    let decoded = Decoder::new(registry, CodecOptions::default())
        .decode(&bytes)
        .unwrap();
    let degraded = &decoded.children[0];
    assert_eq!(degraded.kind(), NodeKind::Object3D);
    assert_eq!(degraded.name.as_deref(), Some("mesh"));
    assert_eq!(degraded.children.len(), 1);
}

#[test]
fn unsupported_children_are_omitted() {
    let root = Node::group()
        .with_child(Node::new(NodeData::Camera).with_name("camera"))
        .with_child(Node::object().with_name("kept"))
        .with_child(
            Node::new(NodeData::Light).with_child(Node::object().with_name("under light")),
        );
    let (bytes, stats) = Encoder::default().encode_with_stats(&root).unwrap();
    assert_eq!(stats.nodes_skipped, 2);

    let decoded = decode_scene(&bytes).unwrap();
    assert_eq!(decoded.children.len(), 1);
    assert_eq!(decoded.children[0].name.as_deref(), Some("kept"));
    assert!(decoded.find_by_name("under light").is_none());
}

#[test]
fn unsupported_root_is_an_error() {
    let err = encode_scene(&Node::new(NodeData::Camera)).unwrap_err();
    assert_eq!(err, EncodeError::UnsupportedRoot(NodeKind::Camera));
}

#[test]
fn unsupported_child_is_an_error_in_strict_mode() {
    let root = Node::group().with_child(Node::new(NodeData::Light));
    let err = Encoder::new(TypeRegistry::default(), strict())
        .encode(&root)
        .unwrap_err();
    assert_eq!(
        err,
        EncodeError::Registry(RegistryError::UnsupportedNodeKind(NodeKind::Light))
    );
}

fn geometry_with_f64() -> graphbuf_scene::Geometry {
    triangle("mixed").with_attribute(
        "weights",
        Attribute::new(AttributeArray::F64(vec![0.25; 3]), 1).unwrap(),
    )
}

#[test]
fn unsupported_attribute_is_skipped_on_encode() {
    let geometry = geometry_with_f64();
    let root = Node::mesh(Arc::new(geometry.clone()));
    let (bytes, stats) = Encoder::default().encode_with_stats(&root).unwrap();
    assert_eq!(stats.attributes_skipped, 1);

    let decoded = decode_scene(&bytes).unwrap();
    let got = decoded.geometry().unwrap();
    assert!(got.attribute("weights").is_none());
    assert_eq!(
        got.attributes.keys().collect::<Vec<_>>(),
        ["position", "normal"]
    );
    assert_eq!(got.vertex_count(), geometry.vertex_count());
    assert_eq!(got.index, Some(IndexBuffer::U16(vec![0, 1, 2])));
}

#[test]
fn unknown_attribute_tag_is_skipped_on_decode() {
    let mut wide = TypeRegistry::default();
    wide.enable_array(ArrayKind::F64);
    let root = Node::mesh(Arc::new(geometry_with_f64()));
    let bytes = Encoder::new(wide.clone(), CodecOptions::default())
        .encode(&root)
        .unwrap();

    // A decoder that knows f64 keeps it.
    let full = Decoder::new(wide, CodecOptions::default())
        .decode(&bytes)
        .unwrap();
    assert_eq!(
        full.geometry().unwrap().attribute("weights").map(Attribute::kind),
        Some(ArrayKind::F64)
    );

    // The default decoder drops it.
    let lenient = decode_scene(&bytes).unwrap();
    assert!(lenient.geometry().unwrap().attribute("weights").is_none());
    assert_eq!(lenient.geometry().unwrap().attributes.len(), 2);

    let err = Decoder::new(TypeRegistry::default(), strict())
        .decode(&bytes)
        .unwrap_err();
    assert_eq!(err, DecodeError::Registry(RegistryError::UnknownArrayTag(2)));
}

#[test]
fn unsupported_attribute_is_an_error_in_strict_mode() {
    let root = Node::mesh(Arc::new(geometry_with_f64()));
    let err = Encoder::new(TypeRegistry::default(), strict())
        .encode(&root)
        .unwrap_err();
    assert_eq!(
        err,
        EncodeError::Registry(RegistryError::UnsupportedArrayKind(ArrayKind::F64))
    );
}

#[test]
fn every_element_type_roundtrips_when_enabled() {
    let mut registry = TypeRegistry::default();
    registry.enable_array(ArrayKind::F64);
    let geometry = graphbuf_scene::Geometry::new()
        .with_attribute("f32", Attribute::new(AttributeArray::F32(vec![1.5, -2.5]), 2).unwrap())
        .with_attribute("f64", Attribute::new(AttributeArray::F64(vec![1e300]), 1).unwrap())
        .with_attribute("i8", Attribute::new(AttributeArray::I8(vec![-128, 127]), 1).unwrap())
        .with_attribute(
            "u8",
            Attribute::new(AttributeArray::U8(vec![0, 255]), 2)
                .unwrap()
                .with_normalized(true),
        )
        .with_attribute("i16", Attribute::new(AttributeArray::I16(vec![-1, 2, -3]), 3).unwrap())
        .with_attribute("u16", Attribute::new(AttributeArray::U16(vec![65_535]), 1).unwrap())
        .with_attribute("i32", Attribute::new(AttributeArray::I32(vec![i32::MIN]), 1).unwrap())
        .with_attribute("u32", Attribute::new(AttributeArray::U32(vec![u32::MAX; 4]), 4).unwrap());
    let root = Node::mesh(Arc::new(geometry.clone()));
    let bytes = Encoder::new(registry.clone(), CodecOptions::default())
        .encode(&root)
        .unwrap();
    let decoded = Decoder::new(registry, CodecOptions::default())
        .decode(&bytes)
        .unwrap();
    let got = decoded.geometry().unwrap();
    assert_eq!(**got, geometry);
    assert!(got.attributes.keys().eq(geometry.attributes.keys()));
}
