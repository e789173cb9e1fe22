// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(
    missing_docs,
    clippy::unwrap_used,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

use std::sync::Arc;

use graphbuf_codec::fixtures::compare_graphs;
use graphbuf_codec::{decode_scene, Encoder};
use graphbuf_scene::math::Mat4;
use graphbuf_scene::{
    Attribute, AttributeArray, Drawable, Geometry, IndexBuffer, Layers, Node, NodeData, NodeKind,
};
use proptest::prelude::*;

const CODEC_KINDS: [NodeKind; 8] = [
    NodeKind::Object3D,
    NodeKind::Group,
    NodeKind::Scene,
    NodeKind::Mesh,
    NodeKind::Line,
    NodeKind::LineLoop,
    NodeKind::LineSegments,
    NodeKind::Points,
];

#[derive(Debug, Clone)]
struct NodePlan {
    kind: NodeKind,
    geometry: usize,
    flags: [bool; 5],
    render_order: i32,
    layers: u32,
    translation: [f32; 3],
    children: Vec<NodePlan>,
}

fn arb_geometry() -> impl Strategy<Value = Geometry> {
    (1usize..8, any::<bool>(), proptest::option::of(any::<bool>())).prop_map(
        |(vertices, normalized, index)| {
            let positions: Vec<f32> = (0..vertices * 3).map(|i| i as f32 * 0.5).collect();
            let position = Attribute::new(AttributeArray::F32(positions), 3).unwrap();
            let ids = Attribute::new(AttributeArray::U16((0..vertices as u16).collect()), 1)
                .unwrap()
                .with_normalized(normalized);
            let mut geometry = Geometry::new()
                .with_attribute("position", position)
                .with_attribute("id", ids);
            geometry.index = index.map(|wide| {
                let indices: Vec<u32> = (0..vertices as u32).rev().collect();
                if wide {
                    IndexBuffer::U32(indices)
                } else {
                    IndexBuffer::narrowest(indices)
                }
            });
            geometry
        },
    )
}

fn arb_plan() -> impl Strategy<Value = NodePlan> {
    let leaf = (
        proptest::sample::select(CODEC_KINDS.to_vec()),
        any::<usize>(),
        any::<[bool; 5]>(),
        any::<i32>(),
        any::<u32>(),
        prop::array::uniform3(-100.0f32..100.0),
    )
        .prop_map(|(kind, geometry, flags, render_order, layers, translation)| NodePlan {
            kind,
            geometry,
            flags,
            render_order,
            layers,
            translation,
            children: Vec::new(),
        });
    leaf.prop_recursive(4, 48, 5, |inner| {
        (inner.clone(), proptest::collection::vec(inner, 0..5)).prop_map(|(mut plan, children)| {
            plan.children = children;
            plan
        })
    })
}

fn build(plan: &NodePlan, pool: &[Arc<Geometry>]) -> Node {
    let data = if plan.kind.is_drawable() {
        let geometry = Arc::clone(&pool[plan.geometry % pool.len()]);
        NodeData::drawable(plan.kind, Drawable::new(geometry))
    } else {
        NodeData::empty(plan.kind)
    };
    let [x, y, z] = plan.translation;
    let mut node = Node::new(data)
        .with_matrix(Mat4::translation(x, y, z))
        .with_render_order(plan.render_order)
        .with_layers(Layers(plan.layers))
        .with_children(plan.children.iter().map(|child| build(child, pool)));
    let [visible, cast, receive, culled, auto] = plan.flags;
    node.visible = visible;
    node.cast_shadow = cast;
    node.receive_shadow = receive;
    node.frustum_culled = culled;
    node.matrix_auto_update = auto;
    node
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_graphs_roundtrip(
        pool in proptest::collection::vec(arb_geometry(), 1..4),
        plan in arb_plan(),
    ) {
        let pool: Vec<_> = pool.into_iter().map(Arc::new).collect();
        let root = build(&plan, &pool);
        let (bytes, stats) = Encoder::default().encode_with_stats(&root).unwrap();
        prop_assert!(stats.geometries_written <= pool.len());
        prop_assert_eq!(stats.nodes_written, root.count());

        let decoded = decode_scene(&bytes).unwrap();
        let compared = compare_graphs(&root, &decoded);
        prop_assert!(compared.is_ok(), "{:?}", compared);
    }
}
