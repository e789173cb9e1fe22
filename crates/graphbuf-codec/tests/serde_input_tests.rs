// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used)]

use std::sync::Arc;

use graphbuf_codec::fixtures::{compare_graphs, triangle};
use graphbuf_codec::{decode_scene, encode_scene};
use graphbuf_scene::{Geometry, Node};
use serde_json::{json, Value};

fn triangle_json() -> Value {
    serde_json::to_value(triangle("tri")).unwrap()
}

#[test]
fn deserialized_geometry_roundtrips() {
    let geometry: Geometry = serde_json::from_value(triangle_json()).unwrap();
    let root = Node::mesh(Arc::new(geometry));
    let decoded = decode_scene(&encode_scene(&root).unwrap()).unwrap();
    assert!(compare_graphs(&root, &decoded).is_ok());
}

#[test]
fn zero_item_size_never_reaches_the_encoder() {
    let mut value = triangle_json();
    value["attributes"]["position"]["item_size"] = json!(0);
    let err = serde_json::from_value::<Geometry>(value).unwrap_err();
    assert!(err.to_string().contains("item size"), "{err}");
}

#[test]
fn ragged_attribute_never_reaches_the_encoder() {
    let mut value = triangle_json();
    value["attributes"]["position"]["array"] = json!({ "F32": [1.0, 2.0, 3.0, 4.0] });
    assert!(serde_json::from_value::<Geometry>(value).is_err());
}
