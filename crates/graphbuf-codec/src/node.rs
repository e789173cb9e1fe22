// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node records.
//!
//! Every node is written as a kind-specific record whose slot 0 references a
//! base block holding the fields all kinds share, children included. A
//! reader that does not know a kind can still recover the base block and
//! the subtree below it.
//!
//! Children are written before their parent (the table engine only allows
//! backward references) and listed in two parallel vectors: one of wire
//! tags and one of record offsets.

use graphbuf_scene::math::Mat4;
use graphbuf_scene::{
    ColorRgb8, Drawable, Fog, Layers, Node, NodeData, NodeKind, SceneSettings,
};
use graphbuf_table::{marker, Offset, Table};
use tracing::{debug, trace, warn};

use crate::cache::NodeRef;
use crate::error::{DecodeError, EncodeError};
use crate::geometry::{decode_geometry, encode_geometry};
use crate::registry::{FOG_EXPONENTIAL, FOG_LINEAR, GEOMETRY_BUFFER, TAG_NONE};
use crate::root::{DecodeSession, EncodeSession};
use crate::schema;

/// Encodes `node` and its subtree.
///
/// Returns `None` when the node's kind is not accepted by the registry; the
/// caller leaves it out of its parent's child list. `depth` counts the node
/// itself, so the root is at depth 1.
pub(crate) fn encode_node(
    session: &mut EncodeSession<'_>,
    node: &Node,
    depth: usize,
) -> Result<Option<NodeRef>, EncodeError> {
    if depth > session.options.max_depth {
        return Err(EncodeError::DepthExceeded {
            max_depth: session.options.max_depth,
        });
    }
    if let Some(&hit) = session.cache.nodes.get(&node.uuid) {
        trace!(uuid = %node.uuid, "node already encoded");
        session.stats.nodes_reused += 1;
        return Ok(Some(hit));
    }

    let kind = node.kind();
    let tag = match session.registry.tag_for_node(kind) {
        Ok(tag) => tag,
        Err(err) if session.options.strict => return Err(err.into()),
        Err(err) => {
            warn!(uuid = %node.uuid, %kind, %err, "skipping node with unsupported kind");
            session.stats.nodes_skipped += 1;
            return Ok(None);
        }
    };

    let mut child_tags = Vec::with_capacity(node.children.len());
    let mut child_offsets = Vec::with_capacity(node.children.len());
    for child in &node.children {
        if let Some((child_tag, child_offset)) = encode_node(session, child, depth + 1)? {
            child_tags.push(child_tag);
            child_offsets.push(child_offset);
        }
    }

    let base = encode_base(session, node, &child_tags, &child_offsets)?;
    let record = match &node.data {
        NodeData::Scene(settings) => encode_scene(session, base, settings)?,
        data => match data.as_drawable() {
            Some(drawable) => encode_drawable(session, base, drawable)?,
            None => {
                let mut record = session.builder.start_table(schema::node::PLAIN_SLOTS);
                record.add_offset(schema::node::BASE, base)?;
                record.finish()?
            }
        },
    };

    session.cache.nodes.insert(node.uuid.clone(), (tag, record));
    session.stats.nodes_written += 1;
    debug!(uuid = %node.uuid, %kind, children = child_tags.len(), "node encoded");
    Ok(Some((tag, record)))
}

fn encode_base(
    session: &mut EncodeSession<'_>,
    node: &Node,
    child_tags: &[u8],
    child_offsets: &[Offset<marker::Table>],
) -> Result<Offset<marker::Table>, EncodeError> {
    let builder = &mut session.builder;
    let types = builder.create_vector(child_tags)?;
    let children = builder.create_offset_vector(child_offsets)?;
    let uuid = builder.create_string(&node.uuid)?;
    let name = node
        .name
        .as_deref()
        .map(|name| builder.create_string(name))
        .transpose()?;

    let mut base = builder.start_table(schema::base::SLOTS);
    base.add_offset(schema::base::UUID, uuid)?;
    if let Some(name) = name {
        base.add_offset(schema::base::NAME, name)?;
    }
    base.add_bool(schema::base::CAST_SHADOW, node.cast_shadow)?;
    base.add_bool(schema::base::RECEIVE_SHADOW, node.receive_shadow)?;
    base.add_bool(schema::base::FRUSTUM_CULLED, node.frustum_culled)?;
    base.add_scalar(schema::base::RENDER_ORDER, node.render_order)?;
    base.add_array(schema::base::MATRIX, &node.matrix.to_array())?;
    base.add_scalar(schema::base::LAYERS, node.layers.mask())?;
    base.add_bool(schema::base::VISIBLE, node.visible)?;
    base.add_bool(schema::base::MATRIX_AUTO_UPDATE, node.matrix_auto_update)?;
    base.add_offset(schema::base::CHILDREN_TYPES, types)?;
    base.add_offset(schema::base::CHILDREN, children)?;
    Ok(base.finish()?)
}

fn encode_drawable(
    session: &mut EncodeSession<'_>,
    base: Offset<marker::Table>,
    drawable: &Drawable,
) -> Result<Offset<marker::Table>, EncodeError> {
    let geometry = drawable
        .geometry
        .as_deref()
        .map(|geometry| encode_geometry(session, geometry))
        .transpose()?;

    let mut record = session.builder.start_table(schema::node::DRAWABLE_SLOTS);
    record.add_offset(schema::node::BASE, base)?;
    match geometry {
        Some(geometry) => {
            record.add_scalar(schema::node::GEOMETRY_TYPE, GEOMETRY_BUFFER)?;
            record.add_offset(schema::node::GEOMETRY, geometry)?;
        }
        None => record.add_scalar(schema::node::GEOMETRY_TYPE, TAG_NONE)?,
    }
    Ok(record.finish()?)
}

fn encode_scene(
    session: &mut EncodeSession<'_>,
    base: Offset<marker::Table>,
    settings: &SceneSettings,
) -> Result<Offset<marker::Table>, EncodeError> {
    let builder = &mut session.builder;
    let fog = match settings.fog {
        Some(Fog::Linear { color, near, far }) => {
            let mut fog = builder.start_table(schema::fog::SLOTS);
            fog.add_scalar(schema::fog::COLOR, color.to_hex())?;
            fog.add_scalar(schema::fog::NEAR, near)?;
            fog.add_scalar(schema::fog::FAR, far)?;
            Some((FOG_LINEAR, fog.finish()?))
        }
        Some(Fog::Exponential { color, density }) => {
            let mut fog = builder.start_table(schema::fog::SLOTS);
            fog.add_scalar(schema::fog::COLOR, color.to_hex())?;
            fog.add_scalar(schema::fog::DENSITY, density)?;
            Some((FOG_EXPONENTIAL, fog.finish()?))
        }
        None => None,
    };

    let mut record = builder.start_table(schema::node::SCENE_SLOTS);
    record.add_offset(schema::node::BASE, base)?;
    if let Some(background) = settings.background {
        record.add_scalar(schema::node::BACKGROUND, background.to_hex())?;
    }
    match fog {
        Some((tag, fog)) => {
            record.add_scalar(schema::node::FOG_TYPE, tag)?;
            record.add_offset(schema::node::FOG, fog)?;
        }
        None => record.add_scalar(schema::node::FOG_TYPE, TAG_NONE)?,
    }
    Ok(record.finish()?)
}

/// Decodes the record at `record` as a node of wire kind `tag`, returning
/// the node and the size of its subtree.
///
/// Unknown tags decode as [`NodeKind::Object3D`] carrying the base fields
/// and children, unless the session is strict.
pub(crate) fn decode_node(
    session: &mut DecodeSession<'_>,
    tag: u8,
    record: Table<'_>,
    depth: usize,
) -> Result<(Node, usize), DecodeError> {
    if depth > session.options.max_depth {
        return Err(DecodeError::DepthExceeded {
            max_depth: session.options.max_depth,
        });
    }
    if let Some((node, size)) = session.cache.node_at(record.position())? {
        trace!(uuid = %node.uuid, "node reused");
        session.count(size)?;
        return Ok((node, size));
    }

    let base = record
        .table(schema::node::BASE)?
        .ok_or(DecodeError::missing("node", "base"))?;
    let uuid = base
        .str(schema::base::UUID)?
        .ok_or(DecodeError::missing("node", "uuid"))?;
    if let Some((node, size)) = session.cache.node(uuid) {
        trace!(uuid, "node reused by identity key");
        session.count(size)?;
        return Ok((node, size));
    }

    let kind = match session.registry.node_for_tag(tag) {
        Ok(kind) => kind,
        Err(err) if session.options.strict => return Err(err.into()),
        Err(err) => {
            warn!(uuid, tag, %err, "decoding node with unknown tag as Object3D");
            NodeKind::Object3D
        }
    };
    session.count(1)?;

    let types = base.vector::<u8>(schema::base::CHILDREN_TYPES)?;
    let offsets = base.tables(schema::base::CHILDREN)?;
    let types_len = types.map_or(0, |v| v.len());
    let offsets_len = offsets.map_or(0, |v| v.len());
    if types_len != offsets_len {
        return Err(DecodeError::ChildrenMismatch {
            types: types_len,
            offsets: offsets_len,
        });
    }
    let mut children = Vec::with_capacity(types_len);
    let mut size = 1;
    if let (Some(types), Some(offsets)) = (types, offsets) {
        for (child_tag, child) in types.iter().zip(offsets.iter()) {
            let (child, child_size) = decode_node(session, child_tag, child?, depth + 1)?;
            size += child_size;
            children.push(child);
        }
    }

    let data = match kind {
        NodeKind::Scene => NodeData::Scene(decode_scene(record, uuid)?),
        kind if kind.is_drawable() => {
            NodeData::drawable(kind, decode_drawable(session, record, uuid)?)
        }
        kind => NodeData::empty(kind),
    };

    let matrix = base
        .array::<f32, 16>(schema::base::MATRIX)?
        .map_or_else(Mat4::identity, Mat4::new);
    let matrix_auto_update = base
        .bool(schema::base::MATRIX_AUTO_UPDATE)?
        .unwrap_or(true);

    let mut node = Node::with_uuid(uuid, data);
    node.name = base.str(schema::base::NAME)?.map(str::to_owned);
    node.matrix = matrix;
    node.transform = matrix_auto_update.then(|| matrix.decompose());
    node.matrix_auto_update = matrix_auto_update;
    node.visible = base.bool(schema::base::VISIBLE)?.unwrap_or(true);
    node.cast_shadow = base.bool(schema::base::CAST_SHADOW)?.unwrap_or(false);
    node.receive_shadow = base.bool(schema::base::RECEIVE_SHADOW)?.unwrap_or(false);
    node.frustum_culled = base.bool(schema::base::FRUSTUM_CULLED)?.unwrap_or(true);
    node.render_order = base.scalar::<i32>(schema::base::RENDER_ORDER)?.unwrap_or(0);
    node.layers = base
        .scalar::<u32>(schema::base::LAYERS)?
        .map_or(Layers::DEFAULT, Layers);
    node.children = children;

    session.cache.insert_node(record.position(), &node, size);
    debug!(uuid, %kind, children = node.children.len(), "node decoded");
    Ok((node, size))
}

fn decode_drawable(
    session: &mut DecodeSession<'_>,
    record: Table<'_>,
    uuid: &str,
) -> Result<Drawable, DecodeError> {
    let tag = record
        .scalar::<u8>(schema::node::GEOMETRY_TYPE)?
        .unwrap_or(TAG_NONE);
    let geometry = match tag {
        TAG_NONE => None,
        GEOMETRY_BUFFER => {
            let table = record
                .table(schema::node::GEOMETRY)?
                .ok_or(DecodeError::missing("node", "geometry"))?;
            Some(decode_geometry(session, table)?)
        }
        other => {
            warn!(uuid, tag = other, "ignoring geometry with unknown tag");
            None
        }
    };
    Ok(Drawable { geometry })
}

fn decode_scene(record: Table<'_>, uuid: &str) -> Result<SceneSettings, DecodeError> {
    let background = record
        .scalar::<u32>(schema::node::BACKGROUND)?
        .map(ColorRgb8::from_hex);
    let tag = record
        .scalar::<u8>(schema::node::FOG_TYPE)?
        .unwrap_or(TAG_NONE);
    let fog = match tag {
        TAG_NONE => None,
        FOG_LINEAR | FOG_EXPONENTIAL => {
            let fog = record
                .table(schema::node::FOG)?
                .ok_or(DecodeError::missing("scene", "fog"))?;
            let color = fog
                .scalar::<u32>(schema::fog::COLOR)?
                .map(ColorRgb8::from_hex)
                .unwrap_or_default();
            let read = |slot: u16, field: &'static str| -> Result<f32, DecodeError> {
                fog.scalar::<f32>(slot)?
                    .ok_or(DecodeError::missing("fog", field))
            };
            Some(if tag == FOG_LINEAR {
                Fog::Linear {
                    color,
                    near: read(schema::fog::NEAR, "near")?,
                    far: read(schema::fog::FAR, "far")?,
                }
            } else {
                Fog::Exponential {
                    color,
                    density: read(schema::fog::DENSITY, "density")?,
                }
            })
        }
        other => {
            warn!(uuid, tag = other, "ignoring fog with unknown tag");
            None
        }
    };
    Ok(SceneSettings { background, fog })
}
