// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Geometry records: attributes tagged by element type, optional index.

use std::sync::Arc;

use graphbuf_scene::{ArrayKind, Attribute, AttributeArray, Geometry, IndexBuffer, IndexWidth};
use graphbuf_table::{marker, Offset, Scalar, Table, TableBuilder, TableError};
use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::error::{DecodeError, EncodeError};
use crate::registry::{self, TAG_NONE};
use crate::root::{DecodeSession, EncodeSession};
use crate::schema;

/// Writes `geometry` once per session and returns its record.
pub(crate) fn encode_geometry(
    session: &mut EncodeSession<'_>,
    geometry: &Geometry,
) -> Result<Offset<marker::Table>, EncodeError> {
    if let Some(&offset) = session.cache.geometries.get(&geometry.uuid) {
        trace!(uuid = %geometry.uuid, "geometry already encoded");
        session.stats.geometries_reused += 1;
        return Ok(offset);
    }

    let index = match &geometry.index {
        Some(IndexBuffer::U16(values)) => Some(write_index(&mut session.builder, values)?),
        Some(IndexBuffer::U32(values)) => Some(write_index(&mut session.builder, values)?),
        None => None,
    };

    let mut entries = Vec::with_capacity(geometry.attributes.len());
    for (name, attribute) in &geometry.attributes {
        match attribute.validate() {
            Ok(()) => {}
            Err(source) if session.options.strict => {
                return Err(EncodeError::InvalidAttribute {
                    name: name.clone(),
                    source,
                });
            }
            Err(err) => {
                warn!(
                    uuid = %geometry.uuid,
                    attribute = %name,
                    %err,
                    "skipping invalid attribute"
                );
                session.stats.attributes_skipped += 1;
                continue;
            }
        }
        let tag = match session.registry.tag_for_array(attribute.kind()) {
            Ok(tag) => tag,
            Err(err) if session.options.strict => return Err(err.into()),
            Err(err) => {
                warn!(
                    uuid = %geometry.uuid,
                    attribute = %name,
                    %err,
                    "skipping attribute with unsupported element type"
                );
                session.stats.attributes_skipped += 1;
                continue;
            }
        };
        let builder = &mut session.builder;
        let payload = match attribute.array() {
            AttributeArray::F32(v) => write_attribute(builder, v, attribute)?,
            AttributeArray::F64(v) => write_attribute(builder, v, attribute)?,
            AttributeArray::I8(v) => write_attribute(builder, v, attribute)?,
            AttributeArray::U8(v) => write_attribute(builder, v, attribute)?,
            AttributeArray::I16(v) => write_attribute(builder, v, attribute)?,
            AttributeArray::U16(v) => write_attribute(builder, v, attribute)?,
            AttributeArray::I32(v) => write_attribute(builder, v, attribute)?,
            AttributeArray::U32(v) => write_attribute(builder, v, attribute)?,
        };
        let name = builder.create_string(name)?;
        let mut entry = builder.start_table(schema::attribute::SLOTS);
        entry.add_offset(schema::attribute::NAME, name)?;
        entry.add_scalar(schema::attribute::ATTRIBUTE_TYPE, tag)?;
        entry.add_offset(schema::attribute::ATTRIBUTE, payload)?;
        entries.push(entry.finish()?);
    }

    let builder = &mut session.builder;
    let attributes = builder.create_offset_vector(&entries)?;
    let uuid = builder.create_string(&geometry.uuid)?;
    let name = geometry
        .name
        .as_deref()
        .map(|name| builder.create_string(name))
        .transpose()?;

    let mut record = builder.start_table(schema::geometry::SLOTS);
    record.add_offset(schema::geometry::UUID, uuid)?;
    if let Some(name) = name {
        record.add_offset(schema::geometry::NAME, name)?;
    }
    record.add_offset(schema::geometry::ATTRIBUTES, attributes)?;
    match (&geometry.index, index) {
        (Some(buffer), Some(index)) => {
            record.add_scalar(schema::geometry::INDEX_TYPE, registry::index_tag(buffer.width()))?;
            record.add_offset(schema::geometry::INDEX, index)?;
        }
        _ => record.add_scalar(schema::geometry::INDEX_TYPE, TAG_NONE)?,
    }
    let offset = record.finish()?;

    session.cache.geometries.insert(geometry.uuid.clone(), offset);
    session.stats.geometries_written += 1;
    trace!(uuid = %geometry.uuid, attributes = entries.len(), "geometry encoded");
    Ok(offset)
}

fn write_index<T: Scalar>(
    builder: &mut TableBuilder,
    values: &[T],
) -> Result<Offset<marker::Table>, TableError> {
    let array = builder.create_vector(values)?;
    let mut table = builder.start_table(schema::index::SLOTS);
    table.add_offset(schema::index::ARRAY, array)?;
    table.finish()
}

fn write_attribute<T: Scalar>(
    builder: &mut TableBuilder,
    values: &[T],
    attribute: &Attribute,
) -> Result<Offset<marker::Table>, TableError> {
    let array = builder.create_vector(values)?;
    let mut table = builder.start_table(schema::attribute_data::SLOTS);
    table.add_offset(schema::attribute_data::ARRAY, array)?;
    table.add_scalar(schema::attribute_data::ITEM_SIZE, attribute.item_size())?;
    table.add_bool(schema::attribute_data::NORMALIZED, attribute.normalized())?;
    table.finish()
}

/// Reads the geometry at `record`, returning the shared instance if the
/// same record or identity key was already decoded in this session.
pub(crate) fn decode_geometry(
    session: &mut DecodeSession<'_>,
    record: Table<'_>,
) -> Result<Arc<Geometry>, DecodeError> {
    if let Some(geometry) = session.cache.geometry_at(record.position())? {
        return Ok(geometry);
    }
    let uuid = record
        .str(schema::geometry::UUID)?
        .ok_or(DecodeError::missing("geometry", "uuid"))?;
    if let Some(geometry) = session.cache.geometry(uuid) {
        return Ok(geometry);
    }

    let index = match registry::index_width(
        record
            .scalar::<u8>(schema::geometry::INDEX_TYPE)?
            .unwrap_or(TAG_NONE),
    )? {
        None => None,
        Some(width) => {
            let table = record
                .table(schema::geometry::INDEX)?
                .ok_or(DecodeError::missing("geometry", "index"))?;
            let slot = schema::index::ARRAY;
            Some(match width {
                IndexWidth::U16 => IndexBuffer::U16(read_array(table, slot, "index")?),
                IndexWidth::U32 => IndexBuffer::U32(read_array(table, slot, "index")?),
            })
        }
    };

    let mut attributes = IndexMap::new();
    if let Some(entries) = record.tables(schema::geometry::ATTRIBUTES)? {
        for entry in entries.iter() {
            let entry = entry?;
            let name = entry
                .str(schema::attribute::NAME)?
                .ok_or(DecodeError::missing("attribute", "name"))?;
            let tag = entry
                .scalar::<u8>(schema::attribute::ATTRIBUTE_TYPE)?
                .unwrap_or(TAG_NONE);
            let kind = match session.registry.array_for_tag(tag) {
                Ok(kind) => kind,
                Err(err) if session.options.strict => return Err(err.into()),
                Err(err) => {
                    warn!(uuid, attribute = name, tag, %err, "skipping attribute with unknown tag");
                    continue;
                }
            };
            let payload = entry
                .table(schema::attribute::ATTRIBUTE)?
                .ok_or(DecodeError::missing("attribute", "attribute"))?;
            let attribute = read_attribute(payload, kind, name)?;
            attributes.insert(name.to_owned(), attribute);
        }
    }

    let geometry = Arc::new(Geometry {
        uuid: uuid.to_owned(),
        name: record.str(schema::geometry::NAME)?.map(str::to_owned),
        attributes,
        index,
    });
    session
        .cache
        .insert_geometry(record.position(), Arc::clone(&geometry));
    trace!(uuid, "geometry decoded");
    Ok(geometry)
}

fn read_array<T: Scalar>(
    table: Table<'_>,
    slot: u16,
    record: &'static str,
) -> Result<Vec<T>, DecodeError> {
    let vector = table
        .vector::<T>(slot)?
        .ok_or(DecodeError::missing(record, "array"))?;
    Ok(vector.to_vec())
}

fn read_attribute(
    payload: Table<'_>,
    kind: ArrayKind,
    name: &str,
) -> Result<Attribute, DecodeError> {
    const ARRAY: u16 = schema::attribute_data::ARRAY;
    let array = match kind {
        ArrayKind::F32 => AttributeArray::F32(read_array(payload, ARRAY, "attribute")?),
        ArrayKind::F64 => AttributeArray::F64(read_array(payload, ARRAY, "attribute")?),
        ArrayKind::I8 => AttributeArray::I8(read_array(payload, ARRAY, "attribute")?),
        ArrayKind::U8 => AttributeArray::U8(read_array(payload, ARRAY, "attribute")?),
        ArrayKind::I16 => AttributeArray::I16(read_array(payload, ARRAY, "attribute")?),
        ArrayKind::U16 => AttributeArray::U16(read_array(payload, ARRAY, "attribute")?),
        ArrayKind::I32 => AttributeArray::I32(read_array(payload, ARRAY, "attribute")?),
        ArrayKind::U32 => AttributeArray::U32(read_array(payload, ARRAY, "attribute")?),
    };
    let item_size = payload
        .scalar::<u32>(schema::attribute_data::ITEM_SIZE)?
        .ok_or(DecodeError::missing("attribute", "item size"))?;
    let normalized = payload
        .bool(schema::attribute_data::NORMALIZED)?
        .unwrap_or(false);
    Attribute::new(array, item_size)
        .map(|attribute| attribute.with_normalized(normalized))
        .map_err(|source| DecodeError::InvalidAttribute {
            name: name.to_owned(),
            source,
        })
}
