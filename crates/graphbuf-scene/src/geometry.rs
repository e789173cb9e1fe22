// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vertex data: geometries, named attributes and index buffers.

use indexmap::IndexMap;

use crate::ModelError;

/// Element type of an attribute array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArrayKind {
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 32-bit integer.
    U32,
}

impl ArrayKind {
    /// Every element type, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::F32,
        Self::F64,
        Self::I8,
        Self::U8,
        Self::I16,
        Self::U16,
        Self::I32,
        Self::U32,
    ];

    /// Width of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::F64 => 8,
        }
    }
}

/// Typed numeric storage for one attribute.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeArray {
    /// 32-bit floats.
    F32(Vec<f32>),
    /// 64-bit floats.
    F64(Vec<f64>),
    /// Signed bytes.
    I8(Vec<i8>),
    /// Unsigned bytes.
    U8(Vec<u8>),
    /// Signed 16-bit integers.
    I16(Vec<i16>),
    /// Unsigned 16-bit integers.
    U16(Vec<u16>),
    /// Signed 32-bit integers.
    I32(Vec<i32>),
    /// Unsigned 32-bit integers.
    U32(Vec<u32>),
}

impl AttributeArray {
    /// Element type of the array.
    pub const fn kind(&self) -> ArrayKind {
        match self {
            Self::F32(_) => ArrayKind::F32,
            Self::F64(_) => ArrayKind::F64,
            Self::I8(_) => ArrayKind::I8,
            Self::U8(_) => ArrayKind::U8,
            Self::I16(_) => ArrayKind::I16,
            Self::U16(_) => ArrayKind::U16,
            Self::I32(_) => ArrayKind::I32,
            Self::U32(_) => ArrayKind::U32,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::I8(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    /// Returns true if the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named per-vertex array.
///
/// The array length is always a whole multiple of `item_size`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "AttributeParts"))]
pub struct Attribute {
    array: AttributeArray,
    item_size: u32,
    normalized: bool,
}

/// Unchecked wire shape of [`Attribute`]; deserialization goes through
/// [`Attribute::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct AttributeParts {
    array: AttributeArray,
    item_size: u32,
    normalized: bool,
}

#[cfg(feature = "serde")]
impl TryFrom<AttributeParts> for Attribute {
    type Error = ModelError;

    fn try_from(parts: AttributeParts) -> Result<Self, Self::Error> {
        Ok(Self::new(parts.array, parts.item_size)?.with_normalized(parts.normalized))
    }
}

impl Attribute {
    /// Wraps `array` as an attribute with `item_size` components per vertex.
    ///
    /// # Errors
    ///
    /// [`ModelError::ZeroItemSize`] if `item_size` is zero, and
    /// [`ModelError::RaggedAttribute`] if the array length is not a multiple
    /// of `item_size`.
    pub fn new(array: AttributeArray, item_size: u32) -> Result<Self, ModelError> {
        let attribute = Self {
            array,
            item_size,
            normalized: false,
        };
        attribute.validate()?;
        Ok(attribute)
    }

    /// Checks that the array splits into whole items of `item_size`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Attribute::new`].
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.item_size == 0 {
            return Err(ModelError::ZeroItemSize);
        }
        let len = self.array.len();
        if len % self.item_size as usize != 0 {
            return Err(ModelError::RaggedAttribute {
                len,
                item_size: self.item_size,
            });
        }
        Ok(())
    }

    /// Marks integer data as normalized to `[0, 1]` / `[-1, 1]` on read.
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// The underlying array.
    pub fn array(&self) -> &AttributeArray {
        &self.array
    }

    /// Element type of the underlying array.
    pub fn kind(&self) -> ArrayKind {
        self.array.kind()
    }

    /// Components per vertex.
    pub fn item_size(&self) -> u32 {
        self.item_size
    }

    /// Whether integer values are normalized when read.
    pub fn normalized(&self) -> bool {
        self.normalized
    }

    /// Number of vertices (`len / item_size`).
    pub fn vertex_count(&self) -> usize {
        self.array
            .len()
            .checked_div(self.item_size as usize)
            .unwrap_or(0)
    }
}

/// Declared element width of an index buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexWidth {
    /// 16-bit indices.
    U16,
    /// 32-bit indices.
    U32,
}

/// Vertex indices with their declared width.
///
/// The width belongs to the buffer; nothing widens or narrows it implicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexBuffer {
    /// 16-bit indices.
    U16(Vec<u16>),
    /// 32-bit indices.
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Stores `indices` as `u16` when every value fits, `u32` otherwise.
    pub fn narrowest(indices: Vec<u32>) -> Self {
        let narrowed: Option<Vec<u16>> = indices.iter().map(|&i| u16::try_from(i).ok()).collect();
        match narrowed {
            Some(short) => Self::U16(short),
            None => Self::U32(indices),
        }
    }

    /// Declared width.
    pub const fn width(&self) -> IndexWidth {
        match self {
            Self::U16(_) => IndexWidth::U16,
            Self::U32(_) => IndexWidth::U32,
        }
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    /// Returns true if there are no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the indices widened to `u32`.
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            Self::U16(v) => Box::new(v.iter().map(|&i| u32::from(i))),
            Self::U32(v) => Box::new(v.iter().copied()),
        }
    }
}

/// A shareable bundle of vertex attributes and an optional index buffer.
///
/// Nodes hold geometries behind `Arc`; two nodes pointing at the same
/// allocation share one geometry and are encoded against a single record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    /// Identity key, unique per geometry instance.
    pub uuid: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Attributes in insertion order.
    pub attributes: IndexMap<String, Attribute>,
    /// Optional index buffer.
    pub index: Option<IndexBuffer>,
}

impl Geometry {
    /// Creates an empty geometry with a fresh identity key.
    pub fn new() -> Self {
        Self::with_uuid(crate::new_identity_key())
    }

    /// Creates an empty geometry with a caller-chosen identity key.
    pub fn with_uuid(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: None,
            attributes: IndexMap::new(),
            index: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends (or replaces, keeping its position) a named attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Sets the index buffer.
    pub fn with_index(mut self, index: IndexBuffer) -> Self {
        self.index = Some(index);
        self
    }

    /// Looks up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Vertex count of the `position` attribute, or of the first attribute
    /// when there is no `position`. Zero for a geometry without attributes.
    pub fn vertex_count(&self) -> usize {
        self.attributes
            .get("position")
            .or_else(|| self.attributes.values().next())
            .map_or(0, Attribute::vertex_count)
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ragged_attribute_is_rejected() {
        let err = Attribute::new(AttributeArray::F32(vec![0.0; 7]), 3).unwrap_err();
        assert_eq!(err, ModelError::RaggedAttribute { len: 7, item_size: 3 });
        assert_eq!(
            Attribute::new(AttributeArray::U8(vec![]), 0).unwrap_err(),
            ModelError::ZeroItemSize
        );
    }

    #[test]
    fn vertex_count_prefers_position() {
        let geometry = Geometry::new()
            .with_attribute("uv", Attribute::new(AttributeArray::F32(vec![0.0; 4]), 2).unwrap())
            .with_attribute(
                "position",
                Attribute::new(AttributeArray::F32(vec![0.0; 9]), 3).unwrap(),
            );
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(Geometry::new().vertex_count(), 0);
    }

    #[test]
    fn narrowest_index_keeps_u16_when_it_fits() {
        assert_eq!(IndexBuffer::narrowest(vec![0, 1, 65_535]).width(), IndexWidth::U16);
        assert_eq!(IndexBuffer::narrowest(vec![0, 65_536]).width(), IndexWidth::U32);
        let index = IndexBuffer::U16(vec![2, 1, 0]);
        assert_eq!(index.iter().collect::<Vec<_>>(), [2, 1, 0]);
    }

    #[test]
    fn fresh_geometries_get_distinct_keys() {
        assert_ne!(Geometry::new().uuid, Geometry::new().uuid);
    }
}
