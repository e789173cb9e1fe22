// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Zero-parse views over table buffers.
//!
//! Nothing is decoded up front: [`Buffer::new`] checks the header and every
//! accessor bounds-checks the bytes it touches. References are only followed
//! backwards (to objects written earlier), so walking a buffer always
//! terminates even when the bytes are hostile.

use core::marker::PhantomData;

use crate::builder::{REF_SIZE, TABLE_PREFIX};
use crate::error::TableError;
use crate::types::{BufferHeader, Scalar};

/// Validated table buffer.
#[derive(Debug, Clone, Copy)]
pub struct Buffer<'a> {
    data: &'a [u8],
    header: BufferHeader,
}

impl<'a> Buffer<'a> {
    /// Wraps `data` after validating the header.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::TooSmall`], [`TableError::InvalidMagic`] or
    /// [`TableError::UnsupportedVersion`] if the header is not usable.
    pub fn new(data: &'a [u8]) -> Result<Self, TableError> {
        if data.len() < BufferHeader::SIZE {
            return Err(TableError::TooSmall {
                size: data.len(),
                minimum: BufferHeader::SIZE,
            });
        }
        // Byte slices carry no alignment guarantee, so copy the header out.
        let header: BufferHeader = bytemuck::pod_read_unaligned(&data[..BufferHeader::SIZE]);
        if header.magic != BufferHeader::MAGIC {
            return Err(TableError::InvalidMagic {
                expected: BufferHeader::MAGIC,
                actual: header.magic,
            });
        }
        if header.version() != BufferHeader::VERSION {
            return Err(TableError::UnsupportedVersion(header.version()));
        }
        Ok(Self { data, header })
    }

    /// Returns the buffer header.
    #[must_use]
    pub fn header(&self) -> &BufferHeader {
        &self.header
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the root table named by the header.
    pub fn root_table(&self) -> Result<Table<'a>, TableError> {
        Table::at(self.data, self.header.root())
    }
}

fn slice_at<'a>(
    data: &'a [u8],
    offset: usize,
    length: usize,
    what: &'static str,
) -> Result<&'a [u8], TableError> {
    offset
        .checked_add(length)
        .and_then(|end| data.get(offset..end))
        .ok_or(TableError::OutOfBounds {
            what,
            offset: offset as u64,
            length: length as u64,
            size: data.len(),
        })
}

fn read_scalar<T: Scalar>(data: &[u8], offset: usize, what: &'static str) -> Result<T, TableError> {
    slice_at(data, offset, T::SIZE, what).map(T::read_le)
}

/// Resolves a stored reference, rejecting anything not strictly before `holder`.
fn follow(data: &[u8], holder: usize, at: usize) -> Result<usize, TableError> {
    let target: u32 = read_scalar(data, at, "reference")?;
    let target_pos = target as usize;
    if target_pos < BufferHeader::SIZE || target_pos >= holder {
        return Err(TableError::ForwardReference {
            from: u32::try_from(holder).unwrap_or(u32::MAX),
            to: target,
        });
    }
    Ok(target_pos)
}

/// View over one table.
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    data: &'a [u8],
    pos: usize,
    slots: u16,
}

impl<'a> Table<'a> {
    fn at(data: &'a [u8], pos: u32) -> Result<Self, TableError> {
        let start = pos as usize;
        if start < BufferHeader::SIZE {
            return Err(TableError::OutOfBounds {
                what: "table",
                offset: u64::from(pos),
                length: TABLE_PREFIX as u64,
                size: data.len(),
            });
        }
        if start % 4 != 0 {
            return Err(TableError::Misaligned {
                what: "table",
                offset: pos,
                alignment: 4,
            });
        }
        let slots: u16 = read_scalar(data, start, "table")?;
        slice_at(
            data,
            start,
            TABLE_PREFIX + usize::from(slots) * REF_SIZE,
            "table slots",
        )?;
        Ok(Self {
            data,
            pos: start,
            slots,
        })
    }

    /// Absolute position of this table.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // positions come from u32 offsets
    pub fn position(&self) -> u32 {
        self.pos as u32
    }

    /// Number of slots declared by the table.
    #[must_use]
    pub fn slot_count(&self) -> u16 {
        self.slots
    }

    /// Returns true if `slot` holds a value.
    pub fn has(&self, slot: u16) -> Result<bool, TableError> {
        Ok(self.field(slot, 0)?.is_some())
    }

    /// Absolute position of a present field whose payload is `size` bytes.
    ///
    /// Slots beyond the declared count read as absent, so readers tolerate
    /// tables written with fewer fields.
    fn field(&self, slot: u16, size: usize) -> Result<Option<usize>, TableError> {
        if slot >= self.slots {
            return Ok(None);
        }
        let entry_at = self.pos + TABLE_PREFIX + usize::from(slot) * REF_SIZE;
        let rel: u32 = read_scalar(self.data, entry_at, "slot entry")?;
        if rel == 0 {
            return Ok(None);
        }
        let header_len = TABLE_PREFIX + usize::from(self.slots) * REF_SIZE;
        let rel = rel as usize;
        if rel < header_len {
            return Err(TableError::OutOfBounds {
                what: "field",
                offset: (self.pos + rel) as u64,
                length: size as u64,
                size: self.data.len(),
            });
        }
        let at = self.pos + rel;
        slice_at(self.data, at, size, "field")?;
        Ok(Some(at))
    }

    /// Reads a scalar field.
    pub fn scalar<T: Scalar>(&self, slot: u16) -> Result<Option<T>, TableError> {
        match self.field(slot, T::SIZE)? {
            Some(at) => read_scalar(self.data, at, "field").map(Some),
            None => Ok(None),
        }
    }

    /// Reads a boolean field (any non-zero byte is `true`).
    pub fn bool(&self, slot: u16) -> Result<Option<bool>, TableError> {
        Ok(self.scalar::<u8>(slot)?.map(|b| b != 0))
    }

    /// Reads a fixed-size inline array.
    pub fn array<T: Scalar + Default, const N: usize>(
        &self,
        slot: u16,
    ) -> Result<Option<[T; N]>, TableError> {
        let Some(at) = self.field(slot, T::SIZE * N)? else {
            return Ok(None);
        };
        let mut out = [T::default(); N];
        for (i, value) in out.iter_mut().enumerate() {
            *value = read_scalar(self.data, at + i * T::SIZE, "array element")?;
        }
        Ok(Some(out))
    }

    fn reference(&self, slot: u16) -> Result<Option<usize>, TableError> {
        match self.field(slot, REF_SIZE)? {
            Some(at) => follow(self.data, self.pos, at).map(Some),
            None => Ok(None),
        }
    }

    /// Reads a string field.
    #[allow(clippy::cast_possible_truncation)] // `at` came from a u32 reference
    pub fn str(&self, slot: u16) -> Result<Option<&'a str>, TableError> {
        let Some(at) = self.reference(slot)? else {
            return Ok(None);
        };
        let len: u32 = read_scalar(self.data, at, "string")?;
        let bytes = slice_at(self.data, at + 4, len as usize, "string")?;
        core::str::from_utf8(bytes)
            .map(Some)
            .map_err(|_| TableError::InvalidUtf8(at as u32))
    }

    /// Reads a nested table field.
    pub fn table(&self, slot: u16) -> Result<Option<Table<'a>>, TableError> {
        match self.reference(slot)? {
            #[allow(clippy::cast_possible_truncation)] // `at` came from a u32 reference
            Some(at) => Table::at(self.data, at as u32).map(Some),
            None => Ok(None),
        }
    }

    /// Reads a vector-of-scalars field.
    pub fn vector<T: Scalar>(&self, slot: u16) -> Result<Option<Vector<'a, T>>, TableError> {
        let Some(at) = self.reference(slot)? else {
            return Ok(None);
        };
        let len: u32 = read_scalar(self.data, at, "vector")?;
        let len = len as usize;
        let byte_len = len.checked_mul(T::SIZE).ok_or(TableError::TooLarge)?;
        let bytes = slice_at(self.data, at + 4, byte_len, "vector elements")?;
        Ok(Some(Vector {
            bytes,
            len,
            _marker: PhantomData,
        }))
    }

    /// Reads a vector-of-tables field.
    pub fn tables(&self, slot: u16) -> Result<Option<TableVector<'a>>, TableError> {
        let Some(at) = self.reference(slot)? else {
            return Ok(None);
        };
        let len: u32 = read_scalar(self.data, at, "table vector")?;
        let len = len as usize;
        let byte_len = len.checked_mul(REF_SIZE).ok_or(TableError::TooLarge)?;
        slice_at(self.data, at + 4, byte_len, "table vector elements")?;
        Ok(Some(TableVector {
            data: self.data,
            pos: at,
            len,
        }))
    }
}

/// View over a vector of scalars.
#[derive(Debug, Clone, Copy)]
pub struct Vector<'a, T> {
    bytes: &'a [u8],
    len: usize,
    _marker: PhantomData<T>,
}

impl<'a, T: Scalar> Vector<'a, T> {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the vector has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the element at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let at = index * T::SIZE;
        self.bytes.get(at..at + T::SIZE).map(T::read_le)
    }

    /// Iterates over the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        let bytes = self.bytes;
        bytes.chunks_exact(T::SIZE).map(T::read_le)
    }

    /// Copies the elements into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

/// View over a vector of table references.
#[derive(Debug, Clone, Copy)]
pub struct TableVector<'a> {
    data: &'a [u8],
    pos: usize,
    len: usize,
}

impl<'a> TableVector<'a> {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the vector has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Resolves the table at `index`.
    #[allow(clippy::cast_possible_truncation)] // `target` came from a u32 reference
    pub fn get(&self, index: usize) -> Result<Table<'a>, TableError> {
        if index >= self.len {
            return Err(TableError::OutOfBounds {
                what: "table vector index",
                offset: index as u64,
                length: 1,
                size: self.len,
            });
        }
        let target = follow(self.data, self.pos, self.pos + 4 + index * REF_SIZE)?;
        Table::at(self.data, target as u32)
    }

    /// Iterates over the tables in order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Table<'a>, TableError>> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;

    #[test]
    fn rejects_short_buffer() {
        let err = Buffer::new(&[0u8; 8]).unwrap_err();
        assert!(matches!(err, TableError::TooSmall { .. }));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = [0u8; 32];
        data[..4].copy_from_slice(b"NOPE");
        let err = Buffer::new(&data).unwrap_err();
        assert!(matches!(err, TableError::InvalidMagic { .. }));
    }

    #[test]
    fn reads_fields_back() {
        let mut builder = TableBuilder::new();
        let name = builder.create_string("cube").unwrap();
        let values = builder.create_vector(&[1u16, 2, 3]).unwrap();
        let mut t = builder.start_table(5);
        t.add_offset(0, name).unwrap();
        t.add_offset(1, values).unwrap();
        t.add_scalar(2, -7i32).unwrap();
        t.add_bool(4, true).unwrap();
        let root = t.finish().unwrap();
        let bytes = builder.finish(root);

        let table = Buffer::new(&bytes).unwrap().root_table().unwrap();
        assert_eq!(table.str(0).unwrap(), Some("cube"));
        assert_eq!(table.vector::<u16>(1).unwrap().unwrap().to_vec(), [1, 2, 3]);
        assert_eq!(table.scalar::<i32>(2).unwrap(), Some(-7));
        assert_eq!(table.scalar::<u32>(3).unwrap(), None);
        assert_eq!(table.bool(4).unwrap(), Some(true));
        // Slots past the declared count read as absent.
        assert_eq!(table.scalar::<u32>(40).unwrap(), None);
    }

    #[test]
    fn rejects_self_reference() {
        let mut builder = TableBuilder::new();
        let mut t = builder.start_table(1);
        t.add_scalar(0, 0u32).unwrap();
        let root = t.finish().unwrap();
        let mut bytes = builder.finish(root);
        // Point slot 0 at the table itself.
        let field_at = root.value() as usize + 8;
        bytes[field_at..field_at + 4].copy_from_slice(&root.value().to_le_bytes());

        let table = Buffer::new(&bytes).unwrap().root_table().unwrap();
        assert!(matches!(
            table.table(0),
            Err(TableError::ForwardReference { .. })
        ));
    }
}
