// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Append-only builder for table buffers.
//!
//! Objects are written front to back after a fixed header. An object may only
//! reference objects that were finished before it, so the builder hands out
//! [`Offset`]s for finished objects and a table under construction borrows the
//! builder mutably until it is finished. This keeps every buffer acyclic.

use rustc_hash::FxHashMap;

use crate::error::TableError;
use crate::types::{align_up, marker, BufferHeader, Offset, Scalar};

/// Bytes preceding the slot entries of a table (`u16` count + `u16` reserved).
pub(crate) const TABLE_PREFIX: usize = 4;
/// Width of one slot entry or one stored reference.
pub(crate) const REF_SIZE: usize = 4;

/// Growable buffer that allocates strings, vectors and tables.
#[derive(Debug)]
pub struct TableBuilder {
    buf: Vec<u8>,
    strings: FxHashMap<String, Offset<marker::Str>>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::with_capacity(1024)
    }
}

impl TableBuilder {
    /// Creates a builder with a default initial capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with room for `capacity` bytes before reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity.max(BufferHeader::SIZE));
        buf.resize(BufferHeader::SIZE, 0);
        Self {
            buf,
            strings: FxHashMap::default(),
        }
    }

    /// Number of bytes written so far, header included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing but the header has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.len() == BufferHeader::SIZE
    }

    fn pad_to(&mut self, align: usize) {
        let target = align_up(self.buf.len(), align);
        self.buf.resize(target, 0);
    }

    fn position(&self) -> Result<u32, TableError> {
        u32::try_from(self.buf.len()).map_err(|_| TableError::TooLarge)
    }

    fn write_len(&mut self, len: usize) -> Result<(), TableError> {
        let len = u32::try_from(len).map_err(|_| TableError::TooLarge)?;
        len.write_le(&mut self.buf);
        Ok(())
    }

    /// Writes a string, returning the offset of an identical earlier string if
    /// one exists.
    pub fn create_string(&mut self, value: &str) -> Result<Offset<marker::Str>, TableError> {
        if let Some(existing) = self.strings.get(value) {
            return Ok(*existing);
        }
        self.pad_to(4);
        let offset = Offset::new(self.position()?);
        self.write_len(value.len())?;
        self.buf.extend_from_slice(value.as_bytes());
        self.strings.insert(value.to_owned(), offset);
        Ok(offset)
    }

    /// Writes a vector of scalars.
    ///
    /// The element block starts on a multiple of `max(4, T::SIZE)`.
    pub fn create_vector<T: Scalar>(
        &mut self,
        items: &[T],
    ) -> Result<Offset<marker::Vector<T>>, TableError> {
        let align = T::SIZE.max(4);
        // Length prefix sits immediately before the aligned element block.
        let mut start = align_up(self.buf.len(), 4);
        while (start + 4) % align != 0 {
            start += 4;
        }
        self.buf.resize(start, 0);
        let offset = Offset::new(self.position()?);
        self.write_len(items.len())?;
        self.buf.reserve(items.len() * T::SIZE);
        for item in items {
            item.write_le(&mut self.buf);
        }
        Ok(offset)
    }

    /// Writes a vector of references to earlier objects.
    pub fn create_offset_vector<T>(
        &mut self,
        items: &[Offset<T>],
    ) -> Result<Offset<marker::Vector<Offset<T>>>, TableError> {
        self.pad_to(4);
        let offset = Offset::new(self.position()?);
        self.write_len(items.len())?;
        for item in items {
            item.value().write_le(&mut self.buf);
        }
        Ok(offset)
    }

    /// Begins a table with `slots` field slots.
    ///
    /// The table is written when [`TableWriter::finish`] is called.
    pub fn start_table(&mut self, slots: u16) -> TableWriter<'_> {
        TableWriter {
            builder: self,
            slots: vec![None; usize::from(slots)],
            data: Vec::new(),
        }
    }

    /// Stamps the header with `root` and returns the finished bytes.
    #[must_use]
    pub fn finish(mut self, root: Offset<marker::Table>) -> Vec<u8> {
        let header = BufferHeader {
            magic: BufferHeader::MAGIC,
            version_le: BufferHeader::VERSION.to_le(),
            root_le: root.value().to_le(),
            reserved: 0,
        };
        self.buf[..BufferHeader::SIZE].copy_from_slice(bytemuck::bytes_of(&header));
        self.buf
    }
}

/// A table under construction.
///
/// Fields are staged in a scratch area and laid out on [`finish`](Self::finish).
/// Adding the same slot twice keeps the last value.
#[derive(Debug)]
pub struct TableWriter<'b> {
    builder: &'b mut TableBuilder,
    /// Position of each present field relative to the start of `data`.
    slots: Vec<Option<usize>>,
    data: Vec<u8>,
}

impl TableWriter<'_> {
    fn begin_field(&mut self, slot: u16) -> Result<(), TableError> {
        let slots = u16::try_from(self.slots.len()).unwrap_or(u16::MAX);
        let entry = self
            .slots
            .get_mut(usize::from(slot))
            .ok_or(TableError::SlotOutOfRange { slot, slots })?;
        let at = align_up(self.data.len(), 4);
        self.data.resize(at, 0);
        *entry = Some(at);
        Ok(())
    }

    /// Adds a scalar field.
    pub fn add_scalar<T: Scalar>(&mut self, slot: u16, value: T) -> Result<(), TableError> {
        self.begin_field(slot)?;
        value.write_le(&mut self.data);
        Ok(())
    }

    /// Adds a boolean field stored as one byte.
    pub fn add_bool(&mut self, slot: u16, value: bool) -> Result<(), TableError> {
        self.add_scalar(slot, u8::from(value))
    }

    /// Adds a fixed-size inline array (e.g. a 4×4 matrix).
    pub fn add_array<T: Scalar>(&mut self, slot: u16, values: &[T]) -> Result<(), TableError> {
        self.begin_field(slot)?;
        for value in values {
            value.write_le(&mut self.data);
        }
        Ok(())
    }

    /// Adds a reference to a finished object.
    pub fn add_offset<T>(&mut self, slot: u16, target: Offset<T>) -> Result<(), TableError> {
        self.add_scalar(slot, target.value())
    }

    /// Lays the table out in the builder and returns its offset.
    pub fn finish(self) -> Result<Offset<marker::Table>, TableError> {
        let Self {
            builder,
            slots,
            data,
        } = self;
        builder.pad_to(4);
        let start = builder.position()?;
        let header_len = TABLE_PREFIX + slots.len() * REF_SIZE;

        let count = u16::try_from(slots.len()).map_err(|_| TableError::TooLarge)?;
        count.write_le(&mut builder.buf);
        0u16.write_le(&mut builder.buf);
        for slot in &slots {
            let entry = match slot {
                Some(at) => u32::try_from(header_len + at).map_err(|_| TableError::TooLarge)?,
                None => 0,
            };
            entry.write_le(&mut builder.buf);
        }
        builder.buf.extend_from_slice(&data);
        // Later objects must still be addressable.
        builder.position()?;
        Ok(Offset::new(start))
    }
}
