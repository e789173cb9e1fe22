// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixed layout pieces of a table buffer: header, scalar encoding, typed offsets.
//!
//! All multi-byte values are little-endian. The header is `#[repr(C)]` and
//! derives `bytemuck::Pod` so it can be read without unsafe code.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use bytemuck::{Pod, Zeroable};

/// Buffer header (16 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct BufferHeader {
    /// Magic bytes: `b"GBUF"`.
    pub magic: [u8; 4],
    /// Layout version (little-endian u32).
    pub version_le: u32,
    /// Absolute offset of the root table (little-endian u32).
    pub root_le: u32,
    /// Reserved for future header fields (must be zero).
    pub reserved: u32,
}

const _: () = assert!(core::mem::size_of::<BufferHeader>() == 16);

impl BufferHeader {
    /// Magic bytes identifying a table buffer.
    pub const MAGIC: [u8; 4] = *b"GBUF";
    /// Layout version written by this crate.
    pub const VERSION: u32 = 1;
    /// Header size in bytes; the first object starts here.
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// Returns the layout version (converting from little-endian).
    #[must_use]
    pub fn version(&self) -> u32 {
        u32::from_le(self.version_le)
    }

    /// Returns the root table offset (converting from little-endian).
    #[must_use]
    pub fn root(&self) -> u32 {
        u32::from_le(self.root_le)
    }
}

/// Fixed-width value stored little-endian in tables and vectors.
pub trait Scalar: Pod {
    /// Encoded width in bytes.
    const SIZE: usize = core::mem::size_of::<Self>();

    /// Appends the little-endian encoding of `self`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decodes a value from exactly [`Self::SIZE`] bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Marker types naming what an [`Offset`] points at.
pub mod marker {
    use core::marker::PhantomData;

    /// A length-prefixed UTF-8 string.
    #[derive(Debug)]
    pub enum Str {}

    /// A table with slot-addressed fields.
    #[derive(Debug)]
    pub enum Table {}

    /// A length-prefixed vector of `T`.
    #[derive(Debug)]
    pub struct Vector<T>(PhantomData<T>);
}

/// Absolute position of a finished object inside the buffer being built.
///
/// The type parameter only records what kind of object lives there so the
/// builder can reject mismatched field assignments at compile time.
pub struct Offset<T> {
    pos: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Offset<T> {
    pub(crate) const fn new(pos: u32) -> Self {
        Self {
            pos,
            _marker: PhantomData,
        }
    }

    /// Returns the absolute byte position.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.pos
    }
}

impl<T> Clone for Offset<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Offset<T> {}

impl<T> PartialEq for Offset<T> {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}

impl<T> Eq for Offset<T> {}

impl<T> Hash for Offset<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pos.hash(state);
    }
}

impl<T> fmt::Debug for Offset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Offset({})", self.pos)
    }
}

/// Rounds `n` up to the next multiple of `align` (a power of two).
#[inline]
pub(crate) const fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}
