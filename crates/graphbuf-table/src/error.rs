// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type shared by the table builder and reader.

use thiserror::Error;

/// Errors produced while building or reading a table buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Buffer is too small to contain a valid header.
    #[error("buffer too small: {size} bytes, minimum {minimum}")]
    TooSmall {
        /// Actual buffer size.
        size: usize,
        /// Minimum required size.
        minimum: usize,
    },

    /// Magic bytes don't match the expected value.
    #[error("invalid magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: [u8; 4],
        /// Actual magic bytes found.
        actual: [u8; 4],
    },

    /// Header announces a layout version this reader does not understand.
    #[error("unsupported table layout version {0}")]
    UnsupportedVersion(u32),

    /// An object or field would extend past the end of the buffer.
    #[error("{what} out of bounds: offset {offset}, length {length}, buffer size {size}")]
    OutOfBounds {
        /// Object kind for diagnostics.
        what: &'static str,
        /// Object offset.
        offset: u64,
        /// Object length in bytes.
        length: u64,
        /// Total buffer size.
        size: usize,
    },

    /// A reference does not point to an object written before its holder.
    #[error("reference at {from} points to {to}, which is not an earlier object")]
    ForwardReference {
        /// Position of the object holding the reference.
        from: u32,
        /// Referenced position.
        to: u32,
    },

    /// Field slot index exceeds the table's declared slot count.
    #[error("slot {slot} out of range for table with {slots} slots")]
    SlotOutOfRange {
        /// Requested slot.
        slot: u16,
        /// Declared slot count.
        slots: u16,
    },

    /// String bytes are not valid UTF-8.
    #[error("invalid utf-8 in string at offset {0}")]
    InvalidUtf8(u32),

    /// Object does not start on its required boundary.
    #[error("{what} at offset {offset} is not {alignment}-byte aligned")]
    Misaligned {
        /// Object kind for diagnostics.
        what: &'static str,
        /// Object offset.
        offset: u32,
        /// Required alignment.
        alignment: usize,
    },

    /// Buffer grew past the 32-bit offset range.
    #[error("buffer exceeds the 32-bit offset range")]
    TooLarge,
}
