// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Offset-addressed binary tables for graphbuf.
//!
//! A buffer is a 16-byte [`BufferHeader`] followed by strings, vectors and
//! tables appended front to back. Tables address their fields through a slot
//! array, so optional fields cost four bytes when absent and readers can
//! access any field without parsing the rest of the buffer.
//!
//! # Layout
//!
//! - **String**: `u32` length + UTF-8 bytes.
//! - **Vector**: `u32` length + little-endian elements, the first element
//!   aligned to `max(4, size_of::<T>())`.
//! - **Table**: `u16` slot count, `u16` reserved, one `u32` per slot holding
//!   the field position relative to the table (`0` = absent), field data.
//!
//! References are absolute `u32` offsets and always point at an object
//! written earlier. [`TableBuilder`] guarantees this by construction and the
//! reader rejects anything else, so a valid buffer is acyclic.
//!
//! # Example
//!
//! ```
//! use graphbuf_table::{Buffer, TableBuilder};
//!
//! # fn main() -> Result<(), graphbuf_table::TableError> {
//! let mut builder = TableBuilder::new();
//! let name = builder.create_string("root")?;
//! let mut table = builder.start_table(2);
//! table.add_offset(0, name)?;
//! table.add_scalar(1, 42u32)?;
//! let root = table.finish()?;
//! let bytes = builder.finish(root);
//!
//! let root = Buffer::new(&bytes)?.root_table()?;
//! assert_eq!(root.str(0)?, Some("root"));
//! assert_eq!(root.scalar::<u32>(1)?, Some(42));
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
mod reader;
mod types;

pub use builder::{TableBuilder, TableWriter};
pub use error::TableError;
pub use reader::{Buffer, Table, TableVector, Vector};
pub use types::{marker, BufferHeader, Offset, Scalar};
