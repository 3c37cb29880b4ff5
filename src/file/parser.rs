//! Low-level byte stream parser for the pin database container and consent messages.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor over a byte slice with
//! bounds-checked reads of little-endian primitives, raw byte runs and length-prefixed strings.
//!
//! # Key Components
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_le`] - Read primitive types (little-endian)
//! - [`crate::file::parser::Parser::read_bytes`] - Borrow a run of raw bytes
//! - [`crate::file::parser::Parser::read_prefixed_string_utf8`] - Read a u8-length-prefixed UTF-8 string
//! - [`crate::file::parser::Parser::remaining`] - Count unread bytes, used to reject trailing data
//!
//! # Usage Examples
//!
//! ```rust
//! use pinscope::Parser;
//!
//! let data = [0x01, 0x02, 0x03, b'a', b'b', b'c'];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_le::<u16>()?, 0x0201);
//! assert_eq!(parser.read_prefixed_string_utf8()?, "abc");
//! assert!(!parser.has_more_data());
//! # Ok::<(), pinscope::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, PinIO},
    Result,
};

/// A cursor-based binary data parser.
///
/// The parser maintains an internal position and validates every read against the underlying
/// slice, so truncated or hostile input produces [`crate::Error::OutOfBounds`] instead of a panic.
/// Borrowed results (`read_bytes`, `read_prefixed_string_utf8`) share the lifetime of the input.
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns `true` while unread bytes remain.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Read a little-endian value of type `T` and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough bytes remain.
    pub fn read_le<T: PinIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `len` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(out_of_bounds_error!());
        }

        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    /// Read a string prefixed by its byte length as a single `u8`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncation, or [`crate::Error::Malformed`] if the
    /// bytes are not valid UTF-8.
    pub fn read_prefixed_string_utf8(&mut self) -> Result<&'a str> {
        let len = self.read_le::<u8>()?;
        self.read_string_utf8(usize::from(len))
    }

    /// Read `len` bytes as a UTF-8 string.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncation, or [`crate::Error::Malformed`] if the
    /// bytes are not valid UTF-8.
    pub fn read_string_utf8(&mut self, len: usize) -> Result<&'a str> {
        let start = self.position;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map_err(|_| malformed_error!("Invalid UTF-8 string at offset {}", start))
    }
}
