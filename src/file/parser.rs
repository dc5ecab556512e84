//! Low-level byte stream parser for Portable PDB blob decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data parser
//! used to read the compressed encodings that Portable PDB stores in its blob heap: sequence
//! point blobs, document name blobs and similar structures defined on top of ECMA-335.
//!
//! # Architecture
//!
//! The parser maintains a position within a byte slice and provides:
//!
//! - **Position tracking** - Maintains current offset for sequential parsing operations
//! - **Bounds checking** - All operations validate data availability before reading
//! - **Compressed integers** - ECMA-335 II.23.2 unsigned and signed compressed integers
//!
//! # Usage Examples
//!
//! ```rust
//! use pdbscope::Parser;
//!
//! // 3, then -2 (signed, one byte: rotated into 0x7D), then 0x1234 (two bytes)
//! let data = [0x03, 0x7D, 0x92, 0x34];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_compressed_uint()?, 3);
//! assert_eq!(parser.read_compressed_int()?, -2);
//! assert_eq!(parser.read_compressed_uint()?, 0x1234);
//! assert!(!parser.has_more_data());
//! # Ok::<(), pdbscope::Error>(())
//! ```

use crate::Result;

/// A cursor over a byte slice for reading compressed metadata values.
///
/// The parser maintains an internal position cursor and provides bounds checking
/// to prevent buffer overruns when reading malformed or truncated data.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Read a single byte and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] at the end of the data.
    pub fn read_u8(&mut self) -> Result<u8> {
        let Some(&byte) = self.data.get(self.position) else {
            return Err(out_of_bounds_error!());
        };

        self.position += 1;
        Ok(byte)
    }

    /// Read a compressed unsigned integer as defined in ECMA-335 II.23.2.
    ///
    /// Returns the decoded value together with its encoded width in bytes (1, 2 or 4),
    /// which [`Parser::read_compressed_int`] needs for sign extension.
    fn read_compressed_uint_sized(&mut self) -> Result<(u32, u8)> {
        let first_byte = self.read_u8()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok((u32::from(first_byte), 1));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_u8()?;
            let value = ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte);
            return Ok((value, 2));
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_u8()?);
            let b2 = u32::from(self.read_u8()?);
            let b3 = u32::from(self.read_u8()?);
            let value = ((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3;
            return Ok((value, 4));
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }

    /// Read a compressed unsigned integer as defined in ECMA-335 II.23.2.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for an invalid leading byte.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        Ok(self.read_compressed_uint_sized()?.0)
    }

    /// Read a compressed signed integer as defined in ECMA-335 II.23.2.
    ///
    /// The value is rotated left by one bit within its encoded width (6, 13 or 28 bits of
    /// payload), so the sign bit ends up in the least significant position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for invalid encoding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pdbscope::Parser;
    ///
    /// assert_eq!(Parser::new(&[0x06]).read_compressed_int()?, 3);
    /// assert_eq!(Parser::new(&[0x7B]).read_compressed_int()?, -3);
    /// assert_eq!(Parser::new(&[0x80, 0x01]).read_compressed_int()?, -8192);
    /// # Ok::<(), pdbscope::Error>(())
    /// ```
    pub fn read_compressed_int(&mut self) -> Result<i32> {
        let (unsigned, width) = self.read_compressed_uint_sized()?;

        let payload = unsigned >> 1;
        if unsigned & 1 == 0 {
            #[allow(clippy::cast_possible_wrap)]
            return Ok(payload as i32);
        }

        let sign_extension: u32 = match width {
            1 => 0xFFFF_FFC0,
            2 => 0xFFFF_E000,
            _ => 0xF000_0000,
        };

        #[allow(clippy::cast_possible_wrap)]
        Ok((payload | sign_extension) as i32)
    }
}
