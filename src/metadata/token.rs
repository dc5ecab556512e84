//! Metadata tokens identifying methods, documents and debug table rows.
//!
//! A token packs a table identifier into its top byte and a 1-based row id into the lower
//! 24 bits. The resolver uses MethodDef tokens (`0x06`) as method identifiers and Document
//! tokens (`0x30`) for source documents from the Portable PDB tables.
//!
//! # Examples
//!
//! ```rust
//! use pdbscope::metadata::token::Token;
//!
//! let token = Token::method_def(7);
//! assert_eq!(token.value(), 0x0600_0007);
//! assert_eq!(token.table(), Token::TABLE_METHOD_DEF);
//! assert_eq!(token.row(), 7);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

/// A metadata token: table identifier in the top byte, row id below.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// MethodDef table (ECMA-335 II.22.26)
    pub const TABLE_METHOD_DEF: u8 = 0x06;
    /// Portable PDB Document table
    pub const TABLE_DOCUMENT: u8 = 0x30;

    /// Creates a token from its raw value.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a MethodDef token for `row`.
    #[must_use]
    pub fn method_def(row: u32) -> Self {
        Self::from_parts(Self::TABLE_METHOD_DEF, row)
    }

    /// Creates a Document token for `row`.
    #[must_use]
    pub fn document(row: u32) -> Self {
        Self::from_parts(Self::TABLE_DOCUMENT, row)
    }

    /// Combines a table identifier and a row id; the row is truncated to 24 bits.
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// The raw 32-bit value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The table identifier.
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The 1-based row id.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// `true` for the nil token.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_token_parts() {
        let token = Token(0x0600_0001);
        assert_eq!(token.table(), 0x06);
        assert_eq!(token.row(), 1);

        let token = Token(0x06FF_FFFF);
        assert_eq!(token.row(), 0x00FF_FFFF);
    }

    #[test]
    fn test_token_constructors() {
        assert_eq!(Token::method_def(3), Token(0x0600_0003));
        assert_eq!(Token::document(12), Token(0x3000_000C));
        assert_eq!(
            Token::from_parts(Token::TABLE_DOCUMENT, 0x0100_0002),
            Token(0x3000_0002)
        );
    }

    #[test]
    fn test_token_is_null() {
        assert!(Token(0).is_null());
        assert!(!Token::method_def(1).is_null());
    }

    #[test]
    fn test_token_from_conversion() {
        let token: Token = 0x0600_0001u32.into();
        assert_eq!(token.value(), 0x0600_0001);

        let back_to_u32: u32 = token.into();
        assert_eq!(back_to_u32, 0x0600_0001);
    }

    #[test]
    fn test_token_formatting() {
        let token = Token(0x0600_0001);
        assert_eq!(format!("{}", token), "0x06000001");

        let debug_str = format!("{:?}", token);
        assert!(debug_str.contains("Token(0x06000001"));
        assert!(debug_str.contains("table: 0x06"));
        assert!(debug_str.contains("row: 1"));
    }

    #[test]
    fn test_token_ordering_and_hash() {
        let first = Token::method_def(1);
        let second = Token::method_def(2);
        let document = Token::document(1);

        assert!(first < second);
        assert!(second < document);

        let mut map = HashMap::new();
        map.insert(first, "Main");
        map.insert(second, "Helper");
        assert_eq!(map.get(&first), Some(&"Main"));
        assert_eq!(map.get(&second), Some(&"Helper"));
    }
}
