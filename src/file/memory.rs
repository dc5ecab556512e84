//! In-memory file backend.
//!
//! [`crate::file::Memory`] owns a byte buffer and implements
//! [`crate::file::Backend`] on top of it. It backs [`crate::file::MemoryFiles`] and is handy
//! wherever source contents are already loaded.

use super::Backend;

/// Owned byte buffer exposed through [`Backend`].
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Wraps `data`.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
