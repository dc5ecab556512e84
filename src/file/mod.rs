//! Source file access for path relocation and checksum verification.
//!
//! The resolver never opens source files to read code; it only needs to know whether a
//! candidate path exists and, when checksum verification is enabled, what bytes it contains.
//! Both operations go through the [`SourceFiles`] trait so that callers can plug in the real
//! filesystem ([`DiskFiles`]) or a virtual one ([`MemoryFiles`]).
//!
//! # Key Components
//!
//! - [`crate::file::SourceFiles`] - Lookup of candidate source paths
//! - [`crate::file::Backend`] - Trait for byte access to an opened file
//! - [`crate::file::DiskFiles`] - `stat` based existence checks, memory-mapped contents
//! - [`crate::file::MemoryFiles`] - In-memory file set keyed by path
//! - [`crate::file::parser::Parser`] - Cursor for decoding compressed blob data
//!
//! # Examples
//!
//! ```rust
//! use pdbscope::file::{MemoryFiles, SourceFiles};
//!
//! let files = MemoryFiles::new();
//! files.insert(r"D:\work\App\Program.cs", b"class Program {}".to_vec());
//!
//! assert!(files.exists(r"D:\work\App\Program.cs"));
//! let backend = files.open(r"D:\work\App\Program.cs")?;
//! assert_eq!(backend.len(), 16);
//! # Ok::<(), pdbscope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! All types in this module are [`Send`] and [`Sync`]. [`MemoryFiles`] uses a lock-free skip
//! list so files can be added while other threads query it.

pub mod parser;

mod memory;
mod physical;

use std::{path::Path, sync::Arc};

use crossbeam_skiplist::SkipMap;

use crate::Result;
pub use memory::Memory;
pub use physical::Physical;

/// Byte access to an opened source file.
pub trait Backend: Send + Sync {
    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File lookup used to test relocation candidates.
///
/// Paths are passed exactly as the relocator produced them, i.e. possibly with a foreign
/// directory separator convention. Implementations decide how to interpret them.
pub trait SourceFiles: Send + Sync {
    /// Returns `true` if a file exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Opens the file at `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be opened.
    fn open(&self, path: &str) -> Result<Box<dyn Backend>>;
}

/// The local filesystem.
///
/// Existence is a plain `stat`; contents are memory mapped through [`Physical`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFiles;

impl SourceFiles for DiskFiles {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn open(&self, path: &str) -> Result<Box<dyn Backend>> {
        Ok(Box::new(Physical::new(path)?))
    }
}

/// A virtual file set keyed by exact path string.
#[derive(Default)]
pub struct MemoryFiles {
    files: SkipMap<String, Arc<Vec<u8>>>,
}

impl MemoryFiles {
    /// Creates an empty file set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file.
    pub fn insert(&self, path: impl Into<String>, contents: Vec<u8>) {
        self.files.insert(path.into(), Arc::new(contents));
    }

    /// Number of files in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the set holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceFiles for MemoryFiles {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Backend>> {
        match self.files.get(path) {
            Some(entry) => Ok(Box::new(Memory::new(entry.value().as_ref().clone()))),
            None => Err(crate::Error::FileError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{path} is not part of the in-memory file set"),
            ))),
        }
    }
}
