//! Physical file backend for memory-mapped I/O.
//!
//! [`crate::file::Physical`] maps a source file into memory so that its checksum can
//! be computed without copying the whole file into a buffer first.

use super::Backend;
use crate::{
    Error::{Error, FileError},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A memory-mapped file on disk.
#[derive(Debug)]
pub struct Physical {
    data: Mmap,
}

impl Physical {
    /// Opens and maps the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be opened and
    /// [`crate::Error::Error`] if mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        // The mapping is read-only and dropped together with `Physical`; concurrent truncation
        // of a source file by another process is outside what the resolver guards against.
        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_physical_invalid_file_path() {
        let result = Physical::new(PathBuf::from("/nonexistent/path/to/Program.cs"));
        assert!(result.is_err());
        match result.unwrap_err() {
            FileError(io_error) => {
                assert_eq!(io_error.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected FileError"),
        }
    }

    #[test]
    fn test_physical_small_file() {
        let temp_path = std::env::temp_dir().join("pdbscope_physical_small.cs");
        let contents = b"namespace App { }";
        std::fs::write(&temp_path, contents).unwrap();

        let physical = Physical::new(&temp_path).unwrap();
        assert_eq!(physical.len(), contents.len());
        assert_eq!(physical.data(), contents);
        assert_eq!(&physical.data()[..9], b"namespace");

        std::fs::remove_file(&temp_path).unwrap();
    }

    #[test]
    fn test_physical_empty_file() {
        let temp_path = std::env::temp_dir().join("pdbscope_physical_empty.cs");
        std::fs::write(&temp_path, b"").unwrap();

        let physical = Physical::new(&temp_path).unwrap();
        assert_eq!(physical.len(), 0);
        assert!(physical.is_empty());
        assert!(physical.data().is_empty());

        std::fs::remove_file(&temp_path).unwrap();
    }
}
