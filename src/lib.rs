// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # pdbscope
//!
//! Debug symbol resolution for .NET debuggers, built on Portable PDB data.
//!
//! A debugger needs to translate between what the runtime reports and what the user sees:
//! the IL offset a thread stopped at becomes a file, line and column; a breakpoint set on a
//! source line becomes an IL position; the stepper needs to know which instructions are
//! compiler-generated; the locals window needs names, types and visibility ranges of every
//! local. `pdbscope` answers these questions from the sequence points and scope tables of
//! the symbols, and relocates source paths recorded at compile time to where the files
//! live now.
//!
//! ## Features
//!
//! - **🔍 Offset to source** - Sequence point lookup with hidden-code handling
//! - **📍 Source to offset** - Document matching, line snapping and method lookup
//! - **🧭 Path relocation** - Lazy candidate generation for moved checkouts and relative paths
//! - **🧩 Scope walking** - Locals with their scope ranges, iteratively for any nesting depth
//! - **🛡️ Checksum verification** - MD5, SHA-1 and SHA-256 document checksums
//! - **⚡ Concurrent stores** - Lock-free symbol stores that can be queried from any thread
//!
//! ### Using the Prelude
//!
//! ```rust
//! use std::sync::Arc;
//! use pdbscope::prelude::*;
//!
//! let store = MemorySymbolStore::new();
//! store.add_document(Document::new(Token::document(1), r"C:\build\App\Program.cs"));
//! store.add_method(
//!     Token::method_def(1),
//!     MethodSymbols::new(vec![
//!         SequencePointRecord {
//!             il_offset: 0,
//!             document: 1,
//!             start_line: 5,
//!             start_col: 9,
//!             end_line: 5,
//!             end_col: 30,
//!             is_hidden: false,
//!         },
//!         SequencePointRecord::hidden(10, 1),
//!     ]),
//! );
//!
//! let module = Arc::new(LoadedModule::new(r"D:\App\bin\App.exe").with_symbols(store));
//! module.add_method(Token::method_def(1), 20);
//!
//! let files = MemoryFiles::new();
//! files.insert(r"D:\App\Program.cs", Vec::new());
//!
//! let resolver = PdbSymbolSource::new(files);
//! let method = LoadedMethod::new(module, Token::method_def(1));
//!
//! let point = resolver.find_by_offset(&method, 2).unwrap();
//! assert_eq!(point.filename, r"D:\App\Program.cs");
//! assert_eq!(resolver.ignored_ranges(&method).unwrap(), vec![IlRange::new(10, 20)]);
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`metadata`] - Portable PDB value types and blob decoding
//! - [`symbols`] - The resolver, its collaborator traits and in-memory implementations
//! - [`file`] - Source file access for relocation and checksum verification
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! Decoders and stores return [`Result<T, Error>`](Result). The resolver itself answers with
//! `Option`s: missing or corrupt symbols make a lookup fail, never the debugger.
//!
//! ```rust
//! use pdbscope::{metadata::sequencepoints::parse_sequence_points, Error};
//!
//! match parse_sequence_points(&[0x00, 0x00, 0x05], 1) {
//!     Ok(records) => println!("{} records", records.len()),
//!     Err(Error::OutOfBounds) => println!("Truncated blob"),
//!     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ### References
//!
//! - [ECMA-335 Standard](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)
//! - [Portable PDB](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md)

#[macro_use]
pub(crate) mod error;

#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// ```rust
/// use pdbscope::prelude::*;
///
/// let token = Token::method_def(1);
/// let config = ResolverConfig::default();
/// assert!(config.reject_compiler_temporaries);
/// ```
pub mod prelude;

/// Source file access.
///
/// [`file::SourceFiles`] is the lookup the resolver uses to test relocation candidates and to
/// read file contents for checksum verification. [`file::DiskFiles`] uses the local
/// filesystem, [`file::MemoryFiles`] a virtual file set.
pub mod file;

/// Portable PDB value types and decoders.
///
/// Tokens, documents, sequence points and lexical scopes, together with the decoders for
/// the sequence points blob and the document name blob.
pub mod metadata;

/// Symbol resolution.
///
/// See [`symbols::PdbSymbolSource`] for the resolver and [`symbols::SymbolSource`] for the
/// operations it provides.
pub mod symbols;

/// `pdbscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `pdbscope` Error type
///
/// The error type for all fallible operations in this crate.
pub use error::Error;

/// Provides access to the low-level blob parser.
///
/// # Example
///
/// ```rust
/// use pdbscope::Parser;
///
/// let blob = [0xC0, 0x00, 0x40, 0x00];
/// let mut parser = Parser::new(&blob);
/// assert_eq!(parser.read_compressed_uint()?, 0x4000);
/// # Ok::<(), pdbscope::Error>(())
/// ```
pub use file::parser::Parser;
