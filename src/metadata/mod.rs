//! Portable PDB metadata as seen by a debugger.
//!
//! This module holds the value types the resolver works with and the decoders that produce
//! them from the Portable PDB tables and blobs.
//!
//! # Key Components
//!
//! - [`token`] - Metadata table row references for methods and documents
//! - [`document`] - Source documents, checksums and the document name blob
//! - [`sequencepoints`] - The sequence points blob and the IL/source lookups
//! - [`localscope`] - LocalScope rows, the scope tree and local variables
//!
//! # Examples
//!
//! ```rust
//! use pdbscope::metadata::{
//!     localscope::{collect_locals, LexicalScope, ScopeVariable},
//!     sequencepoints::IlRange,
//! };
//!
//! let root = LexicalScope::new(0, 100)
//!     .with_variable(ScopeVariable::new(0, "x"))
//!     .with_child(LexicalScope::new(10, 50).with_variable(ScopeVariable::new(1, "y")));
//!
//! let locals = collect_locals(&root, |_| None);
//! let y = locals.iter().find(|local| local.name == "y").unwrap();
//! assert_eq!(y.il_ranges, vec![IlRange::new(10, 50)]);
//! ```

/// Source documents and their checksums
pub mod document;
/// Lexical scopes and local variables
pub mod localscope;
/// Sequence points parsing and lookup
pub mod sequencepoints;
/// Metadata tokens
pub mod token;
