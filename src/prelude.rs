//! # pdbscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the pdbscope library. Import this module to get quick access to the resolver, its
//! collaborators and the symbol value types.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all pdbscope operations
pub use crate::Error;

/// The result type used throughout pdbscope
pub use crate::Result;

/// Low-level blob parsing
pub use crate::Parser;

// ================================================================================================
// Resolver
// ================================================================================================

/// The resolver and its configuration
pub use crate::symbols::{PdbSymbolSource, ResolverConfig};

/// Operations and collaborator contracts
pub use crate::symbols::{CompiledMethod, DebugModule, SymbolSource, SymbolStore};

/// In-memory collaborators
pub use crate::symbols::{LoadedMethod, LoadedModule, MemorySymbolStore, MethodSymbols};

/// Path relocation
pub use crate::symbols::relocate::{relocate, RelocatedPaths};

// ================================================================================================
// Symbol Value Types
// ================================================================================================

/// Metadata token type for methods and documents
pub use crate::metadata::token::Token;

/// Source documents
pub use crate::metadata::document::{Document, DocumentRc, HashAlgorithm, Language};

/// Sequence points
pub use crate::metadata::sequencepoints::{
    IlRange, SequencePoint, SequencePointRecord, SequencePoints, SourcePosition,
};

/// Lexical scopes and locals
pub use crate::metadata::localscope::{
    LexicalScope, LocalScopeRow, LocalVariable, LocalVariableAttributes, ScopeVariable,
};

// ================================================================================================
// Source Files
// ================================================================================================

/// Source file lookup
pub use crate::file::{DiskFiles, MemoryFiles, SourceFiles};
