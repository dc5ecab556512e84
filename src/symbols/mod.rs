//! Symbol resolution for compiled methods.
//!
//! This module answers the questions a debugger asks about compiled code: which source
//! statement an IL offset belongs to, which IL belongs to a source position, which
//! instructions the stepper should skip and which locals are declared where.
//!
//! # Architecture
//!
//! The resolver is written against three collaborator traits:
//!
//! - [`SymbolStore`] - read access to the debug symbols of one module
//! - [`DebugModule`] - a loaded binary: its location on disk, its symbols and method bodies
//! - [`CompiledMethod`] - one method of a loaded binary
//!
//! [`PdbSymbolSource`] implements the [`SymbolSource`] operations on top of them. The
//! [`store`] and [`module`] submodules provide in-memory implementations of the collaborators,
//! populated from decoded Portable PDB data.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use pdbscope::prelude::*;
//!
//! let store = MemorySymbolStore::new();
//! let document = store.add_document(Document::new(Token::document(1), "/src/App/Program.cs"));
//! store.add_method(
//!     Token::method_def(1),
//!     MethodSymbols::new(vec![SequencePointRecord {
//!         il_offset: 0,
//!         document: document.token.row(),
//!         start_line: 5,
//!         start_col: 9,
//!         end_line: 5,
//!         end_col: 30,
//!         is_hidden: false,
//!     }]),
//! );
//!
//! let module = Arc::new(LoadedModule::new("/src/App/bin/App.dll").with_symbols(store));
//! module.add_method(Token::method_def(1), 16);
//!
//! let files = MemoryFiles::new();
//! files.insert("/src/App/Program.cs", b"class Program {}".to_vec());
//!
//! let resolver = PdbSymbolSource::new(files);
//! let method = LoadedMethod::new(module.clone(), Token::method_def(1));
//!
//! let point = resolver.find_by_offset(&method, 4).unwrap();
//! assert_eq!(point.start_line, 5);
//! assert!(point.located);
//! ```

pub mod config;
pub mod module;
pub mod pdb;
pub mod relocate;
pub mod store;

pub use config::ResolverConfig;
pub use module::{LoadedMethod, LoadedModule};
pub use pdb::PdbSymbolSource;
pub use store::{MemorySymbolStore, MethodSymbols};

use crate::{
    metadata::{
        document::{Document, DocumentRc},
        localscope::{LexicalScope, LocalVariable},
        sequencepoints::{IlRange, SequencePoint, SequencePoints},
        token::Token,
    },
    Result,
};

/// Read access to the debug symbols of one module.
///
/// Implementations must be safe to query from several threads.
pub trait SymbolStore: Send + Sync {
    /// `true` if the symbols describe `method`.
    fn contains_method(&self, method: Token) -> bool;

    /// The sequence points of `method`, hidden ones included, in store order.
    ///
    /// `code_size` is the length of the method body in bytes and closes the last range.
    ///
    /// # Errors
    /// Returns [`crate::Error::NoSymbols`] for unknown methods and [`crate::Error::Malformed`]
    /// for corrupt symbol data.
    fn sequence_points(&self, method: Token, code_size: u32) -> Result<SequencePoints>;

    /// The lexical scope tree of `method`.
    ///
    /// # Errors
    /// Returns [`crate::Error::NoSymbols`] for unknown methods and [`crate::Error::Malformed`]
    /// for scope rows that do not nest.
    fn root_scope(&self, method: Token, code_size: u32) -> Result<LexicalScope>;

    /// All source documents the symbols refer to.
    fn documents(&self) -> Vec<DocumentRc>;

    /// The closest line of `document` that has code: the first line at or after `line`,
    /// otherwise the last line before it.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotFound`] if no visible sequence point refers to `document`.
    fn closest_line(&self, document: &Document, line: u32) -> Result<u32>;

    /// The method whose code covers `(line, column)` in `document`.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotFound`] if no method covers the position.
    fn method_at_position(&self, document: &Document, line: u32, column: u16) -> Result<Token>;
}

/// A loaded binary.
pub trait DebugModule: Send + Sync {
    /// Path of the binary on disk, used as base for relocating source paths.
    fn binary_path(&self) -> &str;

    /// The debug symbols of the binary, if any were loaded.
    fn symbols(&self) -> Option<&dyn SymbolStore>;

    /// Size of the IL body of `method` in bytes.
    fn code_size(&self, method: Token) -> Option<u32>;

    /// Display name of the declared type of local `slot` in `method`.
    fn local_variable_type(&self, method: Token, slot: u16) -> Option<String>;
}

/// A method of a loaded binary.
pub trait CompiledMethod {
    /// MethodDef token of the method.
    fn token(&self) -> Token;

    /// The module declaring the method.
    fn module(&self) -> &dyn DebugModule;

    /// Size of the IL body in bytes, 0 if unknown.
    fn code_size(&self) -> u32 {
        self.module().code_size(self.token()).unwrap_or(0)
    }

    /// Display name of the declared type of local `slot`.
    fn local_variable_type(&self, slot: u16) -> Option<String> {
        self.module().local_variable_type(self.token(), slot)
    }
}

/// The operations a debugger needs from debug symbols.
///
/// Every operation answers `None` (or `false`) when no symbols are available. None of them
/// modify any state.
pub trait SymbolSource {
    /// `true` if symbols for `method` are loaded.
    fn has_symbols(&self, method: &dyn CompiledMethod) -> bool;

    /// The visible sequence point an IL offset belongs to, with its path relocated.
    fn find_by_offset(&self, method: &dyn CompiledMethod, il_offset: u32) -> Option<SequencePoint>;

    /// The sequence point for a source position in `module`.
    ///
    /// A `column` of 0 matches the first statement starting on or after `line`.
    fn find_by_location(
        &self,
        module: &dyn DebugModule,
        filename: &str,
        line: u32,
        column: u16,
    ) -> Option<SequencePoint>;

    /// IL ranges of compiler-generated code the stepper should skip.
    fn ignored_ranges(&self, method: &dyn CompiledMethod) -> Option<Vec<IlRange>>;

    /// The locals declared anywhere in `method`, each with the range of its scope.
    fn local_variables(&self, method: &dyn CompiledMethod) -> Option<Vec<LocalVariable>>;
}
