//! Symbol resolution on top of Portable PDB data.
//!
//! [`PdbSymbolSource`] implements [`SymbolSource`] for any module whose symbols are exposed
//! through a [`SymbolStore`]. It never fails loudly: missing symbols, unknown documents and
//! corrupt symbol data all resolve to `None`. Corrupt data is logged with `log::warn!`, plain
//! misses with `log::debug!`.
//!
//! # Source Paths
//!
//! Paths in the symbols are the paths at compile time. Before a sequence point is handed out
//! its path is relocated against the path of the loaded binary (see
//! [`crate::symbols::relocate`]). If a candidate exists on disk it replaces the recorded path
//! and [`SequencePoint::located`] is set; otherwise the recorded path is kept.
//!
//! With [`ResolverConfig::verify_checksums`] a candidate is only accepted if its content
//! matches the checksum the compiler recorded for the document.

use crate::{
    file::{DiskFiles, SourceFiles},
    metadata::{
        document::{is_compiler_temporary, Document, DocumentRc},
        localscope::{collect_locals, LocalVariable},
        sequencepoints::{IlRange, SequencePoint, SequencePoints},
    },
    symbols::{
        relocate::{eq_ignore_case, file_name, source_code_path},
        CompiledMethod, DebugModule, ResolverConfig, SymbolSource, SymbolStore,
    },
};

/// Resolves IL offsets, source positions and locals through a module's [`SymbolStore`].
pub struct PdbSymbolSource<F: SourceFiles = DiskFiles> {
    files: F,
    config: ResolverConfig,
}

impl PdbSymbolSource<DiskFiles> {
    /// A resolver probing the local filesystem, with the default configuration.
    #[must_use]
    pub fn disk() -> Self {
        Self::new(DiskFiles)
    }
}

impl Default for PdbSymbolSource<DiskFiles> {
    fn default() -> Self {
        Self::disk()
    }
}

impl<F: SourceFiles> PdbSymbolSource<F> {
    /// A resolver probing `files`, with the default configuration.
    pub fn new(files: F) -> Self {
        Self::with_config(files, ResolverConfig::default())
    }

    /// A resolver probing `files` with `config`.
    pub fn with_config(files: F, config: ResolverConfig) -> Self {
        PdbSymbolSource { files, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The file set relocation candidates are checked against.
    pub fn files(&self) -> &F {
        &self.files
    }

    /// The relocated path of `original`, if a candidate exists below `module`.
    ///
    /// With checksum verification enabled, `document` supplies the expected checksum.
    pub fn source_code_path(
        &self,
        module: &dyn DebugModule,
        original: &str,
        document: Option<&Document>,
    ) -> Option<String> {
        source_code_path(
            &self.files,
            module.binary_path(),
            original,
            self.config.relocation_depth,
            |candidate| self.accept(candidate, document),
        )
    }

    fn accept(&self, candidate: &str, document: Option<&Document>) -> bool {
        let Some(document) = document.filter(|_| self.config.verify_checksums) else {
            return true;
        };

        match self.files.open(candidate) {
            Ok(contents) => match document.verify_checksum(contents.data()) {
                Some(false) => {
                    log::debug!(
                        "Checksum mismatch for {} (expected {})",
                        candidate,
                        document.hash_hex()
                    );
                    false
                }
                _ => true,
            },
            Err(error) => {
                log::debug!("Cannot read {} - {}", candidate, error);
                false
            }
        }
    }

    fn symbols_for<'m>(&self, method: &'m dyn CompiledMethod) -> Option<&'m dyn SymbolStore> {
        method
            .module()
            .symbols()
            .filter(|store| store.contains_method(method.token()))
    }

    fn fetch_points(&self, method: &dyn CompiledMethod) -> Option<SequencePoints> {
        let store = self.symbols_for(method)?;

        match store.sequence_points(method.token(), method.code_size()) {
            Ok(points) => Some(points),
            Err(error) => {
                log::warn!(
                    "Discarding sequence points of {} - {}",
                    method.token(),
                    error
                );
                None
            }
        }
    }

    fn document_named(store: &dyn SymbolStore, name: &str) -> Option<DocumentRc> {
        store
            .documents()
            .into_iter()
            .find(|document| document.name == name)
    }

    fn locate(
        &self,
        module: &dyn DebugModule,
        mut point: SequencePoint,
        document: Option<&Document>,
    ) -> SequencePoint {
        if let Some(path) = self.source_code_path(module, &point.filename, document) {
            point.filename = path;
            point.located = true;
        }
        point
    }

    fn find_document(
        &self,
        module: &dyn DebugModule,
        documents: &[DocumentRc],
        filename: &str,
    ) -> Option<DocumentRc> {
        if let Some(document) = documents
            .iter()
            .find(|document| eq_ignore_case(&document.name, filename))
        {
            return Some(document.clone());
        }

        let name = file_name(filename);
        documents
            .iter()
            .filter(|document| eq_ignore_case(document.file_name(), name))
            .find(|document| {
                self.source_code_path(module, &document.name, Some(document.as_ref()))
                    .is_some_and(|path| eq_ignore_case(&path, filename))
            })
            .cloned()
    }
}

impl<F: SourceFiles> SymbolSource for PdbSymbolSource<F> {
    fn has_symbols(&self, method: &dyn CompiledMethod) -> bool {
        self.symbols_for(method).is_some()
    }

    fn find_by_offset(&self, method: &dyn CompiledMethod, il_offset: u32) -> Option<SequencePoint> {
        let points = self.fetch_points(method)?;

        let Some(point) = points.find_by_offset(il_offset) else {
            log::debug!(
                "No sequence point for {} at IL_{:04x}",
                method.token(),
                il_offset
            );
            return None;
        };

        if self.config.reject_compiler_temporaries && is_compiler_temporary(&point.filename) {
            log::debug!("Ignoring compiler temporary file {}", point.filename);
            return None;
        }

        let module = method.module();
        let document = module
            .symbols()
            .and_then(|store| Self::document_named(store, &point.filename));

        Some(self.locate(module, point.clone(), document.as_deref()))
    }

    fn find_by_location(
        &self,
        module: &dyn DebugModule,
        filename: &str,
        line: u32,
        column: u16,
    ) -> Option<SequencePoint> {
        let store = module.symbols()?;

        let documents = store.documents();
        let Some(document) = self.find_document(module, &documents, filename) else {
            log::debug!("No document matches {}", filename);
            return None;
        };

        let method = store
            .closest_line(&document, line)
            .and_then(|valid_line| store.method_at_position(&document, valid_line, column));
        let method = match method {
            Ok(method) => method,
            Err(error) => {
                log::debug!("No method at {}:{} - {}", filename, line, error);
                return None;
            }
        };

        let code_size = module.code_size(method).unwrap_or(0);
        let points = match store.sequence_points(method, code_size) {
            Ok(points) => points,
            Err(error) => {
                log::warn!("Discarding sequence points of {} - {}", method, error);
                return None;
            }
        };

        let in_document = SequencePoints(
            points
                .into_iter()
                .filter(|point| point.filename == document.name)
                .collect(),
        );
        let point = in_document.find_by_position(line, column)?.clone();

        Some(self.locate(module, point, Some(document.as_ref())))
    }

    fn ignored_ranges(&self, method: &dyn CompiledMethod) -> Option<Vec<IlRange>> {
        let points = self.fetch_points(method)?;
        Some(points.ignored_ranges())
    }

    fn local_variables(&self, method: &dyn CompiledMethod) -> Option<Vec<LocalVariable>> {
        let store = self.symbols_for(method)?;

        match store.root_scope(method.token(), method.code_size()) {
            Ok(root) => Some(collect_locals(&root, |slot| {
                method.local_variable_type(slot)
            })),
            Err(error) => {
                log::warn!("Discarding scopes of {} - {}", method.token(), error);
                None
            }
        }
    }
}
