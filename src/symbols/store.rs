//! In-memory symbol store.
//!
//! [`MemorySymbolStore`] holds the debug information of one module as decoded from its
//! Portable PDB: the Document table and, per method, the sequence points and LocalScope rows.
//! It implements [`SymbolStore`] and can be populated and queried from several threads at the
//! same time.
//!
//! Sequence points may be added already decoded or as the raw blob from the
//! MethodDebugInformation table, in which case they are decoded the first time the method is
//! looked at and kept. A corrupt blob only surfaces for that method; queries spanning the
//! whole module skip it.
//!
//! # Examples
//!
//! ```rust
//! use pdbscope::prelude::*;
//!
//! let store = MemorySymbolStore::new();
//! store.add_document(Document::new(Token::document(1), "/src/Program.cs"));
//!
//! // LocalSignature 0; IL 0: line 3 col 5-17; IL 0x06: line 4 col 5-6
//! let blob = vec![0x00, 0x00, 0x00, 0x0C, 0x03, 0x05, 0x06, 0x00, 0x01, 0x02, 0x00];
//! store.add_method(Token::method_def(1), MethodSymbols::from_blob(blob, 1));
//!
//! let points = store.sequence_points(Token::method_def(1), 0x10)?;
//! assert_eq!(points.len(), 2);
//! assert_eq!(points.0[1].start_line, 4);
//! # Ok::<(), pdbscope::Error>(())
//! ```

use std::sync::{Arc, OnceLock};

use crossbeam_skiplist::SkipMap;

use crate::{
    metadata::{
        document::{Document, DocumentRc},
        localscope::{LexicalScope, LocalScopeRow},
        sequencepoints::{parse_sequence_points, SequencePointRecord, SequencePoints},
        token::Token,
    },
    symbols::SymbolStore,
    Error, Result,
};

/// A reference-counted pointer to the symbols of one method
pub type MethodSymbolsRc = Arc<MethodSymbols>;
/// A map that holds the mapping of [`Token`] to [`MethodSymbols`]
pub type MethodSymbolsMap = SkipMap<Token, MethodSymbolsRc>;
/// A vector that holds a list of [`Document`]
pub type DocumentList = Arc<boxcar::Vec<DocumentRc>>;

#[derive(Debug, Clone)]
enum PointData {
    Decoded(Vec<SequencePointRecord>),
    Encoded {
        blob: Vec<u8>,
        document: u32,
        decoded: OnceLock<Vec<SequencePointRecord>>,
    },
}

/// Debug information of one method.
#[derive(Debug, Clone)]
pub struct MethodSymbols {
    points: PointData,
    /// LocalScope rows of the method, in any order
    pub scopes: Vec<LocalScopeRow>,
}

impl MethodSymbols {
    /// Symbols from already decoded sequence point records.
    #[must_use]
    pub fn new(records: Vec<SequencePointRecord>) -> Self {
        MethodSymbols {
            points: PointData::Decoded(records),
            scopes: Vec::new(),
        }
    }

    /// Symbols from a raw sequence points blob.
    ///
    /// `document` is the Document row id of the MethodDebugInformation row, 0 if the blob
    /// names its initial document itself.
    #[must_use]
    pub fn from_blob(blob: Vec<u8>, document: u32) -> Self {
        MethodSymbols {
            points: PointData::Encoded {
                blob,
                document,
                decoded: OnceLock::new(),
            },
            scopes: Vec::new(),
        }
    }

    /// Adds a LocalScope row.
    #[must_use]
    pub fn with_scope(mut self, scope: LocalScopeRow) -> Self {
        self.scopes.push(scope);
        self
    }

    /// The sequence point records, decoding the blob on first use.
    ///
    /// Malformed blobs are not cached and fail again on the next call.
    ///
    /// # Errors
    /// Returns an error if the sequence points blob is malformed.
    pub fn records(&self) -> Result<&[SequencePointRecord]> {
        match &self.points {
            PointData::Decoded(records) => Ok(records.as_slice()),
            PointData::Encoded {
                blob,
                document,
                decoded,
            } => {
                if let Some(records) = decoded.get() {
                    return Ok(records.as_slice());
                }
                let records = parse_sequence_points(blob, *document)?;
                Ok(decoded.get_or_init(|| records).as_slice())
            }
        }
    }
}

/// Thread-safe in-memory [`SymbolStore`].
#[derive(Default)]
pub struct MemorySymbolStore {
    methods: MethodSymbolsMap,
    documents: DocumentList,
}

impl MemorySymbolStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        MemorySymbolStore {
            methods: SkipMap::new(),
            documents: Arc::new(boxcar::Vec::new()),
        }
    }

    /// Adds a document and returns the shared handle to it.
    pub fn add_document(&self, document: Document) -> DocumentRc {
        let document = Arc::new(document);
        self.documents.push(document.clone());
        document
    }

    /// Adds or replaces the symbols of `method`.
    pub fn add_method(&self, method: Token, symbols: MethodSymbols) {
        self.methods.insert(method, Arc::new(symbols));
    }

    /// The document with Document table row id `row`.
    #[must_use]
    pub fn document(&self, row: u32) -> Option<DocumentRc> {
        self.documents
            .iter()
            .find(|(_, document)| document.token.row() == row)
            .map(|(_, document)| document.clone())
    }

    /// Number of methods with symbols.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    fn method(&self, method: Token) -> Result<MethodSymbolsRc> {
        self.methods
            .get(&method)
            .map(|entry| entry.value().clone())
            .ok_or(Error::NoSymbols(method))
    }

    /// Calls `f` for every visible record of every method that lies in `document`.
    ///
    /// Methods with a malformed sequence points blob are skipped.
    fn for_each_visible<F>(&self, document: &Document, mut f: F)
    where
        F: FnMut(Token, &SequencePointRecord),
    {
        let row = document.token.row();
        for entry in self.methods.iter() {
            let records = match entry.value().records() {
                Ok(records) => records,
                Err(error) => {
                    log::warn!("Skipping sequence points of {} - {}", entry.key(), error);
                    continue;
                }
            };
            for record in records
                .iter()
                .filter(|record| !record.is_hidden && record.document == row)
            {
                f(*entry.key(), record);
            }
        }
    }
}

fn covers(record: &SequencePointRecord, line: u32, column: u16) -> bool {
    if line < record.start_line || line > record.end_line {
        return false;
    }
    if column == 0 {
        return true;
    }
    (line != record.start_line || column >= record.start_col)
        && (line != record.end_line || column <= record.end_col)
}

impl SymbolStore for MemorySymbolStore {
    fn contains_method(&self, method: Token) -> bool {
        self.methods.contains_key(&method)
    }

    fn sequence_points(&self, method: Token, code_size: u32) -> Result<SequencePoints> {
        let symbols = self.method(method)?;
        let records = symbols.records()?;

        Ok(SequencePoints::from_records(
            method,
            records,
            code_size,
            |row| self.document(row),
        ))
    }

    fn root_scope(&self, method: Token, code_size: u32) -> Result<LexicalScope> {
        let symbols = self.method(method)?;
        LexicalScope::from_rows(code_size, &symbols.scopes)
    }

    fn documents(&self) -> Vec<DocumentRc> {
        self.documents
            .iter()
            .map(|(_, document)| document.clone())
            .collect()
    }

    fn closest_line(&self, document: &Document, line: u32) -> Result<u32> {
        let mut after: Option<u32> = None;
        let mut before: Option<u32> = None;

        self.for_each_visible(document, |_, record| {
            let start = record.start_line;
            if start >= line {
                after = Some(after.map_or(start, |best| best.min(start)));
            } else {
                before = Some(before.map_or(start, |best| best.max(start)));
            }
        });

        after
            .or(before)
            .ok_or_else(|| Error::NotFound(format!("no code in {}", document.name)))
    }

    fn method_at_position(&self, document: &Document, line: u32, column: u16) -> Result<Token> {
        let mut exact: Option<Token> = None;
        let mut on_line: Option<Token> = None;

        self.for_each_visible(document, |method, record| {
            if exact.is_none() && covers(record, line, column) {
                exact = Some(method);
            }
            if on_line.is_none() && covers(record, line, 0) {
                on_line = Some(method);
            }
        });

        exact.or(on_line).ok_or_else(|| {
            Error::NotFound(format!("no method at {}:{},{}", document.name, line, column))
        })
    }
}
