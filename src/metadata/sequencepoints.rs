//!
//! Sequence Points parsing, indexing and lookup.
//!
//! This module provides types and functions to parse sequence points from the PortablePDB
//! format and to search them in both directions: from an IL offset to a source location
//! (stepping) and from a source location to an IL position (breakpoints).
//!
//! # Architecture
//!
//! Sequence points are stored in the MethodDebugInformation table as a compressed blob.
//! [`parse_sequence_points`] decodes the blob into [`SequencePointRecord`]s, one per entry.
//! [`SequencePoints::from_records`] then turns the records of one method into resolved
//! [`SequencePoint`]s: each point receives the IL range up to the next entry (the last one
//! extends to the end of the method body) and the path and checksum of its document.
//!
//! # Key Components
//!
//! - [`IlRange`] - Half-open `[from, to)` range of IL offsets
//! - [`SequencePointRecord`] - One decoded blob entry
//! - [`SequencePoint`] - A resolved mapping from IL ranges to a source span
//! - [`SequencePoints`] - All points of one method, with the lookup operations
//! - [`SourcePosition`] - A file/line/column triple
//!
//! # Sequence Points Blob Format
//!
//! ```text
//! Blob ::= header SequencePointRecord (SequencePointRecord | document-record)*
//! header ::= LocalSignature InitialDocument?
//! SequencePointRecord ::= sequence-point-record | hidden-sequence-point-record
//! ```
//!
//! - **LocalSignature**: compressed unsigned StandAloneSig row id
//! - **InitialDocument**: compressed unsigned Document row id, only present when the
//!   MethodDebugInformation row does not name a document
//! - **document-record**: `δILOffset = 0` (never on the first record) followed by the new
//!   Document row id
//! - **sequence-point-record**: `δILOffset`, `ΔLines` (unsigned), `ΔColumns` (unsigned if
//!   `ΔLines == 0`, signed otherwise), `δStartLine`, `δStartColumn` (unsigned for the first
//!   non-hidden record, signed deltas from the previous non-hidden record afterwards)
//! - **hidden-sequence-point-record**: `δILOffset`, `ΔLines = 0`, `ΔColumns = 0`
//!
//! ## Hidden Sequence Points
//!
//! A hidden sequence point marks compiler-generated code without a source counterpart. It is
//! represented with a start and end line of [`HIDDEN_LINE`] (0xFEEFEE). Hidden points are never
//! returned by the lookups; their ranges are reported by [`SequencePoints::ignored_ranges`]
//! so the stepper can skip them.
//!
//! ## References
//!
//! - [ECMA-335 II.23.2](https://www.ecma-international.org/publications-and-standards/standards/ecma-335/)
//! - [PortablePDB Spec](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md#sequence-points-blob)

use std::fmt;

use crate::{
    file::parser::Parser,
    metadata::{document::DocumentRc, token::Token},
    symbols::relocate::file_name,
    Result,
};

/// Line number reserved for hidden sequence points.
pub const HIDDEN_LINE: u32 = 0x00FE_EFEE;

/// Half-open range `[from, to)` of IL offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IlRange {
    /// First offset in the range
    pub from: u32,
    /// First offset after the range
    pub to: u32,
}

impl IlRange {
    /// Creates the range `[from, to)`.
    #[must_use]
    pub fn new(from: u32, to: u32) -> Self {
        IlRange { from, to }
    }

    /// `true` if `from <= offset < to`.
    #[must_use]
    pub fn contains(&self, offset: u32) -> bool {
        self.from <= offset && offset < self.to
    }

    /// Number of offsets covered.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.to.saturating_sub(self.from)
    }

    /// `true` if the range covers no offset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }
}

impl fmt::Display for IlRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04x}, 0x{:04x})", self.from, self.to)
    }
}

/// A file path with a line and column, 1-based as in the symbol data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// Path of the source file
    pub path: String,
    /// Line number
    pub line: u32,
    /// Column number, 0 when unknown
    pub column: u16,
}

impl SourcePosition {
    /// Creates a position.
    #[must_use]
    pub fn new(path: impl Into<String>, line: u32, column: u16) -> Self {
        SourcePosition {
            path: path.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{}", self.path, self.line, self.column)
    }
}

/// One decoded entry of a sequence points blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePointRecord {
    /// Offset in the method's IL stream.
    pub il_offset: u32,
    /// Document row id the entry belongs to.
    pub document: u32,
    /// Starting line in the source file.
    pub start_line: u32,
    /// Starting column in the source file.
    pub start_col: u16,
    /// Ending line in the source file.
    pub end_line: u32,
    /// Ending column in the source file.
    pub end_col: u16,
    /// True if this is a hidden sequence point (start_line == 0xFEEFEE).
    pub is_hidden: bool,
}

impl SequencePointRecord {
    /// A hidden record at `il_offset`.
    #[must_use]
    pub fn hidden(il_offset: u32, document: u32) -> Self {
        SequencePointRecord {
            il_offset,
            document,
            start_line: HIDDEN_LINE,
            start_col: 0,
            end_line: HIDDEN_LINE,
            end_col: 0,
            is_hidden: true,
        }
    }
}

/// Parses a PortablePDB sequence points blob.
///
/// `document` is the Document row id stored in the MethodDebugInformation row; pass 0 when
/// the row has none, in which case the blob header carries the initial document.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] for invalid compressed integers or out-of-range values,
/// and [`crate::Error::OutOfBounds`] for a truncated blob.
///
/// # Examples
///
/// ```rust
/// use pdbscope::metadata::sequencepoints::parse_sequence_points;
///
/// // LocalSignature 0; IL 0: line 10 col 5-9; IL +4: hidden
/// let blob: &[u8] = &[0x00, 0x00, 0x00, 0x04, 0x0A, 0x05, 0x04, 0x00, 0x00];
/// let records = parse_sequence_points(blob, 1)?;
///
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[0].start_line, 10);
/// assert_eq!(records[0].end_col, 9);
/// assert!(records[1].is_hidden);
/// # Ok::<(), pdbscope::Error>(())
/// ```
pub fn parse_sequence_points(blob: &[u8], document: u32) -> Result<Vec<SequencePointRecord>> {
    let mut parser = Parser::new(blob);
    let mut points = Vec::new();

    if parser.is_empty() {
        return Ok(points);
    }

    let _local_signature = parser.read_compressed_uint()?;
    let mut document = if document == 0 {
        parser.read_compressed_uint()?
    } else {
        document
    };

    let mut il_offset = 0u32;
    let mut first = true;
    let mut previous: Option<(u32, u16)> = None;

    while parser.has_more_data() {
        let il_offset_delta = parser.read_compressed_uint()?;
        if !first && il_offset_delta == 0 {
            document = parser.read_compressed_uint()?;
            continue;
        }

        il_offset = if first {
            il_offset_delta
        } else {
            il_offset
                .checked_add(il_offset_delta)
                .ok_or_else(|| malformed_error!("IL offset overflow after 0x{:x}", il_offset))?
        };
        first = false;

        let delta_lines = parser.read_compressed_uint()?;
        let delta_columns = if delta_lines == 0 {
            i64::from(parser.read_compressed_uint()?)
        } else {
            i64::from(parser.read_compressed_int()?)
        };

        if delta_lines == 0 && delta_columns == 0 {
            points.push(SequencePointRecord::hidden(il_offset, document));
            continue;
        }

        let (start_line, start_col) = match previous {
            None => (
                i64::from(parser.read_compressed_uint()?),
                i64::from(parser.read_compressed_uint()?),
            ),
            Some((line, col)) => (
                i64::from(line) + i64::from(parser.read_compressed_int()?),
                i64::from(col) + i64::from(parser.read_compressed_int()?),
            ),
        };

        let end_line = start_line + i64::from(delta_lines);
        let end_col = start_col + delta_columns;

        let start_line = checked_line(start_line)?;
        let end_line = checked_line(end_line)?;
        let start_col = checked_column(start_col)?;
        let end_col = checked_column(end_col)?;

        previous = Some((start_line, start_col));
        points.push(SequencePointRecord {
            il_offset,
            document,
            start_line,
            start_col,
            end_line,
            end_col,
            is_hidden: false,
        });
    }

    Ok(points)
}

fn checked_line(value: i64) -> Result<u32> {
    match u32::try_from(value) {
        Ok(line) if line < 0x2000_0000 && line != HIDDEN_LINE => Ok(line),
        _ => Err(malformed_error!("Sequence point line out of range - {}", value)),
    }
}

fn checked_column(value: i64) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| malformed_error!("Sequence point column out of range - {}", value))
}

/// A resolved mapping from one or more IL ranges to a source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePoint {
    /// MethodDef token of the owning method
    pub method: Token,
    /// Disjoint IL ranges, ordered by offset
    pub il_ranges: Vec<IlRange>,
    /// Source path, as recorded in the symbols until relocation replaced it
    pub filename: String,
    /// Checksum of the source file at compile time
    pub checksum: Vec<u8>,
    /// Starting line in the source file
    pub start_line: u32,
    /// Starting column in the source file
    pub start_col: u16,
    /// Ending line in the source file
    pub end_line: u32,
    /// Ending column in the source file
    pub end_col: u16,
    /// `true` once `filename` has been confirmed to exist on disk
    pub located: bool,
}

impl SequencePoint {
    /// The canonical IL offset: the start of the first range, 0 without ranges.
    #[must_use]
    pub fn il_offset(&self) -> u32 {
        self.il_ranges.first().map_or(0, |range| range.from)
    }

    /// `true` for compiler-generated code without a source counterpart.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.start_line == HIDDEN_LINE
    }

    /// `true` if any range contains `offset`.
    #[must_use]
    pub fn contains_offset(&self, offset: u32) -> bool {
        self.il_ranges.iter().any(|range| range.contains(offset))
    }

    /// `true` if `(line, column)` lies inside the source span, bounds inclusive.
    #[must_use]
    pub fn contains_position(&self, line: u32, column: u16) -> bool {
        let after_start =
            self.start_line < line || (self.start_line == line && self.start_col <= column);
        let before_end = line < self.end_line || (line == self.end_line && column <= self.end_col);
        after_start && before_end
    }

    /// The start of the source span.
    #[must_use]
    pub fn start_position(&self) -> SourcePosition {
        SourcePosition::new(self.filename.clone(), self.start_line, self.start_col)
    }
}

impl fmt::Display for SequencePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}-{},{}",
            file_name(&self.filename),
            self.start_line,
            self.start_col,
            self.end_line,
            self.end_col
        )
    }
}

/// Collection of sequence points for a method, in symbol store order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequencePoints(pub Vec<SequencePoint>);

impl SequencePoints {
    /// Resolves the decoded `records` of `method` into sequence points.
    ///
    /// Each record covers the IL up to the next record with a larger offset; the last one
    /// extends to `code_size`. `document` maps a Document row id onto the document; records
    /// whose document cannot be resolved keep an empty filename and checksum.
    pub fn from_records<F>(
        method: Token,
        records: &[SequencePointRecord],
        code_size: u32,
        document: F,
    ) -> Self
    where
        F: Fn(u32) -> Option<DocumentRc>,
    {
        let mut points = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let to = records[index + 1..]
                .iter()
                .map(|next| next.il_offset)
                .find(|&offset| offset > record.il_offset)
                .unwrap_or(code_size)
                .max(record.il_offset);

            let (filename, checksum) = match document(record.document) {
                Some(document) => (document.name.clone(), document.hash.clone()),
                None => (String::new(), Vec::new()),
            };

            points.push(SequencePoint {
                method,
                il_ranges: vec![IlRange::new(record.il_offset, to)],
                filename,
                checksum,
                start_line: record.start_line,
                start_col: record.start_col,
                end_line: record.end_line,
                end_col: record.end_col,
                located: false,
            });
        }

        SequencePoints(points)
    }

    /// Number of points, hidden ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` without points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All points in store order.
    pub fn iter(&self) -> impl Iterator<Item = &SequencePoint> {
        self.0.iter()
    }

    /// Points that map to real source.
    pub fn visible(&self) -> impl Iterator<Item = &SequencePoint> {
        self.0.iter().filter(|point| !point.is_hidden())
    }

    /// Compiler-generated points.
    pub fn hidden(&self) -> impl Iterator<Item = &SequencePoint> {
        self.0.iter().filter(|point| point.is_hidden())
    }

    /// Finds the point an IL offset belongs to.
    ///
    /// The first visible point whose ranges contain `offset` wins. An offset inside a hidden
    /// point maps to nothing. Otherwise the first visible point starting at or after
    /// `offset` is returned, i.e. the next statement.
    #[must_use]
    pub fn find_by_offset(&self, offset: u32) -> Option<&SequencePoint> {
        if let Some(point) = self.visible().find(|point| point.contains_offset(offset)) {
            return Some(point);
        }

        if self.hidden().any(|point| point.contains_offset(offset)) {
            return None;
        }

        self.visible().find(|point| offset <= point.il_offset())
    }

    /// Finds the point for a source position.
    ///
    /// With a non-zero `column` the point whose span contains `(line, column)` is preferred;
    /// otherwise, or if none does, the first visible point starting on or after `line`.
    #[must_use]
    pub fn find_by_position(&self, line: u32, column: u16) -> Option<&SequencePoint> {
        if column != 0 {
            if let Some(point) = self
                .visible()
                .find(|point| point.contains_position(line, column))
            {
                return Some(point);
            }
        }

        self.visible().find(|point| line <= point.start_line)
    }

    /// All IL ranges of hidden points, in store order.
    #[must_use]
    pub fn ignored_ranges(&self) -> Vec<IlRange> {
        self.hidden()
            .flat_map(|point| point.il_ranges.iter().copied())
            .collect()
    }
}

impl IntoIterator for SequencePoints {
    type Item = SequencePoint;
    type IntoIter = std::vec::IntoIter<SequencePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
