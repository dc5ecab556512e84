use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Most of these never reach a caller of [`crate::symbols::PdbSymbolSource`]: resolution
/// failures are an expected outcome when binary and source are out of sync, so the resolver
/// swallows them at the point where the symbol store is queried and answers with `None`.
/// They surface directly from the decoding functions ([`crate::metadata::sequencepoints`],
/// [`crate::metadata::document`], [`crate::metadata::localscope`]) and from
/// [`crate::symbols::SymbolStore`] implementations.
///
/// # Error Categories
///
/// ## Symbol Resolution
/// - [`Error::NoSymbols`] - No debug data is available for a method or module
/// - [`Error::NotFound`] - An offset, location or document could not be mapped
///
/// ## Symbol Data Decoding
/// - [`Error::Malformed`] - Corrupted or invalid symbol data
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of a blob
///
/// ## I/O
/// - [`Error::FileError`] - Filesystem I/O errors while reading source files
///
/// # Examples
///
/// ```rust
/// use pdbscope::{Error, metadata::sequencepoints::parse_sequence_points};
///
/// match parse_sequence_points(&[0x00, 0xFF], 1) {
///     Ok(points) => println!("{} records", points.len()),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed blob: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The method (or the module owning it) has no debug symbols.
    ///
    /// Compiler-generated constructors, methods from assemblies shipped without a PDB and
    /// methods whose symbol data could not be read all end up here.
    #[error("No symbols available for {0}")]
    NoSymbols(Token),

    /// A specific offset, source location or document could not be mapped.
    #[error("Not found - {0}")]
    NotFound(String),

    /// The symbol data is damaged and could not be decoded.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while decoding a blob or buffer.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that occur while opening or mapping source files,
    /// e.g. during checksum verification.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
