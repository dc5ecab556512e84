//! Source documents referenced by debug symbols.
//!
//! A [`Document`] is one row of the Portable PDB Document table (0x30) with its heap references
//! resolved: the source path as recorded at compile time, the checksum of the file contents and
//! the GUIDs identifying the checksum algorithm and the source language.
//!
//! # Key Components
//!
//! - [`Document`] - Resolved document entry
//! - [`HashAlgorithm`] - Checksum algorithms recognised by their GUID
//! - [`Language`] - Source languages recognised by their GUID
//! - [`parse_document_name`] - Decodes the document name blob
//! - [`is_compiler_temporary`] - Detects throw-away files some compilers reference
//!
//! # Document Name Blob Format
//!
//! ```text
//! Blob ::= separator part+
//! separator ::= {UTF8 character} | 0x00
//! part ::= {compressed unsigned integer: #Blob heap index, 0 for an empty part}
//! ```
//!
//! The name is the concatenation of all parts joined by the separator, so `C:\src\a.cs` is
//! stored as separator `\` and the parts `C:`, `src` and `a.cs`.
//!
//! # References
//!
//! - [Portable PDB Format - Document Table](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md#document-table-0x30)

use std::{fmt::Write, sync::Arc};

use md5::Md5;
use sha1::{Digest, Sha1};
use sha2::Sha256;
use uguid::{guid, Guid};

use crate::{file::parser::Parser, metadata::token::Token, symbols::relocate::file_name, Result};

/// A reference-counted pointer to a [`Document`]
pub type DocumentRc = Arc<Document>;

/// Extensions of source files that compilers are known to generate and delete again.
const TEMPORARY_EXTENSIONS: &[&str] = &["vb", "cs", "fs"];

/// Checksum algorithm of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum HashAlgorithm {
    /// MD5, used by older Windows PDBs
    #[strum(serialize = "MD5")]
    Md5,
    /// SHA-1
    #[strum(serialize = "SHA1")]
    Sha1,
    /// SHA-256
    #[strum(serialize = "SHA256")]
    Sha256,
    /// No checksum recorded
    #[strum(serialize = "None")]
    None,
    /// A GUID this crate does not know
    #[strum(serialize = "Unknown")]
    Unknown,
}

impl HashAlgorithm {
    /// Portable PDB / CorSym GUID of MD5
    pub const MD5_GUID: Guid = guid!("406ea660-64cf-4c82-b6f0-42d48172a799");
    /// Portable PDB GUID of SHA-1
    pub const SHA1_GUID: Guid = guid!("ff1816ec-aa5e-4d10-87f7-6f4963833460");
    /// Portable PDB GUID of SHA-256
    pub const SHA256_GUID: Guid = guid!("8829d00f-11b8-4213-878b-770e8597ac16");

    /// Maps a hash algorithm GUID onto the enum.
    #[must_use]
    pub fn from_guid(guid: Guid) -> Self {
        if guid == Guid::ZERO {
            HashAlgorithm::None
        } else if guid == Self::MD5_GUID {
            HashAlgorithm::Md5
        } else if guid == Self::SHA1_GUID {
            HashAlgorithm::Sha1
        } else if guid == Self::SHA256_GUID {
            HashAlgorithm::Sha256
        } else {
            HashAlgorithm::Unknown
        }
    }

    /// The GUID identifying this algorithm, `None` for [`HashAlgorithm::Unknown`].
    #[must_use]
    pub fn guid(self) -> Option<Guid> {
        match self {
            HashAlgorithm::Md5 => Some(Self::MD5_GUID),
            HashAlgorithm::Sha1 => Some(Self::SHA1_GUID),
            HashAlgorithm::Sha256 => Some(Self::SHA256_GUID),
            HashAlgorithm::None => Some(Guid::ZERO),
            HashAlgorithm::Unknown => None,
        }
    }

    /// Hashes `data`; `None` when the algorithm cannot be computed.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Option<Vec<u8>> {
        match self {
            HashAlgorithm::Md5 => Some(Md5::digest(data).to_vec()),
            HashAlgorithm::Sha1 => Some(Sha1::digest(data).to_vec()),
            HashAlgorithm::Sha256 => Some(Sha256::digest(data).to_vec()),
            HashAlgorithm::None | HashAlgorithm::Unknown => None,
        }
    }
}

/// Source language of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Language {
    /// C#
    CSharp,
    /// Visual Basic
    VisualBasic,
    /// F#
    FSharp,
    /// Anything else
    Unknown,
}

impl Language {
    /// C# language GUID
    pub const CSHARP_GUID: Guid = guid!("3f5162f8-07c6-11d3-9053-00c04fa302a1");
    /// Visual Basic language GUID
    pub const VISUAL_BASIC_GUID: Guid = guid!("3a12d0b8-c26c-11d0-b442-00a0244a1dd2");
    /// F# language GUID
    pub const FSHARP_GUID: Guid = guid!("ab4f38c9-b6e6-43ba-be3b-58080b2ccce3");

    /// Maps a language GUID onto the enum.
    #[must_use]
    pub fn from_guid(guid: Guid) -> Self {
        if guid == Self::CSHARP_GUID {
            Language::CSharp
        } else if guid == Self::VISUAL_BASIC_GUID {
            Language::VisualBasic
        } else if guid == Self::FSHARP_GUID {
            Language::FSharp
        } else {
            Language::Unknown
        }
    }
}

/// A source document with resolved name, checksum and language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Document token (table 0x30)
    pub token: Token,
    /// Source path as recorded at compile time
    pub name: String,
    /// GUID of the checksum algorithm, zero if no checksum was recorded
    pub hash_algorithm: Guid,
    /// Checksum of the file contents at compile time
    pub hash: Vec<u8>,
    /// GUID of the source language
    pub language: Guid,
}

impl Document {
    /// Creates a document without checksum or language information.
    #[must_use]
    pub fn new(token: Token, name: impl Into<String>) -> Self {
        Document {
            token,
            name: name.into(),
            hash_algorithm: Guid::ZERO,
            hash: Vec::new(),
            language: Guid::ZERO,
        }
    }

    /// Sets the checksum and the algorithm that produced it.
    #[must_use]
    pub fn with_checksum(mut self, algorithm: HashAlgorithm, hash: Vec<u8>) -> Self {
        self.hash_algorithm = algorithm.guid().unwrap_or(Guid::ZERO);
        self.hash = hash;
        self
    }

    /// Sets the language GUID.
    #[must_use]
    pub fn with_language(mut self, language: Guid) -> Self {
        self.language = language;
        self
    }

    /// The recognised checksum algorithm.
    #[must_use]
    pub fn hash_kind(&self) -> HashAlgorithm {
        HashAlgorithm::from_guid(self.hash_algorithm)
    }

    /// The recognised source language.
    #[must_use]
    pub fn language_kind(&self) -> Language {
        Language::from_guid(self.language)
    }

    /// Final path component of [`Document::name`].
    #[must_use]
    pub fn file_name(&self) -> &str {
        file_name(&self.name)
    }

    /// Lowercase hex of the recorded checksum.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        let mut hex = String::with_capacity(self.hash.len() * 2);
        for byte in &self.hash {
            let _ = write!(&mut hex, "{byte:02x}");
        }
        hex
    }

    /// Checks `contents` against the recorded checksum.
    ///
    /// Returns `None` if there is nothing to compare against (no checksum recorded or an
    /// algorithm this crate cannot compute), otherwise whether the digests match.
    #[must_use]
    pub fn verify_checksum(&self, contents: &[u8]) -> Option<bool> {
        if self.hash.is_empty() {
            return None;
        }

        let digest = self.hash_kind().digest(contents)?;
        Some(digest == self.hash)
    }
}

/// Decodes a Portable PDB document name blob.
///
/// `resolve_part` maps a #Blob heap index onto the UTF-8 bytes of that part; index 0 is never
/// passed to it and denotes an empty part.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] for an empty blob, a multi-byte separator or a part
/// that is not valid UTF-8, and propagates errors from `resolve_part`.
///
/// # Examples
///
/// ```rust
/// use pdbscope::metadata::document::parse_document_name;
///
/// let heap: [&[u8]; 4] = [b"", b"src", b"App", b"Program.cs"];
/// let blob = [b'/', 0x00, 0x01, 0x02, 0x03];
///
/// let name = parse_document_name(&blob, |index| Ok(heap[index as usize]))?;
/// assert_eq!(name, "/src/App/Program.cs");
/// # Ok::<(), pdbscope::Error>(())
/// ```
pub fn parse_document_name<'h, F>(blob: &[u8], resolve_part: F) -> Result<String>
where
    F: Fn(u32) -> Result<&'h [u8]>,
{
    let mut parser = Parser::new(blob);
    if parser.is_empty() {
        return Err(malformed_error!("Document name blob is empty"));
    }

    let separator = parser.read_u8()?;
    if separator > 0x7F {
        return Err(malformed_error!(
            "Unsupported document name separator - 0x{:02x}",
            separator
        ));
    }

    let mut name = String::new();
    let mut first = true;
    while parser.has_more_data() {
        let index = parser.read_compressed_uint()?;

        if !first && separator != 0 {
            name.push(char::from(separator));
        }
        first = false;

        if index == 0 {
            continue;
        }

        let part = resolve_part(index)?;
        match std::str::from_utf8(part) {
            Ok(text) => name.push_str(text),
            Err(_) => {
                return Err(malformed_error!(
                    "Document name part {} is not valid UTF-8",
                    index
                ))
            }
        }
    }

    Ok(name)
}

/// Detects names of temporary source files that a compiler generated and deleted again.
///
/// The Visual Basic compiler, for example, emits sequence points into files such as
/// `17d14f5c-a337-4978-8281-53493378c1071.vb`. Such a file name is 36 to 40 characters
/// long, carries a known source extension and its stem consists of hexadecimal digits and
/// hyphens only.
///
/// # Examples
///
/// ```rust
/// use pdbscope::metadata::document::is_compiler_temporary;
///
/// assert!(is_compiler_temporary(r"C:\Temp\17d14f5c-a337-4978-8281-53493378c1071.vb"));
/// assert!(!is_compiler_temporary(r"C:\src\Program.vb"));
/// ```
#[must_use]
pub fn is_compiler_temporary(path: &str) -> bool {
    let name = file_name(path);
    if !(36..=40).contains(&name.len()) {
        return false;
    }

    let Some((stem, extension)) = name.rsplit_once('.') else {
        return false;
    };

    if !TEMPORARY_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(extension))
    {
        return false;
    }

    stem.contains('-') && stem.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}
