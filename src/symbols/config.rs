//! Resolver configuration
//!
//! Options that change how [`crate::symbols::PdbSymbolSource`] treats the paths and
//! documents it finds in the symbols.

use crate::symbols::relocate::DEFAULT_RELOCATION_DEPTH;

/// Configuration for symbol resolution
///
/// The default rejects compiler temporary files and accepts relocated source files without
/// looking at their content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Treat sequence points in compiler-generated temporary files as unmapped
    ///
    /// The resolver contract is that such points never map to a source location. Turning
    /// this off departs from that contract: offsets in generated code then resolve to the
    /// temporary file, which usually no longer exists.
    pub reject_compiler_temporaries: bool,

    /// Only accept a relocated source file if its content matches the checksum recorded in
    /// the symbols. Files with an unknown checksum algorithm are accepted.
    pub verify_checksums: bool,

    /// Parent directories above the binary's directory tried for relative source paths
    pub relocation_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            reject_compiler_temporaries: true,
            verify_checksums: false,
            relocation_depth: DEFAULT_RELOCATION_DEPTH,
        }
    }
}

impl ResolverConfig {
    /// Creates a configuration that also verifies the checksum of every relocated file
    ///
    /// Reads each candidate file that exists, which is noticeably slower on large sources.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            verify_checksums: true,
            ..Self::default()
        }
    }

    /// Creates a configuration that maps compiler temporary files like any other source
    ///
    /// Not contract-conforming; see [`ResolverConfig::reject_compiler_temporaries`]. Meant
    /// for tools that inspect generated code, not for stepping.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            reject_compiler_temporaries: false,
            verify_checksums: false,
            relocation_depth: DEFAULT_RELOCATION_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_config_presets() {
        let strict = ResolverConfig::strict();
        assert!(strict.reject_compiler_temporaries);
        assert!(strict.verify_checksums);
        assert_eq!(strict.relocation_depth, 2);

        let lenient = ResolverConfig::lenient();
        assert!(!lenient.reject_compiler_temporaries);
        assert!(!lenient.verify_checksums);
    }

    #[test]
    fn test_default_config() {
        let default = ResolverConfig::default();
        assert!(default.reject_compiler_temporaries);
        assert!(!default.verify_checksums);
        assert_eq!(default.relocation_depth, DEFAULT_RELOCATION_DEPTH);
        assert_ne!(default, ResolverConfig::strict());
    }
}
