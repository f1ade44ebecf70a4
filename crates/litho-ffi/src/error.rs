//! Error types for library resolution and symbol binding.
//!
//! Resolution failures carry the full candidate list so installation
//! problems can be diagnosed from the error message alone.

use thiserror::Error;

use crate::resolve::LibraryRole;

/// Result type for resolution and binding operations
pub type FfiResult<T> = Result<T, FfiError>;

/// Errors raised while locating a native library or binding its symbols
#[derive(Error, Debug, Clone)]
pub enum FfiError {
    /// None of the platform candidates for a library could be loaded
    #[error("unable to load the {role} library; tried: {}", .candidates.join(", "))]
    LibraryNotFound {
        /// Which library was being resolved
        role: LibraryRole,
        /// Every candidate name that was attempted, in order
        candidates: Vec<String>,
    },

    /// A required symbol is absent from an otherwise loadable library
    #[error("symbol `{symbol}` missing from {library}")]
    SymbolMissing {
        /// Name of the library the symbol was looked up in
        library: String,
        /// Name of the missing symbol
        symbol: String,
    },
}

impl FfiError {
    /// Create a library-not-found error from the attempted candidate list
    pub fn library_not_found(role: LibraryRole, candidates: &[&str]) -> Self {
        FfiError::LibraryNotFound {
            role,
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Create a missing-symbol error
    pub fn symbol_missing(library: impl Into<String>, symbol: impl Into<String>) -> Self {
        FfiError::SymbolMissing {
            library: library.into(),
            symbol: symbol.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_not_found_lists_all_candidates() {
        let err = FfiError::library_not_found(LibraryRole::Graphics, &["libfoo.so.1", "libfoo.so"]);
        let message = err.to_string();
        assert!(message.contains("libfoo.so.1"));
        assert!(message.contains("libfoo.so"));
        assert!(message.contains("graphics"));
    }

    #[test]
    fn test_symbol_missing_message() {
        let err = FfiError::symbol_missing("libcairo.so.2", "cairo_create");
        assert_eq!(
            err.to_string(),
            "symbol `cairo_create` missing from libcairo.so.2"
        );
    }
}
