//! Native library resolution.
//!
//! The engine is not linked at build time. Each library role (the graphics
//! engine, the font engine, the optional font matcher) is resolved at runtime
//! from an ordered, platform-specific list of candidate names; the first
//! candidate the loader accepts wins and the bound function table is memoized
//! for the rest of the process.
//!
//! # Design
//!
//! - Resolution happens lazily on first use, never at startup
//! - A failed resolution reports every candidate that was attempted
//! - Font matching is a capability, not a requirement: its absence is
//!   reported through [`font_matching_available`] rather than an error

use std::fmt;
use std::sync::OnceLock;

use libloading::Library;
use tracing::debug;

use crate::error::{FfiError, FfiResult};
use crate::tables::{FontEngineApi, FontMatchApi, GraphicsApi};

/// The dynamic libraries the binding layer depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryRole {
    /// The 2D rendering engine (cairo)
    Graphics,
    /// The font engine (FreeType)
    FontEngine,
    /// The font matcher (fontconfig); optional
    FontMatching,
}

impl LibraryRole {
    /// Human-readable role name, used in error messages and logs
    pub const fn name(self) -> &'static str {
        match self {
            LibraryRole::Graphics => "graphics",
            LibraryRole::FontEngine => "font engine",
            LibraryRole::FontMatching => "font matching",
        }
    }

    /// Ordered candidate library names for this role on the current platform.
    ///
    /// Versioned names come first so an unversioned development symlink never
    /// shadows the ABI-stable install.
    pub fn candidates(self) -> &'static [&'static str] {
        #[cfg(target_os = "macos")]
        {
            match self {
                LibraryRole::Graphics => &["libcairo.2.dylib", "libcairo.dylib"],
                LibraryRole::FontEngine => &["libfreetype.6.dylib", "libfreetype.dylib"],
                LibraryRole::FontMatching => &["libfontconfig.1.dylib", "libfontconfig.dylib"],
            }
        }
        #[cfg(windows)]
        {
            match self {
                LibraryRole::Graphics => &["libcairo-2.dll", "cairo.dll"],
                LibraryRole::FontEngine => &["libfreetype-6.dll", "freetype.dll"],
                LibraryRole::FontMatching => &["libfontconfig-1.dll", "fontconfig.dll"],
            }
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            match self {
                LibraryRole::Graphics => &["libcairo.so.2", "libcairo.so"],
                LibraryRole::FontEngine => &["libfreetype.so.6", "libfreetype.so"],
                LibraryRole::FontMatching => &["libfontconfig.so.1", "libfontconfig.so"],
            }
        }
    }
}

impl fmt::Display for LibraryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A freshly loaded library together with the candidate name that won.
#[derive(Debug)]
pub(crate) struct LoadedLibrary {
    pub(crate) lib: Library,
    pub(crate) name: String,
}

/// Try each candidate in order; the first one the loader accepts wins.
pub(crate) fn load_first(role: LibraryRole, candidates: &[&str]) -> FfiResult<LoadedLibrary> {
    for name in candidates {
        // SAFETY: loading a shared object runs its initializers; the
        // candidate lists only name libraries whose initializers are
        // well-behaved C library constructors.
        match unsafe { Library::new(name) } {
            Ok(lib) => {
                debug!(role = role.name(), library = name, "loaded native library");
                return Ok(LoadedLibrary {
                    lib,
                    name: name.to_string(),
                });
            }
            Err(err) => {
                debug!(role = role.name(), library = name, %err, "candidate not loadable");
            }
        }
    }
    Err(FfiError::library_not_found(role, candidates))
}

/// Resolve and bind the graphics engine, memoized for the process lifetime.
///
/// The first call walks the candidate list and binds every symbol; later
/// calls return the same table without touching the loader again. A failure
/// is memoized too: the candidate list is never re-attempted.
pub fn graphics() -> FfiResult<&'static GraphicsApi> {
    static TABLE: OnceLock<FfiResult<GraphicsApi>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            let role = LibraryRole::Graphics;
            GraphicsApi::bind(load_first(role, role.candidates())?)
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Resolve and bind the font engine, memoized for the process lifetime.
pub fn font_engine() -> FfiResult<&'static FontEngineApi> {
    static TABLE: OnceLock<FfiResult<FontEngineApi>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            let role = LibraryRole::FontEngine;
            FontEngineApi::bind(load_first(role, role.candidates())?)
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Resolve and bind the font matcher, if present on this system.
///
/// Font matching support is optional; `None` means the feature is simply
/// unavailable, and callers degrade to an explicit "unsupported" error of
/// their own rather than calling through a missing table.
pub fn font_matching() -> Option<&'static FontMatchApi> {
    static TABLE: OnceLock<Option<FontMatchApi>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            let role = LibraryRole::FontMatching;
            match load_first(role, role.candidates()).and_then(FontMatchApi::bind) {
                Ok(table) => Some(table),
                Err(err) => {
                    debug!(%err, "font matching unavailable");
                    None
                }
            }
        })
        .as_ref()
}

/// Whether the optional font matcher was resolved on this system.
pub fn font_matching_available() -> bool {
    font_matching().is_some()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_candidate_lists_are_nonempty_and_versioned_first() {
        for role in [
            LibraryRole::Graphics,
            LibraryRole::FontEngine,
            LibraryRole::FontMatching,
        ] {
            let candidates = role.candidates();
            assert!(!candidates.is_empty());
            // The versioned name sorts in front of the unversioned fallback.
            assert!(candidates[0].len() > candidates[candidates.len() - 1].len());
        }
    }

    #[test]
    fn test_load_first_reports_every_candidate() {
        let candidates = ["liblitho-test-missing.so.9", "liblitho-test-missing.so"];
        let err = load_first(LibraryRole::Graphics, &candidates).unwrap_err();
        match err {
            FfiError::LibraryNotFound { role, candidates } => {
                assert_eq!(role, LibraryRole::Graphics);
                assert_eq!(
                    candidates,
                    vec![
                        "liblitho-test-missing.so.9".to_string(),
                        "liblitho-test-missing.so".to_string(),
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_load_first_falls_back_past_unloadable_candidates() {
        // Only the second entry exists; resolution must succeed silently.
        let candidates = ["liblitho-test-missing.so.9", "libm.so.6"];
        assert!(load_first(LibraryRole::FontEngine, &candidates).is_ok());
    }

    #[test]
    fn test_resolution_is_memoized() {
        // Whether or not the engine is installed, two calls observe the same
        // memoized outcome: the identical table reference, or the identical
        // candidate list in the error.
        match (graphics(), graphics()) {
            (Ok(a), Ok(b)) => assert!(std::ptr::eq(a, b)),
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            _ => panic!("second resolution disagreed with the first"),
        }
    }
}
