//! The closed set of native object kinds.
//!
//! A raw handle value is meaningless on its own; identity in the registry is
//! always the pair (handle, kind). Partitioning per kind also keeps two
//! different object types that happen to reuse an address from colliding.

use std::fmt;

/// Kind tag for a native resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Drawing context
    Context,
    /// Render target surface
    Surface,
    /// Paint source pattern
    Pattern,
    /// Copied path data (destroy-only: the engine exposes no reference call)
    Path,
    /// Unscaled font face
    FontFace,
    /// Font face scaled and hinted for rendering
    ScaledFont,
    /// Font rendering options (destroy-only)
    FontOptions,
    /// Backend device underlying a surface
    Device,
    /// Pixel-aligned region
    Region,
}

impl ResourceKind {
    /// Number of kinds; sizes the registry partition array.
    pub const COUNT: usize = 9;

    /// Every kind, in declaration order.
    pub const ALL: [ResourceKind; Self::COUNT] = [
        ResourceKind::Context,
        ResourceKind::Surface,
        ResourceKind::Pattern,
        ResourceKind::Path,
        ResourceKind::FontFace,
        ResourceKind::ScaledFont,
        ResourceKind::FontOptions,
        ResourceKind::Device,
        ResourceKind::Region,
    ];

    /// Registry partition index.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Kind name for messages and logs.
    pub const fn name(self) -> &'static str {
        match self {
            ResourceKind::Context => "context",
            ResourceKind::Surface => "surface",
            ResourceKind::Pattern => "pattern",
            ResourceKind::Path => "path",
            ResourceKind::FontFace => "font face",
            ResourceKind::ScaledFont => "scaled font",
            ResourceKind::FontOptions => "font options",
            ResourceKind::Device => "device",
            ResourceKind::Region => "region",
        }
    }

    /// Whether the engine exposes a reference-increment call for this kind.
    ///
    /// Destroy-only kinds cannot be wrapped with borrowed ownership: there is
    /// no way to retain them, so aliasing such a handle would double-free.
    pub const fn supports_reference(self) -> bool {
        !matches!(self, ResourceKind::Path | ResourceKind::FontOptions)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_covers_every_index_once() {
        let mut seen = [false; ResourceKind::COUNT];
        for kind in ResourceKind::ALL {
            assert!(!seen[kind.index()], "duplicate index for {kind}");
            seen[kind.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_destroy_only_kinds() {
        assert!(!ResourceKind::Path.supports_reference());
        assert!(!ResourceKind::FontOptions.supports_reference());
        assert!(ResourceKind::Surface.supports_reference());
        assert!(ResourceKind::Region.supports_reference());
    }
}
