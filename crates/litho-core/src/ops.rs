//! Seam between the wrapper core and the engine's lifecycle entry points.
//!
//! The core never calls the native tables directly; it goes through
//! [`NativeOps`] so that lifetime behavior can be exercised in tests with a
//! counting fake while production wires in [`EngineOps`] over the resolved
//! graphics table.

use litho_ffi::{DestroyFn, GraphicsApi, RefCountFn, ReferenceFn};

use crate::handle::RawHandle;
use crate::kind::ResourceKind;

/// Per-kind native lifecycle calls.
///
/// `reference_count` exists for diagnostics and assertions only. Its value
/// is inherently racy against the native side and must never drive control
/// flow.
pub trait NativeOps: Send + Sync + 'static {
    /// Increment the native reference count for `handle`.
    ///
    /// Only called for kinds with [`ResourceKind::supports_reference`], from
    /// inside the registry critical section for the handle's key.
    fn reference(&self, kind: ResourceKind, handle: RawHandle);

    /// Release one native reference, destroying the resource at zero.
    fn destroy(&self, kind: ResourceKind, handle: RawHandle);

    /// Current native reference count, where the engine exposes one.
    fn reference_count(&self, kind: ResourceKind, handle: RawHandle) -> Option<u32>;
}

/// One kind's row of the lifecycle vtable.
struct KindRow {
    reference: Option<ReferenceFn>,
    destroy: DestroyFn,
    refcount: Option<RefCountFn>,
}

/// Production [`NativeOps`] backed by the resolved graphics table.
pub struct EngineOps {
    graphics: &'static GraphicsApi,
}

impl EngineOps {
    pub fn new(graphics: &'static GraphicsApi) -> Self {
        EngineOps { graphics }
    }

    fn row(&self, kind: ResourceKind) -> KindRow {
        let g = self.graphics;
        match kind {
            ResourceKind::Context => KindRow {
                reference: Some(g.context_reference),
                destroy: g.context_destroy,
                refcount: Some(g.context_refcount),
            },
            ResourceKind::Surface => KindRow {
                reference: Some(g.surface_reference),
                destroy: g.surface_destroy,
                refcount: Some(g.surface_refcount),
            },
            ResourceKind::Pattern => KindRow {
                reference: Some(g.pattern_reference),
                destroy: g.pattern_destroy,
                refcount: Some(g.pattern_refcount),
            },
            ResourceKind::Path => KindRow {
                reference: None,
                destroy: g.path_destroy,
                refcount: None,
            },
            ResourceKind::FontFace => KindRow {
                reference: Some(g.font_face_reference),
                destroy: g.font_face_destroy,
                refcount: Some(g.font_face_refcount),
            },
            ResourceKind::ScaledFont => KindRow {
                reference: Some(g.scaled_font_reference),
                destroy: g.scaled_font_destroy,
                refcount: Some(g.scaled_font_refcount),
            },
            ResourceKind::FontOptions => KindRow {
                reference: None,
                destroy: g.font_options_destroy,
                refcount: None,
            },
            ResourceKind::Device => KindRow {
                reference: Some(g.device_reference),
                destroy: g.device_destroy,
                refcount: Some(g.device_refcount),
            },
            ResourceKind::Region => KindRow {
                reference: Some(g.region_reference),
                destroy: g.region_destroy,
                refcount: None,
            },
        }
    }
}

impl NativeOps for EngineOps {
    fn reference(&self, kind: ResourceKind, handle: RawHandle) {
        let Some(reference) = self.row(kind).reference else {
            // The wrapper core rejects borrowed wraps of destroy-only kinds
            // before reaching this point.
            panic!("no native reference entry point for {kind}");
        };
        // SAFETY: the caller holds a live wrapper-core entry for this handle,
        // so the native side still owns at least one reference to it.
        unsafe {
            reference(handle.as_ptr());
        }
    }

    fn destroy(&self, kind: ResourceKind, handle: RawHandle) {
        let row = self.row(kind);
        // SAFETY: called exactly once per wrapper, releasing the single
        // reference that wrapper accounted for.
        unsafe {
            (row.destroy)(handle.as_ptr());
        }
    }

    fn reference_count(&self, kind: ResourceKind, handle: RawHandle) -> Option<u32> {
        let refcount = self.row(kind).refcount?;
        // SAFETY: diagnostic read on a handle the caller still holds a
        // reference to.
        Some(unsafe { refcount(handle.as_ptr()) })
    }
}
