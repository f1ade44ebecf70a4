//! The wrap / finalize protocol shared by every object kind.
//!
//! # Identity
//!
//! At most one live [`Wrapper`] exists per (handle, kind) at any instant.
//! `wrap` consults the registry under the kind's partition lock and either
//! returns the existing wrapper or creates, registers and returns a new one.
//! The critical section covers the registry check *and* the native
//! reference-increment, so a `wrap` racing a `finalize` on the same key can
//! never observe a moment where the native count reaches zero in between.
//!
//! # Ownership
//!
//! [`Ownership::Created`] records that the native call producing the handle
//! already deposited a fresh reference (factory functions).
//! [`Ownership::Borrowed`] means the handle arrived from an accessor and the
//! wrapper must retain its own reference before use. Either way, a live
//! wrapper accounts for exactly one native reference.
//!
//! # Finalization
//!
//! Dropping the last clone of a wrapper finalizes it deterministically;
//! [`Wrapper::close`] does the same eagerly. Finalization is idempotent,
//! unregisters first, and only then issues the native release — and only if
//! the [`ShutdownGuard`] still permits native calls. The finalized mark is
//! set unconditionally, so no stale clone can reach the engine afterwards.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use libc::c_void;
use tracing::trace;

use crate::error::{Error, Result};
use crate::handle::RawHandle;
use crate::kind::ResourceKind;
use crate::ops::NativeOps;
use crate::registry::HandleRegistry;
use crate::shutdown::{process_guard, ShutdownGuard};

/// How a wrap call accounts for the native reference it represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The producing native call already deposited a fresh reference
    /// (factory functions); no increment is issued.
    Created,
    /// The handle was received from elsewhere; the wrapper retains its own
    /// reference before registering ("borrowed-then-retained").
    Borrowed,
}

/// State shared by a wrapper core and all wrappers it created.
struct CoreShared {
    registry: HandleRegistry,
    ops: Arc<dyn NativeOps>,
    guard: Arc<ShutdownGuard>,
}

/// The single object representing one native resource.
pub(crate) struct WrapperInner {
    handle: RawHandle,
    kind: ResourceKind,
    finalized: AtomicBool,
    core: Arc<CoreShared>,
}

impl WrapperInner {
    pub(crate) fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }

    /// Idempotent teardown: unregister, then release the native reference if
    /// the shutdown guard still permits it.
    fn finalize(&self) {
        if self.finalized.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut shard = self.core.registry.lock(self.kind);
        HandleRegistry::unregister(&mut shard, self.handle, self as *const WrapperInner);
        if self.core.guard.permits_native_call() {
            trace!(kind = %self.kind, handle = ?self.handle, "releasing native reference");
            self.core.ops.destroy(self.kind, self.handle);
        } else {
            trace!(kind = %self.kind, handle = ?self.handle, "release suppressed during teardown");
        }
    }
}

impl Drop for WrapperInner {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// Handle identity and lifetime service.
///
/// One instance exists per process in production (owned by the engine
/// singleton); tests build isolated instances with their own registry and
/// guard. Cloning is cheap and shares the same registry.
#[derive(Clone)]
pub struct WrapperCore {
    shared: Arc<CoreShared>,
}

impl WrapperCore {
    /// A core using the process-wide shutdown guard.
    pub fn new(ops: Arc<dyn NativeOps>) -> Self {
        WrapperCore::with_guard(ops, Arc::clone(process_guard()))
    }

    /// A core with an explicit shutdown guard (isolated tests, embedders).
    pub fn with_guard(ops: Arc<dyn NativeOps>, guard: Arc<ShutdownGuard>) -> Self {
        WrapperCore {
            shared: Arc::new(CoreShared {
                registry: HandleRegistry::new(),
                ops,
                guard,
            }),
        }
    }

    /// Wrap a raw native handle, returning the existing live wrapper for
    /// this (handle, kind) or creating and registering a new one.
    ///
    /// On an identity hit a `Borrowed` wrap issues no retain — the live
    /// wrapper already accounts for exactly one native reference on behalf
    /// of this layer. A `Created` hit means a caching factory handed back
    /// an object this layer already owns, with another fresh reference
    /// deposited on it; that surplus is released on the spot so one live
    /// wrapper keeps matching exactly one layer-held reference.
    pub fn wrap(
        &self,
        ptr: *mut c_void,
        kind: ResourceKind,
        ownership: Ownership,
    ) -> Result<Wrapper> {
        let Some(handle) = RawHandle::new(ptr) else {
            return Err(Error::NullHandle { kind });
        };
        if ownership == Ownership::Borrowed && !kind.supports_reference() {
            return Err(Error::UnsupportedOwnership { kind });
        }

        let mut shard = self.shared.registry.lock(kind);
        if let Some(existing) = HandleRegistry::lookup(&shard, handle) {
            if ownership == Ownership::Created
                && kind.supports_reference()
                && self.shared.guard.permits_native_call()
            {
                // Caching factories (scaled fonts) return the same object
                // twice with a second creation reference on it; drop the
                // surplus while still inside the critical section.
                trace!(%kind, ?handle, "releasing surplus creation reference");
                self.shared.ops.destroy(kind, handle);
            }
            return Ok(Wrapper { inner: existing });
        }
        if ownership == Ownership::Borrowed {
            // Still inside the critical section: no finalize for this key
            // can drop the last native reference between the lookup above
            // and this retain.
            self.shared.ops.reference(kind, handle);
        }
        let inner = Arc::new(WrapperInner {
            handle,
            kind,
            finalized: AtomicBool::new(false),
            core: Arc::clone(&self.shared),
        });
        HandleRegistry::register(&mut shard, handle, kind, &inner);
        trace!(%kind, ?handle, ?ownership, "wrapped native handle");
        Ok(Wrapper { inner })
    }

    /// Finalize a wrapper eagerly. Equivalent to [`Wrapper::close`].
    pub fn finalize(&self, wrapper: &Wrapper) {
        wrapper.inner.finalize();
    }

    /// The shutdown guard this core consults during finalization.
    pub fn shutdown_guard(&self) -> &Arc<ShutdownGuard> {
        &self.shared.guard
    }

    /// Number of live registry entries for `kind`. Diagnostics only.
    pub fn registered(&self, kind: ResourceKind) -> usize {
        self.shared.registry.len(kind)
    }
}

impl fmt::Debug for WrapperCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperCore").finish_non_exhaustive()
    }
}

/// High-level identity for one native resource.
///
/// Clones share the same underlying object; equality and hashing follow
/// (handle, kind), consistent with native identity, so wrappers work as map
/// keys.
pub struct Wrapper {
    inner: Arc<WrapperInner>,
}

impl Wrapper {
    /// The raw handle, for issuing a native call.
    ///
    /// Fails once the wrapper is finalized: no native call may flow through
    /// a released handle, even from a stale clone.
    pub fn raw(&self) -> Result<*mut c_void> {
        if self.inner.is_finalized() {
            return Err(Error::Finalized {
                kind: self.inner.kind,
            });
        }
        Ok(self.inner.handle.as_ptr())
    }

    /// Kind tag of the wrapped resource.
    pub fn kind(&self) -> ResourceKind {
        self.inner.kind
    }

    /// Whether this wrapper has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.inner.is_finalized()
    }

    /// Release the native reference now instead of at drop time.
    ///
    /// Idempotent. Other clones of this wrapper remain safe afterwards:
    /// their native calls fail with [`Error::Finalized`] rather than
    /// reaching the engine.
    pub fn close(&self) {
        self.inner.finalize();
    }

    /// Current native reference count, for diagnostics and assertions only.
    ///
    /// `None` once finalized or where the engine exposes no accessor. The
    /// value is racy against the native side; never branch on it.
    pub fn native_refcount(&self) -> Option<u32> {
        if self.inner.is_finalized() {
            return None;
        }
        self.inner
            .core
            .ops
            .reference_count(self.inner.kind, self.inner.handle)
    }
}

impl Clone for Wrapper {
    fn clone(&self) -> Self {
        Wrapper {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl PartialEq for Wrapper {
    fn eq(&self, other: &Self) -> bool {
        self.inner.handle == other.inner.handle && self.inner.kind == other.inner.kind
    }
}

impl Eq for Wrapper {}

impl Hash for Wrapper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.handle.addr().hash(state);
        self.inner.kind.hash(state);
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("kind", &self.inner.kind)
            .field("handle", &self.inner.handle)
            .field("finalized", &self.inner.is_finalized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Counts lifecycle calls; never dereferences the handle.
    #[derive(Default)]
    struct CountingOps {
        references: AtomicUsize,
        destroys: AtomicUsize,
    }

    impl NativeOps for CountingOps {
        fn reference(&self, _kind: ResourceKind, _handle: RawHandle) {
            self.references.fetch_add(1, Ordering::SeqCst);
        }

        fn destroy(&self, _kind: ResourceKind, _handle: RawHandle) {
            self.destroys.fetch_add(1, Ordering::SeqCst);
        }

        fn reference_count(&self, _kind: ResourceKind, _handle: RawHandle) -> Option<u32> {
            None
        }
    }

    fn test_core() -> (WrapperCore, Arc<CountingOps>) {
        let ops = Arc::new(CountingOps::default());
        let core = WrapperCore::with_guard(
            Arc::clone(&ops) as Arc<dyn NativeOps>,
            Arc::new(ShutdownGuard::new()),
        );
        (core, ops)
    }

    fn fake(addr: usize) -> *mut c_void {
        addr as *mut c_void
    }

    #[test]
    fn test_null_handle_rejected_without_side_effects() {
        let (core, ops) = test_core();
        let err = core
            .wrap(std::ptr::null_mut(), ResourceKind::Surface, Ownership::Borrowed)
            .unwrap_err();
        assert!(matches!(err, Error::NullHandle { .. }));
        assert_eq!(core.registered(ResourceKind::Surface), 0);
        assert_eq!(ops.references.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_identity_hit_retains_once() {
        let (core, ops) = test_core();
        let a = core
            .wrap(fake(0x1000), ResourceKind::Surface, Ownership::Borrowed)
            .unwrap();
        let b = core
            .wrap(fake(0x1000), ResourceKind::Surface, Ownership::Borrowed)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(ops.references.load(Ordering::SeqCst), 1);
        assert_eq!(core.registered(ResourceKind::Surface), 1);
    }

    #[test]
    fn test_same_address_different_kind_is_distinct() {
        let (core, ops) = test_core();
        let surface = core
            .wrap(fake(0x2000), ResourceKind::Surface, Ownership::Borrowed)
            .unwrap();
        let pattern = core
            .wrap(fake(0x2000), ResourceKind::Pattern, Ownership::Borrowed)
            .unwrap();
        assert_ne!(surface, pattern);
        assert_eq!(ops.references.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_borrowed_wrap_of_destroy_only_kind_fails() {
        let (core, ops) = test_core();
        let err = core
            .wrap(fake(0x3000), ResourceKind::Path, Ownership::Borrowed)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedOwnership {
                kind: ResourceKind::Path
            }
        ));
        assert_eq!(ops.references.load(Ordering::SeqCst), 0);
        assert_eq!(core.registered(ResourceKind::Path), 0);
    }

    #[test]
    fn test_created_wrap_of_destroy_only_kind_works() {
        let (core, ops) = test_core();
        let path = core
            .wrap(fake(0x3000), ResourceKind::Path, Ownership::Created)
            .unwrap();
        drop(path);
        assert_eq!(ops.references.load(Ordering::SeqCst), 0);
        assert_eq!(ops.destroys.load(Ordering::SeqCst), 1);
    }
}
