//! Opaque native handle values.

use std::fmt;
use std::ptr::NonNull;

use libc::c_void;

/// Address of a native resource, known non-null.
///
/// A handle is only meaningful together with a
/// [`ResourceKind`](crate::ResourceKind); the pair is the identity key for
/// the whole layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(NonNull<c_void>);

impl RawHandle {
    /// Wrap a raw pointer; `None` for null.
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(RawHandle)
    }

    /// The raw pointer, for passing back across the C boundary.
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// The address value used as a registry key.
    pub(crate) fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

// SAFETY: a RawHandle is an opaque token. The Rust side never dereferences
// it; all access to the memory behind it happens inside the engine, which
// owns whatever synchronization the resource needs.
unsafe impl Send for RawHandle {}
unsafe impl Sync for RawHandle {}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHandle({:p})", self.0)
    }
}
