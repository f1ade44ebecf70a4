//! Process-wide handle registry.
//!
//! Maps (handle address, kind) to a weak reference to the live wrapper, so
//! that every wrap request for the same native object yields the same
//! wrapper. Entries are weak: wrapper liveness is the sole authority on
//! entry existence, the registry never keeps anything alive.
//!
//! Storage is partitioned per kind. The partition mutex is exposed to the
//! wrapper core because the identity-critical section must span the registry
//! check *and* the native increment/decrement, not just the map mutation.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;
use tracing::error;

use crate::handle::RawHandle;
use crate::kind::ResourceKind;
use crate::wrapper::WrapperInner;

/// One kind's partition: handle address to live wrapper.
pub(crate) type Shard = FxHashMap<usize, Weak<WrapperInner>>;

pub(crate) struct HandleRegistry {
    shards: [Mutex<Shard>; ResourceKind::COUNT],
}

impl HandleRegistry {
    pub(crate) fn new() -> Self {
        HandleRegistry {
            shards: std::array::from_fn(|_| Mutex::new(FxHashMap::default())),
        }
    }

    /// Lock the partition for `kind`, entering its critical section.
    pub(crate) fn lock(&self, kind: ResourceKind) -> MutexGuard<'_, Shard> {
        self.shards[kind.index()].lock()
    }

    /// Look up the live wrapper for `handle`, if any.
    ///
    /// A finalized wrapper that has not yet left the map (its close raced
    /// this lookup) counts as absent.
    pub(crate) fn lookup(shard: &Shard, handle: RawHandle) -> Option<Arc<WrapperInner>> {
        shard
            .get(&handle.addr())
            .and_then(Weak::upgrade)
            .filter(|inner| !inner.is_finalized())
    }

    /// Insert the entry for a freshly created wrapper.
    ///
    /// Replacing a dead or finalized entry is routine (the previous wrapper
    /// is on its way out). Replacing a different *live* wrapper means the
    /// identity invariant was already broken: continuing would alias one
    /// native reference under two owners. Unreachable through the wrapper
    /// core, which looks the key up under the same shard guard it registers
    /// under.
    pub(crate) fn register(
        shard: &mut Shard,
        handle: RawHandle,
        kind: ResourceKind,
        inner: &Arc<WrapperInner>,
    ) {
        if let Some(stale) = shard.insert(handle.addr(), Arc::downgrade(inner)) {
            if let Some(live) = stale.upgrade() {
                if !live.is_finalized() && !Arc::ptr_eq(&live, inner) {
                    // Unwinding here would drop wrappers while their shard
                    // is locked and deadlock in their finalize; this state
                    // is unrecoverable, so fail hard without unwinding.
                    error!(
                        %kind,
                        ?handle,
                        "handle registry collision: live wrapper already registered"
                    );
                    std::process::abort();
                }
            }
        }
    }

    /// Remove the entry for `handle` if it still refers to `inner`.
    ///
    /// Idempotent. The identity check matters: a finalize racing a re-wrap
    /// of the same address must not evict the successor's entry.
    pub(crate) fn unregister(shard: &mut Shard, handle: RawHandle, inner: *const WrapperInner) {
        if let Some(entry) = shard.get(&handle.addr()) {
            if std::ptr::eq(entry.as_ptr(), inner) {
                shard.remove(&handle.addr());
            }
        }
    }

    /// Number of entries currently registered for `kind`. Diagnostics only.
    pub(crate) fn len(&self, kind: ResourceKind) -> usize {
        self.shards[kind.index()].lock().len()
    }
}
