//! Lifetime-management properties, exercised against a counting fake of the
//! engine's lifecycle entry points. Handle values are fabricated addresses;
//! nothing here dereferences them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use libc::c_void;
use pretty_assertions::assert_eq;

use litho_core::{
    Error, NativeOps, Ownership, RawHandle, ResourceKind, ShutdownGuard, Wrapper, WrapperCore,
};

/// Books every lifecycle call per handle address.
#[derive(Default)]
struct MockEngine {
    references: AtomicUsize,
    destroys: AtomicUsize,
    /// Net references this layer holds per handle address.
    net: Mutex<HashMap<usize, i64>>,
}

impl MockEngine {
    fn net_for(&self, addr: usize) -> i64 {
        self.net.lock().unwrap().get(&addr).copied().unwrap_or(0)
    }
}

impl NativeOps for MockEngine {
    fn reference(&self, _kind: ResourceKind, handle: RawHandle) {
        self.references.fetch_add(1, Ordering::SeqCst);
        *self
            .net
            .lock()
            .unwrap()
            .entry(handle.as_ptr() as usize)
            .or_insert(0) += 1;
    }

    fn destroy(&self, _kind: ResourceKind, handle: RawHandle) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        *self
            .net
            .lock()
            .unwrap()
            .entry(handle.as_ptr() as usize)
            .or_insert(0) -= 1;
    }

    fn reference_count(&self, _kind: ResourceKind, handle: RawHandle) -> Option<u32> {
        Some(self.net_for(handle.as_ptr() as usize).max(0) as u32)
    }
}

fn harness() -> (WrapperCore, Arc<MockEngine>, Arc<ShutdownGuard>) {
    let engine = Arc::new(MockEngine::default());
    let guard = Arc::new(ShutdownGuard::new());
    let core = WrapperCore::with_guard(
        Arc::clone(&engine) as Arc<dyn NativeOps>,
        Arc::clone(&guard),
    );
    (core, engine, guard)
}

fn fake(addr: usize) -> *mut c_void {
    addr as *mut c_void
}

#[test]
fn wrapping_the_same_surface_twice_retains_once() {
    let (core, engine, _guard) = harness();
    let a = core
        .wrap(fake(0x1000), ResourceKind::Surface, Ownership::Borrowed)
        .unwrap();
    let b = core
        .wrap(fake(0x1000), ResourceKind::Surface, Ownership::Borrowed)
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(engine.references.load(Ordering::SeqCst), 1);
    assert_eq!(engine.destroys.load(Ordering::SeqCst), 0);
}

#[test]
fn created_context_releases_exactly_once_with_no_retain() {
    let (core, engine, _guard) = harness();
    let context = core
        .wrap(fake(0x2000), ResourceKind::Context, Ownership::Created)
        .unwrap();
    drop(context);
    assert_eq!(engine.references.load(Ordering::SeqCst), 0);
    assert_eq!(engine.destroys.load(Ordering::SeqCst), 1);
}

#[test]
fn null_handle_fails_without_touching_registry_or_engine() {
    let (core, engine, _guard) = harness();
    let err = core
        .wrap(fake(0), ResourceKind::Surface, Ownership::Borrowed)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::NullHandle {
            kind: ResourceKind::Surface
        }
    ));
    assert_eq!(core.registered(ResourceKind::Surface), 0);
    assert_eq!(engine.references.load(Ordering::SeqCst), 0);
    assert_eq!(engine.destroys.load(Ordering::SeqCst), 0);
}

#[test]
fn teardown_suppresses_every_subsequent_release() {
    let (core, engine, guard) = harness();
    let wrappers: Vec<Wrapper> = (0..3)
        .map(|i| {
            core.wrap(
                fake(0x3000 + i * 0x10),
                ResourceKind::Pattern,
                Ownership::Borrowed,
            )
            .unwrap()
        })
        .collect();
    guard.begin_teardown();
    for wrapper in &wrappers {
        wrapper.close();
    }
    assert!(wrappers.iter().all(Wrapper::is_finalized));
    assert_eq!(engine.destroys.load(Ordering::SeqCst), 0);
    // Dropping the finalized wrappers must not release either.
    drop(wrappers);
    assert_eq!(engine.destroys.load(Ordering::SeqCst), 0);
}

#[test]
fn double_close_releases_once() {
    let (core, engine, _guard) = harness();
    let surface = core
        .wrap(fake(0x4000), ResourceKind::Surface, Ownership::Borrowed)
        .unwrap();
    surface.close();
    surface.close();
    drop(surface);
    assert_eq!(engine.destroys.load(Ordering::SeqCst), 1);
    assert_eq!(engine.net_for(0x4000), 0);
}

#[test]
fn close_invalidates_stale_clones() {
    let (core, _engine, _guard) = harness();
    let surface = core
        .wrap(fake(0x5000), ResourceKind::Surface, Ownership::Borrowed)
        .unwrap();
    let stale = surface.clone();
    core.finalize(&surface);
    let err = stale.raw().unwrap_err();
    assert!(matches!(
        err,
        Error::Finalized {
            kind: ResourceKind::Surface
        }
    ));
    assert_eq!(stale.native_refcount(), None);
}

#[test]
fn borrowed_identity_hit_issues_no_retain() {
    let (core, engine, _guard) = harness();
    let created = core
        .wrap(fake(0x6000), ResourceKind::Device, Ownership::Created)
        .unwrap();
    let again = core
        .wrap(fake(0x6000), ResourceKind::Device, Ownership::Borrowed)
        .unwrap();
    assert_eq!(created, again);
    // The live wrapper already accounts for one reference; no retain issued.
    assert_eq!(engine.references.load(Ordering::SeqCst), 0);
}

#[test]
fn caching_factory_surplus_creation_reference_is_released() {
    let (core, engine, _guard) = harness();
    // A caching factory (scaled fonts) can return the same object twice,
    // depositing a fresh creation reference each time.
    let first = core
        .wrap(fake(0xb000), ResourceKind::ScaledFont, Ownership::Created)
        .unwrap();
    let second = core
        .wrap(fake(0xb000), ResourceKind::ScaledFont, Ownership::Created)
        .unwrap();
    assert_eq!(first, second);
    // The second deposited reference is surplus and released immediately.
    assert_eq!(engine.destroys.load(Ordering::SeqCst), 1);
    drop(first);
    drop(second);
    // Two deposited references, two releases: no net leak.
    assert_eq!(engine.references.load(Ordering::SeqCst), 0);
    assert_eq!(engine.destroys.load(Ordering::SeqCst), 2);
}

#[test]
fn surplus_release_is_suppressed_during_teardown() {
    let (core, engine, guard) = harness();
    let first = core
        .wrap(fake(0xc000), ResourceKind::ScaledFont, Ownership::Created)
        .unwrap();
    guard.begin_teardown();
    let second = core
        .wrap(fake(0xc000), ResourceKind::ScaledFont, Ownership::Created)
        .unwrap();
    assert_eq!(first, second);
    drop(first);
    drop(second);
    assert_eq!(engine.destroys.load(Ordering::SeqCst), 0);
}

#[test]
fn address_can_be_rewrapped_after_full_release() {
    let (core, engine, _guard) = harness();
    let first = core
        .wrap(fake(0x7000), ResourceKind::FontFace, Ownership::Borrowed)
        .unwrap();
    drop(first);
    assert_eq!(core.registered(ResourceKind::FontFace), 0);
    let second = core
        .wrap(fake(0x7000), ResourceKind::FontFace, Ownership::Borrowed)
        .unwrap();
    assert_eq!(engine.references.load(Ordering::SeqCst), 2);
    assert_eq!(engine.destroys.load(Ordering::SeqCst), 1);
    drop(second);
    assert_eq!(engine.net_for(0x7000), 0);
}

#[test]
fn registry_entry_lives_exactly_as_long_as_the_wrapper() {
    let (core, _engine, _guard) = harness();
    let region = core
        .wrap(fake(0x8000), ResourceKind::Region, Ownership::Borrowed)
        .unwrap();
    assert_eq!(core.registered(ResourceKind::Region), 1);
    let clone = region.clone();
    drop(region);
    assert_eq!(core.registered(ResourceKind::Region), 1);
    drop(clone);
    assert_eq!(core.registered(ResourceKind::Region), 0);
}

#[test]
fn wrappers_key_maps_by_native_identity() {
    let (core, _engine, _guard) = harness();
    let a = core
        .wrap(fake(0x9000), ResourceKind::Surface, Ownership::Borrowed)
        .unwrap();
    let b = core
        .wrap(fake(0x9100), ResourceKind::Surface, Ownership::Borrowed)
        .unwrap();
    let mut sizes: HashMap<Wrapper, (u32, u32)> = HashMap::new();
    sizes.insert(a.clone(), (640, 480));
    sizes.insert(b, (800, 600));
    let a_again = core
        .wrap(fake(0x9000), ResourceKind::Surface, Ownership::Borrowed)
        .unwrap();
    assert_eq!(sizes.get(&a_again), Some(&(640, 480)));
    assert_eq!(sizes.len(), 2);
    drop(a);
}

#[test]
fn diagnostics_reflect_the_single_layer_reference() {
    let (core, _engine, _guard) = harness();
    let pattern = core
        .wrap(fake(0xa000), ResourceKind::Pattern, Ownership::Borrowed)
        .unwrap();
    assert_eq!(pattern.native_refcount(), Some(1));
}

#[test]
fn refcount_parity_holds_under_contention() {
    let (core, engine, _guard) = harness();
    let mut handles = Vec::new();
    for t in 0..8u64 {
        let core = core.clone();
        handles.push(std::thread::spawn(move || {
            for i in 0..200u64 {
                // Two threads share each address, racing wrap against drop.
                let addr = 0x10_0000 + ((t / 2) * 0x100 + (i % 4) * 0x10) as usize;
                let wrapper = core
                    .wrap(fake(addr), ResourceKind::Surface, Ownership::Borrowed)
                    .unwrap();
                assert!(wrapper.raw().is_ok() || wrapper.is_finalized());
                drop(wrapper);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    // Every retain this layer issued has been matched by exactly one release.
    assert_eq!(
        engine.references.load(Ordering::SeqCst),
        engine.destroys.load(Ordering::SeqCst)
    );
    assert_eq!(core.registered(ResourceKind::Surface), 0);
    let net = engine.net.lock().unwrap();
    assert!(net.values().all(|&n| n == 0), "net references: {net:?}");
}
