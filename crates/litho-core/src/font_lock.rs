//! Cross-engine lock for the font engine.
//!
//! The font engine keeps global mutable state and is not safe for concurrent
//! entry from multiple threads. Every call through its table must run under
//! this process-wide lock. The graphics engine serializes per resource on
//! its own and is deliberately not locked here.

use parking_lot::Mutex;

static FONT_ENGINE_LOCK: Mutex<()> = Mutex::new(());

/// Run `operation` with the font-engine lock held.
///
/// The lock is released on every exit path, including unwinding. Not
/// reentrant: an `operation` that calls back into this function deadlocks.
pub fn with_font_engine_lock<R>(operation: impl FnOnce() -> R) -> R {
    let _guard = FONT_ENGINE_LOCK.lock();
    operation()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_lock_serializes_threads() {
        let inside = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let inside = Arc::clone(&inside);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    with_font_engine_lock(|| {
                        assert!(!inside.swap(true, Ordering::SeqCst), "overlapping entry");
                        inside.store(false, Ordering::SeqCst);
                    });
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_lock_released_after_panic() {
        let caught = std::panic::catch_unwind(|| with_font_engine_lock(|| panic!("boom")));
        assert!(caught.is_err());
        // A poisoned or still-held lock would hang here.
        with_font_engine_lock(|| {});
    }
}
