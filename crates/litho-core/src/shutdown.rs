//! Process teardown detection.
//!
//! Once the process starts tearing down global state, the native libraries
//! may already be unloaded and calling into them would crash. The guard is a
//! one-way flag: after [`ShutdownGuard::begin_teardown`], finalization stops
//! issuing native release calls and simply marks wrappers finalized.
//!
//! The transition is global and monotonic. A finalize that checked the guard
//! just before the transition may still issue its native call; that window
//! is accepted — at worst the final few native references leak while the
//! process is exiting anyway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::debug;

/// Two-phase process state: active, then irreversibly tearing down.
pub struct ShutdownGuard {
    tearing_down: AtomicBool,
}

impl ShutdownGuard {
    /// A guard in the active phase.
    pub const fn new() -> Self {
        ShutdownGuard {
            tearing_down: AtomicBool::new(false),
        }
    }

    /// Enter the tearing-down phase. Idempotent, irreversible.
    pub fn begin_teardown(&self) {
        if !self.tearing_down.swap(true, Ordering::SeqCst) {
            debug!("teardown: suppressing further native release calls");
        }
    }

    /// Whether the tearing-down phase has been entered.
    pub fn is_tearing_down(&self) -> bool {
        self.tearing_down.load(Ordering::SeqCst)
    }

    /// True only while native calls are still safe to issue.
    pub fn permits_native_call(&self) -> bool {
        !self.is_tearing_down()
    }
}

impl Default for ShutdownGuard {
    fn default() -> Self {
        ShutdownGuard::new()
    }
}

/// The process-wide guard shared by every default wrapper core.
pub fn process_guard() -> &'static Arc<ShutdownGuard> {
    static GUARD: OnceLock<Arc<ShutdownGuard>> = OnceLock::new();
    GUARD.get_or_init(|| Arc::new(ShutdownGuard::new()))
}

/// Signal that the process is finalizing global state.
///
/// Call this before the native libraries can be unloaded (runtime shutdown
/// hooks, `atexit`-style callbacks in embedders). Wrappers finalized after
/// this point are marked closed without touching the engine.
pub fn begin_process_teardown() {
    process_guard().begin_teardown();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_by_default() {
        let guard = ShutdownGuard::new();
        assert!(guard.permits_native_call());
        assert!(!guard.is_tearing_down());
    }

    #[test]
    fn test_transition_is_one_way_and_idempotent() {
        let guard = ShutdownGuard::new();
        guard.begin_teardown();
        assert!(!guard.permits_native_call());
        guard.begin_teardown();
        assert!(!guard.permits_native_call());
    }
}
