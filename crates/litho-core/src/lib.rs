//! Handle identity and lifetime management for the native 2D engine.
//!
//! The engine hands out reference-counted objects through raw pointers; this
//! crate keeps exactly one high-level wrapper alive per native object and
//! keeps the native reference count in lockstep with wrapper lifetime:
//!
//! - [`WrapperCore::wrap`] — wrap a raw handle, reusing the live wrapper for
//!   that (handle, kind) when one exists
//! - [`Wrapper::close`] / drop — deterministic release of the wrapper's
//!   native reference
//! - [`ShutdownGuard`] — suppresses native calls once process teardown may
//!   have unloaded the libraries
//! - [`with_font_engine_lock`] — serializes entry into the font engine,
//!   which is not internally thread-safe
//!
//! Concrete object types (surfaces, contexts, fonts) live in the `litho`
//! crate; they contain no lifetime logic of their own and route every handle
//! the engine returns back through [`WrapperCore::wrap`].

mod error;
mod font_lock;
mod handle;
mod kind;
mod ops;
mod registry;
mod shutdown;
mod wrapper;

pub use error::{check_status, Error, Result};
pub use font_lock::with_font_engine_lock;
pub use handle::RawHandle;
pub use kind::ResourceKind;
pub use ops::{EngineOps, NativeOps};
pub use shutdown::{begin_process_teardown, process_guard, ShutdownGuard};
pub use wrapper::{Ownership, Wrapper, WrapperCore};
