//! Runtime resolution of the native 2D engine and its function tables.
//!
//! This crate owns the lowest layer of the binding: finding the engine's
//! shared libraries on the current platform, binding the entry points the
//! higher layers call, and translating raw status codes. It knows nothing
//! about wrappers or object lifetime — that lives in `litho-core`.
//!
//! Three library roles exist:
//!
//! - [`resolve::graphics`] — the 2D rendering engine (required)
//! - [`resolve::font_engine`] — the font engine (required)
//! - [`resolve::font_matching`] — the font matcher (optional capability)
//!
//! Resolution is lazy and memoized: the candidate list for a role is walked
//! once per process, success or failure.

pub mod error;
pub mod resolve;
pub mod status;
pub mod tables;

pub use error::{FfiError, FfiResult};
pub use resolve::{font_engine, font_matching, font_matching_available, graphics, LibraryRole};
pub use tables::{
    DestroyFn, FontEngineApi, FontMatchApi, GraphicsApi, Matrix, RawPtr, RefCountFn, ReferenceFn,
    StatusFn, UserDataDestroyFn, UserDataKey,
};
