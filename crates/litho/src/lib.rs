//! Safe, identity-preserving bindings to the native 2D rendering engine.
//!
//! The engine hands out reference-counted objects through raw pointers. This
//! crate wraps them in typed values ([`Surface`], [`Context`], [`Pattern`],
//! [`FontFace`], ...) whose lifetime rules come from `litho-core`: at most
//! one wrapper per native object, deterministic release on drop or
//! [`close`](Wrapper::close), and suppression of native calls once process
//! teardown begins.
//!
//! Everything starts at [`engine`], which resolves the native libraries on
//! first use and memoizes the outcome:
//!
//! ```no_run
//! use litho::{engine, Format};
//!
//! fn main() -> litho::Result<()> {
//!     let engine = engine()?;
//!     let surface = engine.image_surface(Format::Argb32, 256, 256)?;
//!     let cr = surface.context()?;
//!     cr.set_source_rgb(0.1, 0.1, 0.4)?;
//!     cr.paint()?;
//!     surface.write_to_png("out.png")?;
//!     Ok(())
//! }
//! ```

use std::ffi::CStr;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use litho_core::{with_font_engine_lock, EngineOps, RawHandle, WrapperCore};
use litho_ffi::{FontEngineApi, FontMatchApi, GraphicsApi, RawPtr};

mod context;
mod device;
mod font;
mod pattern;
mod region;
mod surface;
mod util;

pub use context::{Context, Path};
pub use device::Device;
pub use font::{FontFace, FontOptions, ScaledFont};
pub use pattern::Pattern;
pub use region::Region;
pub use surface::{Format, Surface};

pub use litho_core::{
    begin_process_teardown, Error, Ownership, ResourceKind, Result, Wrapper,
};

/// The resolved native engine and the lifetime service built over it.
///
/// One instance exists per process, created lazily by [`engine`]. All typed
/// objects borrow it for `'static`, so factory methods take `&'static self`.
pub struct Engine {
    core: WrapperCore,
    graphics: &'static GraphicsApi,
    font_engine: &'static FontEngineApi,
    font_match: Option<&'static FontMatchApi>,
    ft_library: RawHandle,
    font_config: OnceLock<Option<RawHandle>>,
}

impl Engine {
    fn init() -> Result<Engine> {
        let graphics = litho_ffi::graphics()?;
        let font_engine = litho_ffi::font_engine()?;
        let font_match = litho_ffi::font_matching();

        let core = WrapperCore::new(Arc::new(EngineOps::new(graphics)));

        let ft_library = with_font_engine_lock(|| {
            let mut library: RawPtr = std::ptr::null_mut();
            // SAFETY: init writes the library handle before returning.
            let code = unsafe { (font_engine.init)(&mut library) };
            if code != 0 {
                return Err(Error::native_status(code, "FT_Init_FreeType"));
            }
            RawHandle::new(library).ok_or_else(|| {
                Error::native_status(litho_ffi::status::STATUS_NULL_POINTER, "FT_Init_FreeType")
            })
        })?;

        debug!(
            graphics = graphics.library_name(),
            font_engine = font_engine.library_name(),
            font_matching = font_match.is_some(),
            "engine initialized"
        );
        Ok(Engine {
            core,
            graphics,
            font_engine,
            font_match,
            ft_library,
            font_config: OnceLock::new(),
        })
    }

    /// Create an image surface backed by engine-allocated pixel memory.
    pub fn image_surface(&'static self, format: Format, width: i32, height: i32) -> Result<Surface> {
        Surface::image(self, format, width, height)
    }

    /// An opaque solid-color pattern.
    pub fn solid_rgb(&'static self, red: f64, green: f64, blue: f64) -> Result<Pattern> {
        Pattern::solid_rgb(self, red, green, blue)
    }

    /// A translucent solid-color pattern.
    pub fn solid_rgba(&'static self, red: f64, green: f64, blue: f64, alpha: f64) -> Result<Pattern> {
        Pattern::solid_rgba(self, red, green, blue, alpha)
    }

    /// Default rendering options for scaled fonts.
    pub fn font_options(&'static self) -> Result<FontOptions> {
        FontOptions::new(self)
    }

    /// Open `face_index` of the font file at `path`.
    pub fn font_face_from_file(&'static self, path: &str, face_index: i64) -> Result<FontFace> {
        FontFace::from_file(self, path, face_index)
    }

    /// An empty region.
    pub fn region(&'static self) -> Result<Region> {
        Region::new(self)
    }

    /// Resolve `family` to the concrete family the system matcher picks.
    ///
    /// Fails with [`Error::FontMatchingUnavailable`] when the optional
    /// matching library is not installed.
    pub fn match_family(&'static self, family: &str) -> Result<String> {
        font::match_family(self, family)
    }

    /// Whether the optional font matcher was resolved on this system.
    pub fn font_matching_available(&self) -> bool {
        self.font_match.is_some()
    }

    /// The engine's own description of a raw status code.
    pub fn status_message(&self, status: i32) -> String {
        // SAFETY: the engine returns a static NUL-terminated string for any
        // status value, including out-of-range ones.
        unsafe { CStr::from_ptr((self.graphics.status_to_string)(status)) }
            .to_string_lossy()
            .into_owned()
    }

    /// The handle identity and lifetime service.
    pub fn core(&self) -> &WrapperCore {
        &self.core
    }

    pub(crate) fn graphics(&self) -> &'static GraphicsApi {
        self.graphics
    }

    pub(crate) fn font_engine_api(&self) -> &'static FontEngineApi {
        self.font_engine
    }

    pub(crate) fn ft_library(&self) -> RawPtr {
        self.ft_library.as_ptr()
    }

    pub(crate) fn font_match(&self) -> Option<&'static FontMatchApi> {
        self.font_match
    }

    /// The matcher's configuration handle, loaded once on first use.
    pub(crate) fn font_config(&self) -> Result<RawPtr> {
        let Some(fc) = self.font_match else {
            return Err(Error::FontMatchingUnavailable);
        };
        let config = self.font_config.get_or_init(|| {
            // SAFETY: loads the system font configuration; null on failure.
            let ptr = unsafe { (fc.init_load_config_and_fonts)() };
            RawHandle::new(ptr)
        });
        match config {
            Some(handle) => Ok(handle.as_ptr()),
            None => Err(Error::FontMatchingUnavailable),
        }
    }
}

/// The process-wide engine, resolved and initialized on first call.
///
/// A failure (engine libraries not installed, font engine refused to
/// initialize) is memoized: every later call reports the same error without
/// touching the loader again.
pub fn engine() -> Result<&'static Engine> {
    static ENGINE: OnceLock<Result<Engine>> = OnceLock::new();
    ENGINE.get_or_init(Engine::init).as_ref().map_err(Clone::clone)
}
