//! Font faces, scaled fonts, and family matching.
//!
//! Fonts are the one place two native engines meet: faces are opened through
//! the font engine and then handed to the graphics engine, which keeps using
//! the underlying face object for as long as the graphics-side font face is
//! alive. Every call into the font engine — including the destroy callback
//! the graphics engine fires when the face's last reference drops — runs
//! under the cross-engine lock.

use std::ffi::CStr;

use libc::{c_int, c_void};

use litho_core::{
    check_status, with_font_engine_lock, Error, Ownership, ResourceKind, Result, Wrapper,
};
use litho_ffi::{Matrix, RawPtr, UserDataKey};

use crate::util::c_string;
use crate::Engine;

/// User-data slot tying a graphics-side font face to the font-engine face
/// it was created from. Identity is the key's address.
static FT_FACE_KEY: UserDataKey = UserDataKey { unused: 0 };

const FC_MATCH_PATTERN: c_int = 0;
const FC_RESULT_MATCH: c_int = 0;

/// Destroy callback the graphics engine invokes when the font face's last
/// native reference drops.
unsafe extern "C" fn release_font_engine_face(data: *mut c_void) {
    // The table was resolved before any face existed, so this lookup is a
    // memoized hit.
    if let Ok(api) = litho_ffi::font_engine() {
        with_font_engine_lock(|| {
            (api.done_face)(data);
        });
    }
}

/// A typeface loaded from a font file.
pub struct FontFace {
    wrapper: Wrapper,
    engine: &'static Engine,
}

impl FontFace {
    /// Open `face_index` of the font file at `path`.
    ///
    /// The font-engine face is owned by the graphics-side font face from the
    /// moment the user-data hook is attached; it is released exactly once,
    /// when the last native reference to the wrapped face drops.
    pub(crate) fn from_file(
        engine: &'static Engine,
        path: &str,
        face_index: i64,
    ) -> Result<FontFace> {
        let cpath = c_string(path, "FT_New_Face")?;
        let ft = engine.font_engine_api();

        let ft_face = with_font_engine_lock(|| {
            let mut face: RawPtr = std::ptr::null_mut();
            // SAFETY: the font-engine library handle was initialized at
            // engine construction; the path buffer outlives the call.
            let code = unsafe {
                (ft.new_face)(
                    engine.ft_library(),
                    cpath.as_ptr(),
                    face_index as libc::c_long,
                    &mut face,
                )
            };
            if code != 0 {
                return Err(Error::native_status(code, "FT_New_Face"));
            }
            Ok(face)
        })?;

        // SAFETY: freshly opened face; the result carries a fresh reference.
        let raw = unsafe { (engine.graphics().ft_font_face_create)(ft_face, 0) };
        let wrapper = match engine
            .core()
            .wrap(raw, ResourceKind::FontFace, Ownership::Created)
        {
            Ok(wrapper) => wrapper,
            Err(err) => {
                // The graphics side never took ownership; close the
                // font-engine face ourselves.
                with_font_engine_lock(|| {
                    // SAFETY: ft_face is live and unowned here.
                    unsafe { (ft.done_face)(ft_face) };
                });
                return Err(err);
            }
        };
        let face = FontFace { wrapper, engine };

        let hook_status = {
            let raw = face.wrapper.raw()?;
            // SAFETY: live font face handle; the key is 'static and the
            // callback outlives the process.
            unsafe {
                (engine.graphics().font_face_set_user_data)(
                    raw,
                    &FT_FACE_KEY,
                    ft_face,
                    Some(release_font_engine_face),
                )
            }
        };
        if let Err(err) = check_status(hook_status, "cairo_font_face_set_user_data") {
            // Hook rejected (out of memory): the graphics face will never
            // release the font-engine face, so do both halves here.
            face.close();
            with_font_engine_lock(|| {
                // SAFETY: the failed hook left ft_face unowned.
                unsafe { (ft.done_face)(ft_face) };
            });
            return Err(err);
        }
        face.status()?;
        Ok(face)
    }

    /// Font face error state as a result.
    pub fn status(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live font face handle owned by this wrapper.
        let status = unsafe { (self.engine.graphics().font_face_status)(raw) };
        check_status(status, "cairo_font_face_status")
    }

    /// A scaled font rendering this face at `size` pixels.
    pub fn scaled(&self, size: f64, options: &FontOptions) -> Result<ScaledFont> {
        ScaledFont::new(self, size, options)
    }

    /// Native reference count, for diagnostics only.
    pub fn reference_count(&self) -> Option<u32> {
        self.wrapper.native_refcount()
    }

    /// Release the native reference now instead of at drop time.
    pub fn close(&self) {
        self.wrapper.close();
    }

    /// The identity wrapper for this font face.
    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }
}

/// A font face bound to a concrete size and rendering options.
pub struct ScaledFont {
    wrapper: Wrapper,
    engine: &'static Engine,
}

impl ScaledFont {
    /// Bind `face` to a uniform scale of `size` with the given options.
    pub fn new(face: &FontFace, size: f64, options: &FontOptions) -> Result<ScaledFont> {
        let engine = face.engine;
        let font_matrix = Matrix::scale(size, size);
        let ctm = Matrix::identity();
        let face_raw = face.wrapper.raw()?;
        let options_raw = options.wrapper.raw()?;
        // SAFETY: two live handles; the matrices are copied by the engine.
        let raw = unsafe {
            (engine.graphics().scaled_font_create)(face_raw, &font_matrix, &ctm, options_raw)
        };
        let wrapper = engine
            .core()
            .wrap(raw, ResourceKind::ScaledFont, Ownership::Created)?;
        let font = ScaledFont { wrapper, engine };
        font.status()?;
        Ok(font)
    }

    /// Scaled font error state as a result.
    pub fn status(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live scaled font handle owned by this wrapper.
        let status = unsafe { (self.engine.graphics().scaled_font_status)(raw) };
        check_status(status, "cairo_scaled_font_status")
    }

    /// Native reference count, for diagnostics only.
    pub fn reference_count(&self) -> Option<u32> {
        self.wrapper.native_refcount()
    }

    /// Release the native reference now instead of at drop time.
    pub fn close(&self) {
        self.wrapper.close();
    }

    /// The identity wrapper for this scaled font.
    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }
}

/// Rendering options for scaled fonts.
///
/// Destroy-only on the native side: options carry no reference count, so a
/// `FontOptions` can be created and closed but never re-wrapped as borrowed.
pub struct FontOptions {
    wrapper: Wrapper,
    engine: &'static Engine,
}

impl FontOptions {
    pub(crate) fn new(engine: &'static Engine) -> Result<FontOptions> {
        // SAFETY: factory call; the result is a fresh allocation.
        let raw = unsafe { (engine.graphics().font_options_create)() };
        let wrapper = engine
            .core()
            .wrap(raw, ResourceKind::FontOptions, Ownership::Created)?;
        let options = FontOptions { wrapper, engine };
        options.status()?;
        Ok(options)
    }

    /// Font options error state as a result.
    pub fn status(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live font options handle owned by this wrapper.
        let status = unsafe { (self.engine.graphics().font_options_status)(raw) };
        check_status(status, "cairo_font_options_status")
    }

    /// Release the native allocation now instead of at drop time.
    pub fn close(&self) {
        self.wrapper.close();
    }

    /// The identity wrapper for these options.
    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }
}

/// Resolve `family` to the concrete family name the matcher picks.
///
/// The matcher walks the system font configuration, so even a nonsense
/// family yields *some* best match; `Ok` therefore means "the matcher ran",
/// not "the family exists".
pub(crate) fn match_family(engine: &'static Engine, family: &str) -> Result<String> {
    let Some(fc) = engine.font_match() else {
        return Err(Error::FontMatchingUnavailable);
    };
    let config = engine.font_config()?;
    let cfamily = c_string(family, "FcNameParse")?;

    // The matcher rasterizes through the font engine internally.
    with_font_engine_lock(|| {
        // SAFETY: the family buffer outlives the call.
        let pattern = unsafe { (fc.name_parse)(cfamily.as_ptr()) };
        if pattern.is_null() {
            return Err(Error::native_status(-1, "FcNameParse"));
        }
        // SAFETY: live pattern and config handles.
        unsafe {
            (fc.config_substitute)(config, pattern, FC_MATCH_PATTERN);
            (fc.default_substitute)(pattern);
        }
        let mut result: c_int = 0;
        // SAFETY: live pattern and config handles; result is written before
        // the call returns.
        let matched = unsafe { (fc.font_match)(config, pattern, &mut result) };
        // SAFETY: pattern is ours to destroy; the match holds no borrow of it.
        unsafe { (fc.pattern_destroy)(pattern) };
        if matched.is_null() || result != FC_RESULT_MATCH {
            return Err(Error::native_status(result, "FcFontMatch"));
        }

        let mut value: *mut libc::c_char = std::ptr::null_mut();
        // SAFETY: live matched pattern; the property name is NUL-terminated.
        let got = unsafe {
            (fc.pattern_get_string)(matched, b"family\0".as_ptr().cast(), 0, &mut value)
        };
        // The string borrows the matched pattern, so copy it out before the
        // pattern is destroyed.
        let name = if got == FC_RESULT_MATCH && !value.is_null() {
            // SAFETY: the matcher returns a NUL-terminated string owned by
            // the matched pattern, which is still live here.
            Some(unsafe { CStr::from_ptr(value) }.to_string_lossy().into_owned())
        } else {
            None
        };
        // SAFETY: matched is ours to destroy.
        unsafe { (fc.pattern_destroy)(matched) };
        name.ok_or_else(|| Error::native_status(got, "FcPatternGetString"))
    })
}
