//! Bound function tables, one per library role.
//!
//! A table is built once from a freshly loaded library: every symbol the
//! binding layer needs is looked up eagerly, so a missing entry point
//! surfaces at resolution time instead of mid-drawing. Each table keeps its
//! [`libloading::Library`] alive for as long as the table exists, which is
//! the process lifetime once memoized — the raw function pointers can never
//! outlive the mapping they point into.

use libc::{c_char, c_int, c_long, c_uint, c_void};
use libloading::Library;

use crate::error::{FfiError, FfiResult};
use crate::resolve::LoadedLibrary;

/// Opaque native handle as it crosses the C boundary.
pub type RawPtr = *mut c_void;

/// `T* f(T*)` — reference-increment entry points return their argument.
pub type ReferenceFn = unsafe extern "C" fn(RawPtr) -> RawPtr;
/// `void f(T*)` — reference-decrement / destroy entry points.
pub type DestroyFn = unsafe extern "C" fn(RawPtr);
/// `unsigned f(T*)` — diagnostic refcount accessors.
pub type RefCountFn = unsafe extern "C" fn(RawPtr) -> c_uint;
/// `cairo_status_t f(T*)`.
pub type StatusFn = unsafe extern "C" fn(RawPtr) -> c_int;
/// Destroy callback attached to engine user data.
pub type UserDataDestroyFn = unsafe extern "C" fn(*mut c_void);

/// Key for engine user-data slots; identity is the key's address.
#[repr(C)]
pub struct UserDataKey {
    pub unused: c_int,
}

/// Affine transform in the engine's wire layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Matrix {
    /// The identity transform.
    pub const fn identity() -> Self {
        Matrix {
            xx: 1.0,
            yx: 0.0,
            xy: 0.0,
            yy: 1.0,
            x0: 0.0,
            y0: 0.0,
        }
    }

    /// A pure scale transform.
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Matrix {
            xx: sx,
            yx: 0.0,
            xy: 0.0,
            yy: sy,
            x0: 0.0,
            y0: 0.0,
        }
    }
}

/// Copy one symbol out of a loaded library, by name.
fn sym<T: Copy>(lib: &Library, library: &str, symbol: &str) -> FfiResult<T> {
    // SAFETY: the caller-declared field type fixes T to the C signature of
    // the named entry point; a wrong declaration here is a binding bug, not
    // something the loader can detect.
    unsafe {
        lib.get::<T>(symbol.as_bytes())
            .map(|s| *s)
            .map_err(|_| FfiError::symbol_missing(library, symbol))
    }
}

// ============================================================================
// Graphics engine (cairo)
// ============================================================================

/// Bound entry points of the graphics engine.
///
/// The lifecycle block (reference / destroy / refcount per object kind) is
/// what the wrapper core drives; the rest are the drawing and factory calls
/// the typed layer exposes.
#[derive(Debug)]
pub struct GraphicsApi {
    // Lifecycle: drawing contexts
    pub context_reference: ReferenceFn,
    pub context_destroy: DestroyFn,
    pub context_refcount: RefCountFn,
    // Lifecycle: surfaces
    pub surface_reference: ReferenceFn,
    pub surface_destroy: DestroyFn,
    pub surface_refcount: RefCountFn,
    // Lifecycle: patterns
    pub pattern_reference: ReferenceFn,
    pub pattern_destroy: DestroyFn,
    pub pattern_refcount: RefCountFn,
    // Lifecycle: paths (destroy-only; the engine exposes no reference call)
    pub path_destroy: DestroyFn,
    // Lifecycle: font faces
    pub font_face_reference: ReferenceFn,
    pub font_face_destroy: DestroyFn,
    pub font_face_refcount: RefCountFn,
    // Lifecycle: scaled fonts
    pub scaled_font_reference: ReferenceFn,
    pub scaled_font_destroy: DestroyFn,
    pub scaled_font_refcount: RefCountFn,
    // Lifecycle: font options (destroy-only)
    pub font_options_destroy: DestroyFn,
    // Lifecycle: devices
    pub device_reference: ReferenceFn,
    pub device_destroy: DestroyFn,
    pub device_refcount: RefCountFn,
    // Lifecycle: regions (no refcount accessor in the engine API)
    pub region_reference: ReferenceFn,
    pub region_destroy: DestroyFn,

    // Context operations
    pub create: unsafe extern "C" fn(RawPtr) -> RawPtr,
    pub status: StatusFn,
    pub status_to_string: unsafe extern "C" fn(c_int) -> *const c_char,
    pub get_target: unsafe extern "C" fn(RawPtr) -> RawPtr,
    pub get_source: unsafe extern "C" fn(RawPtr) -> RawPtr,
    pub set_source: unsafe extern "C" fn(RawPtr, RawPtr),
    pub set_source_rgb: unsafe extern "C" fn(RawPtr, f64, f64, f64),
    pub set_source_rgba: unsafe extern "C" fn(RawPtr, f64, f64, f64, f64),
    pub save: unsafe extern "C" fn(RawPtr),
    pub restore: unsafe extern "C" fn(RawPtr),
    pub paint: unsafe extern "C" fn(RawPtr),
    pub move_to: unsafe extern "C" fn(RawPtr, f64, f64),
    pub line_to: unsafe extern "C" fn(RawPtr, f64, f64),
    pub rectangle: unsafe extern "C" fn(RawPtr, f64, f64, f64, f64),
    pub stroke: unsafe extern "C" fn(RawPtr),
    pub fill: unsafe extern "C" fn(RawPtr),
    pub copy_path: unsafe extern "C" fn(RawPtr) -> RawPtr,

    // Surface operations
    pub image_surface_create: unsafe extern "C" fn(c_int, c_int, c_int) -> RawPtr,
    pub surface_flush: unsafe extern "C" fn(RawPtr),
    pub surface_finish: unsafe extern "C" fn(RawPtr),
    pub surface_status: StatusFn,
    pub surface_write_to_png: unsafe extern "C" fn(RawPtr, *const c_char) -> c_int,
    pub surface_get_device: unsafe extern "C" fn(RawPtr) -> RawPtr,

    // Pattern operations
    pub pattern_create_rgb: unsafe extern "C" fn(f64, f64, f64) -> RawPtr,
    pub pattern_create_rgba: unsafe extern "C" fn(f64, f64, f64, f64) -> RawPtr,
    pub pattern_status: StatusFn,

    // Font operations
    pub font_face_status: StatusFn,
    pub font_face_set_user_data: unsafe extern "C" fn(
        RawPtr,
        *const UserDataKey,
        *mut c_void,
        Option<UserDataDestroyFn>,
    ) -> c_int,
    pub font_options_create: unsafe extern "C" fn() -> RawPtr,
    pub font_options_status: StatusFn,
    pub scaled_font_create:
        unsafe extern "C" fn(RawPtr, *const Matrix, *const Matrix, RawPtr) -> RawPtr,
    pub scaled_font_status: StatusFn,
    pub ft_font_face_create: unsafe extern "C" fn(RawPtr, c_int) -> RawPtr,

    // Device operations
    pub device_status: StatusFn,

    // Region operations
    pub region_create: unsafe extern "C" fn() -> RawPtr,
    pub region_status: StatusFn,

    library: String,
    _lib: Library,
}

impl GraphicsApi {
    pub(crate) fn bind(loaded: LoadedLibrary) -> FfiResult<Self> {
        let LoadedLibrary { lib, name } = loaded;
        macro_rules! bind {
            ($symbol:literal) => {
                sym(&lib, &name, $symbol)?
            };
        }
        Ok(GraphicsApi {
            context_reference: bind!("cairo_reference"),
            context_destroy: bind!("cairo_destroy"),
            context_refcount: bind!("cairo_get_reference_count"),
            surface_reference: bind!("cairo_surface_reference"),
            surface_destroy: bind!("cairo_surface_destroy"),
            surface_refcount: bind!("cairo_surface_get_reference_count"),
            pattern_reference: bind!("cairo_pattern_reference"),
            pattern_destroy: bind!("cairo_pattern_destroy"),
            pattern_refcount: bind!("cairo_pattern_get_reference_count"),
            path_destroy: bind!("cairo_path_destroy"),
            font_face_reference: bind!("cairo_font_face_reference"),
            font_face_destroy: bind!("cairo_font_face_destroy"),
            font_face_refcount: bind!("cairo_font_face_get_reference_count"),
            scaled_font_reference: bind!("cairo_scaled_font_reference"),
            scaled_font_destroy: bind!("cairo_scaled_font_destroy"),
            scaled_font_refcount: bind!("cairo_scaled_font_get_reference_count"),
            font_options_destroy: bind!("cairo_font_options_destroy"),
            device_reference: bind!("cairo_device_reference"),
            device_destroy: bind!("cairo_device_destroy"),
            device_refcount: bind!("cairo_device_get_reference_count"),
            region_reference: bind!("cairo_region_reference"),
            region_destroy: bind!("cairo_region_destroy"),

            create: bind!("cairo_create"),
            status: bind!("cairo_status"),
            status_to_string: bind!("cairo_status_to_string"),
            get_target: bind!("cairo_get_target"),
            get_source: bind!("cairo_get_source"),
            set_source: bind!("cairo_set_source"),
            set_source_rgb: bind!("cairo_set_source_rgb"),
            set_source_rgba: bind!("cairo_set_source_rgba"),
            save: bind!("cairo_save"),
            restore: bind!("cairo_restore"),
            paint: bind!("cairo_paint"),
            move_to: bind!("cairo_move_to"),
            line_to: bind!("cairo_line_to"),
            rectangle: bind!("cairo_rectangle"),
            stroke: bind!("cairo_stroke"),
            fill: bind!("cairo_fill"),
            copy_path: bind!("cairo_copy_path"),

            image_surface_create: bind!("cairo_image_surface_create"),
            surface_flush: bind!("cairo_surface_flush"),
            surface_finish: bind!("cairo_surface_finish"),
            surface_status: bind!("cairo_surface_status"),
            surface_write_to_png: bind!("cairo_surface_write_to_png"),
            surface_get_device: bind!("cairo_surface_get_device"),

            pattern_create_rgb: bind!("cairo_pattern_create_rgb"),
            pattern_create_rgba: bind!("cairo_pattern_create_rgba"),
            pattern_status: bind!("cairo_pattern_status"),

            font_face_status: bind!("cairo_font_face_status"),
            font_face_set_user_data: bind!("cairo_font_face_set_user_data"),
            font_options_create: bind!("cairo_font_options_create"),
            font_options_status: bind!("cairo_font_options_status"),
            scaled_font_create: bind!("cairo_scaled_font_create"),
            scaled_font_status: bind!("cairo_scaled_font_status"),
            ft_font_face_create: bind!("cairo_ft_font_face_create_for_ft_face"),

            device_status: bind!("cairo_device_status"),

            region_create: bind!("cairo_region_create"),
            region_status: bind!("cairo_region_status"),

            library: name,
            _lib: lib,
        })
    }

    /// File name the table was bound from, for diagnostics.
    pub fn library_name(&self) -> &str {
        &self.library
    }
}

// ============================================================================
// Font engine (FreeType)
// ============================================================================

/// Bound entry points of the font engine.
///
/// The font engine is not internally thread-safe; every call through this
/// table must be bracketed by the cross-engine lock.
#[derive(Debug)]
pub struct FontEngineApi {
    pub init: unsafe extern "C" fn(*mut RawPtr) -> c_int,
    pub done: unsafe extern "C" fn(RawPtr) -> c_int,
    pub new_face: unsafe extern "C" fn(RawPtr, *const c_char, c_long, *mut RawPtr) -> c_int,
    pub done_face: unsafe extern "C" fn(RawPtr) -> c_int,

    library: String,
    _lib: Library,
}

impl FontEngineApi {
    pub(crate) fn bind(loaded: LoadedLibrary) -> FfiResult<Self> {
        let LoadedLibrary { lib, name } = loaded;
        macro_rules! bind {
            ($symbol:literal) => {
                sym(&lib, &name, $symbol)?
            };
        }
        Ok(FontEngineApi {
            init: bind!("FT_Init_FreeType"),
            done: bind!("FT_Done_FreeType"),
            new_face: bind!("FT_New_Face"),
            done_face: bind!("FT_Done_Face"),
            library: name,
            _lib: lib,
        })
    }

    /// File name the table was bound from, for diagnostics.
    pub fn library_name(&self) -> &str {
        &self.library
    }
}

// ============================================================================
// Font matcher (fontconfig) — optional
// ============================================================================

/// Bound entry points of the font matcher.
#[derive(Debug)]
pub struct FontMatchApi {
    pub init_load_config_and_fonts: unsafe extern "C" fn() -> RawPtr,
    pub name_parse: unsafe extern "C" fn(*const c_char) -> RawPtr,
    pub config_substitute: unsafe extern "C" fn(RawPtr, RawPtr, c_int) -> c_int,
    pub default_substitute: unsafe extern "C" fn(RawPtr),
    pub font_match: unsafe extern "C" fn(RawPtr, RawPtr, *mut c_int) -> RawPtr,
    pub pattern_get_string:
        unsafe extern "C" fn(RawPtr, *const c_char, c_int, *mut *mut c_char) -> c_int,
    pub pattern_destroy: unsafe extern "C" fn(RawPtr),

    library: String,
    _lib: Library,
}

impl FontMatchApi {
    pub(crate) fn bind(loaded: LoadedLibrary) -> FfiResult<Self> {
        let LoadedLibrary { lib, name } = loaded;
        macro_rules! bind {
            ($symbol:literal) => {
                sym(&lib, &name, $symbol)?
            };
        }
        Ok(FontMatchApi {
            init_load_config_and_fonts: bind!("FcInitLoadConfigAndFonts"),
            name_parse: bind!("FcNameParse"),
            config_substitute: bind!("FcConfigSubstitute"),
            default_substitute: bind!("FcDefaultSubstitute"),
            font_match: bind!("FcFontMatch"),
            pattern_get_string: bind!("FcPatternGetString"),
            pattern_destroy: bind!("FcPatternDestroy"),
            library: name,
            _lib: lib,
        })
    }

    /// File name the table was bound from, for diagnostics.
    pub fn library_name(&self) -> &str {
        &self.library
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_matrix_identity() {
        let m = Matrix::identity();
        assert_eq!(m.xx, 1.0);
        assert_eq!(m.yy, 1.0);
        assert_eq!(m.xy, 0.0);
        assert_eq!(m.x0, 0.0);
    }

    #[test]
    fn test_matrix_scale() {
        let m = Matrix::scale(12.5, 12.5);
        assert_eq!(m.xx, 12.5);
        assert_eq!(m.yy, 12.5);
        assert_eq!(m.yx, 0.0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_bind_reports_missing_symbol() {
        use crate::resolve::{load_first, LibraryRole};

        // libm loads fine but carries none of the engine's entry points.
        let loaded = load_first(LibraryRole::Graphics, &["libm.so.6"]).unwrap();
        let err = GraphicsApi::bind(loaded).unwrap_err();
        match err {
            FfiError::SymbolMissing { library, symbol } => {
                assert_eq!(library, "libm.so.6");
                assert_eq!(symbol, "cairo_reference");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
