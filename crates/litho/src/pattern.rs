//! Paint source patterns.

use litho_core::{check_status, Ownership, ResourceKind, Result, Wrapper};

use crate::Engine;

/// A source the engine paints with.
pub struct Pattern {
    wrapper: Wrapper,
    engine: &'static Engine,
}

impl Pattern {
    /// An opaque solid-color pattern.
    pub(crate) fn solid_rgb(
        engine: &'static Engine,
        red: f64,
        green: f64,
        blue: f64,
    ) -> Result<Pattern> {
        // SAFETY: factory call; the result carries a fresh reference.
        let raw = unsafe { (engine.graphics().pattern_create_rgb)(red, green, blue) };
        Pattern::from_created(engine, raw, "cairo_pattern_create_rgb")
    }

    /// A translucent solid-color pattern.
    pub(crate) fn solid_rgba(
        engine: &'static Engine,
        red: f64,
        green: f64,
        blue: f64,
        alpha: f64,
    ) -> Result<Pattern> {
        // SAFETY: factory call; the result carries a fresh reference.
        let raw = unsafe { (engine.graphics().pattern_create_rgba)(red, green, blue, alpha) };
        Pattern::from_created(engine, raw, "cairo_pattern_create_rgba")
    }

    fn from_created(
        engine: &'static Engine,
        raw: *mut libc::c_void,
        operation: &'static str,
    ) -> Result<Pattern> {
        let wrapper = engine
            .core()
            .wrap(raw, ResourceKind::Pattern, Ownership::Created)?;
        let pattern = Pattern { wrapper, engine };
        pattern.check(operation)?;
        Ok(pattern)
    }

    pub(crate) fn from_wrapper(wrapper: Wrapper, engine: &'static Engine) -> Pattern {
        Pattern { wrapper, engine }
    }

    /// Pattern error state as a result.
    pub fn status(&self) -> Result<()> {
        self.check("cairo_pattern_status")
    }

    /// Native reference count, for diagnostics only.
    pub fn reference_count(&self) -> Option<u32> {
        self.wrapper.native_refcount()
    }

    /// Release the native reference now instead of at drop time.
    pub fn close(&self) {
        self.wrapper.close();
    }

    /// The identity wrapper for this pattern.
    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live pattern handle owned by this wrapper.
        let status = unsafe { (self.engine.graphics().pattern_status)(raw) };
        check_status(status, operation)
    }
}
