//! Drawing contexts and copied paths.
//!
//! Every handle a context hands back (its target surface, its source
//! pattern, a copied path) goes through the wrapper core, so wrapping the
//! same underlying object from two different accessors yields the same
//! high-level identity.

use litho_core::{check_status, Ownership, ResourceKind, Result, Wrapper};

use crate::pattern::Pattern;
use crate::surface::Surface;
use crate::Engine;

/// A drawing context targeting one surface.
pub struct Context {
    wrapper: Wrapper,
    engine: &'static Engine,
}

impl Context {
    /// Create a context drawing onto `surface`.
    pub fn new(surface: &Surface) -> Result<Context> {
        let engine = surface.engine();
        // SAFETY: factory call on a live surface handle; the result carries
        // a fresh reference accounted for by the Created wrap.
        let raw = unsafe { (engine.graphics().create)(surface.wrapper().raw()?) };
        let wrapper = engine
            .core()
            .wrap(raw, ResourceKind::Context, Ownership::Created)?;
        let context = Context { wrapper, engine };
        context.check("cairo_create")?;
        Ok(context)
    }

    /// Context error state as a result.
    pub fn status(&self) -> Result<()> {
        self.check("cairo_status")
    }

    /// The surface this context draws onto.
    ///
    /// The returned handle is borrowed from the context, so the wrap retains
    /// it; if the target is already wrapped somewhere, that same surface
    /// comes back.
    pub fn target(&self) -> Result<Surface> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle; accessor returns a borrowed surface.
        let target = unsafe { (self.engine.graphics().get_target)(raw) };
        let wrapper = self
            .engine
            .core()
            .wrap(target, ResourceKind::Surface, Ownership::Borrowed)?;
        Ok(Surface::from_wrapper(wrapper, self.engine))
    }

    /// The current source pattern.
    pub fn source(&self) -> Result<Pattern> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle; accessor returns a borrowed pattern.
        let source = unsafe { (self.engine.graphics().get_source)(raw) };
        let wrapper = self
            .engine
            .core()
            .wrap(source, ResourceKind::Pattern, Ownership::Borrowed)?;
        Ok(Pattern::from_wrapper(wrapper, self.engine))
    }

    /// Use `pattern` as the source for subsequent painting.
    pub fn set_source(&self, pattern: &Pattern) -> Result<()> {
        let raw = self.wrapper.raw()?;
        let source = pattern.wrapper().raw()?;
        // SAFETY: two live handles; the engine retains its own reference to
        // the pattern.
        unsafe { (self.engine.graphics().set_source)(raw, source) };
        self.check("cairo_set_source")
    }

    /// Use an opaque color as the source.
    pub fn set_source_rgb(&self, red: f64, green: f64, blue: f64) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle.
        unsafe { (self.engine.graphics().set_source_rgb)(raw, red, green, blue) };
        self.check("cairo_set_source_rgb")
    }

    /// Use a translucent color as the source.
    pub fn set_source_rgba(&self, red: f64, green: f64, blue: f64, alpha: f64) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle.
        unsafe { (self.engine.graphics().set_source_rgba)(raw, red, green, blue, alpha) };
        self.check("cairo_set_source_rgba")
    }

    /// Push the graphics state.
    pub fn save(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle.
        unsafe { (self.engine.graphics().save)(raw) };
        self.check("cairo_save")
    }

    /// Pop the graphics state.
    pub fn restore(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle.
        unsafe { (self.engine.graphics().restore)(raw) };
        self.check("cairo_restore")
    }

    /// Paint the source everywhere within the clip.
    pub fn paint(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle.
        unsafe { (self.engine.graphics().paint)(raw) };
        self.check("cairo_paint")
    }

    /// Begin a new sub-path at the given point.
    pub fn move_to(&self, x: f64, y: f64) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle.
        unsafe { (self.engine.graphics().move_to)(raw, x, y) };
        self.check("cairo_move_to")
    }

    /// Add a line from the current point.
    pub fn line_to(&self, x: f64, y: f64) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle.
        unsafe { (self.engine.graphics().line_to)(raw, x, y) };
        self.check("cairo_line_to")
    }

    /// Add a closed rectangular sub-path.
    pub fn rectangle(&self, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle.
        unsafe { (self.engine.graphics().rectangle)(raw, x, y, width, height) };
        self.check("cairo_rectangle")
    }

    /// Stroke the current path and clear it.
    pub fn stroke(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle.
        unsafe { (self.engine.graphics().stroke)(raw) };
        self.check("cairo_stroke")
    }

    /// Fill the current path and clear it.
    pub fn fill(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle.
        unsafe { (self.engine.graphics().fill)(raw) };
        self.check("cairo_fill")
    }

    /// Copy the current path out of the context.
    pub fn copy_path(&self) -> Result<Path> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle; the copy is a fresh allocation the
        // Created wrap takes responsibility for.
        let path = unsafe { (self.engine.graphics().copy_path)(raw) };
        let wrapper = self
            .engine
            .core()
            .wrap(path, ResourceKind::Path, Ownership::Created)?;
        // An out-of-memory copy still yields an object; the context status
        // tells it apart. The wrapper above frees it either way.
        self.check("cairo_copy_path")?;
        Ok(Path { wrapper })
    }

    /// Release the native reference now instead of at drop time.
    pub fn close(&self) {
        self.wrapper.close();
    }

    /// The identity wrapper for this context.
    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live context handle owned by this wrapper.
        let status = unsafe { (self.engine.graphics().status)(raw) };
        check_status(status, operation)
    }
}

/// Path data copied out of a context.
///
/// Destroy-only on the native side: paths carry no reference count, so a
/// `Path` can be created and closed but never re-wrapped as borrowed.
pub struct Path {
    wrapper: Wrapper,
}

impl Path {
    /// Release the native allocation now instead of at drop time.
    pub fn close(&self) {
        self.wrapper.close();
    }

    /// The identity wrapper for this path.
    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }
}
