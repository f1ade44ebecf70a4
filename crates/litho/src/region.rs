//! Pixel-aligned regions.

use litho_core::{check_status, Ownership, ResourceKind, Result, Wrapper};

use crate::Engine;

/// A set of pixel-aligned rectangles.
pub struct Region {
    wrapper: Wrapper,
    engine: &'static Engine,
}

impl Region {
    /// An empty region.
    pub(crate) fn new(engine: &'static Engine) -> Result<Region> {
        // SAFETY: factory call; the result carries a fresh reference.
        let raw = unsafe { (engine.graphics().region_create)() };
        let wrapper = engine
            .core()
            .wrap(raw, ResourceKind::Region, Ownership::Created)?;
        let region = Region { wrapper, engine };
        region.status()?;
        Ok(region)
    }

    /// Region error state as a result.
    pub fn status(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live region handle owned by this wrapper.
        let status = unsafe { (self.engine.graphics().region_status)(raw) };
        check_status(status, "cairo_region_status")
    }

    /// Release the native reference now instead of at drop time.
    pub fn close(&self) {
        self.wrapper.close();
    }

    /// The identity wrapper for this region.
    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }
}
