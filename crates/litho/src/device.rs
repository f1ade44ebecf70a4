//! Backend devices underlying surfaces.

use litho_core::{check_status, Result, Wrapper};

use crate::Engine;

/// The rendering backend behind a surface.
///
/// Obtained from [`Surface::device`](crate::Surface::device); plain image
/// surfaces have none.
pub struct Device {
    wrapper: Wrapper,
    engine: &'static Engine,
}

impl Device {
    pub(crate) fn from_wrapper(wrapper: Wrapper, engine: &'static Engine) -> Device {
        Device { wrapper, engine }
    }

    /// Device error state as a result.
    pub fn status(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live device handle owned by this wrapper.
        let status = unsafe { (self.engine.graphics().device_status)(raw) };
        check_status(status, "cairo_device_status")
    }

    /// Native reference count, for diagnostics only.
    pub fn reference_count(&self) -> Option<u32> {
        self.wrapper.native_refcount()
    }

    /// Release the native reference now instead of at drop time.
    pub fn close(&self) {
        self.wrapper.close();
    }

    /// The identity wrapper for this device.
    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }
}
