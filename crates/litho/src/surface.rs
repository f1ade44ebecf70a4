//! Render target surfaces.

use libc::c_int;

use litho_core::{check_status, Ownership, ResourceKind, Result, Wrapper};

use crate::device::Device;
use crate::util::c_string;
use crate::{Context, Engine};

/// Pixel format of an image surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// 32-bit premultiplied ARGB
    Argb32,
    /// 32-bit xRGB, alpha unused
    Rgb24,
    /// 8-bit alpha only
    A8,
    /// 1-bit alpha only
    A1,
    /// 16-bit 5-6-5 RGB
    Rgb16_565,
    /// 30-bit RGB, 10 bits per channel
    Rgb30,
}

impl Format {
    pub(crate) fn to_raw(self) -> c_int {
        match self {
            Format::Argb32 => 0,
            Format::Rgb24 => 1,
            Format::A8 => 2,
            Format::A1 => 3,
            Format::Rgb16_565 => 4,
            Format::Rgb30 => 5,
        }
    }
}

/// A surface the engine renders into.
pub struct Surface {
    wrapper: Wrapper,
    engine: &'static Engine,
}

impl Surface {
    /// Create an image surface backed by engine-allocated pixel memory.
    pub(crate) fn image(
        engine: &'static Engine,
        format: Format,
        width: i32,
        height: i32,
    ) -> Result<Surface> {
        // SAFETY: factory call; a non-null result arrives with a fresh
        // reference that the Created wrap accounts for.
        let raw = unsafe { (engine.graphics().image_surface_create)(format.to_raw(), width, height) };
        let wrapper = engine
            .core()
            .wrap(raw, ResourceKind::Surface, Ownership::Created)?;
        let surface = Surface { wrapper, engine };
        surface.check("cairo_image_surface_create")?;
        Ok(surface)
    }

    pub(crate) fn from_wrapper(wrapper: Wrapper, engine: &'static Engine) -> Surface {
        Surface { wrapper, engine }
    }

    /// A new drawing context targeting this surface.
    pub fn context(&self) -> Result<Context> {
        Context::new(self)
    }

    /// Finish any pending drawing before the pixels are read externally.
    pub fn flush(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live surface handle owned by this wrapper.
        unsafe { (self.engine.graphics().surface_flush)(raw) };
        self.check("cairo_surface_flush")
    }

    /// Finish the surface: drop external resources and disallow further
    /// drawing. The wrapper itself stays valid until closed or dropped.
    pub fn finish(&self) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live surface handle owned by this wrapper.
        unsafe { (self.engine.graphics().surface_finish)(raw) };
        self.check("cairo_surface_finish")
    }

    /// Write the surface contents out as a PNG file.
    pub fn write_to_png(&self, path: &str) -> Result<()> {
        let cpath = c_string(path, "cairo_surface_write_to_png")?;
        let raw = self.wrapper.raw()?;
        // SAFETY: live surface handle; the path buffer outlives the call.
        let status = unsafe { (self.engine.graphics().surface_write_to_png)(raw, cpath.as_ptr()) };
        check_status(status, "cairo_surface_write_to_png")
    }

    /// The backend device underlying this surface, if it has one.
    ///
    /// Plain image surfaces have none; that is a `None`, not an error.
    pub fn device(&self) -> Result<Option<Device>> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live surface handle; the accessor returns a borrowed
        // device handle or null.
        let device = unsafe { (self.engine.graphics().surface_get_device)(raw) };
        if device.is_null() {
            return Ok(None);
        }
        let wrapper = self
            .engine
            .core()
            .wrap(device, ResourceKind::Device, Ownership::Borrowed)?;
        Ok(Some(Device::from_wrapper(wrapper, self.engine)))
    }

    /// Surface error state as a result.
    pub fn status(&self) -> Result<()> {
        self.check("cairo_surface_status")
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        let raw = self.wrapper.raw()?;
        // SAFETY: live surface handle owned by this wrapper.
        let status = unsafe { (self.engine.graphics().surface_status)(raw) };
        check_status(status, operation)
    }

    /// Native reference count, for diagnostics only.
    pub fn reference_count(&self) -> Option<u32> {
        self.wrapper.native_refcount()
    }

    /// Release the native reference now instead of at drop time.
    pub fn close(&self) {
        self.wrapper.close();
    }

    /// The identity wrapper for this surface.
    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }

    pub(crate) fn engine(&self) -> &'static Engine {
        self.engine
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_format_wire_values() {
        assert_eq!(Format::Argb32.to_raw(), 0);
        assert_eq!(Format::Rgb24.to_raw(), 1);
        assert_eq!(Format::A8.to_raw(), 2);
        assert_eq!(Format::A1.to_raw(), 3);
        assert_eq!(Format::Rgb16_565.to_raw(), 4);
        assert_eq!(Format::Rgb30.to_raw(), 5);
    }
}
