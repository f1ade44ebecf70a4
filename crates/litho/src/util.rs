//! Small conversions at the C string boundary.

use std::ffi::CString;

use litho_core::{Error, Result};
use litho_ffi::status::STATUS_INVALID_STRING;

/// Convert a Rust string for a native call that takes `const char *`.
///
/// An interior NUL can never round-trip through the C boundary; it is
/// reported as the engine's own invalid-string status so callers see one
/// error shape for bad strings regardless of which side caught them.
pub(crate) fn c_string(s: &str, operation: &'static str) -> Result<CString> {
    CString::new(s).map_err(|_| Error::native_status(STATUS_INVALID_STRING, operation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_nul_is_an_invalid_string() {
        assert!(c_string("fonts/DejaVuSans.ttf", "FT_New_Face").is_ok());
        let err = c_string("bad\0path", "FT_New_Face").unwrap_err();
        assert!(matches!(
            err,
            Error::NativeStatus {
                status: STATUS_INVALID_STRING,
                operation: "FT_New_Face"
            }
        ));
    }
}
