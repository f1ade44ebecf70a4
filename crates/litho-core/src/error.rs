//! Error taxonomy for the lifetime-management layer.
//!
//! Every failure surfaces as a typed error to the caller; the core never
//! logs and swallows. The single exception is finalization during process
//! teardown, where the native call is suppressed silently — that is expected
//! shutdown behavior, not a fault.

use thiserror::Error;

use litho_ffi::FfiError;

use crate::kind::ResourceKind;

/// Result type used throughout the binding layer
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the wrapper core and the layers above it
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A required native library could not be resolved or bound
    #[error(transparent)]
    Library(#[from] FfiError),

    /// A null handle was presented to `wrap`.
    ///
    /// A null from the native side signals an already-reported native error;
    /// it is propagated rather than silently turned into a dead wrapper.
    #[error("null {kind} handle passed to wrap")]
    NullHandle {
        /// Kind the caller tried to wrap
        kind: ResourceKind,
    },

    /// A native call was attempted through an already-finalized wrapper
    #[error("{kind} wrapper used after finalization")]
    Finalized {
        /// Kind of the finalized wrapper
        kind: ResourceKind,
    },

    /// Borrowed wrap of a kind the engine cannot retain
    #[error("{kind} handles cannot be retained: the engine exposes no reference call for this kind")]
    UnsupportedOwnership {
        /// The destroy-only kind
        kind: ResourceKind,
    },

    /// The engine reported a non-success status after an operation.
    ///
    /// Never retried automatically; native operations are not idempotent.
    #[error("native call `{operation}` failed with status {status}")]
    NativeStatus {
        /// Raw engine status code
        status: i32,
        /// Name of the native entry point that failed
        operation: &'static str,
    },

    /// The optional font-matching library is not present on this system
    #[error("font matching is unavailable on this system")]
    FontMatchingUnavailable,
}

impl Error {
    /// Create a native-status error for a failed operation
    pub fn native_status(status: i32, operation: &'static str) -> Self {
        Error::NativeStatus { status, operation }
    }
}

/// Translate a raw engine status into a result carrying the operation name.
pub fn check_status(status: i32, operation: &'static str) -> Result<()> {
    if litho_ffi::status::is_success(status) {
        Ok(())
    } else {
        Err(Error::native_status(status, operation))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_check_status_carries_operation_name() {
        assert!(check_status(litho_ffi::status::STATUS_SUCCESS, "cairo_paint").is_ok());
        let err = check_status(litho_ffi::status::STATUS_NO_MEMORY, "cairo_paint").unwrap_err();
        assert_eq!(
            err.to_string(),
            "native call `cairo_paint` failed with status 1"
        );
    }

    #[test]
    fn test_null_handle_message_names_the_kind() {
        let err = Error::NullHandle {
            kind: ResourceKind::Surface,
        };
        assert_eq!(err.to_string(), "null surface handle passed to wrap");
    }
}
