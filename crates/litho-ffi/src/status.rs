//! Engine status codes.
//!
//! The engine reports failure through per-object status values rather than
//! return codes on every call. The constants here mirror the C enumeration;
//! anything other than [`STATUS_SUCCESS`] is a failure the caller must see.

/// Operation completed without error
pub const STATUS_SUCCESS: i32 = 0;
/// Out of memory
pub const STATUS_NO_MEMORY: i32 = 1;
/// `restore` without matching `save`
pub const STATUS_INVALID_RESTORE: i32 = 2;
/// Group pop without matching push
pub const STATUS_INVALID_POP_GROUP: i32 = 3;
/// Path operation that requires a current point
pub const STATUS_NO_CURRENT_POINT: i32 = 4;
/// Non-invertible transform
pub const STATUS_INVALID_MATRIX: i32 = 5;
/// Invalid status value passed back in
pub const STATUS_INVALID_STATUS: i32 = 6;
/// Null pointer where an object was required
pub const STATUS_NULL_POINTER: i32 = 7;
/// String with invalid encoding
pub const STATUS_INVALID_STRING: i32 = 8;
/// Malformed path data
pub const STATUS_INVALID_PATH_DATA: i32 = 9;
/// Error while reading from an input source
pub const STATUS_READ_ERROR: i32 = 10;
/// Error while writing to an output target
pub const STATUS_WRITE_ERROR: i32 = 11;
/// Operation on a finished surface
pub const STATUS_SURFACE_FINISHED: i32 = 12;

/// Whether a raw status value signals success.
pub fn is_success(status: i32) -> bool {
    status == STATUS_SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_zero_is_success() {
        assert!(is_success(STATUS_SUCCESS));
        assert!(!is_success(STATUS_NO_MEMORY));
        assert!(!is_success(STATUS_WRITE_ERROR));
        assert!(!is_success(-1));
    }
}
