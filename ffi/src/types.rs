//! `#[repr(C)]` types shared with C callers.

use std::ffi::CString;
use std::os::raw::c_char;

use backoffice_core::{HttpError, Payload};

/// What kind of payload an error response carried.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiPayloadKind {
    None = 0,
    Json = 1,
    Text = 2,
}

/// A normalized non-2xx response.
///
/// `message` is always a valid, non-empty C string owned by this library;
/// release the whole struct with `backoffice_http_error_free`.
#[repr(C)]
pub struct FfiHttpError {
    pub status: u16,
    pub payload_kind: FfiPayloadKind,
    pub message: *mut c_char,
}

impl FfiHttpError {
    pub(crate) fn from_core(error: HttpError) -> *mut Self {
        let payload_kind = match error.payload {
            None => FfiPayloadKind::None,
            Some(Payload::Json(_)) => FfiPayloadKind::Json,
            Some(Payload::Text(_)) => FfiPayloadKind::Text,
        };
        Box::into_raw(Box::new(FfiHttpError {
            status: error.status,
            payload_kind,
            message: into_c_string(error.message),
        }))
    }
}

/// Hand a Rust string to C. Interior NULs are dropped rather than failing.
pub(crate) fn into_c_string(value: String) -> *mut c_char {
    let value = if value.contains('\0') {
        value.replace('\0', "")
    } else {
        value
    };
    CString::new(value).unwrap_or_default().into_raw()
}
