//! C-ABI wrapper around the pure parts of `backoffice-core`.
//!
//! # Overview
//! Form layers written in other languages validate CNPJs and turn error
//! responses into user-facing messages through these functions, so the
//! rules and the pt-BR copy live in one place.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - No transport is linked: the core is built without default features.
//! - The C caller owns all returned pointers and must call the matching
//!   `backoffice_*_free` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use backoffice_core::{clean_tax_id, format_tax_id, is_valid_tax_id, HttpError, HttpResponse};

use types::*;

/// Borrow a C string as `&str`. Null and invalid UTF-8 read as `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives the
/// returned reference.
unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Tax IDs
// ---------------------------------------------------------------------------

/// `true` when `value` is a valid CNPJ, punctuation ignored.
///
/// Null or non-UTF-8 input is invalid.
#[unsafe(no_mangle)]
pub extern "C" fn backoffice_taxid_is_valid(value: *const c_char) -> bool {
    catch_unwind(|| unsafe { read_str(value) }.is_some_and(is_valid_tax_id)).unwrap_or(false)
}

/// Digits-only copy of `value`.
///
/// Returns null if `value` is null. Free with `backoffice_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn backoffice_taxid_clean(value: *const c_char) -> *mut c_char {
    catch_unwind(|| match unsafe { read_str(value) } {
        Some(value) => into_c_string(clean_tax_id(value)),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// `value` rendered as `00.000.000/0000-00`.
///
/// Returns null unless the input holds exactly 14 digits. Free with
/// `backoffice_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn backoffice_taxid_format(value: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        unsafe { read_str(value) }
            .and_then(format_tax_id)
            .map_or(std::ptr::null_mut(), into_c_string)
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Error messages
// ---------------------------------------------------------------------------

/// User-facing message for a failed response with `status` and an optional
/// text `body`.
///
/// A null body is treated as empty. Never returns null except on an internal
/// panic. Free with `backoffice_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn backoffice_error_message(status: u16, body: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        let body = if body.is_null() {
            Vec::new()
        } else {
            unsafe { CStr::from_ptr(body) }.to_bytes().to_vec()
        };
        let response = HttpResponse {
            status,
            headers: Vec::new(),
            body,
        };
        into_c_string(HttpError::from_response(&response).message)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Normalize a raw error response.
///
/// `content_type` may be null. `body` may be null when `body_len` is 0.
/// Free the result with `backoffice_http_error_free`.
#[unsafe(no_mangle)]
pub extern "C" fn backoffice_http_error_new(
    status: u16,
    content_type: *const c_char,
    body: *const u8,
    body_len: usize,
) -> *mut FfiHttpError {
    catch_unwind(|| {
        let mut headers = Vec::new();
        if let Some(content_type) = unsafe { read_str(content_type) } {
            headers.push(("content-type".to_string(), content_type.to_string()));
        }
        let body = if body.is_null() || body_len == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(body, body_len) }.to_vec()
        };
        let response = HttpResponse {
            status,
            headers,
            body,
        };
        FfiHttpError::from_core(HttpError::from_response(&response))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free an `FfiHttpError` and its message. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn backoffice_http_error_free(error: *mut FfiHttpError) {
    if error.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let error = unsafe { Box::from_raw(error) };
        if !error.message.is_null() {
            drop(unsafe { CString::from_raw(error.message) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn backoffice_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
