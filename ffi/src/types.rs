//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Requests mirror the core `HttpRequest` with C strings and a raw header
//! array. Parse results do not mirror the core's Rust types: connections,
//! users and details are opaque JSON objects anyway, so every success payload
//! crosses the boundary as a JSON C string the host decodes itself.

use std::ffi::CString;
use std::os::raw::c_char;

use guacamole_core::{ApiError, HttpMethod};
use serde::Serialize;

/// Opaque handle to a `GuacamoleClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiGuacClient {
    pub(crate) inner: guacamole_core::GuacamoleClient,
}

/// Convert an owned string into a heap C string owned by the caller.
///
/// JSON output never contains a raw NUL; other strings originate from C
/// strings, so the empty fallback is unreachable in practice.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `guac_build_*` functions. The host executes the request,
/// honouring `validate_certs`, and passes `url` plus the response back
/// through the matching `guac_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
    pub validate_certs: bool,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: guacamole_core::HttpRequest) -> *mut Self {
        let url = into_c_string(req.url);
        let body = match req.body {
            Some(b) => into_c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: into_c_string(k),
                    value: into_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
            validate_certs: req.validate_certs,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request, then
/// passes a pointer to a `guac_parse_*` function. The FFI layer reads but
/// does not free these fields. A null `body` is treated as empty.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiGuacResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidJson = 1,
    Request = 2,
    GroupNotFound = 3,
    Panic = 4,
    NullArg = 5,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null and `json` holds
/// the payload: an object for token, users and details, an array for
/// connections, a string for a group identifier.
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string naming the URL, and `json` is null.
#[repr(C)]
pub struct FfiGuacResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub json: *mut c_char,
}

impl FfiGuacResult {
    fn boxed(error_code: FfiErrorCode, error_message: *mut c_char, json: *mut c_char) -> *mut Self {
        Box::into_raw(Box::new(FfiGuacResult {
            error_code,
            error_message,
            json,
        }))
    }

    /// Build a success result carrying `value` as JSON text.
    pub(crate) fn ok<T: Serialize>(value: &T) -> *mut Self {
        match serde_json::to_string(value) {
            Ok(json) => Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), into_c_string(json)),
            Err(e) => Self::panic(&format!("failed to encode result: {e}")),
        }
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let code = match &err {
            ApiError::InvalidJson { .. } => FfiErrorCode::InvalidJson,
            ApiError::Request { .. } => FfiErrorCode::Request,
            ApiError::GroupNotFound { .. } => FfiErrorCode::GroupNotFound,
        };
        Self::boxed(code, into_c_string(err.to_string()), std::ptr::null_mut())
    }

    /// Build an error result for a null (or non-UTF-8) argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let msg = format!("null or invalid argument: {name}");
        Self::boxed(FfiErrorCode::NullArg, into_c_string(msg), std::ptr::null_mut())
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::Panic,
            into_c_string(msg.to_string()),
            std::ptr::null_mut(),
        )
    }
}
