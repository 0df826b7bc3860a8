//! C-ABI wrapper around `guacamole-core`.
//!
//! # Overview
//! Exposes the Guacamole API client through `extern "C"` functions so an
//! automation host written in any language with a C FFI can build requests
//! and parse responses. The host performs the HTTP round-trip itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `guac_build_*` / `guac_parse_*` mirrors the core API 1:1.
//!   Parse functions take the URL of the request they answer, so errors can
//!   name it.
//! - A single `FfiGuacResult` envelope carries either a JSON payload or an
//!   error code and message.
//! - The C caller owns all returned pointers and must call the matching
//!   `guac_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use guacamole_core::{ApiError, GuacamoleClient, HttpResponse};
use serde::Serialize;

use types::*;

/// Borrow a C string as `&str`. `None` for null or non-UTF-8 input.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Run `build` against the client behind `client`, returning null on null
/// arguments, on a `None` from `build` and on panic.
fn build_with(
    client: *const FfiGuacClient,
    build: impl FnOnce(&GuacamoleClient) -> Option<guacamole_core::HttpRequest>,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match build(&client.inner) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Shared argument checking and panic guarding for every `guac_parse_*`.
/// `parse` runs inside the guard, so any extra arguments it reads are
/// covered too.
fn parse_with(
    fn_name: &str,
    client: *const FfiGuacClient,
    url: *const c_char,
    response: *const FfiHttpResponse,
    parse: impl FnOnce(&GuacamoleClient, &str, HttpResponse) -> *mut FfiGuacResult,
) -> *mut FfiGuacResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiGuacResult::null_arg("client");
        }
        if response.is_null() {
            return FfiGuacResult::null_arg("response");
        }
        let Some(url) = (unsafe { c_str(url) }) else {
            return FfiGuacResult::null_arg("url");
        };
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        parse(&client.inner, url, ffi_response_to_core(resp))
    }))
    .unwrap_or_else(|_| FfiGuacResult::panic(&format!("panic in {fn_name}")))
}

/// Map a core parse outcome onto the result envelope.
fn outcome<T: Serialize>(result: Result<T, ApiError>) -> *mut FfiGuacResult {
    match result {
        Ok(value) => FfiGuacResult::ok(&value),
        Err(e) => FfiGuacResult::from_error(e),
    }
}

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body and a
/// non-UTF-8 body both become an empty string, which then fails JSON decoding.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = unsafe { c_str(resp.body) }.unwrap_or("").to_string();
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `GuacamoleClient` bound to `base_url`.
///
/// Returns null if `base_url` is null or not UTF-8, or if an internal panic
/// occurs. The caller must free the returned pointer with `guac_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn guac_client_new(
    base_url: *const c_char,
    validate_certs: bool,
) -> *mut FfiGuacClient {
    catch_unwind(|| {
        let Some(url) = (unsafe { c_str(base_url) }) else {
            return std::ptr::null_mut();
        };
        let client = GuacamoleClient::new(url).with_validate_certs(validate_certs);
        Box::into_raw(Box::new(FfiGuacClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `guac_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn guac_client_free(client: *mut FfiGuacClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the form-encoded POST that exchanges credentials for a token.
///
/// Returns null if any argument is null.
/// The caller must free the returned pointer with `guac_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn guac_build_get_token(
    client: *const FfiGuacClient,
    username: *const c_char,
    password: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let username = unsafe { c_str(username) }?;
        let password = unsafe { c_str(password) }?;
        c.build_get_token(username, password).ok()
    })
}

/// Build the request for a group's connection tree.
///
/// `group` may be null, meaning the root group.
#[unsafe(no_mangle)]
pub extern "C" fn guac_build_list_connections(
    client: *const FfiGuacClient,
    datasource: *const c_char,
    group: *const c_char,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let datasource = unsafe { c_str(datasource) }?;
        let token = unsafe { c_str(token) }?;
        let group = if group.is_null() {
            None
        } else {
            Some(unsafe { c_str(group) }?)
        };
        Some(c.build_list_connections(datasource, group, token))
    })
}

/// Build the request listing every connection group.
#[unsafe(no_mangle)]
pub extern "C" fn guac_build_list_connection_groups(
    client: *const FfiGuacClient,
    datasource: *const c_char,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let datasource = unsafe { c_str(datasource) }?;
        let token = unsafe { c_str(token) }?;
        Some(c.build_list_connection_groups(datasource, token))
    })
}

/// Build the request listing every user.
#[unsafe(no_mangle)]
pub extern "C" fn guac_build_list_users(
    client: *const FfiGuacClient,
    datasource: *const c_char,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let datasource = unsafe { c_str(datasource) }?;
        let token = unsafe { c_str(token) }?;
        Some(c.build_list_users(datasource, token))
    })
}

/// Build the request for one connection's parameters.
#[unsafe(no_mangle)]
pub extern "C" fn guac_build_connection_details(
    client: *const FfiGuacClient,
    datasource: *const c_char,
    connection_id: *const c_char,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let datasource = unsafe { c_str(datasource) }?;
        let connection_id = unsafe { c_str(connection_id) }?;
        let token = unsafe { c_str(token) }?;
        Some(c.build_connection_details(datasource, connection_id, token))
    })
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Parse a token response. The JSON payload is
/// `{"authToken": ..., "dataSource": ...}`.
#[unsafe(no_mangle)]
pub extern "C" fn guac_parse_get_token(
    client: *const FfiGuacClient,
    url: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiGuacResult {
    parse_with("guac_parse_get_token", client, url, response, |c, url, resp| {
        outcome(c.parse_get_token(url, resp))
    })
}

/// Parse a connection tree. The JSON payload is an array of connections.
#[unsafe(no_mangle)]
pub extern "C" fn guac_parse_list_connections(
    client: *const FfiGuacClient,
    url: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiGuacResult {
    parse_with("guac_parse_list_connections", client, url, response, |c, url, resp| {
        outcome(c.parse_list_connections(url, resp))
    })
}

/// Parse a group listing and look up the group called `name`. The JSON
/// payload is the identifier as a string.
#[unsafe(no_mangle)]
pub extern "C" fn guac_parse_connection_group_id(
    client: *const FfiGuacClient,
    url: *const c_char,
    response: *const FfiHttpResponse,
    name: *const c_char,
) -> *mut FfiGuacResult {
    parse_with("guac_parse_connection_group_id", client, url, response, |c, url, resp| {
        let Some(name) = (unsafe { c_str(name) }) else {
            return FfiGuacResult::null_arg("name");
        };
        outcome(c.parse_connection_group_id(url, resp, name))
    })
}

/// Parse a users listing. The JSON payload maps username to user info.
#[unsafe(no_mangle)]
pub extern "C" fn guac_parse_list_users(
    client: *const FfiGuacClient,
    url: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiGuacResult {
    parse_with("guac_parse_list_users", client, url, response, |c, url, resp| {
        outcome(c.parse_list_users(url, resp))
    })
}

/// Parse connection parameters. The JSON payload is an object.
#[unsafe(no_mangle)]
pub extern "C" fn guac_parse_connection_details(
    client: *const FfiGuacClient,
    url: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiGuacResult {
    parse_with("guac_parse_connection_details", client, url, response, |c, url, resp| {
        outcome(c.parse_connection_details(url, resp))
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `guac_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn guac_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiGuacResult` returned by any `guac_parse_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn guac_free_result(result: *mut FfiGuacResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.json);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn guac_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_c_string(s));
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
