//! # Comparison Core
//!
//! The state and derivation layer of a product comparison table editor,
//! designed for FFI (Foreign Function Interface) integration with a UI shell
//! (Flutter, a web view, a native toolkit). The shell renders; this crate
//! owns the data.
//!
//! ## Features
//!
//! - **Entity store**: specifications and products keyed by generated ids,
//!   with cascading deletes, backfill on create and drag reordering
//! - **View pipeline**: filter, sort (numeric-aware, empty values last) and
//!   specification visibility, recomputed from scratch on demand
//! - **Import/export**: name-keyed JSON and CSV interchange files reconciled
//!   against internal ids, rejected atomically on any invalid record
//! - **LMDB persistence**: every mutation is saved; corrupt or legacy records
//!   are repaired on load
//! - **Safe error handling**: No `unwrap()` calls in production code
//!
//! ## Quick Start
//!
//! ```no_run
//! use comparison_core::{create_session, dispatch_intent, get_view};
//! use std::ffi::CString;
//!
//! let config = CString::new(r#"{"path": "my_catalog"}"#).unwrap();
//! let session = create_session(config.as_ptr());
//!
//! let intent = CString::new(r#"{"type": "createSpecification", "name": "Weight"}"#).unwrap();
//! let result = dispatch_intent(session, intent.as_ptr());
//! let view = get_view(session);
//! ```
//!
//! ## FFI Functions
//!
//! Every function returning `*const c_char` returns a JSON [`AppResponse`];
//! release it with [`free_c_string`].
//!
//! - [`create_session`] - Open the store and load the session
//! - [`dispatch_intent`] - Apply one user intent
//! - [`get_view`] - Current table view
//! - [`import_data`] - Replace everything from a JSON or CSV file
//! - [`export_data`] - JSON or CSV template of the current data
//! - [`close_session`] - Explicit session cleanup
//! - [`free_c_string`] - Release a returned string

pub mod app_response;
pub mod comparison_model;
pub mod config;
pub mod durable_store;
pub mod entity_store;
pub mod error;
pub mod id_generator;
pub mod intent;
pub mod persistence;
pub mod reconciler;
pub mod seed;
pub mod selection;
pub mod session;
pub mod view_pipeline;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Serialize;
use serde_json::json;

use crate::app_response::AppResponse;
use crate::config::SessionConfig;
use crate::intent::Intent;
use crate::reconciler::DataFormat;
use crate::session::ComparisonSession;

/// Opens a comparison session.
///
/// # Parameters
///
/// * `config_json` - Null-terminated JSON [`SessionConfig`]; null or `{}`
///   selects the defaults
///
/// # Returns
///
/// A pointer to the session, or a null pointer on failure. Release it with
/// [`close_session`].
///
/// # Errors
///
/// Returns null pointer if:
/// - The config string is not valid UTF-8 or not a valid config
/// - The LMDB environment cannot be created or opened
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_session(config_json: *const c_char) -> *mut ComparisonSession {
    let config = if config_json.is_null() {
        SessionConfig::default()
    } else {
        let raw = match unsafe { CStr::from_ptr(config_json).to_str() } {
            Ok(s) => s,
            Err(e) => {
                warn!("Invalid UTF-8 in session config: {e}");
                return std::ptr::null_mut();
            }
        };
        match serde_json::from_str::<SessionConfig>(raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid session config: {e}");
                return std::ptr::null_mut();
            }
        }
    };

    info!("Opening comparison session at: {}.lmdb", config.path);
    match ComparisonSession::open(config) {
        Ok(session) => Box::into_raw(Box::new(session)),
        Err(e) => {
            warn!("Failed to open comparison session: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Applies one [`Intent`] to the session.
///
/// The `Ok` payload is `{"result": <intent result>, "notices": [..]}`, where
/// `notices` carries messages the user should see (for example a failed save).
/// An error response carries no notices; they are delivered with the next
/// successful one.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use comparison_core::{create_session, dispatch_intent};
///
/// let session = create_session(std::ptr::null());
/// let intent = CString::new(r#"{"type": "requestSort", "key": "name"}"#).unwrap();
/// let result = dispatch_intent(session, intent.as_ptr());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn dispatch_intent(
    session: *mut ComparisonSession,
    intent_json: *const c_char,
) -> *const c_char {
    let session = match unsafe { session.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null session pointer passed to dispatch_intent"),
    };

    let json_str = match c_ptr_to_string(intent_json, "intent") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };

    let intent: Intent = match serde_json::from_str(&json_str) {
        Ok(intent) => intent,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid intent: {e}"));
            return response_to_c_string(&error);
        }
    };

    // Notices stay queued until a response can carry them.
    match session.apply(intent) {
        Ok(result) => {
            let notices = session.drain_notices();
            ok_json(&json!({ "result": result, "notices": notices }))
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Returns the current table view (visible specifications and products,
/// selection, brands, sort and reorder modes).
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_view(session: *mut ComparisonSession) -> *const c_char {
    match unsafe { session.as_ref() } {
        Some(session) => ok_json(&session.view()),
        None => bad_request("Null session pointer passed to get_view"),
    }
}

/// Replaces all specifications and products with the contents of a file.
///
/// # Parameters
///
/// * `session` - Session pointer
/// * `format_ptr` - `"json"` or `"csv"`
/// * `text_ptr` - File contents
///
/// # Returns
///
/// `Ok` with `{"result": {"specifications": n, "products": n}, "notices": [..]}`,
/// or `ValidationError` describing the first invalid record. A rejected file
/// leaves the session untouched.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn import_data(
    session: *mut ComparisonSession,
    format_ptr: *const c_char,
    text_ptr: *const c_char,
) -> *const c_char {
    let session = match unsafe { session.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null session pointer passed to import_data"),
    };

    let format = match c_ptr_to_string(format_ptr, "format") {
        Ok(format) => format,
        Err(error_ptr) => return error_ptr,
    };
    let text = match c_ptr_to_string(text_ptr, "text") {
        Ok(text) => text,
        Err(error_ptr) => return error_ptr,
    };

    match DataFormat::parse(&format).and_then(|format| session.import(format, &text)) {
        Ok(summary) => {
            let notices = session.drain_notices();
            ok_json(&json!({ "result": summary, "notices": notices }))
        }
        Err(e) => {
            warn!("Import rejected: {e}");
            response_to_c_string(&AppResponse::from(e))
        }
    }
}

/// Exports the current data as a JSON or CSV template.
///
/// The `Ok` payload is the file contents as-is.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn export_data(
    session: *mut ComparisonSession,
    format_ptr: *const c_char,
) -> *const c_char {
    let session = match unsafe { session.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null session pointer passed to export_data"),
    };

    let format = match c_ptr_to_string(format_ptr, "format") {
        Ok(format) => format,
        Err(error_ptr) => return error_ptr,
    };

    match DataFormat::parse(&format).and_then(|format| session.export(format)) {
        Ok(text) => response_to_c_string(&AppResponse::Ok(text)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Closes the session and its LMDB environment.
///
/// The pointer must not be used afterwards. Useful before a hot restart,
/// when the shell reopens the same store.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_session(session: *mut ComparisonSession) -> *const c_char {
    if session.is_null() {
        return bad_request("Null session pointer passed to close_session");
    }

    drop(unsafe { Box::from_raw(session) });
    info!("Comparison session closed");
    response_to_c_string(&AppResponse::success("Session closed successfully"))
}

/// Releases a string returned by any function of this crate.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_c_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr) });
}

fn ok_json<T: Serialize>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

fn bad_request(message: &str) -> *const c_char {
    warn!("{message}");
    response_to_c_string(&AppResponse::BadRequest(message.to_string()))
}

/// Serializes the response to JSON and hands ownership of the C string to
/// the caller. Returns a null pointer if serialization or C string creation
/// fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String, turning null pointers and
/// invalid UTF-8 into a ready-to-return `BadRequest` response.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        return Err(bad_request(&format!("Null {field_name} pointer")));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
