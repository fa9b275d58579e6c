//! FFI layer for the Swift/Objective-C binding.
//!
//! This module provides C-compatible functions. All data crosses the boundary
//! as JSON strings: predicate documents in, compiled predicates out.
//!
//! # Memory Management
//!
//! - Strings returned by `quarry_*` functions are allocated by Rust
//! - Caller must free them with `quarry_string_free`
//!
//! # Error Handling
//!
//! Functions return JSON with either:
//! - `{"ok": {"filter": "...", "arguments": [...]}}` on success
//! - `{"error": "<message>"}` on failure

use crate::{
    compiler::{CompileOptions, CompiledPredicate},
    document::PredicateDocument,
    error::Result,
    Error, Schema,
};
use std::ffi::{c_char, CStr, CString};

/// Result wrapper for FFI responses.
#[derive(serde::Serialize)]
#[serde(untagged)]
enum FfiResult<T: serde::Serialize> {
    Ok { ok: T },
    Err { error: String },
}

impl<T: serde::Serialize> FfiResult<T> {
    fn ok(value: T) -> Self {
        FfiResult::Ok { ok: value }
    }

    fn err(message: impl Into<String>) -> Self {
        FfiResult::Err {
            error: message.into(),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {}"}}"#, e))
    }
}

impl<T: serde::Serialize> From<Result<T>> for FfiResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => FfiResult::ok(value),
            Err(e) => FfiResult::err(e.to_string()),
        }
    }
}

/// Convert a Rust string to a C string pointer.
/// Caller must free with `quarry_string_free`.
fn to_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        // Interior NUL byte
        Err(_) => CString::from(c"{\"error\":\"string contained null bytes\"}").into_raw(),
    }
}

/// Convert a C string pointer to a Rust string.
/// Returns None if pointer is null or invalid UTF-8.
unsafe fn from_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn compile_document(schema: Option<&Schema>, document: &str) -> Result<CompiledPredicate> {
    PredicateDocument::from_json(document)?.compile(schema, CompileOptions::default())
}

// ============================================================================
// Compilation
// ============================================================================

/// Compile a predicate document.
///
/// # Arguments
/// - `document_json`: JSON string of a predicate document
///
/// # Returns
/// JSON string: `{"ok": CompiledPredicate}` or `{"error": "message"}`
///
/// # Safety
/// - `document_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `quarry_string_free`
#[no_mangle]
pub unsafe extern "C" fn quarry_compile(document_json: *const c_char) -> *mut c_char {
    let document = match from_c_string(document_json) {
        Some(s) => s,
        None => return to_c_string(FfiResult::<()>::err("invalid document string").to_json()),
    };

    to_c_string(FfiResult::from(compile_document(None, &document)).to_json())
}

/// Compile a predicate document, resolving its key paths against a schema.
///
/// # Arguments
/// - `schema_json`: JSON string of Schema
/// - `document_json`: JSON string of a predicate document naming its class
///
/// # Returns
/// JSON string: `{"ok": CompiledPredicate}` or `{"error": "message"}`
///
/// # Safety
/// - `schema_json` must be a valid null-terminated C string or null
/// - `document_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `quarry_string_free`
#[no_mangle]
pub unsafe extern "C" fn quarry_compile_with_schema(
    schema_json: *const c_char,
    document_json: *const c_char,
) -> *mut c_char {
    let schema_str = match from_c_string(schema_json) {
        Some(s) => s,
        None => return to_c_string(FfiResult::<()>::err("invalid schema string").to_json()),
    };

    let document = match from_c_string(document_json) {
        Some(s) => s,
        None => return to_c_string(FfiResult::<()>::err("invalid document string").to_json()),
    };

    let schema: Schema = match serde_json::from_str(&schema_str) {
        Ok(s) => s,
        Err(e) => {
            let error = Error::InvalidDocument(format!("invalid schema: {e}"));
            return to_c_string(FfiResult::<()>::err(error.to_string()).to_json());
        }
    };

    let result = schema
        .validate()
        .and_then(|()| compile_document(Some(&schema), &document));
    to_c_string(FfiResult::from(result).to_json())
}

/// Free a string allocated by the engine.
///
/// # Safety
/// - `s` must be a valid pointer from a `quarry_*` function
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn quarry_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// ============================================================================
// Utility
// ============================================================================

/// Get the engine version.
///
/// # Returns
/// Static string pointer (do not free)
#[no_mangle]
pub extern "C" fn quarry_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
