//! FFI bindings for Airtime
//!
//! This module provides C-compatible functions for driving a tracker from a
//! native host. Sensor callbacks pass raw components and the sensor-clock
//! timestamp; records come back as JSON strings that must be freed by the
//! caller using `airtime_free_string`.
//!
//! A handle is not thread-safe. Hosts that deliver accelerometer and
//! gyroscope callbacks on different threads must serialize calls per handle.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::ClassifierConfig;
use crate::pipeline::ThrowTracker;
use crate::types::{Sample, ThrowRecord};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn to_json_cstr<T: serde::Serialize + ?Sized>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Tracker lifecycle
// ============================================================================

/// Opaque handle to a ThrowTracker
pub struct AirtimeTrackerHandle {
    tracker: ThrowTracker,
}

/// Create a tracker with default thresholds.
///
/// # Safety
/// - Returns a pointer to a newly allocated tracker.
/// - Must be freed with `airtime_tracker_free`.
#[no_mangle]
pub unsafe extern "C" fn airtime_tracker_new() -> *mut AirtimeTrackerHandle {
    clear_last_error();
    Box::into_raw(Box::new(AirtimeTrackerHandle {
        tracker: ThrowTracker::new(),
    }))
}

/// Create a tracker from a JSON classifier config.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string.
/// - Must be freed with `airtime_tracker_free`.
/// - Returns NULL on error; call `airtime_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn airtime_tracker_new_with_config(
    config_json: *const c_char,
) -> *mut AirtimeTrackerHandle {
    clear_last_error();

    let json_str = match cstr_to_string(config_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        }
    };

    let tracker = ClassifierConfig::from_json(&json_str).and_then(ThrowTracker::with_config);
    match tracker {
        Ok(tracker) => Box::into_raw(Box::new(AirtimeTrackerHandle { tracker })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a tracker.
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `airtime_tracker_new*`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn airtime_tracker_free(tracker: *mut AirtimeTrackerHandle) {
    if !tracker.is_null() {
        drop(Box::from_raw(tracker));
    }
}

// ============================================================================
// Sample delivery
// ============================================================================

/// Feed one accelerometer reading (m/s²).
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `airtime_tracker_new*`.
/// - Returns the resulting state code (0 idle, 1 throwing, 2 free flight),
///   or -1 on error. When a throw completes, fetch it with
///   `airtime_tracker_last_throw_json`.
#[no_mangle]
pub unsafe extern "C" fn airtime_tracker_process_accelerometer(
    tracker: *mut AirtimeTrackerHandle,
    x: f64,
    y: f64,
    z: f64,
    timestamp_ns: i64,
) -> i32 {
    clear_last_error();

    if tracker.is_null() {
        set_last_error("Null tracker pointer");
        return -1;
    }

    let handle = &mut *tracker;
    handle
        .tracker
        .process_sample(&Sample::accelerometer([x, y, z], timestamp_ns));
    handle.tracker.current_state().code()
}

/// Feed one gyroscope reading (rad/s).
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `airtime_tracker_new*`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn airtime_tracker_process_gyroscope(
    tracker: *mut AirtimeTrackerHandle,
    x: f64,
    y: f64,
    z: f64,
    timestamp_ns: i64,
) -> i32 {
    clear_last_error();

    if tracker.is_null() {
        set_last_error("Null tracker pointer");
        return -1;
    }

    let handle = &mut *tracker;
    handle
        .tracker
        .process_sample(&Sample::gyroscope([x, y, z], timestamp_ns));
    0
}

/// Current motion state code.
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `airtime_tracker_new*`.
/// - Returns -1 on error.
#[no_mangle]
pub unsafe extern "C" fn airtime_tracker_current_state(
    tracker: *const AirtimeTrackerHandle,
) -> i32 {
    clear_last_error();

    if tracker.is_null() {
        set_last_error("Null tracker pointer");
        return -1;
    }

    (*tracker).tracker.current_state().code()
}

// ============================================================================
// Results
// ============================================================================

/// Most recent completed throw as JSON.
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `airtime_tracker_new*`.
/// - Returns a newly allocated string that must be freed with `airtime_free_string`.
/// - Returns NULL if no throw has completed yet or on error; in the error
///   case `airtime_last_error` is set.
#[no_mangle]
pub unsafe extern "C" fn airtime_tracker_last_throw_json(
    tracker: *const AirtimeTrackerHandle,
) -> *mut c_char {
    clear_last_error();

    if tracker.is_null() {
        set_last_error("Null tracker pointer");
        return ptr::null_mut();
    }

    match (*tracker).tracker.last_throw() {
        Some(record) => to_json_cstr(record),
        None => ptr::null_mut(),
    }
}

/// All completed throws as a JSON array, most recent first.
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `airtime_tracker_new*`.
/// - Returns a newly allocated string that must be freed with `airtime_free_string`.
/// - Returns NULL on error; call `airtime_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn airtime_tracker_history_json(
    tracker: *const AirtimeTrackerHandle,
) -> *mut c_char {
    clear_last_error();

    if tracker.is_null() {
        set_last_error("Null tracker pointer");
        return ptr::null_mut();
    }

    let history: Vec<&ThrowRecord> = (*tracker).tracker.history().collect();
    to_json_cstr(&history)
}

/// Full report over the stored history.
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `airtime_tracker_new*`.
/// - `device_id` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `airtime_free_string`.
/// - Returns NULL on error; call `airtime_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn airtime_tracker_report_json(
    tracker: *const AirtimeTrackerHandle,
    device_id: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if tracker.is_null() {
        set_last_error("Null tracker pointer");
        return ptr::null_mut();
    }

    let device_str = match cstr_to_string(device_id) {
        Some(s) => s,
        None => {
            set_last_error("Invalid device_id string pointer");
            return ptr::null_mut();
        }
    };

    match (*tracker).tracker.report_json(&device_str) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Drop stored throws without resetting id numbering.
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `airtime_tracker_new*`.
#[no_mangle]
pub unsafe extern "C" fn airtime_tracker_clear_history(tracker: *mut AirtimeTrackerHandle) {
    if !tracker.is_null() {
        (*tracker).tracker.clear_history();
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Airtime functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an Airtime function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn airtime_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Airtime function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn airtime_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Airtime library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn airtime_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
