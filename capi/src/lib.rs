/*! C API for the rure regular expression engine.

Every type in this API is opaque, and handled through pointers created by
a `*_new` or `rure_compile*` function and released with the corresponding
`*_free` function. Haystacks are passed as a pointer and a length, they can
contain arbitrary bytes, and every offset is a byte offset within the
haystack.

Compiled regular expressions ([`rure`]) can be used from multiple threads at
the same time. Capture groups ([`rure_captures`]) and iterators
([`rure_iter`]) can't, each thread must use its own.
*/

#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use std::ffi::{c_char, CStr, CString};
use std::slice;

use ::rure::{FlagSet, Options, Regex};

use crate::error::{clear_error, set_error};

pub use captures::*;
pub use error::*;
pub use iter::*;
pub use options::*;

mod captures;
mod error;
mod iter;
mod options;


/// Case-insensitive matching.
pub const RURE_FLAG_CASEI: u32 = 1 << 0;
/// `^` and `$` match at the start and end of lines.
pub const RURE_FLAG_MULTI: u32 = 1 << 1;
/// `.` matches any character, including `\n`.
pub const RURE_FLAG_DOTNL: u32 = 1 << 2;
/// Swaps the meaning of greedy and lazy repetitions.
pub const RURE_FLAG_SWAP_GREED: u32 = 1 << 3;
/// Whitespaces in the pattern are ignored, and `#` starts a comment.
pub const RURE_FLAG_SPACE: u32 = 1 << 4;
/// Unicode-aware matching.
pub const RURE_FLAG_UNICODE: u32 = 1 << 5;
/// Flags used by [`rure_compile_must`]. Only Unicode is enabled.
pub const RURE_DEFAULT_FLAGS: u32 = RURE_FLAG_UNICODE;

/// Default limit for the size of a compiled program, in bytes.
pub const RURE_DEFAULT_SIZE_LIMIT: usize = 10 * (1 << 20);
/// Default limit for the size of the lazy DFA cache, in bytes.
pub const RURE_DEFAULT_DFA_SIZE_LIMIT: usize = 2 * (1 << 20);

/// A compiled regular expression.
pub struct rure(Regex);

/// The bounds of a match, `start` is inclusive and `end` exclusive.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct rure_match {
    pub start: usize,
    pub end: usize,
}

impl From<::rure::Match> for rure_match {
    fn from(m: ::rure::Match) -> Self {
        Self { start: m.start(), end: m.end() }
    }
}

/// Returns the haystack as a slice. A null pointer is accepted only with
/// length zero.
pub(crate) unsafe fn haystack<'a>(
    ptr: *const u8,
    len: usize,
) -> Option<&'a [u8]> {
    if ptr.is_null() {
        return if len == 0 { Some(&[]) } else { None };
    }
    Some(slice::from_raw_parts(ptr, len))
}

/// Compiles a regular expression with the default flags, aborting the
/// process if the pattern is invalid.
///
/// The pattern must be a null-terminated UTF-8 string. The result must be
/// destroyed with [`rure_free`].
#[no_mangle]
pub unsafe extern "C" fn rure_compile_must(
    pattern: *const c_char,
) -> *mut rure {
    if pattern.is_null() {
        eprintln!("pattern is a null pointer");
        std::process::abort();
    }
    let pattern = CStr::from_ptr(pattern).to_bytes();
    let mut err = rure_error::default();
    let re = rure_compile(
        pattern.as_ptr(),
        pattern.len(),
        RURE_DEFAULT_FLAGS,
        std::ptr::null(),
        &mut err,
    );
    if re.is_null() {
        eprintln!("{}", err.as_str());
        std::process::abort();
    }
    re
}

/// Compiles a regular expression.
///
/// `pattern` points to `length` bytes of UTF-8, which don't need to be
/// null-terminated. `flags` is a combination of the `RURE_FLAG_*` constants.
/// `options` can be null, in which case the default options are used.
///
/// Returns null if the regular expression can't be compiled. In that case
/// the reason is stored in `error`, if not null. The result must be
/// destroyed with [`rure_free`].
#[no_mangle]
pub unsafe extern "C" fn rure_compile(
    pattern: *const u8,
    length: usize,
    flags: u32,
    options: *const rure_options,
    error: *mut rure_error,
) -> *mut rure {
    let error = error.as_mut();

    let pattern = match haystack(pattern, length) {
        Some(pattern) => pattern,
        None => {
            set_error(error, "pattern is a null pointer");
            return std::ptr::null_mut();
        }
    };

    let default_options = Options::default();
    let options = options.as_ref().map_or(&default_options, |o| &o.0);

    match Regex::with_options(pattern, FlagSet::from_bits(flags), options) {
        Ok(re) => {
            clear_error(error);
            Box::into_raw(Box::new(rure(re)))
        }
        Err(err) => {
            set_error(error, &err.to_string());
            std::ptr::null_mut()
        }
    }
}

/// Destroys a [`rure`] object.
///
/// Capture groups and iterators created from the regular expression remain
/// usable after this, and must be destroyed on their own.
#[no_mangle]
pub unsafe extern "C" fn rure_free(re: *mut rure) {
    if !re.is_null() {
        drop(Box::from_raw(re))
    }
}

/// Returns true if the regular expression matches somewhere in the
/// haystack, starting the search at byte `start`.
///
/// Assertions like `^` and `\b` take into account the bytes before
/// `start`, so this is not the same as searching in `haystack + start`.
#[no_mangle]
pub unsafe extern "C" fn rure_is_match(
    re: *const rure,
    haystack_ptr: *const u8,
    length: usize,
    start: usize,
) -> bool {
    match (re.as_ref(), haystack(haystack_ptr, length)) {
        (Some(re), Some(haystack)) => re.0.is_match_at(haystack, start),
        _ => false,
    }
}

/// Finds the leftmost-first match starting at byte `start`, and stores its
/// bounds in `match`. Returns false if there's no match.
#[no_mangle]
pub unsafe extern "C" fn rure_find(
    re: *const rure,
    haystack_ptr: *const u8,
    length: usize,
    start: usize,
    match_: *mut rure_match,
) -> bool {
    let (re, haystack) = match (re.as_ref(), haystack(haystack_ptr, length)) {
        (Some(re), Some(haystack)) => (re, haystack),
        _ => return false,
    };
    match re.0.find_at(haystack, start) {
        Some(m) => {
            if let Some(match_) = match_.as_mut() {
                *match_ = m.into();
            }
            true
        }
        None => false,
    }
}

/// Finds the leftmost-first match starting at byte `start`, and stores its
/// capture groups in `captures`. Returns false if there's no match.
///
/// `captures` must have been created with [`rure_captures_new`] for this
/// same regular expression.
#[no_mangle]
pub unsafe extern "C" fn rure_find_captures(
    re: *const rure,
    haystack_ptr: *const u8,
    length: usize,
    start: usize,
    captures: *mut rure_captures,
) -> bool {
    match (re.as_ref(), haystack(haystack_ptr, length), captures.as_mut()) {
        (Some(re), Some(haystack), Some(captures)) => {
            re.0.captures_at(haystack, start, &mut captures.0)
        }
        _ => false,
    }
}

/// Stores in `end` the position where the first match found from byte
/// `start` ends. This position is never after the end of the
/// leftmost-first match, and is usually found faster.
#[no_mangle]
pub unsafe extern "C" fn rure_shortest_match(
    re: *const rure,
    haystack_ptr: *const u8,
    length: usize,
    start: usize,
    end: *mut usize,
) -> bool {
    let (re, haystack) = match (re.as_ref(), haystack(haystack_ptr, length)) {
        (Some(re), Some(haystack)) => (re, haystack),
        _ => return false,
    };
    match re.0.shortest_match_at(haystack, start) {
        Some(e) => {
            if let Some(end) = end.as_mut() {
                *end = e;
            }
            true
        }
        None => false,
    }
}

/// Returns the index of the capture group with the given name, or -1 if
/// there's no such group.
#[no_mangle]
pub unsafe extern "C" fn rure_capture_name_index(
    re: *const rure,
    name: *const c_char,
) -> i32 {
    let (re, name) = match (re.as_ref(), name.is_null()) {
        (Some(re), false) => (re, CStr::from_ptr(name)),
        _ => return -1,
    };
    name.to_str()
        .ok()
        .and_then(|name| re.0.capture_index(name))
        .and_then(|i| i32::try_from(i).ok())
        .unwrap_or(-1)
}

/// Escapes the meta characters in `pattern`, a null-terminated UTF-8
/// string, and returns a new null-terminated string that matches `pattern`
/// literally. Aborts the process if `pattern` is not valid UTF-8.
///
/// The result must be destroyed with [`rure_cstring_free`].
#[no_mangle]
pub unsafe extern "C" fn rure_escape_must(
    pattern: *const c_char,
) -> *const c_char {
    if pattern.is_null() {
        eprintln!("pattern is a null pointer");
        std::process::abort();
    }
    let pattern = match CStr::from_ptr(pattern).to_str() {
        Ok(pattern) => pattern,
        Err(err) => {
            eprintln!("{}", err);
            std::process::abort();
        }
    };
    // The input has no interior null bytes, neither does the output.
    match CString::new(::rure::escape(pattern)) {
        Ok(escaped) => escaped.into_raw(),
        Err(err) => {
            eprintln!("{}", err);
            std::process::abort();
        }
    }
}

/// Destroys a string returned by [`rure_escape_must`].
#[no_mangle]
pub unsafe extern "C" fn rure_cstring_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
