use std::ffi::{c_char, CString};

use ::rure::{IterState, Regex};

use crate::{haystack, rure, rure_captures, rure_match};

/// Iterator over successive non-overlapping matches.
///
/// The iterator doesn't keep a copy of the haystack. The same haystack must
/// be passed to every call to [`rure_iter_next`] or
/// [`rure_iter_next_captures`], and must remain valid during each call.
pub struct rure_iter {
    re: Regex,
    state: IterState,
}

/// Iterator over the names of the capture groups of a regular expression.
pub struct rure_iter_capture_names {
    re: Regex,
    next: usize,
    /// Names returned so far, they live as long as the iterator.
    names: Vec<CString>,
}

/// Creates a [`rure_iter`] object for iterating over the matches of `re`.
///
/// Returns null if `re` is null. The result must be destroyed with
/// [`rure_iter_free`].
#[no_mangle]
pub unsafe extern "C" fn rure_iter_new(re: *const rure) -> *mut rure_iter {
    match re.as_ref() {
        Some(re) => Box::into_raw(Box::new(rure_iter {
            re: re.0.clone(),
            state: IterState::new(),
        })),
        None => std::ptr::null_mut(),
    }
}

/// Destroys a [`rure_iter`] object.
#[no_mangle]
pub unsafe extern "C" fn rure_iter_free(it: *mut rure_iter) {
    if !it.is_null() {
        drop(Box::from_raw(it))
    }
}

/// Stores in `match` the bounds of the next match. Returns false when there
/// are no more matches, after that it always returns false.
///
/// Empty matches are reported once per position, and never split a UTF-8
/// sequence when Unicode is enabled.
#[no_mangle]
pub unsafe extern "C" fn rure_iter_next(
    it: *mut rure_iter,
    haystack_ptr: *const u8,
    length: usize,
    match_: *mut rure_match,
) -> bool {
    let (it, haystack) = match (it.as_mut(), haystack(haystack_ptr, length)) {
        (Some(it), Some(haystack)) => (it, haystack),
        _ => return false,
    };
    match it.state.next(&it.re, haystack) {
        Some(m) => {
            if let Some(match_) = match_.as_mut() {
                *match_ = m.into();
            }
            true
        }
        None => false,
    }
}

/// Like [`rure_iter_next`], but stores the capture groups of the next match
/// in `captures`, which must have been created for the same regular
/// expression as the iterator.
#[no_mangle]
pub unsafe extern "C" fn rure_iter_next_captures(
    it: *mut rure_iter,
    haystack_ptr: *const u8,
    length: usize,
    captures: *mut rure_captures,
) -> bool {
    match (it.as_mut(), haystack(haystack_ptr, length), captures.as_mut()) {
        (Some(it), Some(haystack), Some(captures)) => {
            it.state.next_captures(&it.re, haystack, &mut captures.0)
        }
        _ => false,
    }
}

/// Creates an iterator over the names of the capture groups of `re`, in
/// group order. Unnamed groups, including group 0, have an empty name.
///
/// Returns null if `re` is null. The result must be destroyed with
/// [`rure_iter_capture_names_free`].
#[no_mangle]
pub unsafe extern "C" fn rure_iter_capture_names_new(
    re: *const rure,
) -> *mut rure_iter_capture_names {
    match re.as_ref() {
        Some(re) => Box::into_raw(Box::new(rure_iter_capture_names {
            re: re.0.clone(),
            next: 0,
            names: Vec::new(),
        })),
        None => std::ptr::null_mut(),
    }
}

/// Destroys a [`rure_iter_capture_names`] object, and every name returned
/// by it.
#[no_mangle]
pub unsafe extern "C" fn rure_iter_capture_names_free(
    it: *mut rure_iter_capture_names,
) {
    if !it.is_null() {
        drop(Box::from_raw(it))
    }
}

/// Stores in `name` a pointer to the next capture group name, as a
/// null-terminated string. Returns false when there are no more names.
///
/// The string is owned by the iterator and is valid until the iterator is
/// destroyed.
#[no_mangle]
pub unsafe extern "C" fn rure_iter_capture_names_next(
    it: *mut rure_iter_capture_names,
    name: *mut *const c_char,
) -> bool {
    let it = match it.as_mut() {
        Some(it) => it,
        None => return false,
    };

    let next = match it.re.capture_names().nth(it.next) {
        Some(next) => next.unwrap_or_default(),
        None => return false,
    };

    // Group names are identifiers, they never contain null bytes.
    let cstr = match CString::new(next) {
        Ok(cstr) => cstr,
        Err(_) => return false,
    };

    it.next += 1;

    if let Some(name) = name.as_mut() {
        *name = cstr.as_ptr();
    }

    it.names.push(cstr);
    true
}
