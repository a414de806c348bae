use ::rure::Captures;

use crate::{rure, rure_match};

/// The capture groups of a match.
pub struct rure_captures(pub(crate) Captures);

/// Creates a [`rure_captures`] object for storing the capture groups of
/// `re`. It can be used with any search function that accepts capture
/// groups, as long as the regular expression is `re`.
///
/// Returns null if `re` is null. The result must be destroyed with
/// [`rure_captures_free`].
#[no_mangle]
pub unsafe extern "C" fn rure_captures_new(
    re: *const rure,
) -> *mut rure_captures {
    match re.as_ref() {
        Some(re) => {
            Box::into_raw(Box::new(rure_captures(re.0.new_captures())))
        }
        None => std::ptr::null_mut(),
    }
}

/// Destroys a [`rure_captures`] object.
#[no_mangle]
pub unsafe extern "C" fn rure_captures_free(captures: *mut rure_captures) {
    if !captures.is_null() {
        drop(Box::from_raw(captures))
    }
}

/// Stores in `match` the bounds of the capture group with index `i`.
/// Returns false if the group didn't participate in the match, or if `i`
/// is not a valid group index. Group 0 is the whole match.
#[no_mangle]
pub unsafe extern "C" fn rure_captures_at(
    captures: *const rure_captures,
    i: usize,
    match_: *mut rure_match,
) -> bool {
    match captures.as_ref().and_then(|captures| captures.0.get(i)) {
        Some(m) => {
            if let Some(match_) = match_.as_mut() {
                *match_ = m.into();
            }
            true
        }
        None => false,
    }
}

/// Returns the number of capture groups, including group 0.
#[no_mangle]
pub unsafe extern "C" fn rure_captures_len(
    captures: *const rure_captures,
) -> usize {
    captures.as_ref().map_or(0, |captures| captures.0.len())
}
