use std::ffi::{c_char, CString};

/// Describes why a regular expression couldn't be compiled.
#[derive(Default)]
pub struct rure_error {
    message: Option<CString>,
}

impl rure_error {
    pub(crate) fn as_str(&self) -> &str {
        self.message
            .as_ref()
            .and_then(|message| message.to_str().ok())
            .unwrap_or_default()
    }
}

pub(crate) fn set_error(error: Option<&mut rure_error>, message: &str) {
    if let Some(error) = error {
        error.message = CString::new(message.replace('\0', "\\0")).ok();
    }
}

pub(crate) fn clear_error(error: Option<&mut rure_error>) {
    if let Some(error) = error {
        error.message = None;
    }
}

/// Creates a [`rure_error`] object, which can be passed to
/// [`crate::rure_compile`].
///
/// The result must be destroyed with [`rure_error_free`].
#[no_mangle]
pub extern "C" fn rure_error_new() -> *mut rure_error {
    Box::into_raw(Box::default())
}

/// Destroys a [`rure_error`] object.
#[no_mangle]
pub unsafe extern "C" fn rure_error_free(err: *mut rure_error) {
    if !err.is_null() {
        drop(Box::from_raw(err))
    }
}

/// Returns the error message as a null-terminated string. The string is
/// empty if there's no error.
///
/// The pointer is valid until the error is destroyed or passed to another
/// function that modifies it.
#[no_mangle]
pub unsafe extern "C" fn rure_error_message(
    err: *const rure_error,
) -> *const c_char {
    match err.as_ref().and_then(|err| err.message.as_ref()) {
        Some(message) => message.as_ptr(),
        None => b"\0".as_ptr() as *const c_char,
    }
}
