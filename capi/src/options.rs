use ::rure::Options;

/// Options for [`crate::rure_compile`].
pub struct rure_options(pub(crate) Options);

/// Creates a [`rure_options`] object with the default limits.
///
/// The result must be destroyed with [`rure_options_free`].
#[no_mangle]
pub extern "C" fn rure_options_new() -> *mut rure_options {
    Box::into_raw(Box::new(rure_options(Options::default())))
}

/// Destroys a [`rure_options`] object.
#[no_mangle]
pub unsafe extern "C" fn rure_options_free(options: *mut rure_options) {
    if !options.is_null() {
        drop(Box::from_raw(options))
    }
}

/// Sets the approximate size limit, in bytes, of the compiled program.
/// Compiling a regular expression that exceeds it fails.
#[no_mangle]
pub unsafe extern "C" fn rure_options_size_limit(
    options: *mut rure_options,
    limit: usize,
) {
    if let Some(options) = options.as_mut() {
        options.0.size_limit = limit;
    }
}

/// Sets the approximate size, in bytes, of the cache used by the lazy DFA.
/// This limit is per thread. When it is zero the lazy DFA is not used at
/// all, which makes searches slower but never changes their results.
#[no_mangle]
pub unsafe extern "C" fn rure_options_dfa_size_limit(
    options: *mut rure_options,
    limit: usize,
) {
    if let Some(options) = options.as_mut() {
        options.0.dfa_size_limit = limit;
    }
}
