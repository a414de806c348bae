use std::ops::Range;

use thiserror::Error;

/// Errors returned while compiling a regular expression.
///
/// Matching never fails, once a regular expression has been compiled every
/// search produces a result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The pattern is not a valid regular expression.
    ///
    /// `msg` describes the problem. Its text is stable and callers can rely
    /// on fragments like "unclosed group", "unclosed character class",
    /// "unrecognized escape sequence", "invalid repetition count range",
    /// "Unicode property not found" and "unrecognized flag".
    #[error("regex parse error: {msg} at {}..{}", span.start, span.end)]
    Syntax {
        /// Description of the error.
        msg: String,
        /// Byte range within the pattern where the error was found.
        span: Range<usize>,
    },

    /// The pattern uses a construct that can't be matched in linear time,
    /// like backreferences or look-around.
    #[error("regex parse error: {msg} at {}..{}", span.start, span.end)]
    Unsupported {
        /// Description of the error.
        msg: String,
        /// Byte range within the pattern where the construct was found.
        span: Range<usize>,
    },

    /// The pattern is not valid UTF-8.
    #[error("pattern is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 {
        /// Number of bytes at the start of the pattern that are valid UTF-8.
        valid_up_to: usize,
    },

    /// The compiled program exceeds the configured size limit.
    #[error("compiled program too large ({size} bytes, limit is {limit})")]
    TooLarge {
        /// Size of the program at the moment the limit was exceeded.
        size: usize,
        /// The configured limit.
        limit: usize,
    },
}

/// Returned by the matching engines that may refuse to complete a search,
/// like the lazy DFA when its cache thrashes. The caller is expected to
/// retry the search with a different engine.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("matching engine gave up")]
pub(crate) struct GaveUp;
