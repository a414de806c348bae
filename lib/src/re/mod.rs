/*! This module parses, compiles, and executes regular expressions.

The parsing of regular expressions is actually done by the [`regex-syntax`][1]
crate, which produces a high-level intermediate representation (HIR) for a
given regular expression in text form. This crate provides its own
[`hir::Hir`] type, but is just a thin wrapper around the
[`regex_syntax::hir::Hir`] type.

Given a [`hir::Hir`], the compiler produces a [`instr::Program`] where every
instruction consumes at most one byte. The program is executed by one of
these engines:

* [`pikevm`]: the Pike VM described in [Regular Expression Matching: the
  Virtual Machine Approach][2]. It handles every regexp and haystack, and
  reports capture groups.
* [`backtrack`]: a backtracker that remembers the (instruction, position)
  pairs already visited, so it never visits the same pair twice. Faster than
  the Pike VM, but only usable with small programs and haystacks.
* [`onepass`]: a DFA that reports capture groups, only available for
  regexps where the next instruction is always determined by the next byte.
* [`dfa`]: a lazy DFA built on-the-fly during the search. The fastest one,
  but it doesn't report capture groups and may give up in some cases.

The [`meta`] module chooses the engine used for each search.

[1]: https://docs.rs/regex-syntax
[2]: https://swtch.com/~rsc/regexp/regexp2.html
*/

pub(crate) mod backtrack;
pub(crate) mod bitmapset;
pub(crate) mod compiler;
pub(crate) mod dfa;
pub(crate) mod hir;
pub(crate) mod instr;
pub(crate) mod literal;
pub(crate) mod meta;
pub(crate) mod onepass;
pub(crate) mod parser;
pub(crate) mod pikevm;
pub(crate) mod pool;
pub(crate) mod prefilter;
pub(crate) mod utf8;


/// The haystack and the range within it where a search takes place.
///
/// Engines never report matches outside `start..end`, but assertions like
/// `\b` or `^` are evaluated looking at the whole haystack.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Input<'h> {
    pub haystack: &'h [u8],
    pub start: usize,
    pub end: usize,
}

impl<'h> Input<'h> {
    pub fn new(haystack: &'h [u8]) -> Self {
        Self { haystack, start: 0, end: haystack.len() }
    }

    /// Limits the search to `start..end`.
    pub fn span(mut self, start: usize, end: usize) -> Self {
        debug_assert!(start <= end && end <= self.haystack.len());
        self.start = start;
        self.end = end;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Returns true if `at` is not in the middle of a valid UTF-8 sequence.
///
/// Positions in the middle of invalid UTF-8 are considered boundaries, as
/// each invalid byte is treated as a character on its own.
pub(crate) fn is_char_boundary(haystack: &[u8], at: usize) -> bool {
    if at == 0 || at >= haystack.len() {
        return true;
    }
    if haystack[at] & 0b1100_0000 != 0b1000_0000 {
        return true;
    }
    // `at` is a continuation byte. Look for the start of the sequence it
    // belongs to and check that the sequence is valid and covers `at`.
    let lo = at.saturating_sub(3);
    for start in (lo..at).rev() {
        if haystack[start] & 0b1100_0000 != 0b1000_0000 {
            let (ch, len) = bstr::decode_utf8(&haystack[start..]);
            return ch.is_none() || start + len <= at;
        }
    }
    true
}

/// Returns the length of the UTF-8 sequence that starts at `at`, or 1 if
/// there's no valid sequence there.
pub(crate) fn utf8_len_at(haystack: &[u8], at: usize) -> usize {
    match haystack.get(at..) {
        Some(rest) if !rest.is_empty() => {
            let (_, len) = bstr::decode_utf8(rest);
            len.max(1)
        }
        _ => 1,
    }
}
