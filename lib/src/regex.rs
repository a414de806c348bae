use std::fmt::{Debug, Display, Formatter};
use std::ops::Range;
use std::sync::Arc;

use crate::config::Options;
use crate::errors::Error;
use crate::flags::{default_flags, FlagSet};
use crate::re::meta::Exec;
use crate::re::utf8_len_at;

/// A compiled regular expression.
///
/// Compiling a regular expression is relatively expensive, and the result
/// should be reused. A `Regex` is cheap to clone, clones share the compiled
/// program and can be used from multiple threads at the same time.
#[derive(Clone)]
pub struct Regex {
    exec: Arc<Exec>,
}

impl Regex {
    /// Compiles a regular expression with the default flags, where only
    /// Unicode support is enabled.
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Self::with_flags(pattern, default_flags())
    }

    /// Compiles a regular expression with the given flags.
    pub fn with_flags(pattern: &str, flags: FlagSet) -> Result<Self, Error> {
        Self::with_options(pattern.as_bytes(), flags, &Options::default())
    }

    /// Compiles a regular expression with the given flags and options.
    ///
    /// The pattern must be valid UTF-8, otherwise [`Error::InvalidUtf8`] is
    /// returned.
    pub fn with_options(
        pattern: &[u8],
        flags: FlagSet,
        options: &Options,
    ) -> Result<Self, Error> {
        let pattern = std::str::from_utf8(pattern).map_err(|err| {
            Error::InvalidUtf8 { valid_up_to: err.valid_up_to() }
        })?;
        Ok(Self { exec: Arc::new(Exec::new(pattern, flags, options)?) })
    }

    /// Returns the pattern this regular expression was compiled from.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.exec.pattern()
    }

    /// Returns true if the regular expression matches anywhere in
    /// `haystack`.
    #[inline]
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.is_match_at(haystack, 0)
    }

    /// Returns true if the regular expression matches anywhere in
    /// `haystack[start..]`.
    ///
    /// The bytes before `start` are not part of any match, but they are
    /// taken into account by assertions. For instance, `\bbar` matches
    /// `"bar"`, but doesn't match `"foobar"` at offset 3.
    pub fn is_match_at(&self, haystack: &[u8], start: usize) -> bool {
        self.exec.is_match_at(haystack, start)
    }

    /// Returns the end of the match that ends first, which may be before
    /// the end of the leftmost-first match. For instance, `a+` on `aaaaa`
    /// returns 1, while [`Regex::find`] returns the match `0..5`.
    #[inline]
    pub fn shortest_match(&self, haystack: &[u8]) -> Option<usize> {
        self.shortest_match_at(haystack, 0)
    }

    /// Like [`Regex::shortest_match`], but starting at `start`.
    pub fn shortest_match_at(
        &self,
        haystack: &[u8],
        start: usize,
    ) -> Option<usize> {
        self.exec.shortest_match_at(haystack, start)
    }

    /// Returns the leftmost-first match in `haystack`.
    #[inline]
    pub fn find(&self, haystack: &[u8]) -> Option<Match> {
        self.find_at(haystack, 0)
    }

    /// Returns the leftmost-first match in `haystack[start..]`. Offsets in
    /// the returned match are relative to the start of `haystack`.
    pub fn find_at(&self, haystack: &[u8], start: usize) -> Option<Match> {
        self.exec.find_at(haystack, start).map(|(s, e)| Match::new(s, e))
    }

    /// Returns every successive non-overlapping match in `haystack`.
    pub fn find_all(&self, haystack: &[u8]) -> Vec<Match> {
        self.find_iter(haystack).collect()
    }

    /// Returns an iterator over successive non-overlapping matches.
    pub fn find_iter<'r, 'h>(&'r self, haystack: &'h [u8]) -> Matches<'r, 'h> {
        Matches { re: self, haystack, state: IterState::new() }
    }

    /// Returns the capture groups of the leftmost-first match.
    pub fn captures(&self, haystack: &[u8]) -> Option<Captures> {
        let mut caps = self.new_captures();
        self.captures_at(haystack, 0, &mut caps).then_some(caps)
    }

    /// Finds the leftmost-first match in `haystack[start..]`, and stores its
    /// capture groups in `caps`.
    ///
    /// `caps` must have been created by this regular expression, or by one
    /// of its clones. Returns false, leaving `caps` cleared, if that's not
    /// the case or if there's no match.
    pub fn captures_at(
        &self,
        haystack: &[u8],
        start: usize,
        caps: &mut Captures,
    ) -> bool {
        caps.clear();
        if !Arc::ptr_eq(&self.exec, &caps.exec)
            || caps.slots.len() != 2 * self.captures_len()
        {
            return false;
        }
        caps.matched = self.exec.captures_at(haystack, start, &mut caps.slots);
        caps.matched
    }

    /// Returns an iterator over the capture groups of successive
    /// non-overlapping matches.
    pub fn captures_iter<'r, 'h>(
        &'r self,
        haystack: &'h [u8],
    ) -> CaptureMatches<'r, 'h> {
        CaptureMatches { re: self, haystack, state: IterState::new() }
    }

    /// Creates an empty container for the capture groups of this regular
    /// expression.
    pub fn new_captures(&self) -> Captures {
        Captures {
            slots: vec![None; 2 * self.captures_len()],
            matched: false,
            exec: self.exec.clone(),
        }
    }

    /// Number of capture groups, including group 0, which corresponds to
    /// the whole match.
    #[inline]
    pub fn captures_len(&self) -> usize {
        self.exec.captures_len()
    }

    /// Returns the name of each capture group, in order. Group 0 and unnamed
    /// groups don't have a name.
    pub fn capture_names(&self) -> CaptureNames<'_> {
        CaptureNames { iter: self.exec.capture_names().iter() }
    }

    /// Returns the index of the group with the given name. If more than one
    /// group have the same name, the first one is returned.
    pub fn capture_index(&self, name: &str) -> Option<usize> {
        self.exec.capture_index(name)
    }

    #[inline]
    fn is_unicode(&self) -> bool {
        self.exec.is_unicode()
    }
}

impl Debug for Regex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Regex").field(&self.as_str()).finish()
    }
}

impl Display for Regex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A match, represented by the byte range `start..end` within the haystack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Match {
    start: usize,
    end: usize,
}

impl Match {
    /// Creates a match. `start` must be less than or equal to `end`.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true for zero-width matches.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the matched bytes.
    ///
    /// # Panics
    ///
    /// If `haystack` is not the one where the match was found, and it is
    /// too short.
    #[inline]
    pub fn as_bytes<'h>(&self, haystack: &'h [u8]) -> &'h [u8] {
        &haystack[self.range()]
    }
}

impl From<Match> for Range<usize> {
    fn from(m: Match) -> Self {
        m.range()
    }
}

/// Capture groups of a match.
///
/// A container is tied to the regular expression that created it, and can
/// be reused across searches with [`Regex::captures_at`].
#[derive(Clone)]
pub struct Captures {
    slots: Vec<Option<usize>>,
    matched: bool,
    exec: Arc<Exec>,
}

impl Captures {
    /// Returns the match for group `i`, where group 0 is the whole match.
    /// Returns `None` if the group didn't participate in the match, or `i`
    /// is out of range.
    pub fn get(&self, i: usize) -> Option<Match> {
        match (self.slots.get(2 * i)?, self.slots.get(2 * i + 1)?) {
            (Some(start), Some(end)) => Some(Match::new(*start, *end)),
            _ => None,
        }
    }

    /// Returns the match for the group with the given name.
    pub fn name(&self, name: &str) -> Option<Match> {
        self.get(self.exec.capture_index(name)?)
    }

    /// Number of groups, including group 0. This is the same for every
    /// match, even if some groups didn't participate in it.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len() / 2
    }

    /// Returns true if the container has no groups, which never happens as
    /// group 0 always exists.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns true if the last search that used this container found a
    /// match.
    #[inline]
    pub fn is_match(&self) -> bool {
        self.matched
    }

    /// Resets every group.
    pub fn clear(&mut self) {
        self.slots.fill(None);
        self.matched = false;
    }

    /// Returns an iterator over every group, including the ones that didn't
    /// participate in the match.
    pub fn iter(&self) -> impl Iterator<Item = Option<Match>> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }
}

impl Debug for Captures {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for (i, group) in self.iter().enumerate() {
            match self.exec.capture_names().get(i).and_then(|n| n.as_deref())
            {
                Some(name) => list.entry(&(name, group)),
                None => list.entry(&(i, group)),
            };
        }
        list.finish()
    }
}

/// Iterator over the names of the capture groups in a regular expression.
pub struct CaptureNames<'r> {
    iter: std::slice::Iter<'r, Option<String>>,
}

impl<'r> Iterator for CaptureNames<'r> {
    type Item = Option<&'r str>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|name| name.as_deref())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl ExactSizeIterator for CaptureNames<'_> {}

/// The position of an iteration over successive non-overlapping matches.
///
/// This type is for iterating over matches when the haystack is not known
/// in advance, but passed to each call to [`IterState::next`]. The haystack
/// must be the same in every call. [`Matches`] and [`CaptureMatches`] are
/// more convenient when the haystack is known.
#[derive(Clone, Debug, Default)]
pub struct IterState {
    /// Where the next search starts.
    last_end: usize,
    /// End of the last match returned.
    last_match: Option<usize>,
    done: bool,
}

impl IterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next match.
    pub fn next(&mut self, re: &Regex, haystack: &[u8]) -> Option<Match> {
        loop {
            let m = self.search(haystack, |start| re.find_at(haystack, start))?;
            if let Some(m) = self.advance(re, haystack, m) {
                return Some(m);
            }
        }
    }

    /// Finds the next match and stores its capture groups in `caps`.
    /// Returns false when there are no more matches.
    pub fn next_captures(
        &mut self,
        re: &Regex,
        haystack: &[u8],
        caps: &mut Captures,
    ) -> bool {
        loop {
            let found = self.search(haystack, |start| {
                if re.captures_at(haystack, start, caps) {
                    caps.get(0)
                } else {
                    None
                }
            });
            let m = match found {
                Some(m) => m,
                None => return false,
            };
            if self.advance(re, haystack, m).is_some() {
                return true;
            }
        }
    }

    fn search<F>(&mut self, haystack: &[u8], find: F) -> Option<Match>
    where
        F: FnOnce(usize) -> Option<Match>,
    {
        if self.done || self.last_end > haystack.len() {
            self.done = true;
            return None;
        }
        let m = find(self.last_end);
        if m.is_none() {
            self.done = true;
        }
        m
    }

    /// Moves past the match `m`. Returns `None` if the match must be
    /// skipped, which happens with empty matches right after the previous
    /// match.
    fn advance(
        &mut self,
        re: &Regex,
        haystack: &[u8],
        m: Match,
    ) -> Option<Match> {
        if m.is_empty() {
            // Empty matches don't consume input, the next search starts at
            // the next character.
            self.last_end = if re.is_unicode() {
                m.end() + utf8_len_at(haystack, m.end())
            } else {
                m.end() + 1
            };
            if self.last_match == Some(m.end()) {
                return None;
            }
        } else {
            self.last_end = m.end();
        }
        self.last_match = Some(m.end());
        Some(m)
    }
}

/// Iterator over successive non-overlapping matches.
pub struct Matches<'r, 'h> {
    re: &'r Regex,
    haystack: &'h [u8],
    state: IterState,
}

impl Iterator for Matches<'_, '_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        self.state.next(self.re, self.haystack)
    }
}

/// Iterator over the capture groups of successive non-overlapping matches.
pub struct CaptureMatches<'r, 'h> {
    re: &'r Regex,
    haystack: &'h [u8],
    state: IterState,
}

impl Iterator for CaptureMatches<'_, '_> {
    type Item = Captures;

    fn next(&mut self) -> Option<Captures> {
        let mut caps = self.re.new_captures();
        self.state
            .next_captures(self.re, self.haystack, &mut caps)
            .then_some(caps)
    }
}

/// Escapes every meta character in `text`, so that the result matches
/// `text` literally when used as a pattern.
pub fn escape(text: &str) -> String {
    regex_syntax::escape(text)
}
