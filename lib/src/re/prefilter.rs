/*!
Literal searchers used for skipping quickly over the parts of the haystack
where a match can't start.

A [`Prefilter`] is built from a set of literals, and reports the leftmost
occurrence of any of them. Depending on the literals the search is done
with `memchr`, `memchr2`, `memchr3`, `memmem` or Aho-Corasick.

Prefilters are advisory, the matching engines use them for finding
candidate positions, and they verify every candidate. When the candidates
are too dense, the time spent in the prefilter is wasted, [`PrefilterState`]
detects such situations and disables the prefilter for the rest of the
search.
*/

use std::ops::Range;

use aho_corasick::{AhoCorasick, MatchKind};
use itertools::Itertools;
use memchr::memmem;

#[derive(Debug, Clone)]
enum Searcher {
    Memchr(u8),
    Memchr2(u8, u8),
    Memchr3(u8, u8, u8),
    Memmem(memmem::Finder<'static>),
    AhoCorasick(AhoCorasick),
}

/// Searches for any of a set of literals.
#[derive(Debug, Clone)]
pub(crate) struct Prefilter {
    searcher: Searcher,
    max_literal_len: usize,
    num_literals: usize,
}

impl Prefilter {
    /// Creates a prefilter for the given literals, which must not be empty.
    /// When two literals match at the same position the first one in the
    /// slice wins.
    pub fn new(literals: &[Vec<u8>]) -> Option<Self> {
        if literals.is_empty() || literals.iter().any(|lit| lit.is_empty()) {
            return None;
        }

        let max_literal_len = literals.iter().map(|lit| lit.len()).max()?;

        let searcher = if max_literal_len == 1 {
            let bytes: Vec<u8> =
                literals.iter().map(|lit| lit[0]).unique().collect();
            match bytes.as_slice() {
                [a] => Searcher::Memchr(*a),
                [a, b] => Searcher::Memchr2(*a, *b),
                [a, b, c] => Searcher::Memchr3(*a, *b, *c),
                _ => Self::aho_corasick(literals)?,
            }
        } else if literals.len() == 1 {
            Searcher::Memmem(memmem::Finder::new(&literals[0]).into_owned())
        } else {
            Self::aho_corasick(literals)?
        };

        Some(Self { searcher, max_literal_len, num_literals: literals.len() })
    }

    fn aho_corasick(literals: &[Vec<u8>]) -> Option<Searcher> {
        AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostFirst)
            .build(literals)
            .ok()
            .map(Searcher::AhoCorasick)
    }

    /// Length of the longest literal.
    #[inline]
    pub fn max_literal_len(&self) -> usize {
        self.max_literal_len
    }

    /// Returns true if the prefilter searches for a single literal.
    #[inline]
    pub fn is_single_literal(&self) -> bool {
        self.num_literals == 1
    }

    /// Finds the leftmost occurrence of any literal within `span`. Returns
    /// the range where the literal was found.
    pub fn find(&self, haystack: &[u8], span: Range<usize>) -> Option<Range<usize>> {
        let slice = haystack.get(span.clone())?;
        let offset = span.start;
        match &self.searcher {
            Searcher::Memchr(a) => {
                memchr::memchr(*a, slice).map(|i| offset + i..offset + i + 1)
            }
            Searcher::Memchr2(a, b) => memchr::memchr2(*a, *b, slice)
                .map(|i| offset + i..offset + i + 1),
            Searcher::Memchr3(a, b, c) => memchr::memchr3(*a, *b, *c, slice)
                .map(|i| offset + i..offset + i + 1),
            Searcher::Memmem(finder) => finder
                .find(slice)
                .map(|i| offset + i..offset + i + finder.needle().len()),
            Searcher::AhoCorasick(ac) => ac
                .find(aho_corasick::Input::new(haystack).range(span))
                .map(|m| m.start()..m.end()),
        }
    }
}

/// Keeps track of the effectiveness of a prefilter during a search.
///
/// A prefilter is considered ineffective when, after being used a minimum
/// number of times, the average number of bytes skipped per use is lower
/// than a small multiple of the longest literal.
#[derive(Debug, Clone)]
pub(crate) struct PrefilterState {
    /// Number of times the prefilter was used.
    skips: u32,
    /// Total number of bytes skipped.
    skipped: usize,
    /// Length of the longest literal in the prefilter.
    max_literal_len: usize,
    /// Once a prefilter is inert it is not used again.
    inert: bool,
}

impl PrefilterState {
    /// Minimum number of uses before the effectiveness is evaluated.
    const MIN_SKIPS: u32 = 40;

    /// The average number of bytes skipped per use must be at least this
    /// factor times the length of the longest literal.
    const MIN_AVG_FACTOR: usize = 2;

    pub fn new(max_literal_len: usize) -> Self {
        Self { skips: 0, skipped: 0, max_literal_len, inert: false }
    }

    /// Returns true if the prefilter should be used.
    pub fn is_effective(&mut self) -> bool {
        if self.inert {
            return false;
        }
        if self.skips < Self::MIN_SKIPS {
            return true;
        }
        let min_skipped = Self::MIN_AVG_FACTOR
            * self.skips as usize
            * self.max_literal_len.max(1);
        if self.skipped >= min_skipped {
            return true;
        }
        self.inert = true;
        false
    }

    /// Records a use of the prefilter that skipped `skipped` bytes.
    #[inline]
    pub fn update(&mut self, skipped: usize) {
        self.skips = self.skips.saturating_add(1);
        self.skipped = self.skipped.saturating_add(skipped);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Prefilter, PrefilterState};

    #[test]
    fn memchr() {
        let pre = Prefilter::new(&[b"a".to_vec()]).unwrap();
        assert_eq!(pre.find(b"xxaxa", 0..5), Some(2..3));
        assert_eq!(pre.find(b"xxaxa", 3..5), Some(4..5));
        assert_eq!(pre.find(b"xxaxa", 3..4), None);

        let pre = Prefilter::new(&[b"a".to_vec(), b"b".to_vec()]).unwrap();
        assert_eq!(pre.find(b"xxbxa", 0..5), Some(2..3));

        let pre = Prefilter::new(&[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()])
            .unwrap();
        assert_eq!(pre.find(b"xxxxc", 0..5), Some(4..5));
    }

    #[test]
    fn memmem() {
        let pre = Prefilter::new(&[b"Holmes".to_vec()]).unwrap();
        assert!(pre.is_single_literal());
        assert_eq!(pre.find(b"Sherlock Holmes", 0..15), Some(9..15));
        assert_eq!(pre.find(b"Sherlock Holmes", 0..14), None);
    }

    #[test]
    fn aho_corasick() {
        let pre =
            Prefilter::new(&[b"samwise".to_vec(), b"sam".to_vec()]).unwrap();
        assert_eq!(pre.find(b"xx samwise", 0..10), Some(3..10));

        let pre =
            Prefilter::new(&[b"sam".to_vec(), b"samwise".to_vec()]).unwrap();
        assert_eq!(pre.find(b"xx samwise", 0..10), Some(3..6));
        assert_eq!(pre.find(b"xx samwise", 4..10), None);
    }

    #[test]
    fn empty_literal() {
        assert!(Prefilter::new(&[]).is_none());
        assert!(Prefilter::new(&[b"a".to_vec(), vec![]]).is_none());
    }

    #[test]
    fn effectiveness() {
        let mut state = PrefilterState::new(3);
        for _ in 0..40 {
            assert!(state.is_effective());
            state.update(1);
        }
        assert!(!state.is_effective());
        assert!(state.inert);

        let mut state = PrefilterState::new(3);
        for _ in 0..100 {
            assert!(state.is_effective());
            state.update(100);
        }
        assert!(state.is_effective());
    }
}
