/*!
Conversion of Unicode classes into tries of UTF-8 byte ranges.

The matching engines operate on bytes, therefore a class like `\p{Greek}`
must be expressed as the set of byte sequences that encode the codepoints in
the class. [`Utf8Sequences`] produces those sequences, each one being a list
of 1 to 4 byte ranges, like `[CE][91-A9]`. Sequences are inserted into a
trie so that sequences sharing a prefix share the instructions that match
that prefix.

Only valid UTF-8 sequences are accepted by the resulting trie, which is what
guarantees that Unicode-aware parts of a regexp never match invalid UTF-8.
*/

use regex_syntax::hir::ClassUnicode;
use regex_syntax::utf8::{Utf8Range, Utf8Sequences};

/// A node in a trie of UTF-8 byte ranges.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Utf8Node {
    pub transitions: Vec<Utf8Transition>,
}

/// A transition from one node to the next one.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Utf8Transition {
    pub start: u8,
    pub end: u8,
    /// `None` if a complete sequence ends after this transition.
    pub next: Option<Box<Utf8Node>>,
}

impl Utf8Node {
    /// Builds the trie for a Unicode class. When `reverse` is true each
    /// sequence is inserted backwards, for matching the class from right to
    /// left.
    pub fn from_class(class: &ClassUnicode, reverse: bool) -> Self {
        let mut root = Utf8Node::default();
        for range in class.iter() {
            for mut seq in Utf8Sequences::new(range.start(), range.end()) {
                if reverse {
                    seq.reverse();
                }
                root.insert(seq.as_slice());
            }
        }
        root
    }

    fn insert(&mut self, ranges: &[Utf8Range]) {
        let (first, rest) = match ranges.split_first() {
            Some(split) => split,
            None => return,
        };

        if let Some(last) = self.transitions.last_mut() {
            // Same range as the previous sequence, share the node.
            if last.start == first.start && last.end == first.end {
                if let Some(next) = last.next.as_mut() {
                    if !rest.is_empty() {
                        next.insert(rest);
                        return;
                    }
                }
            }
            // Both sequences end here and the ranges are adjacent, extend
            // the previous range.
            if last.next.is_none()
                && rest.is_empty()
                && last.end.checked_add(1) == Some(first.start)
            {
                last.end = first.end;
                return;
            }
        }

        let next = if rest.is_empty() {
            None
        } else {
            let mut node = Utf8Node::default();
            node.insert(rest);
            Some(Box::new(node))
        };

        self.transitions.push(Utf8Transition {
            start: first.start,
            end: first.end,
            next,
        });
    }
}
