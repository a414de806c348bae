/*!
Extraction of the literals that every match must start or end with.

The literals are extracted with [`Extractor`], which produces a sequence of
literals ([`Seq`]) in preference order. A sequence may be infinite, meaning
that nothing useful can be said about the strings matched by the regexp,
like in `\w+`. Literals in the sequence can be exact, when the literal is
a complete match, or inexact, when the literal is just a prefix (or suffix)
of the match.
*/

use regex_syntax::hir::literal::{ExtractKind, Extractor, Seq};

use crate::re::hir::Hir;

/// The result of analyzing the literals in a regexp.
#[derive(Debug, Default)]
pub(crate) struct Literals {
    /// Literals that every match starts with, suitable for a prefilter.
    /// `None` if there's no such set of literals.
    pub prefixes: Option<Vec<Vec<u8>>>,
    /// Literals that every match ends with. `None` if there's no such set of
    /// literals.
    pub suffixes: Option<Vec<Vec<u8>>>,
    /// If the regexp is a plain literal or an alternation of literals, these
    /// are the literals in preference order.
    pub exact: Option<Vec<Vec<u8>>>,
}

impl Literals {
    pub fn new(hir: &Hir) -> Self {
        let prefixes =
            Extractor::new().kind(ExtractKind::Prefix).extract(hir.inner());

        // A regexp can be matched by a literal searcher alone when the
        // literals describe every possible match exactly, and there are no
        // captures or assertions that the searcher can't handle.
        let exact = if prefixes.is_exact()
            && !hir.has_explicit_captures()
            && !hir.has_looks()
        {
            seq_to_vec(&prefixes)
        } else {
            None
        };

        let mut prefixes = prefixes;
        prefixes.optimize_for_prefix_by_preference();

        let mut suffixes =
            Extractor::new().kind(ExtractKind::Suffix).extract(hir.inner());
        suffixes.optimize_for_suffix_by_preference();

        Self {
            prefixes: seq_to_vec(&prefixes),
            suffixes: seq_to_vec(&suffixes),
            exact,
        }
    }
}

/// Returns the literals in a finite sequence that doesn't contain the empty
/// literal. `None` is returned for every other sequence, as they are useless
/// for searching.
fn seq_to_vec(seq: &Seq) -> Option<Vec<Vec<u8>>> {
    let literals = seq.literals()?;
    if literals.is_empty() || literals.iter().any(|lit| lit.is_empty()) {
        return None;
    }
    Some(literals.iter().map(|lit| lit.as_bytes().to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Literals;
    use crate::re::parser::Parser;

    fn literals(pattern: &str) -> Literals {
        Literals::new(&Parser::new().parse(pattern).unwrap())
    }

    #[test]
    fn exact() {
        assert_eq!(
            literals("Sherlock|Holmes").exact,
            Some(vec![b"Sherlock".to_vec(), b"Holmes".to_vec()])
        );
        assert_eq!(literals("foo").exact, Some(vec![b"foo".to_vec()]));
        assert_eq!(literals("(foo)").exact, None);
        assert_eq!(literals("^foo").exact, None);
        assert_eq!(literals("foo|").exact, None);
        assert_eq!(literals(r"foo\w").exact, None);
    }

    #[test]
    fn prefixes() {
        assert!(literals(r"foo\w+").prefixes.is_some());
        assert_eq!(literals(r"\w+").prefixes, None);
        assert_eq!(literals(r"a*").prefixes, None);
    }

    #[test]
    fn suffixes() {
        assert_eq!(
            literals(r"\w+Holmes").suffixes,
            Some(vec![b"Holmes".to_vec()])
        );
        assert_eq!(literals(r"Holmes\w+").suffixes, None);
    }
}
