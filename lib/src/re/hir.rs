use regex_syntax::hir::{HirKind, Look};

/// High level intermediate representation (HIR) for a regular expression.
///
/// This is a thin wrapper around [`regex_syntax::hir::Hir`] that exposes the
/// properties the compiler and the meta executor need for choosing the best
/// way of matching the regular expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Hir {
    pub(super) inner: regex_syntax::hir::Hir,
}

impl From<regex_syntax::hir::Hir> for Hir {
    fn from(value: regex_syntax::hir::Hir) -> Self {
        Self { inner: value }
    }
}

impl Hir {
    #[inline]
    pub fn kind(&self) -> &HirKind {
        self.inner.kind()
    }

    #[inline]
    pub fn inner(&self) -> &regex_syntax::hir::Hir {
        &self.inner
    }

    /// Returns the length (in bytes) of the smallest string matched by this
    /// HIR.
    ///
    /// `None` is returned when the HIR matches nothing, like `[a&&b]`.
    #[inline]
    pub fn minimum_len(&self) -> Option<usize> {
        self.inner.properties().minimum_len()
    }

    /// Returns the length (in bytes) of the longest string matched by this
    /// HIR, or `None` if there's no upper bound.
    #[inline]
    pub fn maximum_len(&self) -> Option<usize> {
        self.inner.properties().maximum_len()
    }

    /// Returns true if every match must start at the beginning of the
    /// haystack, like in `^foo` or `\Abar|\Abaz`.
    #[inline]
    pub fn is_anchored_start(&self) -> bool {
        self.inner.properties().look_set_prefix().contains(Look::Start)
    }

    /// Returns true if every match must end at the end of the haystack, like
    /// in `foo$` or `bar\z`.
    #[inline]
    pub fn is_anchored_end(&self) -> bool {
        self.inner.properties().look_set_suffix().contains(Look::End)
    }

    /// Returns true if the regexp contains any zero-width assertion.
    #[inline]
    pub fn has_looks(&self) -> bool {
        !self.inner.properties().look_set().is_empty()
    }

    /// Returns true if the regexp contains any word boundary assertion,
    /// ASCII or Unicode.
    #[inline]
    pub fn has_word_boundary(&self) -> bool {
        self.inner.properties().look_set().contains_word()
    }

    /// Returns the number of capture groups, including the implicit group 0
    /// that corresponds to the whole match.
    #[inline]
    pub fn captures_len(&self) -> usize {
        self.inner.properties().explicit_captures_len() + 1
    }

    /// Returns true if the regexp contains any capture group besides the
    /// implicit group 0.
    #[inline]
    pub fn has_explicit_captures(&self) -> bool {
        self.inner.properties().explicit_captures_len() > 0
    }

    /// Returns the name of every capture group, indexed by group number.
    /// Group 0 and unnamed groups have no name.
    pub fn capture_names(&self) -> Vec<Option<String>> {
        let mut names = vec![None; self.captures_len()];
        // The visitor never fails.
        let _ = regex_syntax::hir::visit(
            &self.inner,
            CaptureNames { names: &mut names },
        );
        names
    }
}

struct CaptureNames<'a> {
    names: &'a mut Vec<Option<String>>,
}

impl<'a> regex_syntax::hir::Visitor for CaptureNames<'a> {
    type Output = ();
    type Err = ();

    fn finish(self) -> Result<Self::Output, Self::Err> {
        Ok(())
    }

    fn visit_pre(
        &mut self,
        hir: &regex_syntax::hir::Hir,
    ) -> Result<(), Self::Err> {
        if let HirKind::Capture(cap) = hir.kind() {
            if let Some(slot) = self.names.get_mut(cap.index as usize) {
                *slot = cap.name.as_deref().map(String::from);
            }
        }
        Ok(())
    }
}
