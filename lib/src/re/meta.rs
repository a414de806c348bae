/*!
The meta executor, which decides which engine executes each search.

A compiled regexp ([`Exec`]) holds the forward and reverse programs, the
one-pass DFA when the regexp is one-pass, and the literal searchers derived
from the regexp. The engines are tried in this order, and the first one
that applies is used:

1. If the regexp is a literal, or an alternation of literals, the literal
   searcher alone finds the matches.
2. If capture groups are requested, the regexp is anchored at the start and
   it is one-pass, the one-pass DFA is used.
3. If the program and the haystack are small enough, and the regexp doesn't
   contain word boundaries, the bounded backtracker is used.
4. If capture groups are not needed, the lazy DFA is used. When capture
   groups are needed, the lazy DFA finds the bounds of the match and then
   one of the engines that report capture groups runs over those bounds.
5. In any other case, or if the lazy DFA gives up, the Pike VM is used.

Every engine reports the same matches, the only difference is speed.
*/

use std::time::Instant;

use log::*;
use rustc_hash::FxHashMap;

use crate::config::Options;
use crate::errors::{Error, GaveUp};
use crate::flags::{Flag, FlagSet};
use crate::re::backtrack::{self, Backtrack, BacktrackCache};
use crate::re::compiler::Compiler;
use crate::re::dfa::{Dfa, DfaCache};
use crate::re::instr::Program;
use crate::re::literal::Literals;
use crate::re::onepass::{OnePass, OnePassCache};
use crate::re::parser::Parser;
use crate::re::pikevm::{MatchMode, PikeCache, PikeVM};
use crate::re::pool::Pool;
use crate::re::prefilter::{Prefilter, PrefilterState};
use crate::re::{is_char_boundary, Input};

/// Programs with more instructions than this are never executed with the
/// bounded backtracker.
const BACKTRACK_MAX_INSTS: usize = 500;

/// Haystacks longer than this are never searched with the bounded
/// backtracker.
const BACKTRACK_MAX_HAYSTACK: usize = 256 * 1024;

/// What a search must find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SearchKind {
    /// Only whether there's a match.
    IsMatch,
    /// The end of the match that ends first.
    Shortest,
    /// The bounds of the leftmost-first match.
    Find,
    /// The bounds of the leftmost-first match and its capture groups.
    Captures,
}

impl SearchKind {
    fn is_earliest(self) -> bool {
        matches!(self, SearchKind::IsMatch | SearchKind::Shortest)
    }
}

/// Memory used while searching. Each thread searching with the same
/// [`Exec`] takes its own cache from the pool.
#[derive(Debug)]
pub(crate) struct Cache {
    pikevm: PikeCache,
    backtrack: BacktrackCache,
    onepass: OnePassCache,
    dfa: Option<DfaCache>,
    dfa_rev: Option<DfaCache>,
    slots: Vec<Option<usize>>,
}

impl Cache {
    fn new() -> Self {
        Self {
            pikevm: PikeCache::new(),
            backtrack: BacktrackCache::new(),
            onepass: OnePassCache::new(),
            dfa: None,
            dfa_rev: None,
            slots: Vec::new(),
        }
    }
}

/// A compiled regular expression, together with everything needed for
/// executing it.
#[derive(Debug)]
pub(crate) struct Exec {
    pattern: String,
    prog: Program,
    /// Reverse program, used by the lazy DFA for finding where matches
    /// start. `None` if it couldn't be compiled.
    rev: Option<Program>,
    onepass: Option<OnePass>,
    /// Searches for the literals that every match starts with.
    prefilter: Option<Prefilter>,
    /// Searches for the literals that every match ends with.
    suffixes: Option<Prefilter>,
    /// Finds every match on its own when the regexp is just a set of
    /// literals.
    literal_only: Option<Prefilter>,
    anchored_start: bool,
    anchored_end: bool,
    /// True if the regexp can produce empty matches that must not split
    /// UTF-8 sequences in the haystack.
    utf8_empty: bool,
    unicode: bool,
    has_word_boundary: bool,
    capture_names: Vec<Option<String>>,
    capture_indexes: FxHashMap<String, usize>,
    dfa_size_limit: usize,
    pool: Pool<Cache>,
}

impl Exec {
    /// Parses and compiles a regular expression.
    pub fn new(
        pattern: &str,
        flags: FlagSet,
        options: &Options,
    ) -> Result<Self, Error> {
        let start = Instant::now();
        let unicode = flags.contains(Flag::Unicode);

        let hir = Parser::new()
            .case_insensitive(flags.contains(Flag::CaseInsensitive))
            .multi_line(flags.contains(Flag::MultiLine))
            .dot_matches_new_line(flags.contains(Flag::DotMatchesNewLine))
            .swap_greed(flags.contains(Flag::SwapGreed))
            .ignore_whitespace(flags.contains(Flag::IgnoreWhitespace))
            .unicode(unicode)
            .octal(options.octal)
            .nest_limit(options.nest_limit)
            .parse(pattern)?;

        let prog =
            Compiler::new().size_limit(options.size_limit).compile(&hir)?;

        // Without the reverse program the lazy DFA can still find where
        // matches end, the start is found by other engines.
        let rev = match Compiler::new()
            .reverse(true)
            .size_limit(options.size_limit)
            .compile(&hir)
        {
            Ok(rev) => Some(rev),
            Err(err) => {
                debug!("Reverse program not available: {}", err);
                None
            }
        };

        let onepass = OnePass::new(&prog);

        let literals = if cfg!(feature = "prefilter") {
            Literals::new(&hir)
        } else {
            Literals::default()
        };

        let prefilter = literals.prefixes.as_deref().and_then(Prefilter::new);
        let suffixes = literals.suffixes.as_deref().and_then(Prefilter::new);
        let literal_only = literals.exact.as_deref().and_then(Prefilter::new);

        let capture_names = hir.capture_names();
        let mut capture_indexes = FxHashMap::default();

        for (i, name) in capture_names.iter().enumerate() {
            if let Some(name) = name {
                capture_indexes.entry(name.clone()).or_insert(i);
            }
        }

        debug!(
            "Compiled regexp `{}`: {} instructions ({} bytes), {} reverse instructions",
            pattern,
            prog.len(),
            prog.memory_usage(),
            rev.as_ref().map_or(0, |rev| rev.len()),
        );

        debug!(
            "Engines: one-pass: {:?} bytes, prefilter: {}, literal only: {}",
            onepass.as_ref().map(|onepass| onepass.memory_usage()),
            prefilter.is_some(),
            literal_only.is_some(),
        );

        info!("Regexp compilation time: {:?}", Instant::elapsed(&start));

        Ok(Self {
            pattern: pattern.to_string(),
            utf8_empty: unicode && hir.minimum_len() == Some(0),
            unicode,
            anchored_start: hir.is_anchored_start(),
            anchored_end: hir.is_anchored_end(),
            has_word_boundary: hir.has_word_boundary(),
            prog,
            rev,
            onepass,
            prefilter,
            suffixes,
            literal_only,
            capture_names,
            capture_indexes,
            dfa_size_limit: options.dfa_size_limit,
            pool: Pool::new(),
        })
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Returns true if the regexp was compiled with the Unicode flag.
    #[inline]
    pub fn is_unicode(&self) -> bool {
        self.unicode
    }

    /// Number of capture groups, including group 0.
    #[inline]
    pub fn captures_len(&self) -> usize {
        self.capture_names.len()
    }

    /// Name of each capture group, indexed by group number.
    #[inline]
    pub fn capture_names(&self) -> &[Option<String>] {
        self.capture_names.as_slice()
    }

    /// Returns the index of the first group with the given name.
    pub fn capture_index(&self, name: &str) -> Option<usize> {
        self.capture_indexes.get(name).copied()
    }

    /// Returns true if the regexp matches somewhere in `haystack[start..]`.
    pub fn is_match_at(&self, haystack: &[u8], start: usize) -> bool {
        if start > haystack.len() {
            return false;
        }
        let mut slots = [None, None];
        let input = Input::new(haystack).span(start, haystack.len());
        self.search(&input, SearchKind::IsMatch, &mut slots)
    }

    /// Returns the end of the match that ends first.
    pub fn shortest_match_at(
        &self,
        haystack: &[u8],
        start: usize,
    ) -> Option<usize> {
        if start > haystack.len() {
            return None;
        }
        let mut slots = [None, None];
        let input = Input::new(haystack).span(start, haystack.len());
        if self.search(&input, SearchKind::Shortest, &mut slots) {
            slots[1]
        } else {
            None
        }
    }

    /// Returns the bounds of the leftmost-first match.
    pub fn find_at(
        &self,
        haystack: &[u8],
        start: usize,
    ) -> Option<(usize, usize)> {
        if start > haystack.len() {
            return None;
        }
        let mut slots = [None, None];
        let input = Input::new(haystack).span(start, haystack.len());
        if !self.search(&input, SearchKind::Find, &mut slots) {
            return None;
        }
        match slots {
            [Some(s), Some(e)] => Some((s, e)),
            _ => None,
        }
    }

    /// Finds the leftmost-first match and writes its capture slots into
    /// `slots`, which must have two slots per group.
    pub fn captures_at(
        &self,
        haystack: &[u8],
        start: usize,
        slots: &mut [Option<usize>],
    ) -> bool {
        slots.fill(None);
        if start > haystack.len() {
            return false;
        }
        let input = Input::new(haystack).span(start, haystack.len());
        self.search(&input, SearchKind::Captures, slots)
    }

    /// Runs the search, skipping empty matches that split a UTF-8
    /// sequence when required.
    fn search(
        &self,
        input: &Input,
        kind: SearchKind,
        slots: &mut [Option<usize>],
    ) -> bool {
        let mut cache = self.pool.get(Cache::new);
        let mut input = *input;

        loop {
            if !self.search_raw(&mut cache, &input, kind, slots) {
                return false;
            }
            if !self.utf8_empty {
                return true;
            }
            match (slots[0], slots[1]) {
                (Some(s), Some(e))
                    if s == e && !is_char_boundary(input.haystack, e) =>
                {
                    if s >= input.end {
                        return false;
                    }
                    input = input.span(s + 1, input.end);
                }
                _ => return true,
            }
        }
    }

    fn search_raw(
        &self,
        cache: &mut Cache,
        input: &Input,
        kind: SearchKind,
        slots: &mut [Option<usize>],
    ) -> bool {
        // `^` can't match anywhere except at the start of the haystack.
        if self.anchored_start && input.start > 0 {
            return false;
        }

        if kind.is_earliest() {
            if let Some(suffixes) = &self.suffixes {
                if suffixes.find(input.haystack, input.start..input.end).is_none()
                {
                    return false;
                }
            }
        }

        if let Some(literals) = &self.literal_only {
            if !kind.is_earliest()
                || kind == SearchKind::IsMatch
                || literals.is_single_literal()
            {
                trace!("Searching `{}` with literal searcher", self.pattern);
                return match literals.find(input.haystack, input.start..input.end)
                {
                    Some(m) => {
                        slots[0] = Some(m.start);
                        slots[1] = Some(m.end);
                        true
                    }
                    None => false,
                };
            }
        }

        if kind == SearchKind::Captures && self.anchored_start {
            if let Some(onepass) = &self.onepass {
                trace!("Searching `{}` with one-pass DFA", self.pattern);
                return onepass.search(&mut cache.onepass, input, slots);
            }
        }

        if !kind.is_earliest()
            && !self.has_word_boundary
            && self.prog.len() <= BACKTRACK_MAX_INSTS
            && input.len() <= BACKTRACK_MAX_HAYSTACK
            && backtrack::should_exec(self.prog.len(), input.len())
        {
            trace!("Searching `{}` with backtracker", self.pattern);
            let mut state = self.prefilter_state();
            return Backtrack::new(&self.prog).search(
                &mut cache.backtrack,
                input,
                self.anchored_start,
                self.prefilter.as_ref().zip(state.as_mut()),
                slots,
            );
        }

        if self.dfa_size_limit > 0 && !(kind.is_earliest() && self.utf8_empty)
        {
            trace!("Searching `{}` with lazy DFA", self.pattern);
            match self.search_dfa(cache, input, kind, slots) {
                Ok(matched) => return matched,
                Err(GaveUp) => {
                    debug!(
                        "Lazy DFA gave up with `{}`, falling back to Pike VM",
                        self.pattern
                    );
                }
            }
        }

        trace!("Searching `{}` with Pike VM", self.pattern);

        let mode = if kind.is_earliest() {
            MatchMode::Earliest
        } else {
            MatchMode::LeftmostFirst
        };

        let mut state = self.prefilter_state();

        // Earliest searches can't be retried after an empty match that
        // splits a UTF-8 sequence, as a match that started before it and
        // ends later would be lost. The Pike VM skips those matches itself.
        PikeVM::new(&self.prog).utf8_empty(self.utf8_empty).search(
            &mut cache.pikevm,
            input,
            self.anchored_start,
            mode,
            self.prefilter.as_ref().zip(state.as_mut()),
            slots,
        )
    }

    fn search_dfa(
        &self,
        cache: &mut Cache,
        input: &Input,
        kind: SearchKind,
        slots: &mut [Option<usize>],
    ) -> Result<bool, GaveUp> {
        if kind.is_earliest() {
            let dfa = Dfa::new(&self.prog, self.dfa_size_limit);
            let dfa_cache =
                cache.dfa.get_or_insert_with(|| DfaCache::new(&self.prog));
            let mut state = self.prefilter_state();
            let end = dfa.search_fwd(
                dfa_cache,
                input,
                self.anchored_start,
                true,
                self.prefilter.as_ref().zip(state.as_mut()),
            )?;
            slots[1] = end;
            return Ok(end.is_some());
        }

        let (start, end) = match self.find_dfa(cache, input)? {
            Some(bounds) => bounds,
            None => return Ok(false),
        };

        if kind == SearchKind::Find {
            slots[0] = Some(start);
            slots[1] = Some(end);
            return Ok(true);
        }

        // The bounds of the match are known, capture groups are found by
        // an anchored search over them.
        let bounded = input.span(start, end);

        if let Some(onepass) = &self.onepass {
            return Ok(onepass.search(&mut cache.onepass, &bounded, slots));
        }

        if backtrack::should_exec(self.prog.len(), bounded.len()) {
            return Ok(Backtrack::new(&self.prog).search(
                &mut cache.backtrack,
                &bounded,
                true,
                None,
                slots,
            ));
        }

        Ok(PikeVM::new(&self.prog).search(
            &mut cache.pikevm,
            &bounded,
            true,
            MatchMode::LeftmostFirst,
            None,
            slots,
        ))
    }

    /// Finds the bounds of the leftmost-first match with the lazy DFA.
    fn find_dfa(
        &self,
        cache: &mut Cache,
        input: &Input,
    ) -> Result<Option<(usize, usize)>, GaveUp> {
        // Matches of regexps anchored only at the end all end at the end of
        // the haystack, the reverse DFA finds where they start.
        if self.anchored_end
            && !self.anchored_start
            && input.end == input.haystack.len()
        {
            if let Some(rev) = &self.rev {
                let dfa = Dfa::new(rev, self.dfa_size_limit);
                let rev_cache =
                    cache.dfa_rev.get_or_insert_with(|| DfaCache::new(rev));
                return Ok(dfa
                    .search_rev(rev_cache, input)?
                    .map(|start| (start, input.end)));
            }
        }

        let dfa = Dfa::new(&self.prog, self.dfa_size_limit);
        let fwd_cache =
            cache.dfa.get_or_insert_with(|| DfaCache::new(&self.prog));
        let mut state = self.prefilter_state();

        let end = match dfa.search_fwd(
            fwd_cache,
            input,
            self.anchored_start,
            false,
            self.prefilter.as_ref().zip(state.as_mut()),
        )? {
            Some(end) => end,
            None => return Ok(None),
        };

        if self.anchored_start {
            return Ok(Some((input.start, end)));
        }

        let bounded = input.span(input.start, end);

        if let Some(rev) = &self.rev {
            let dfa = Dfa::new(rev, self.dfa_size_limit);
            let rev_cache =
                cache.dfa_rev.get_or_insert_with(|| DfaCache::new(rev));
            return match dfa.search_rev(rev_cache, &bounded)? {
                Some(start) => Ok(Some((start, end))),
                // The forward DFA found a match, the reverse one must find
                // it too.
                None => Err(GaveUp),
            };
        }

        // The leftmost-first match ends at `end`, the Pike VM finds the same
        // match within the shorter span.
        cache.slots.clear();
        cache.slots.resize(2, None);

        if PikeVM::new(&self.prog).search(
            &mut cache.pikevm,
            &bounded,
            false,
            MatchMode::LeftmostFirst,
            None,
            &mut cache.slots,
        ) {
            if let [Some(s), Some(e)] = cache.slots[..] {
                return Ok(Some((s, e)));
            }
        }

        Err(GaveUp)
    }

    fn prefilter_state(&self) -> Option<PrefilterState> {
        self.prefilter.as_ref().map(|p| PrefilterState::new(p.max_literal_len()))
    }
}
