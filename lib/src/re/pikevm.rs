/*!
An implementation of the Pike VM.

The Pike VM simulates all the threads of an NFA in lock-step, advancing all
of them one byte at a time. Threads are kept in a [`BitmapSet`] where the
insertion order is the priority of each thread, and an instruction can
appear only once. When a thread reaches a `Match` instruction all threads
with lower priority are discarded, which gives leftmost-first semantics
without backtracking.

The time complexity is O(n * m), where n is the length of the haystack and
m the number of instructions in the program.
*/

use std::mem;

use log::trace;

use crate::re::bitmapset::BitmapSet;
use crate::re::instr::{Inst, InstPtr, Program};
use crate::re::prefilter::{Prefilter, PrefilterState};
use crate::re::{is_char_boundary, Input};

/// How the search ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MatchMode {
    /// Finds the leftmost-first match.
    LeftmostFirst,
    /// Stops as soon as any match is found. The reported match is the one
    /// that ends first.
    Earliest,
}

/// A set of threads, each one with its own capture slots.
#[derive(Debug, Clone)]
struct Threads {
    set: BitmapSet,
    caps: Vec<Option<usize>>,
    slots_per_thread: usize,
}

impl Threads {
    fn new() -> Self {
        Self { set: BitmapSet::new(0), caps: Vec::new(), slots_per_thread: 0 }
    }

    fn resize(&mut self, num_insts: usize, slots_per_thread: usize) {
        if self.set.capacity() != num_insts {
            self.set = BitmapSet::new(num_insts);
        }
        self.slots_per_thread = slots_per_thread;
        self.caps.resize(num_insts * slots_per_thread, None);
    }

    #[inline]
    fn caps(&self, ip: InstPtr) -> &[Option<usize>] {
        let i = ip * self.slots_per_thread;
        &self.caps[i..i + self.slots_per_thread]
    }

    #[inline]
    fn caps_mut(&mut self, ip: InstPtr) -> &mut [Option<usize>] {
        let i = ip * self.slots_per_thread;
        &mut self.caps[i..i + self.slots_per_thread]
    }
}

/// Frames in the stack used while computing the epsilon closure.
#[derive(Debug, Clone)]
enum FollowEpsilon {
    /// Explore the instruction at the given location.
    Explore(InstPtr),
    /// Restore a capture slot to its previous value.
    RestoreCapture { slot: usize, pos: Option<usize> },
}

/// Memory used by the Pike VM during a search. It is reused from one search
/// to the next one.
#[derive(Debug, Clone)]
pub(crate) struct PikeCache {
    clist: Threads,
    nlist: Threads,
    stack: Vec<FollowEpsilon>,
    caps: Vec<Option<usize>>,
    /// Threads added or stepped during the last search.
    steps: usize,
}

impl PikeCache {
    pub fn new() -> Self {
        Self {
            clist: Threads::new(),
            nlist: Threads::new(),
            stack: Vec::new(),
            caps: Vec::new(),
            steps: 0,
        }
    }
}

pub(crate) struct PikeVM<'r> {
    prog: &'r Program,
    utf8_empty: bool,
}

impl<'r> PikeVM<'r> {
    pub fn new(prog: &'r Program) -> Self {
        Self { prog, utf8_empty: false }
    }

    /// In [`MatchMode::Earliest`], ignores empty matches that split a UTF-8
    /// sequence and keeps searching. Requires tracking at least two slots.
    pub fn utf8_empty(mut self, yes: bool) -> Self {
        self.utf8_empty = yes;
        self
    }

    /// Searches for a match within the span of `input`.
    ///
    /// When a match is found, `slots` receives the capture slots of the
    /// matching thread and the function returns true. Only the first
    /// `slots.len()` slots are tracked, passing a slice of length 2 is
    /// enough for obtaining the bounds of the match.
    ///
    /// If `anchored` is true, only matches that start at `input.start` are
    /// reported.
    pub fn search(
        &self,
        cache: &mut PikeCache,
        input: &Input,
        anchored: bool,
        mode: MatchMode,
        prefilter: Option<(&Prefilter, &mut PrefilterState)>,
        slots: &mut [Option<usize>],
    ) -> bool {
        let PikeCache { clist, nlist, stack, caps, steps } = cache;

        clist.resize(self.prog.len(), slots.len());
        nlist.resize(self.prog.len(), slots.len());
        clist.set.clear();
        nlist.set.clear();
        caps.resize(slots.len(), None);
        *steps = 0;

        let mut prefilter = if anchored { None } else { prefilter };
        let mut matched = false;
        let mut at = input.start;

        'search: loop {
            if clist.set.is_empty() {
                // No threads alive and there's already a match, no other
                // match with higher priority can be found.
                if matched || (anchored && at > input.start) {
                    break;
                }
                // Skip to the next position where a match could start.
                if let Some((pre, state)) = prefilter.as_mut() {
                    if state.is_effective() {
                        match pre.find(input.haystack, at..input.end) {
                            Some(candidate) => {
                                state.update(candidate.start - at);
                                at = candidate.start;
                            }
                            None => break,
                        }
                    }
                }
            }

            // Start a new thread at the current position, with lower
            // priority than the existing ones. This is done only while
            // there's no match, as a match implies that every thread
            // started later has lower priority.
            if !matched && (!anchored || at == input.start) {
                caps.fill(None);
                self.add(
                    clist,
                    stack,
                    caps,
                    self.prog.start_anchored,
                    input,
                    at,
                );
            }

            *steps += clist.set.len();

            let byte = if at < input.end {
                Some(input.haystack[at])
            } else {
                None
            };

            for i in 0..clist.set.len() {
                let ip = clist.set.as_slice()[i];
                match self.prog.insts[ip] {
                    Inst::Match => {
                        if mode == MatchMode::Earliest
                            && self.utf8_empty
                            && self.splits_utf8(clist.caps(ip), input, at)
                        {
                            continue;
                        }
                        slots.copy_from_slice(clist.caps(ip));
                        matched = true;
                        if mode == MatchMode::Earliest {
                            break 'search;
                        }
                        // Threads after this one have lower priority.
                        break;
                    }
                    Inst::Byte(_) | Inst::Range(..) | Inst::Class(_) => {
                        if let Some(b) = byte {
                            if self.prog.accepts(ip, b) {
                                caps.copy_from_slice(clist.caps(ip));
                                self.add(
                                    nlist,
                                    stack,
                                    caps,
                                    ip + 1,
                                    input,
                                    at + 1,
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }

            if at >= input.end {
                break;
            }

            at += 1;
            mem::swap(clist, nlist);
            nlist.set.clear();
        }

        trace!("Pike VM stepped {} threads", steps);
        matched
    }

    /// True if `caps` describe an empty match at `at` that is not at a
    /// character boundary.
    fn splits_utf8(
        &self,
        caps: &[Option<usize>],
        input: &Input,
        at: usize,
    ) -> bool {
        caps.first().copied().flatten() == Some(at)
            && !is_char_boundary(input.haystack, at)
    }

    /// Adds the thread at `ip` to `threads`, following every epsilon
    /// transition. `caps` are the capture slots of the thread, they are
    /// left unchanged when the function returns.
    fn add(
        &self,
        threads: &mut Threads,
        stack: &mut Vec<FollowEpsilon>,
        caps: &mut [Option<usize>],
        ip: InstPtr,
        input: &Input,
        at: usize,
    ) {
        stack.push(FollowEpsilon::Explore(ip));
        while let Some(frame) = stack.pop() {
            match frame {
                FollowEpsilon::Explore(ip) => {
                    self.add_step(threads, stack, caps, ip, input, at)
                }
                FollowEpsilon::RestoreCapture { slot, pos } => {
                    caps[slot] = pos
                }
            }
        }
    }

    fn add_step(
        &self,
        threads: &mut Threads,
        stack: &mut Vec<FollowEpsilon>,
        caps: &mut [Option<usize>],
        mut ip: InstPtr,
        input: &Input,
        at: usize,
    ) {
        loop {
            if !threads.set.insert(ip) {
                return;
            }
            match self.prog.insts[ip] {
                Inst::Match
                | Inst::Byte(_)
                | Inst::Range(..)
                | Inst::Class(_) => {
                    threads.caps_mut(ip).copy_from_slice(caps);
                    return;
                }
                Inst::Look(look) => {
                    if !look.matches(input.haystack, at) {
                        return;
                    }
                    ip += 1;
                }
                Inst::Save(slot) => {
                    if slot < caps.len() {
                        stack.push(FollowEpsilon::RestoreCapture {
                            slot,
                            pos: caps[slot],
                        });
                        caps[slot] = Some(at);
                    }
                    ip += 1;
                }
                Inst::Split(a, b) => {
                    stack.push(FollowEpsilon::Explore(b));
                    ip = a;
                }
                Inst::Jump(target) => {
                    ip = target;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{MatchMode, PikeCache, PikeVM};
    use crate::re::compiler::Compiler;
    use crate::re::parser::Parser;
    use crate::re::Input;

    fn find(
        pattern: &str,
        haystack: &[u8],
        mode: MatchMode,
    ) -> Option<Vec<Option<usize>>> {
        let hir = Parser::new().parse(pattern).unwrap();
        let prog = Compiler::new().compile(&hir).unwrap();
        let mut slots = vec![None; prog.slots];
        let mut cache = PikeCache::new();
        let input = Input::new(haystack);
        PikeVM::new(&prog)
            .search(&mut cache, &input, false, mode, None, &mut slots)
            .then_some(slots)
    }

    #[test]
    fn leftmost_first() {
        assert_eq!(
            find("samwise|sam", b"samwise", MatchMode::LeftmostFirst),
            Some(vec![Some(0), Some(7)])
        );
        assert_eq!(
            find("sam|samwise", b"samwise", MatchMode::LeftmostFirst),
            Some(vec![Some(0), Some(3)])
        );
        assert_eq!(
            find("a+", b"xaaaa", MatchMode::LeftmostFirst),
            Some(vec![Some(1), Some(5)])
        );
        assert_eq!(
            find("a+?", b"xaaaa", MatchMode::LeftmostFirst),
            Some(vec![Some(1), Some(2)])
        );
        assert_eq!(find("b", b"xaaaa", MatchMode::LeftmostFirst), None);
    }

    #[test]
    fn earliest() {
        assert_eq!(
            find("a+", b"aaaaa", MatchMode::Earliest),
            Some(vec![Some(0), Some(1)])
        );
    }

    #[test]
    fn earliest_utf8_empty() {
        let hir = Parser::new().parse(r"\B|.").unwrap();
        let prog = Compiler::new().compile(&hir).unwrap();
        let mut slots = vec![None; 2];
        let mut cache = PikeCache::new();
        let input = Input::new("é".as_bytes());

        // The empty match at offset 1 is inside the sequence for `é`.
        assert!(PikeVM::new(&prog).search(
            &mut cache,
            &input,
            false,
            MatchMode::Earliest,
            None,
            &mut slots
        ));
        assert_eq!(slots, vec![Some(1), Some(1)]);

        assert!(PikeVM::new(&prog).utf8_empty(true).search(
            &mut cache,
            &input,
            false,
            MatchMode::Earliest,
            None,
            &mut slots
        ));
        assert_eq!(slots, vec![Some(0), Some(2)]);
    }

    #[test]
    fn linear_steps() {
        for pattern in [r"(a*)*b", r"(x+x+)+y"] {
            let hir = Parser::new().parse(pattern).unwrap();
            let prog = Compiler::new().compile(&hir).unwrap();
            let mut cache = PikeCache::new();
            let mut slots = vec![None; prog.slots];

            let mut steps = Vec::new();
            for n in [1000, 2000] {
                let haystack = pattern[1..2].repeat(n);
                let input = Input::new(haystack.as_bytes());
                assert!(!PikeVM::new(&prog).search(
                    &mut cache,
                    &input,
                    false,
                    MatchMode::LeftmostFirst,
                    None,
                    &mut slots
                ));
                assert!(cache.steps <= prog.len() * (n + 1));
                steps.push(cache.steps);
            }

            // Doubling the haystack roughly doubles the work.
            assert!(steps[1] > steps[0], "`{}`", pattern);
            assert!(steps[1] < 3 * steps[0], "`{}`", pattern);
        }
    }

    #[test]
    fn captures() {
        assert_eq!(
            find(r"(\w+)\s+(\w+)", b"  hello world", MatchMode::LeftmostFirst),
            Some(vec![
                Some(2),
                Some(13),
                Some(2),
                Some(7),
                Some(8),
                Some(13)
            ])
        );
        assert_eq!(
            find("(a)|(b)", b"b", MatchMode::LeftmostFirst),
            Some(vec![Some(0), Some(1), None, None, Some(0), Some(1)])
        );
    }
}
