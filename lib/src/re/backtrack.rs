/*!
A bounded backtracker.

This is a classic backtracking matcher, that explores alternatives in
priority order and stops at the first match, which is by definition the
leftmost-first one. It is made linear by remembering every (instruction,
position) pair already visited: when a pair is visited a second time the
outcome is known to be a failure, as it failed the first time.

The memory needed for remembering the visited pairs is proportional to the
length of the program times the length of the haystack, therefore this
engine is only used when that product is small.
*/

use bitvec::vec::BitVec;
use log::trace;

use crate::re::instr::{Inst, InstPtr, Program};
use crate::re::prefilter::{Prefilter, PrefilterState};
use crate::re::Input;

/// Maximum size in bytes of the bitmap that tracks the visited
/// (instruction, position) pairs.
const MAX_VISITED_BYTES: usize = 256 * 1024;

/// Returns true if the backtracker can search a haystack of length
/// `haystack_len` with a program of `num_insts` instructions without
/// exceeding its memory budget.
pub(crate) fn should_exec(num_insts: usize, haystack_len: usize) -> bool {
    num_insts
        .checked_mul(haystack_len.saturating_add(1))
        .map_or(false, |bits| bits <= MAX_VISITED_BYTES * 8)
}

#[derive(Debug, Clone, Copy)]
enum Job {
    /// Continue at the given instruction and position.
    Inst { ip: InstPtr, at: usize },
    /// Restore a capture slot to its previous value.
    SaveRestore { slot: usize, old: Option<usize> },
}

/// Memory used by the backtracker during a search.
#[derive(Debug, Clone, Default)]
pub(crate) struct BacktrackCache {
    jobs: Vec<Job>,
    visited: BitVec<usize>,
    /// (instruction, position) pairs visited during the last search.
    steps: usize,
}

impl BacktrackCache {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) struct Backtrack<'r> {
    prog: &'r Program,
}

impl<'r> Backtrack<'r> {
    pub fn new(prog: &'r Program) -> Self {
        Self { prog }
    }

    /// Searches for the leftmost-first match within the span of `input`.
    ///
    /// The caller must make sure that [`should_exec`] returns true for the
    /// program and the span of the input. As in the Pike VM, only the first
    /// `slots.len()` slots are tracked.
    pub fn search(
        &self,
        cache: &mut BacktrackCache,
        input: &Input,
        anchored: bool,
        prefilter: Option<(&Prefilter, &mut PrefilterState)>,
        slots: &mut [Option<usize>],
    ) -> bool {
        let visited_len = self.prog.len() * (input.len() + 1);
        cache.visited.clear();
        cache.visited.resize(visited_len, false);
        cache.steps = 0;

        let matched = if anchored {
            self.backtrack(cache, input, input.start, slots)
        } else {
            self.search_unanchored(cache, input, prefilter, slots)
        };

        trace!("Backtracker visited {} states", cache.steps);
        matched
    }

    fn search_unanchored(
        &self,
        cache: &mut BacktrackCache,
        input: &Input,
        prefilter: Option<(&Prefilter, &mut PrefilterState)>,
        slots: &mut [Option<usize>],
    ) -> bool {
        let mut prefilter = prefilter;
        let mut start = input.start;

        while start <= input.end {
            if let Some((pre, state)) = prefilter.as_mut() {
                if state.is_effective() {
                    match pre.find(input.haystack, start..input.end) {
                        Some(candidate) => {
                            state.update(candidate.start - start);
                            start = candidate.start;
                        }
                        None => return false,
                    }
                }
            }
            if self.backtrack(cache, input, start, slots) {
                return true;
            }
            start += 1;
        }

        false
    }

    fn backtrack(
        &self,
        cache: &mut BacktrackCache,
        input: &Input,
        start: usize,
        slots: &mut [Option<usize>],
    ) -> bool {
        cache.jobs.clear();
        cache.jobs.push(Job::Inst { ip: self.prog.start_anchored, at: start });

        while let Some(job) = cache.jobs.pop() {
            match job {
                Job::Inst { ip, at } => {
                    if self.step(cache, input, slots, ip, at) {
                        return true;
                    }
                }
                Job::SaveRestore { slot, old } => {
                    slots[slot] = old;
                }
            }
        }

        false
    }

    /// Follows a single path of execution until it fails or finds a match.
    /// Alternatives with lower priority are pushed into the jobs stack.
    fn step(
        &self,
        cache: &mut BacktrackCache,
        input: &Input,
        slots: &mut [Option<usize>],
        mut ip: InstPtr,
        mut at: usize,
    ) -> bool {
        loop {
            // Each (ip, at) pair is explored only once.
            let k = ip * (input.len() + 1) + (at - input.start);
            if cache.visited[k] {
                return false;
            }
            cache.visited.set(k, true);
            cache.steps += 1;

            match self.prog.insts[ip] {
                Inst::Match => return true,
                Inst::Byte(_) | Inst::Range(..) | Inst::Class(_) => {
                    if at < input.end
                        && self.prog.accepts(ip, input.haystack[at])
                    {
                        ip += 1;
                        at += 1;
                    } else {
                        return false;
                    }
                }
                Inst::Look(look) => {
                    if look.matches(input.haystack, at) {
                        ip += 1;
                    } else {
                        return false;
                    }
                }
                Inst::Save(slot) => {
                    if slot < slots.len() {
                        cache
                            .jobs
                            .push(Job::SaveRestore { slot, old: slots[slot] });
                        slots[slot] = Some(at);
                    }
                    ip += 1;
                }
                Inst::Split(a, b) => {
                    cache.jobs.push(Job::Inst { ip: b, at });
                    ip = a;
                }
                Inst::Jump(target) => {
                    ip = target;
                }
            }
        }
    }
}
