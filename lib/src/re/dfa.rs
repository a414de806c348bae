/*!
A lazy DFA.

The DFA is built on-the-fly while searching. Each DFA state is identified
by the set of program instructions from which the execution continues, in
priority order, plus a summary of the last byte read (see [`ByteCtx`]),
which is needed for evaluating assertions like `^` or `\b`. Transitions are
computed the first time they are needed, and stored in a cache that is
reused by later searches.

The cache has a limited size. When it is full, it is cleared and the
search continues. If the cache is cleared too often without making enough
progress the DFA gives up, and the caller must use another engine.

This DFA doesn't report capture groups. A forward search finds where the
leftmost-first match ends, and a search with the reverse program, starting
at that position, finds where the match starts.

Unicode word boundaries can't be evaluated by looking at a single byte at
each side of the current position. The DFA handles them as if they were
ASCII word boundaries, and gives up as soon as it sees a non-ASCII byte
when the program contains them.
*/

use std::mem::size_of;

use log::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::GaveUp;
use crate::re::bitmapset::BitmapSet;
use crate::re::instr::{ByteCtx, Inst, InstPtr, Program};
use crate::re::prefilter::{Prefilter, PrefilterState};
use crate::re::Input;

type StateId = u32;

/// The dead state. No match can be found from it.
const DEAD: StateId = 0;

/// Transitions not computed yet.
const UNKNOWN: StateId = StateId::MAX;

/// Number of cache clears after which the DFA may give up.
const MIN_CLEARS: usize = 3;

/// When the cache is cleared more than [`MIN_CLEARS`] times, the DFA gives
/// up unless it searched at least this number of bytes per state since the
/// previous clear.
const MIN_BYTES_PER_STATE: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct State {
    /// Instructions from which the execution continues, in priority order.
    /// Their epsilon closure is not computed until the next byte is known.
    insts: Box<[InstPtr]>,
    /// The byte that led to this state.
    ctx: ByteCtx,
    /// True if a match ends right before the byte that led to this state.
    is_match: bool,
}

impl State {
    fn dead() -> Self {
        Self { insts: Box::new([]), ctx: ByteCtx::Edge, is_match: false }
    }
}

/// How the DFA handles matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MatchKind {
    /// Threads with lower priority than a match are discarded.
    LeftmostFirst,
    /// Every match is reported, used by reverse searches for finding the
    /// longest match.
    All,
}

/// Memory used by the DFA. Each cache can be used with a single program.
#[derive(Debug, Clone)]
pub(crate) struct DfaCache {
    /// Transitions, `stride` per state.
    table: Vec<StateId>,
    states: Vec<State>,
    map: FxHashMap<State, StateId>,
    /// Start states, indexed by anchoring and [`ByteCtx`].
    starts: [StateId; 2 * ByteCtx::COUNT],
    memory_usage: usize,
    /// Number of times the cache was cleared during the current search.
    clears: usize,
    /// Position at which the cache was cleared for the last time.
    clear_at: usize,
    stack: Vec<InstPtr>,
    visited: BitmapSet,
    next: SmallVec<[InstPtr; 16]>,
}

impl DfaCache {
    pub fn new(prog: &Program) -> Self {
        let mut cache = Self {
            table: Vec::new(),
            states: Vec::new(),
            map: FxHashMap::default(),
            starts: [UNKNOWN; 2 * ByteCtx::COUNT],
            memory_usage: 0,
            clears: 0,
            clear_at: 0,
            stack: Vec::new(),
            visited: BitmapSet::new(prog.len()),
            next: SmallVec::new(),
        };
        cache.reset(prog.byte_classes.len() + 1);
        cache
    }

    /// Removes every state, except the dead one.
    fn reset(&mut self, stride: usize) {
        self.table.clear();
        self.states.clear();
        self.map.clear();
        self.starts = [UNKNOWN; 2 * ByteCtx::COUNT];
        self.memory_usage = 0;
        let dead = self.push(State::dead(), stride);
        self.table[dead as usize * stride..(dead as usize + 1) * stride]
            .fill(DEAD);
    }

    fn push(&mut self, state: State, stride: usize) -> StateId {
        let id = self.states.len() as StateId;
        self.memory_usage += state_cost(&state, stride);
        self.table.resize(self.table.len() + stride, UNKNOWN);
        self.map.insert(state.clone(), id);
        self.states.push(state);
        id
    }
}

/// Approximated memory used by a state, including its transitions and its
/// entry in the map.
fn state_cost(state: &State, stride: usize) -> usize {
    2 * (size_of::<State>() + state.insts.len() * size_of::<InstPtr>())
        + stride * size_of::<StateId>()
        + size_of::<StateId>()
}

pub(crate) struct Dfa<'r> {
    prog: &'r Program,
    kind: MatchKind,
    size_limit: usize,
    stride: usize,
    /// True if bytes >= 0x80 make the DFA give up.
    quit_non_ascii: bool,
}

impl<'r> Dfa<'r> {
    /// Creates a DFA for the given program. Forward programs are searched
    /// with leftmost-first semantics, and reverse programs look for the
    /// longest match.
    pub fn new(prog: &'r Program, size_limit: usize) -> Self {
        Self {
            prog,
            kind: if prog.reverse {
                MatchKind::All
            } else {
                MatchKind::LeftmostFirst
            },
            size_limit,
            stride: prog.byte_classes.len() + 1,
            quit_non_ascii: prog.has_unicode_word_boundary(),
        }
    }

    /// Finds the end of the leftmost-first match within the span of
    /// `input`. If `earliest` is true the search stops at the first match
    /// found, which is not necessarily the leftmost-first one, but ends
    /// before it.
    pub fn search_fwd(
        &self,
        cache: &mut DfaCache,
        input: &Input,
        anchored: bool,
        earliest: bool,
        prefilter: Option<(&Prefilter, &mut PrefilterState)>,
    ) -> Result<Option<usize>, GaveUp> {
        debug_assert!(!self.prog.reverse);

        let haystack = input.haystack;
        let mut prefilter = if anchored { None } else { prefilter };
        let mut last_match = None;
        let mut at = input.start;

        cache.clears = 0;
        cache.clear_at = at;

        let left = if at > 0 { Some(haystack[at - 1]) } else { None };
        let mut sid = self.start_state(cache, anchored, left, at)?;

        while at < input.end {
            if let Some((pre, state)) = prefilter.as_mut() {
                if last_match.is_none()
                    && self.is_start(&cache.states[sid as usize])
                    && state.is_effective()
                {
                    match pre.find(haystack, at..input.end) {
                        Some(candidate) => {
                            state.update(candidate.start - at);
                            if candidate.start > at {
                                at = candidate.start;
                                sid = self.start_state(
                                    cache,
                                    false,
                                    Some(haystack[at - 1]),
                                    at,
                                )?;
                            }
                        }
                        None => return Ok(None),
                    }
                }
            }

            sid = self.next_state(cache, sid, Some(haystack[at]), at)?;
            at += 1;

            let state = &cache.states[sid as usize];
            if state.is_match {
                last_match = Some(at - 1);
                if earliest {
                    return Ok(last_match);
                }
            }
            if state.insts.is_empty() {
                return Ok(last_match);
            }
        }

        // Matches that end at `input.end` are detected with one more
        // transition, using the byte that follows the span, if any.
        let right = haystack.get(input.end).copied();
        sid = self.next_state(cache, sid, right, at)?;

        if cache.states[sid as usize].is_match {
            last_match = Some(input.end);
        }

        Ok(last_match)
    }

    /// Searches backwards from `input.end`, with a reverse program, and
    /// returns the smallest position `s` such that `s..input.end` matches.
    pub fn search_rev(
        &self,
        cache: &mut DfaCache,
        input: &Input,
    ) -> Result<Option<usize>, GaveUp> {
        debug_assert!(self.prog.reverse);

        let haystack = input.haystack;
        let mut last_match = None;
        let mut at = input.end;

        cache.clears = 0;
        cache.clear_at = at;

        let right = haystack.get(at).copied();
        let mut sid = self.start_state(cache, true, right, at)?;

        while at > input.start {
            sid = self.next_state(cache, sid, Some(haystack[at - 1]), at)?;
            at -= 1;

            let state = &cache.states[sid as usize];
            if state.is_match {
                last_match = Some(at + 1);
            }
            if state.insts.is_empty() {
                return Ok(last_match);
            }
        }

        let left = if input.start > 0 {
            Some(haystack[input.start - 1])
        } else {
            None
        };

        sid = self.next_state(cache, sid, left, at)?;

        if cache.states[sid as usize].is_match {
            last_match = Some(input.start);
        }

        Ok(last_match)
    }

    /// Returns true if the state is the unanchored start state, or the
    /// state reached after discarding every thread except the one that
    /// restarts the search at the next position.
    fn is_start(&self, state: &State) -> bool {
        match state.insts.as_ref() {
            [ip] => {
                *ip == self.prog.start_unanchored
                    || self.prog.insts[*ip]
                        == Inst::Jump(self.prog.start_unanchored)
            }
            _ => false,
        }
    }

    #[inline]
    fn is_quit(&self, byte: u8) -> bool {
        self.quit_non_ascii && byte >= 0x80
    }

    fn ctx_for(&self, byte: Option<u8>) -> ByteCtx {
        match byte {
            // Without assertions, the context is irrelevant.
            Some(_) if self.prog.looks.is_empty() => ByteCtx::Other,
            Some(b) => ByteCtx::of(b),
            None => ByteCtx::Edge,
        }
    }

    /// Returns the start state. `ctx_byte` is the byte that precedes the
    /// start position in forward searches, or the byte that follows it
    /// in reverse searches.
    fn start_state(
        &self,
        cache: &mut DfaCache,
        anchored: bool,
        ctx_byte: Option<u8>,
        at: usize,
    ) -> Result<StateId, GaveUp> {
        if ctx_byte.is_some_and(|b| self.is_quit(b)) {
            return Err(GaveUp);
        }
        let ctx = self.ctx_for(ctx_byte);
        let i = anchored as usize * ByteCtx::COUNT + ctx as usize;
        if cache.starts[i] != UNKNOWN {
            return Ok(cache.starts[i]);
        }
        let start = if anchored {
            self.prog.start_anchored
        } else {
            self.prog.start_unanchored
        };
        let state = State { insts: Box::new([start]), ctx, is_match: false };
        let sid = self.add_state(cache, state, None, at)?;
        cache.starts[i] = sid;
        Ok(sid)
    }

    /// Returns the state reached from `sid` after reading `byte`, where
    /// `None` means that there are no more bytes.
    #[inline]
    fn next_state(
        &self,
        cache: &mut DfaCache,
        sid: StateId,
        byte: Option<u8>,
        at: usize,
    ) -> Result<StateId, GaveUp> {
        let class = match byte {
            Some(b) => self.prog.byte_classes.get(b),
            None => self.stride - 1,
        };
        let next = cache.table[sid as usize * self.stride + class];
        if next != UNKNOWN {
            return Ok(next);
        }
        if byte.is_some_and(|b| self.is_quit(b)) {
            return Err(GaveUp);
        }

        let state = self.compute(cache, sid, byte);

        // Adding the new state may clear the cache, in which case the
        // current state gets a new identifier.
        let mut current = sid;
        let next = self.add_state(cache, state, Some(&mut current), at)?;
        cache.table[current as usize * self.stride + class] = next;

        Ok(next)
    }

    /// Computes the state reached from `sid` after reading `byte`.
    fn compute(
        &self,
        cache: &mut DfaCache,
        sid: StateId,
        byte: Option<u8>,
    ) -> State {
        let DfaCache { states, stack, visited, next, .. } = cache;
        let current = &states[sid as usize];

        let byte_ctx = byte.map_or(ByteCtx::Edge, ByteCtx::of);

        // Assertions are evaluated at the position between the last byte
        // read and the next one, regardless of the search direction.
        let (left, right) = if self.prog.reverse {
            (byte_ctx, current.ctx)
        } else {
            (current.ctx, byte_ctx)
        };

        let mut is_match = false;

        next.clear();
        visited.clear();
        stack.clear();

        'seeds: for seed in current.insts.iter() {
            stack.push(*seed);
            while let Some(mut ip) = stack.pop() {
                loop {
                    if !visited.insert(ip) {
                        break;
                    }
                    match self.prog.insts[ip] {
                        Inst::Match => {
                            is_match = true;
                            if self.kind == MatchKind::LeftmostFirst {
                                stack.clear();
                                break 'seeds;
                            }
                            break;
                        }
                        Inst::Byte(_) | Inst::Range(..) | Inst::Class(_) => {
                            if let Some(b) = byte {
                                if self.prog.accepts(ip, b) {
                                    next.push(ip + 1);
                                }
                            }
                            break;
                        }
                        Inst::Look(look) => {
                            if !look.matches_ctx(left, right) {
                                break;
                            }
                            ip += 1;
                        }
                        Inst::Save(_) => {
                            ip += 1;
                        }
                        Inst::Split(a, b) => {
                            stack.push(b);
                            ip = a;
                        }
                        Inst::Jump(target) => {
                            ip = target;
                        }
                    }
                }
            }
        }

        let ctx = if next.is_empty() {
            ByteCtx::Edge
        } else {
            self.ctx_for(byte)
        };

        State { insts: next.as_slice().into(), ctx, is_match }
    }

    /// Adds a state to the cache, returning its identifier. If the state
    /// already exists, the existing identifier is returned.
    ///
    /// When the cache is full it is cleared, and `current` is updated with
    /// the new identifier of the state it refers to.
    fn add_state(
        &self,
        cache: &mut DfaCache,
        state: State,
        current: Option<&mut StateId>,
        at: usize,
    ) -> Result<StateId, GaveUp> {
        if let Some(sid) = cache.map.get(&state) {
            return Ok(*sid);
        }

        let cost = state_cost(&state, self.stride);

        if cache.memory_usage + cost > self.size_limit {
            self.clear_cache(cache, current, at)?;
            if let Some(sid) = cache.map.get(&state) {
                return Ok(*sid);
            }
            if cache.memory_usage + cost > self.size_limit {
                return Err(GaveUp);
            }
        }

        Ok(cache.push(state, self.stride))
    }

    fn clear_cache(
        &self,
        cache: &mut DfaCache,
        current: Option<&mut StateId>,
        at: usize,
    ) -> Result<(), GaveUp> {
        if cache.clears >= MIN_CLEARS {
            let searched = at.abs_diff(cache.clear_at);
            if searched < MIN_BYTES_PER_STATE * cache.states.len() {
                debug!(
                    "Lazy DFA cache thrashing: {} clears, {} states",
                    cache.clears,
                    cache.states.len()
                );
                return Err(GaveUp);
            }
        }

        debug!(
            "Clearing lazy DFA cache at offset {}: {} states, {} bytes",
            at,
            cache.states.len(),
            cache.memory_usage
        );

        let saved =
            current.as_ref().map(|sid| cache.states[**sid as usize].clone());

        cache.reset(self.stride);
        cache.clears += 1;
        cache.clear_at = at;

        if let (Some(current), Some(state)) = (current, saved) {
            *current = match cache.map.get(&state) {
                Some(sid) => *sid,
                None => cache.push(state, self.stride),
            };
        }

        Ok(())
    }
}
