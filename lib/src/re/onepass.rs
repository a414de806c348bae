/*!
A one-pass DFA that reports capture groups.

A regexp is one-pass when, while matching it left-to-right, there's at most
one way to continue after reading each byte. For instance, `(\w+)\s+(\w+)`
is one-pass because `\w` and `\s` never match the same byte, while `a*a` is
not, because after reading an `a` it's not known whether the `a` matched by
`a*` or by the final `a`.

For one-pass regexps the positions where capture groups start and end can be
determined by a DFA, without the need of keeping multiple threads with
their own capture slots, like the Pike VM does. Each transition in the DFA
carries the set of slots that must be updated when the transition is taken,
and the assertions that must hold for taking it.

This DFA only executes anchored searches. The caller is responsible for
knowing where the match starts, which happens when the regexp is anchored
or after the lazy DFA found the bounds of the match.
*/

use std::mem::size_of;

use crate::re::bitmapset::BitmapSet;
use crate::re::instr::{ByteClasses, Inst, InstPtr, LookSet, Program};
use crate::re::Input;

/// Maximum size in bytes of the transition table.
const MAX_TABLE_SIZE: usize = 1 << 20;

/// Identifier used in [`Transition::next`] when there's no transition.
const NONE: u32 = u32::MAX;

/// A set of capture slots, one bit per slot. Only regexps with at most
/// 64 slots (32 groups) are supported.
type SlotMask = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Transition {
    /// Next state, or [`NONE`].
    next: u32,
    /// Slots that receive the current position when this transition is
    /// taken.
    slots: SlotMask,
    /// Assertions that must hold at the current position.
    looks: LookSet,
    /// True if the transition has higher priority than the match in the
    /// same state. Transitions with lower priority are not followed once
    /// that match is found.
    before_match: bool,
}

impl Transition {
    const EMPTY: Transition = Transition {
        next: NONE,
        slots: 0,
        looks: LookSet::empty(),
        before_match: false,
    };
}

#[derive(Clone, Copy, Debug)]
struct MatchInfo {
    slots: SlotMask,
    looks: LookSet,
}

/// A one-pass DFA built from a forward [`Program`].
#[derive(Debug, Clone)]
pub(crate) struct OnePass {
    /// Transitions, `stride` per state.
    table: Vec<Transition>,
    /// Information about the match reachable from each state, if any.
    matches: Vec<Option<MatchInfo>>,
    stride: usize,
    slots: usize,
    classes: ByteClasses,
}

/// Scratch memory for [`OnePass::search`].
#[derive(Debug, Clone, Default)]
pub(crate) struct OnePassCache {
    caps: Vec<Option<usize>>,
}

impl OnePassCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OnePass {
    /// Builds a one-pass DFA for the program. Returns `None` if the program
    /// is not one-pass, has too many capture slots, or the DFA would be too
    /// large.
    pub fn new(prog: &Program) -> Option<Self> {
        if prog.reverse || prog.slots > SlotMask::BITS as usize {
            return None;
        }

        let num_classes = prog.byte_classes.len();
        let representatives: Vec<u8> =
            prog.byte_classes.representatives().collect();

        let mut builder = Builder {
            prog,
            stride: num_classes,
            table: Vec::new(),
            matches: Vec::new(),
            state_of: vec![NONE; prog.len()],
            pending: Vec::new(),
            visited: BitmapSet::new(prog.len()),
            stack: Vec::new(),
        };

        builder.state_for(prog.start_anchored)?;

        while let Some((state, pc)) = builder.pending.pop() {
            builder.build_state(state, pc, &representatives)?;
        }

        Some(Self {
            table: builder.table,
            matches: builder.matches,
            stride: num_classes,
            slots: prog.slots,
            classes: prog.byte_classes.clone(),
        })
    }

    /// Finds the leftmost-first match that starts at `input.start`, and
    /// writes its capture slots into `slots`.
    pub fn search(
        &self,
        cache: &mut OnePassCache,
        input: &Input,
        slots: &mut [Option<usize>],
    ) -> bool {
        let caps = &mut cache.caps;
        caps.clear();
        caps.resize(self.slots, None);

        let mut matched = false;
        let mut state = 0_usize;
        let mut at = input.start;

        loop {
            let mut matched_here = false;

            if let Some(m) = &self.matches[state] {
                if m.looks.matches(input.haystack, at) {
                    copy_slots(slots, caps);
                    set_slots(slots, m.slots, at);
                    matched = true;
                    matched_here = true;
                }
            }

            if at >= input.end {
                break;
            }

            let class = self.classes.get(input.haystack[at]);
            let t = &self.table[state * self.stride + class];

            if t.next == NONE
                || (matched_here && !t.before_match)
                || !t.looks.matches(input.haystack, at)
            {
                break;
            }

            set_slots(caps, t.slots, at);
            state = t.next as usize;
            at += 1;
        }

        matched
    }

    /// Approximated amount of heap memory used by the DFA.
    pub fn memory_usage(&self) -> usize {
        self.table.len() * size_of::<Transition>()
            + self.matches.len() * size_of::<Option<MatchInfo>>()
    }
}

fn copy_slots(dst: &mut [Option<usize>], src: &[Option<usize>]) {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
}

fn set_slots(slots: &mut [Option<usize>], mask: SlotMask, at: usize) {
    let mut mask = mask;
    while mask != 0 {
        let slot = mask.trailing_zeros() as usize;
        if let Some(s) = slots.get_mut(slot) {
            *s = Some(at);
        }
        mask &= mask - 1;
    }
}

struct Builder<'r> {
    prog: &'r Program,
    stride: usize,
    table: Vec<Transition>,
    matches: Vec<Option<MatchInfo>>,
    /// DFA state for each instruction that starts a state.
    state_of: Vec<u32>,
    /// States that haven't been built yet.
    pending: Vec<(usize, InstPtr)>,
    visited: BitmapSet,
    stack: Vec<(InstPtr, SlotMask, LookSet)>,
}

impl<'r> Builder<'r> {
    /// Returns the state that starts at instruction `pc`, creating it if
    /// it doesn't exist yet.
    fn state_for(&mut self, pc: InstPtr) -> Option<u32> {
        if self.state_of[pc] != NONE {
            return Some(self.state_of[pc]);
        }
        let state = self.matches.len();
        if (state + 1) * self.stride * size_of::<Transition>() > MAX_TABLE_SIZE
        {
            return None;
        }
        self.table.resize(self.table.len() + self.stride, Transition::EMPTY);
        self.matches.push(None);
        self.state_of[pc] = state as u32;
        self.pending.push((state, pc));
        Some(state as u32)
    }

    /// Fills the transitions of `state` by following every path that
    /// starts at `pc`, in priority order.
    fn build_state(
        &mut self,
        state: usize,
        pc: InstPtr,
        representatives: &[u8],
    ) -> Option<()> {
        self.visited.clear();
        self.stack.clear();
        self.stack.push((pc, 0, LookSet::empty()));

        while let Some((mut ip, mut slots, mut looks)) = self.stack.pop() {
            loop {
                // Reaching the same instruction through two different paths
                // means that the choice is not determined by the input.
                if !self.visited.insert(ip) {
                    return None;
                }
                match self.prog.insts[ip] {
                    Inst::Match => {
                        if self.matches[state].is_some() {
                            return None;
                        }
                        self.matches[state] = Some(MatchInfo { slots, looks });
                        break;
                    }
                    Inst::Byte(_) | Inst::Range(..) | Inst::Class(_) => {
                        let next = self.state_for(ip + 1)?;
                        let before_match = self.matches[state].is_none();
                        let t = Transition { next, slots, looks, before_match };
                        for (class, b) in representatives.iter().enumerate() {
                            if !self.prog.accepts(ip, *b) {
                                continue;
                            }
                            let entry =
                                &mut self.table[state * self.stride + class];
                            if entry.next == NONE {
                                *entry = t;
                            } else if *entry != t {
                                return None;
                            }
                        }
                        break;
                    }
                    Inst::Look(look) => {
                        looks.insert(look);
                        ip += 1;
                    }
                    Inst::Save(slot) => {
                        if slot < self.prog.slots {
                            slots |= 1 << slot;
                        }
                        ip += 1;
                    }
                    Inst::Split(a, b) => {
                        self.stack.push((b, slots, looks));
                        ip = a;
                    }
                    Inst::Jump(target) => {
                        ip = target;
                    }
                }
            }
        }

        Some(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{OnePass, OnePassCache};
    use crate::re::compiler::Compiler;
    use crate::re::instr::Program;
    use crate::re::parser::Parser;
    use crate::re::Input;

    fn compile(pattern: &str) -> Program {
        let hir = Parser::new().parse(pattern).unwrap();
        Compiler::new().compile(&hir).unwrap()
    }

    fn search(pattern: &str, haystack: &[u8]) -> Option<Vec<Option<usize>>> {
        let prog = compile(pattern);
        let onepass = OnePass::new(&prog).unwrap();
        let mut slots = vec![None; prog.slots];
        let mut cache = OnePassCache::new();
        onepass
            .search(&mut cache, &Input::new(haystack), &mut slots)
            .then_some(slots)
    }

    #[test]
    fn is_one_pass() {
        assert!(OnePass::new(&compile("([a-z]+) ([a-z]+)")).is_some());
        assert!(OnePass::new(&compile("a(b|c)d")).is_some());
        assert!(OnePass::new(&compile("a*a")).is_none());
        assert!(OnePass::new(&compile("(a|ab)")).is_none());
        assert!(OnePass::new(&compile("(a*)*")).is_none());
    }

    #[test]
    fn captures() {
        assert_eq!(
            search("([a-z]+) ([a-z]+)", b"hello world!"),
            Some(vec![Some(0), Some(11), Some(0), Some(5), Some(6), Some(11)])
        );
        assert_eq!(
            search("a(b|c)d", b"acd"),
            Some(vec![Some(0), Some(3), Some(1), Some(2)])
        );
        assert_eq!(search("a(b|c)d", b"aed"), None);
        assert_eq!(
            search("(?:(a)|b)+", b"ab"),
            Some(vec![Some(0), Some(2), Some(0), Some(1)])
        );
    }

    #[test]
    fn greediness() {
        assert_eq!(search("a+", b"aaa"), Some(vec![Some(0), Some(3)]));
        assert_eq!(search("a+?", b"aaa"), Some(vec![Some(0), Some(1)]));
        assert_eq!(search("ab?", b"ab"), Some(vec![Some(0), Some(2)]));
        assert_eq!(search("ab??", b"ab"), Some(vec![Some(0), Some(1)]));
    }

    #[test]
    fn looks() {
        assert_eq!(search(r"a\b", b"a b"), Some(vec![Some(0), Some(1)]));
        assert_eq!(search(r"a\b", b"ab"), None);
        assert_eq!(search(r"^a$", b"a"), Some(vec![Some(0), Some(1)]));
        assert_eq!(search(r"^a$", b"ab"), None);
    }
}
