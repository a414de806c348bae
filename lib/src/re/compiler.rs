/*!
This module provides a compiler that takes a regex's [`Hir`] and produces a
[`Program`] that can be executed by any of the matching engines.

The compiler can produce two kinds of programs, one that matches the regexp
left-to-right (the forward program), and another one that matches it
right-to-left (the reverse program). The reverse program is used by the
lazy DFA for finding where a match starts once the forward program found
where it ends. Reverse programs don't record capture groups.

The code produced for each HIR node falls through to the instruction that
follows it when it matches. Forward jumps are emitted with a placeholder
target, and patched once the target is known.
*/

use std::mem::size_of;

use regex_syntax::hir::{self, Class, HirKind};

use crate::errors::Error;
use crate::re::hir::Hir;
use crate::re::instr::{
    ByteClassSet, ByteSet, Inst, InstPtr, Look, LookSet, Program,
};
use crate::re::utf8::Utf8Node;

/// Compiles a [`Hir`] into a [`Program`].
pub(crate) struct Compiler {
    insts: Vec<Inst>,
    classes: Vec<ByteSet>,
    byte_class_set: ByteClassSet,
    looks: LookSet,
    reverse: bool,
    size_limit: usize,
    /// Memory used by things other than instructions and classes, like
    /// capture group metadata.
    extra_size: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            insts: Vec::new(),
            classes: Vec::new(),
            byte_class_set: ByteClassSet::new(),
            looks: LookSet::empty(),
            reverse: false,
            size_limit: crate::config::DEFAULT_SIZE_LIMIT,
            extra_size: 0,
        }
    }

    /// Produces a program that matches the regexp right-to-left.
    pub fn reverse(mut self, yes: bool) -> Self {
        self.reverse = yes;
        self
    }

    /// Maximum size in bytes of the produced program.
    pub fn size_limit(mut self, limit: usize) -> Self {
        self.size_limit = limit;
        self
    }

    /// Compiles the regexp.
    pub fn compile(mut self, hir: &Hir) -> Result<Program, Error> {
        let slots = if self.reverse { 2 } else { hir.captures_len() * 2 };

        // Capture slots and group names are carried by every compiled
        // regexp, and count towards the size limit.
        self.extra_size = hir.captures_len()
            * (size_of::<Option<String>>() + 2 * size_of::<Option<usize>>());

        // The unanchored start is a lazy `(?s-u:.)*?` that precedes the
        // anchored start.
        let start_unanchored = self.emit(Inst::Split(0, 0))?;
        self.emit_range(0x00, 0xff)?;
        self.emit(Inst::Jump(start_unanchored))?;

        let start_anchored = self.location();
        self.patch(
            start_unanchored,
            Inst::Split(start_anchored, start_unanchored + 1),
        );

        if !self.reverse {
            self.emit(Inst::Save(0))?;
        }

        self.c(hir.inner())?;

        if !self.reverse {
            self.emit(Inst::Save(1))?;
        }

        self.emit(Inst::Match)?;

        if !self.looks.is_empty() {
            self.byte_class_set.set_look_bytes();
        }

        // The lazy DFA gives up when it finds a non-ASCII byte in a program
        // with Unicode word boundaries. Non-ASCII bytes must be in their own
        // classes for that.
        if self.looks.contains_unicode_word() {
            self.byte_class_set.set_range(0x00, 0x7f);
        }

        Ok(Program {
            insts: self.insts,
            classes: self.classes,
            start_anchored,
            start_unanchored,
            byte_classes: self.byte_class_set.byte_classes(),
            slots,
            looks: self.looks,
            reverse: self.reverse,
        })
    }

    /// Returns the location where the next instruction will be emitted.
    #[inline]
    fn location(&self) -> InstPtr {
        self.insts.len()
    }

    fn memory_usage(&self) -> usize {
        self.insts.len() * size_of::<Inst>()
            + self.classes.len() * size_of::<ByteSet>()
            + self.extra_size
    }

    fn emit(&mut self, inst: Inst) -> Result<InstPtr, Error> {
        let location = self.location();
        self.insts.push(inst);
        let size = self.memory_usage();
        if size > self.size_limit {
            return Err(Error::TooLarge { size, limit: self.size_limit });
        }
        Ok(location)
    }

    fn patch(&mut self, location: InstPtr, inst: Inst) {
        self.insts[location] = inst;
    }

    /// Emits a split at `location` that jumps to `location + 1` and `exit`,
    /// giving priority to the former if `greedy` is true.
    fn patch_split(&mut self, location: InstPtr, exit: InstPtr, greedy: bool) {
        let inst = if greedy {
            Inst::Split(location + 1, exit)
        } else {
            Inst::Split(exit, location + 1)
        };
        self.patch(location, inst);
    }

    fn emit_range(&mut self, start: u8, end: u8) -> Result<InstPtr, Error> {
        self.byte_class_set.set_range(start, end);
        if start == end {
            self.emit(Inst::Byte(start))
        } else {
            self.emit(Inst::Range(start, end))
        }
    }

    fn emit_class(&mut self, ranges: &[(u8, u8)]) -> Result<InstPtr, Error> {
        if let [(start, end)] = ranges {
            return self.emit_range(*start, *end);
        }

        let mut set = ByteSet::ZERO;
        for (start, end) in ranges {
            for b in *start..=*end {
                set.set(b as usize, true);
            }
        }

        self.byte_class_set.set_bytes(&set);

        let id = match self.classes.iter().position(|class| *class == set) {
            Some(id) => id,
            None => {
                self.classes.push(set);
                self.classes.len() - 1
            }
        };

        self.emit(Inst::Class(id))
    }

    fn emit_look(&mut self, look: &hir::Look) -> Result<InstPtr, Error> {
        let look = match look {
            hir::Look::Start => Look::Start,
            hir::Look::End => Look::End,
            hir::Look::StartLF => Look::StartLF,
            hir::Look::EndLF => Look::EndLF,
            hir::Look::StartCRLF => Look::StartCRLF,
            hir::Look::EndCRLF => Look::EndCRLF,
            hir::Look::WordAscii => Look::WordAscii,
            hir::Look::WordAsciiNegate => Look::WordAsciiNegate,
            hir::Look::WordUnicode => Look::WordUnicode,
            hir::Look::WordUnicodeNegate => Look::WordUnicodeNegate,
            hir::Look::WordStartAscii => Look::WordStartAscii,
            hir::Look::WordEndAscii => Look::WordEndAscii,
            hir::Look::WordStartUnicode => Look::WordStartUnicode,
            hir::Look::WordEndUnicode => Look::WordEndUnicode,
            hir::Look::WordStartHalfAscii => Look::WordStartHalfAscii,
            hir::Look::WordEndHalfAscii => Look::WordEndHalfAscii,
            hir::Look::WordStartHalfUnicode => Look::WordStartHalfUnicode,
            hir::Look::WordEndHalfUnicode => Look::WordEndHalfUnicode,
            #[allow(unreachable_patterns)]
            other => {
                return Err(Error::Unsupported {
                    msg: format!("unsupported assertion: {:?}", other),
                    span: 0..0,
                })
            }
        };
        self.looks.insert(look);
        self.emit(Inst::Look(look))
    }

    fn c(&mut self, hir: &hir::Hir) -> Result<(), Error> {
        match hir.kind() {
            HirKind::Empty => {}
            HirKind::Literal(literal) => {
                if self.reverse {
                    for b in literal.0.iter().rev() {
                        self.emit_range(*b, *b)?;
                    }
                } else {
                    for b in literal.0.iter() {
                        self.emit_range(*b, *b)?;
                    }
                }
            }
            HirKind::Class(Class::Bytes(class)) => {
                let ranges: Vec<(u8, u8)> =
                    class.iter().map(|r| (r.start(), r.end())).collect();
                self.emit_class(&ranges)?;
            }
            HirKind::Class(Class::Unicode(class)) => {
                let is_ascii =
                    class.ranges().last().map_or(true, |r| r.end() <= '\x7f');
                if is_ascii {
                    let ranges: Vec<(u8, u8)> = class
                        .iter()
                        .map(|r| (r.start() as u8, r.end() as u8))
                        .collect();
                    self.emit_class(&ranges)?;
                } else {
                    let trie = Utf8Node::from_class(class, self.reverse);
                    self.c_utf8_trie(&trie)?;
                }
            }
            HirKind::Look(look) => {
                self.emit_look(look)?;
            }
            HirKind::Repetition(rep) => {
                self.c_repetition(rep)?;
            }
            HirKind::Capture(cap) => {
                if self.reverse {
                    self.c(&cap.sub)?;
                } else {
                    let slot = cap.index as usize * 2;
                    self.emit(Inst::Save(slot))?;
                    self.c(&cap.sub)?;
                    self.emit(Inst::Save(slot + 1))?;
                }
            }
            HirKind::Concat(subs) => {
                if self.reverse {
                    for sub in subs.iter().rev() {
                        self.c(sub)?;
                    }
                } else {
                    for sub in subs {
                        self.c(sub)?;
                    }
                }
            }
            HirKind::Alternation(alternatives) => {
                self.c_alternation(alternatives)?;
            }
        }
        Ok(())
    }

    /// Emits code for an alternation. For `a|b|c` the code is:
    ///
    /// ```text
    ///     SPLIT l1, l2
    /// l1: a
    ///     JUMP end
    /// l2: SPLIT l3, l4
    /// l3: b
    ///     JUMP end
    /// l4: c
    /// end:
    /// ```
    fn c_alternation(&mut self, alternatives: &[hir::Hir]) -> Result<(), Error> {
        let mut jumps_to_end = Vec::with_capacity(alternatives.len());

        for (i, alternative) in alternatives.iter().enumerate() {
            if i + 1 < alternatives.len() {
                let split = self.emit(Inst::Split(0, 0))?;
                self.c(alternative)?;
                jumps_to_end.push(self.emit(Inst::Jump(0))?);
                let next = self.location();
                self.patch(split, Inst::Split(split + 1, next));
            } else {
                self.c(alternative)?;
            }
        }

        let end = self.location();

        for jump in jumps_to_end {
            self.patch(jump, Inst::Jump(end));
        }

        Ok(())
    }

    fn c_repetition(&mut self, rep: &hir::Repetition) -> Result<(), Error> {
        match (rep.min, rep.max) {
            // e* where e can match the empty string, which is emitted as
            // (e+)? so that the empty iteration of e is preferred over
            // skipping e in the same way it would be in e+.
            (0, None) if rep.sub.properties().minimum_len() == Some(0) => {
                let split = self.emit(Inst::Split(0, 0))?;
                let body = self.location();
                self.c(&rep.sub)?;
                let repeat = self.emit(Inst::Split(0, 0))?;
                let end = self.location();
                self.patch_split(split, end, rep.greedy);
                let inst = if rep.greedy {
                    Inst::Split(body, end)
                } else {
                    Inst::Split(end, body)
                };
                self.patch(repeat, inst);
            }
            // e*
            (0, None) => {
                let split = self.emit(Inst::Split(0, 0))?;
                self.c(&rep.sub)?;
                self.emit(Inst::Jump(split))?;
                let end = self.location();
                self.patch_split(split, end, rep.greedy);
            }
            // e{n,}, which is emitted as n-1 copies of e followed by e+.
            (min, None) => {
                for _ in 0..min - 1 {
                    self.c(&rep.sub)?;
                }
                let body = self.location();
                self.c(&rep.sub)?;
                let split = self.emit(Inst::Split(0, 0))?;
                let end = self.location();
                let inst = if rep.greedy {
                    Inst::Split(body, end)
                } else {
                    Inst::Split(end, body)
                };
                self.patch(split, inst);
            }
            // e{n,m}, which is emitted as n copies of e followed by m-n
            // optional copies of e. All the optional copies exit to the
            // same location.
            (min, Some(max)) => {
                for _ in 0..min {
                    self.c(&rep.sub)?;
                }
                let mut splits = Vec::new();
                for _ in min..max {
                    splits.push(self.emit(Inst::Split(0, 0))?);
                    self.c(&rep.sub)?;
                }
                let end = self.location();
                for split in splits {
                    self.patch_split(split, end, rep.greedy);
                }
            }
        }
        Ok(())
    }

    fn c_utf8_trie(&mut self, trie: &Utf8Node) -> Result<(), Error> {
        let mut jumps_to_end = Vec::new();

        self.c_utf8_node(trie, &mut jumps_to_end)?;

        // The last jump is not necessary if it jumps to the next instruction.
        if let Some(last) = jumps_to_end.last() {
            if *last + 1 == self.location() {
                self.insts.pop();
                jumps_to_end.pop();
            }
        }

        let end = self.location();

        for jump in jumps_to_end {
            self.patch(jump, Inst::Jump(end));
        }

        Ok(())
    }

    fn c_utf8_node(
        &mut self,
        node: &Utf8Node,
        jumps_to_end: &mut Vec<InstPtr>,
    ) -> Result<(), Error> {
        let n = node.transitions.len();

        // A class that matches nothing.
        if n == 0 {
            self.emit_class(&[])?;
            return Ok(());
        }

        for (i, transition) in node.transitions.iter().enumerate() {
            let split = if i + 1 < n {
                Some(self.emit(Inst::Split(0, 0))?)
            } else {
                None
            };

            self.emit_range(transition.start, transition.end)?;

            match &transition.next {
                Some(next) => self.c_utf8_node(next, jumps_to_end)?,
                None => jumps_to_end.push(self.emit(Inst::Jump(0))?),
            }

            if let Some(split) = split {
                let next = self.location();
                self.patch(split, Inst::Split(split + 1, next));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
