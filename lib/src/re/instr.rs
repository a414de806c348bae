/*!
This module defines the instructions executed by the matching engines, along
with the [`Program`] type that holds a sequence of them.

Every instruction that consumes input consumes exactly one byte. Unicode
classes are compiled down to sequences of byte ranges (see [`crate::re::utf8`])
so that the engines never need to decode UTF-8 while matching. Zero-width
assertions like `^`, `$` or `\b` are represented by [`Inst::Look`], and the
boundaries of capture groups by [`Inst::Save`].

Control flow is expressed with [`Inst::Split`] and [`Inst::Jump`]. Targets are
absolute indexes within the program, never pointers, so programs are free of
ownership cycles even though they contain loops. Any instruction that is not
a split or a jump falls through to the next one.

A program can be printed in a human-readable form, which is used extensively
in tests:

```text
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: LIT 0x61
00005: SAVE 1
00006: MATCH
```
*/

use std::fmt::{Display, Formatter};
use std::mem::size_of;

use bitvec::array::BitArray;

/// Index of an instruction within a [`Program`].
pub(crate) type InstPtr = usize;

/// Index of a byte class within [`Program::classes`].
pub(crate) type ClassId = usize;

/// A set of bytes, represented as a 256-bits bitmap.
pub(crate) type ByteSet = BitArray<[u64; 4]>;

/// Instructions supported by the matching engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Inst {
    /// A match has been found.
    Match,
    /// Matches a specific byte.
    Byte(u8),
    /// Matches any byte in the inclusive range.
    Range(u8, u8),
    /// Matches any byte in the class identified by [`ClassId`]. Used for
    /// classes that can't be expressed as a single range.
    Class(ClassId),
    /// Zero-width assertion.
    Look(Look),
    /// Stores the current position in the given capture slot. Slots `2*g` and
    /// `2*g+1` hold the start and end of group `g`.
    Save(usize),
    /// Continues at both targets. The first target has higher priority than
    /// the second one, which is what implements leftmost-first semantics and
    /// the difference between greedy and lazy repetitions.
    Split(InstPtr, InstPtr),
    /// Unconditional jump.
    Jump(InstPtr),
}

impl Inst {
    /// Returns true if the instruction consumes a byte from the input.
    #[inline]
    pub fn is_consuming(&self) -> bool {
        matches!(self, Inst::Byte(_) | Inst::Range(..) | Inst::Class(_))
    }
}

/// Zero-width assertions.
///
/// Every assertion is evaluated looking at most at one byte before the
/// current position and one byte after it, except the Unicode word boundary
/// assertions, which need to decode the characters around the position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Look {
    /// Start of the haystack (`\A`, or `^` without the `m` flag).
    Start,
    /// End of the haystack (`\z`, or `$` without the `m` flag).
    End,
    /// Start of a line, where lines are terminated by `\n`.
    StartLF,
    /// End of a line, where lines are terminated by `\n`.
    EndLF,
    /// Start of a line, where lines are terminated by `\r`, `\n` or `\r\n`.
    StartCRLF,
    /// End of a line, where lines are terminated by `\r`, `\n` or `\r\n`.
    EndCRLF,
    /// ASCII word boundary (`(?-u:\b)`).
    WordAscii,
    /// Negation of ASCII word boundary (`(?-u:\B)`).
    WordAsciiNegate,
    /// Unicode word boundary (`\b`).
    WordUnicode,
    /// Negation of Unicode word boundary (`\B`).
    WordUnicodeNegate,
    /// Start of an ASCII word.
    WordStartAscii,
    /// End of an ASCII word.
    WordEndAscii,
    /// Start of a Unicode word.
    WordStartUnicode,
    /// End of a Unicode word.
    WordEndUnicode,
    /// Position not preceded by an ASCII word character.
    WordStartHalfAscii,
    /// Position not followed by an ASCII word character.
    WordEndHalfAscii,
    /// Position not preceded by a Unicode word character.
    WordStartHalfUnicode,
    /// Position not followed by a Unicode word character.
    WordEndHalfUnicode,
}

impl Look {
    const ALL: [Look; 18] = [
        Look::Start,
        Look::End,
        Look::StartLF,
        Look::EndLF,
        Look::StartCRLF,
        Look::EndCRLF,
        Look::WordAscii,
        Look::WordAsciiNegate,
        Look::WordUnicode,
        Look::WordUnicodeNegate,
        Look::WordStartAscii,
        Look::WordEndAscii,
        Look::WordStartUnicode,
        Look::WordEndUnicode,
        Look::WordStartHalfAscii,
        Look::WordEndHalfAscii,
        Look::WordStartHalfUnicode,
        Look::WordEndHalfUnicode,
    ];

    #[inline]
    fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Returns true if the assertion needs Unicode-aware word characters.
    pub fn is_unicode_word(self) -> bool {
        matches!(
            self,
            Look::WordUnicode
                | Look::WordUnicodeNegate
                | Look::WordStartUnicode
                | Look::WordEndUnicode
                | Look::WordStartHalfUnicode
                | Look::WordEndHalfUnicode
        )
    }

    /// Evaluates the assertion at position `at` of `haystack`.
    ///
    /// The whole haystack is always visible, even when the search is limited
    /// to a sub-range of it.
    pub fn matches(self, haystack: &[u8], at: usize) -> bool {
        if self.is_unicode_word() {
            let before = is_word_char_rev(haystack, at);
            let after = is_word_char_fwd(haystack, at);
            return match self {
                Look::WordUnicode => before != after,
                Look::WordUnicodeNegate => before == after,
                Look::WordStartUnicode => !before && after,
                Look::WordEndUnicode => before && !after,
                Look::WordStartHalfUnicode => !before,
                Look::WordEndHalfUnicode => !after,
                _ => unreachable!(),
            };
        }
        let left = if at == 0 {
            ByteCtx::Edge
        } else {
            haystack.get(at - 1).map_or(ByteCtx::Edge, |b| ByteCtx::of(*b))
        };
        let right = haystack.get(at).map_or(ByteCtx::Edge, |b| ByteCtx::of(*b));
        self.matches_ctx(left, right)
    }

    /// Evaluates the assertion given a summary of the bytes at both sides of
    /// the current position. Unicode word assertions are evaluated as if they
    /// were ASCII ones, callers that care about the difference must make sure
    /// that both bytes are ASCII.
    pub fn matches_ctx(self, left: ByteCtx, right: ByteCtx) -> bool {
        let lw = left == ByteCtx::Word;
        let rw = right == ByteCtx::Word;
        match self {
            Look::Start => left == ByteCtx::Edge,
            Look::End => right == ByteCtx::Edge,
            Look::StartLF => matches!(left, ByteCtx::Edge | ByteCtx::LF),
            Look::EndLF => matches!(right, ByteCtx::Edge | ByteCtx::LF),
            Look::StartCRLF => match left {
                ByteCtx::Edge | ByteCtx::LF => true,
                ByteCtx::CR => right != ByteCtx::LF,
                _ => false,
            },
            Look::EndCRLF => match right {
                ByteCtx::Edge | ByteCtx::CR => true,
                ByteCtx::LF => left != ByteCtx::CR,
                _ => false,
            },
            Look::WordAscii | Look::WordUnicode => lw != rw,
            Look::WordAsciiNegate | Look::WordUnicodeNegate => lw == rw,
            Look::WordStartAscii | Look::WordStartUnicode => !lw && rw,
            Look::WordEndAscii | Look::WordEndUnicode => lw && !rw,
            Look::WordStartHalfAscii | Look::WordStartHalfUnicode => !lw,
            Look::WordEndHalfAscii | Look::WordEndHalfUnicode => !rw,
        }
    }

    /// Returns the name used in program listings.
    fn as_str(&self) -> &'static str {
        match self {
            Look::Start => "START",
            Look::End => "END",
            Look::StartLF => "START_LINE",
            Look::EndLF => "END_LINE",
            Look::StartCRLF => "START_LINE_CRLF",
            Look::EndCRLF => "END_LINE_CRLF",
            Look::WordAscii => "WORD_BOUNDARY_ASCII",
            Look::WordAsciiNegate => "WORD_BOUNDARY_ASCII_NEG",
            Look::WordUnicode => "WORD_BOUNDARY",
            Look::WordUnicodeNegate => "WORD_BOUNDARY_NEG",
            Look::WordStartAscii => "WORD_START_ASCII",
            Look::WordEndAscii => "WORD_END_ASCII",
            Look::WordStartUnicode => "WORD_START",
            Look::WordEndUnicode => "WORD_END",
            Look::WordStartHalfAscii => "WORD_START_HALF_ASCII",
            Look::WordEndHalfAscii => "WORD_END_HALF_ASCII",
            Look::WordStartHalfUnicode => "WORD_START_HALF",
            Look::WordEndHalfUnicode => "WORD_END_HALF",
        }
    }
}

/// Returns true if the character that ends right before `at` is a Unicode
/// word character. Invalid UTF-8 is never a word character.
fn is_word_char_rev(haystack: &[u8], at: usize) -> bool {
    let (ch, _) = bstr::decode_last_utf8(&haystack[..at.min(haystack.len())]);
    ch.map_or(false, |c| {
        regex_syntax::try_is_word_character(c).unwrap_or(false)
    })
}

/// Returns true if the character that starts at `at` is a Unicode word
/// character. Invalid UTF-8 is never a word character.
fn is_word_char_fwd(haystack: &[u8], at: usize) -> bool {
    let (ch, _) = bstr::decode_utf8(haystack.get(at..).unwrap_or(&[]));
    ch.map_or(false, |c| {
        regex_syntax::try_is_word_character(c).unwrap_or(false)
    })
}

/// Summary of a byte, or of the lack of it, that is enough for evaluating
/// every assertion except the Unicode word boundaries over non-ASCII text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub(crate) enum ByteCtx {
    /// There's no byte, we are at one of the edges of the haystack.
    Edge = 0,
    /// The byte is `\n`.
    LF = 1,
    /// The byte is `\r`.
    CR = 2,
    /// The byte is an ASCII word character (`[0-9A-Za-z_]`).
    Word = 3,
    /// Any other byte.
    Other = 4,
}

impl ByteCtx {
    pub const COUNT: usize = 5;

    #[inline]
    pub fn of(byte: u8) -> Self {
        match byte {
            b'\n' => ByteCtx::LF,
            b'\r' => ByteCtx::CR,
            b if regex_syntax::is_word_byte(b) => ByteCtx::Word,
            _ => ByteCtx::Other,
        }
    }
}

/// A set of [`Look`] assertions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct LookSet(u32);

impl LookSet {
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn insert(&mut self, look: Look) {
        self.0 |= look.bit();
    }

    #[inline]
    pub fn contains(&self, look: Look) -> bool {
        self.0 & look.bit() != 0
    }

    #[inline]
    pub fn union(self, other: LookSet) -> LookSet {
        LookSet(self.0 | other.0)
    }

    /// Returns an iterator over the assertions in the set.
    pub fn iter(self) -> impl Iterator<Item = Look> {
        Look::ALL.into_iter().filter(move |look| self.contains(*look))
    }

    pub fn contains_unicode_word(&self) -> bool {
        self.iter().any(|look| look.is_unicode_word())
    }

    /// Returns true if all the assertions in the set hold at position `at`.
    #[inline]
    pub fn matches(&self, haystack: &[u8], at: usize) -> bool {
        self.is_empty() || self.iter().all(|look| look.matches(haystack, at))
    }
}

/// Maps every possible byte to an equivalence class.
///
/// Two bytes are in the same class if no instruction in the program is able
/// to distinguish between them. DFAs use these classes as their alphabet,
/// which makes their transition tables much smaller than with one
/// transition per byte.
#[derive(Clone, Debug)]
pub(crate) struct ByteClasses([u8; 256]);

impl ByteClasses {
    /// Returns the class of a given byte.
    #[inline(always)]
    pub fn get(&self, byte: u8) -> usize {
        self.0[byte as usize] as usize
    }

    /// Returns the number of classes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0[255] as usize + 1
    }

    /// Returns one representative byte for each class, in class order.
    pub fn representatives(&self) -> impl Iterator<Item = u8> + '_ {
        let mut last = None;
        (0..=255_u8).filter(move |b| {
            let class = self.0[*b as usize];
            if last == Some(class) {
                false
            } else {
                last = Some(class);
                true
            }
        })
    }
}

/// Builds a [`ByteClasses`] by recording the boundaries of every byte range
/// used in the program.
#[derive(Clone, Debug, Default)]
pub(crate) struct ByteClassSet(BitArray<[u64; 4]>);

impl ByteClassSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indicates that bytes in `start..=end` must be in classes different
    /// from the bytes outside the range.
    pub fn set_range(&mut self, start: u8, end: u8) {
        debug_assert!(start <= end);
        if start > 0 {
            self.0.set(start as usize - 1, true);
        }
        self.0.set(end as usize, true);
    }

    /// Separates the bytes that are relevant for evaluating assertions: line
    /// terminators and ASCII word characters.
    pub fn set_look_bytes(&mut self) {
        self.set_range(b'\n', b'\n');
        self.set_range(b'\r', b'\r');
        let mut b = 0_u16;
        while b <= 255 {
            let byte = b as u8;
            if regex_syntax::is_word_byte(byte) {
                let start = byte;
                let mut end = byte;
                while end < 255 && regex_syntax::is_word_byte(end + 1) {
                    end += 1;
                }
                self.set_range(start, end);
                b = end as u16 + 1;
            } else {
                b += 1;
            }
        }
    }

    pub fn set_bytes(&mut self, bytes: &ByteSet) {
        let mut iter = bytes.iter_ones().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            self.set_range(start as u8, end as u8);
        }
    }

    pub fn byte_classes(&self) -> ByteClasses {
        let mut classes = [0_u8; 256];
        let mut class = 0_u8;
        for b in 0..256 {
            classes[b] = class;
            if self.0[b] && b < 255 {
                class += 1;
            }
        }
        ByteClasses(classes)
    }
}

/// A compiled regular expression, ready to be executed by any of the
/// matching engines.
#[derive(Clone, Debug)]
pub(crate) struct Program {
    /// The instructions.
    pub insts: Vec<Inst>,
    /// Byte sets used by [`Inst::Class`] instructions.
    pub classes: Vec<ByteSet>,
    /// Where the execution starts for anchored searches.
    pub start_anchored: InstPtr,
    /// Where the execution starts for unanchored searches. The code at this
    /// location is equivalent to a lazy `(?s-u:.)*?` followed by the code
    /// at `start_anchored`.
    pub start_unanchored: InstPtr,
    /// Equivalence classes of bytes.
    pub byte_classes: ByteClasses,
    /// Number of capture slots, which is twice the number of groups. Reverse
    /// programs don't record captures and this is always 2 for them.
    pub slots: usize,
    /// Union of all assertions used in the program.
    pub looks: LookSet,
    /// True if this program matches the reverse of the regular expression.
    pub reverse: bool,
}

impl Program {
    /// Returns the number of instructions.
    #[inline]
    pub fn len(&self) -> usize {
        self.insts.len()
    }

    /// Approximated amount of heap memory used by the program.
    pub fn memory_usage(&self) -> usize {
        self.insts.len() * size_of::<Inst>()
            + self.classes.len() * size_of::<ByteSet>()
    }

    /// Returns true if the instruction at `ip` accepts `byte`.
    #[inline(always)]
    pub fn accepts(&self, ip: InstPtr, byte: u8) -> bool {
        match self.insts[ip] {
            Inst::Byte(b) => b == byte,
            Inst::Range(start, end) => start <= byte && byte <= end,
            Inst::Class(id) => self.classes[id][byte as usize],
            _ => false,
        }
    }

    /// Returns true if the program contains any Unicode word boundary
    /// assertion. The lazy DFA can't handle those when they are next to
    /// non-ASCII bytes.
    #[inline]
    pub fn has_unicode_word_boundary(&self) -> bool {
        self.looks.contains_unicode_word()
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        for (ip, inst) in self.insts.iter().enumerate() {
            write!(f, "{:05}: ", ip)?;
            match inst {
                Inst::Match => writeln!(f, "MATCH")?,
                Inst::Byte(b) => writeln!(f, "LIT {:#04x}", b)?,
                Inst::Range(start, end) => {
                    writeln!(f, "RANGE {:#04x}-{:#04x}", start, end)?
                }
                Inst::Class(id) => {
                    write!(f, "CLASS")?;
                    for b in self.classes[*id].iter_ones() {
                        write!(f, " {:#04x}", b)?;
                    }
                    writeln!(f)?
                }
                Inst::Look(look) => writeln!(f, "{}", look.as_str())?,
                Inst::Save(slot) => writeln!(f, "SAVE {}", slot)?,
                Inst::Split(a, b) => writeln!(f, "SPLIT {:05}, {:05}", a, b)?,
                Inst::Jump(target) => writeln!(f, "JUMP {:05}", target)?,
            }
        }
        Ok(())
    }
}
