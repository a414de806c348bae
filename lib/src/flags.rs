/*! Compilation flags.

Flags set the initial state of the options that a pattern can toggle with
`(?flags)`, `(?-flags)` and `(?flags:...)`. For instance, compiling `a(?-i)b`
with [`Flag::CaseInsensitive`] matches `Ab` but not `AB`.

The numeric values of the flags are part of the C API, they are exposed as
the `FLAG_*` constants.
*/

use bitmask::bitmask;

/// Bit for [`Flag::CaseInsensitive`].
pub const FLAG_CASEI: u32 = 1 << 0;
/// Bit for [`Flag::MultiLine`].
pub const FLAG_MULTI: u32 = 1 << 1;
/// Bit for [`Flag::DotMatchesNewLine`].
pub const FLAG_DOTNL: u32 = 1 << 2;
/// Bit for [`Flag::SwapGreed`].
pub const FLAG_SWAP_GREED: u32 = 1 << 3;
/// Bit for [`Flag::IgnoreWhitespace`].
pub const FLAG_SPACE: u32 = 1 << 4;
/// Bit for [`Flag::Unicode`].
pub const FLAG_UNICODE: u32 = 1 << 5;
/// Flags used when none are given: only Unicode support is enabled.
pub const FLAG_DEFAULT: u32 = FLAG_UNICODE;

bitmask! {
    /// Set of compilation flags.
    ///
    /// * `CaseInsensitive`: case-insensitive matching (`i`).
    /// * `MultiLine`: `^` and `$` match at line boundaries (`m`).
    /// * `DotMatchesNewLine`: `.` matches `\n` too (`s`).
    /// * `SwapGreed`: greedy repetitions become lazy and vice versa (`U`).
    /// * `IgnoreWhitespace`: whitespace and `#` comments in the pattern are
    ///   ignored (`x`).
    /// * `Unicode`: classes, `.`, `\w` and `\b` operate on Unicode codepoints
    ///   and only match valid UTF-8 (`u`).
    #[derive(Debug)]
    pub mask FlagSet: u32 where flags Flag {
        CaseInsensitive   = 0x01,
        MultiLine         = 0x02,
        DotMatchesNewLine = 0x04,
        SwapGreed         = 0x08,
        IgnoreWhitespace  = 0x10,
        Unicode           = 0x20,
    }
}

impl FlagSet {
    /// Builds a flag set from its numeric representation. Unknown bits are
    /// ignored.
    pub fn from_bits(bits: u32) -> FlagSet {
        let mut flags = FlagSet::none();
        let table = [
            (FLAG_CASEI, Flag::CaseInsensitive),
            (FLAG_MULTI, Flag::MultiLine),
            (FLAG_DOTNL, Flag::DotMatchesNewLine),
            (FLAG_SWAP_GREED, Flag::SwapGreed),
            (FLAG_SPACE, Flag::IgnoreWhitespace),
            (FLAG_UNICODE, Flag::Unicode),
        ];
        for (bit, flag) in table {
            if bits & bit != 0 {
                flags.set(flag);
            }
        }
        flags
    }
}

/// Returns the flags used by [`crate::Regex::new`], where only
/// [`Flag::Unicode`] is set.
pub fn default_flags() -> FlagSet {
    FlagSet::from_bits(FLAG_DEFAULT)
}
