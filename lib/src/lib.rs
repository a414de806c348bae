/*! A regular expression engine that guarantees linear-time matching.

The syntax of the regular expressions is the one supported by the
[`regex-syntax`][1] crate, minus the constructs that can't be matched in
linear time, like backreferences and look-around. Patterns are UTF-8, but
haystacks are arbitrary bytes. When the Unicode flag is enabled (the
default), character classes match whole UTF-8 sequences and never match
invalid UTF-8.

The main type in this crate is [`Regex`], which is obtained by compiling a
pattern. Searches are carried out by one of several matching engines (a lazy
DFA, a one-pass DFA, a bounded backtracker and a Pike VM), the fastest one
that is able to handle each search is chosen automatically.

# Example

```rust
let re = rure::Regex::new(r"(?P<word>\w+)\s+(\w+)").unwrap();
let caps = re.captures(b"hello world").unwrap();

assert_eq!(caps.get(0).unwrap().range(), 0..11);
assert_eq!(caps.name("word").unwrap().range(), 0..5);
assert_eq!(caps.get(2).unwrap().range(), 6..11);
```

[1]: https://docs.rs/regex-syntax
*/

pub use config::load_options_from_file;
pub use config::Options;
pub use config::DEFAULT_DFA_SIZE_LIMIT;
pub use config::DEFAULT_NEST_LIMIT;
pub use config::DEFAULT_SIZE_LIMIT;

pub use errors::Error;

pub use flags::default_flags;
pub use flags::Flag;
pub use flags::FlagSet;
pub use flags::FLAG_CASEI;
pub use flags::FLAG_DEFAULT;
pub use flags::FLAG_DOTNL;
pub use flags::FLAG_MULTI;
pub use flags::FLAG_SPACE;
pub use flags::FLAG_SWAP_GREED;
pub use flags::FLAG_UNICODE;

pub use regex::escape;
pub use regex::CaptureMatches;
pub use regex::CaptureNames;
pub use regex::Captures;
pub use regex::IterState;
pub use regex::Match;
pub use regex::Matches;
pub use regex::Regex;

pub mod config;
pub mod flags;

mod errors;
mod re;
mod regex;
