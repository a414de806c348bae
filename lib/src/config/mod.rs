/*! Compilation options.

[`Options`] can be built in code with its builder-style setters, or loaded
from a TOML file with [`load_options_from_file`]. Keys missing from the file
keep their default values, for example:

```toml
size_limit = 20971520
dfa_size_limit = 4194304
```
*/

use std::path::Path;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default value for [`Options::size_limit`] (10 MiB).
pub const DEFAULT_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Default value for [`Options::dfa_size_limit`] (2 MiB).
pub const DEFAULT_DFA_SIZE_LIMIT: usize = 2 * (1 << 20);

/// Default value for [`Options::nest_limit`].
pub const DEFAULT_NEST_LIMIT: u32 = 250;

/// Options that control the compilation of a regular expression.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Maximum size, in bytes, of the compiled program.
    pub size_limit: usize,
    /// Maximum size, in bytes, of the lazy DFA cache. The limit applies to
    /// each thread concurrently using the same regular expression. Zero
    /// disables the lazy DFA.
    pub dfa_size_limit: usize,
    /// Maximum nesting depth of groups, classes and repetitions.
    pub nest_limit: u32,
    /// Interpret `\1`...`\777` as octal escapes instead of rejecting them as
    /// backreferences.
    pub octal: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            size_limit: DEFAULT_SIZE_LIMIT,
            dfa_size_limit: DEFAULT_DFA_SIZE_LIMIT,
            nest_limit: DEFAULT_NEST_LIMIT,
            octal: false,
        }
    }
}

impl Options {
    /// Creates options with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum size of the compiled program.
    pub fn size_limit(mut self, limit: usize) -> Self {
        self.size_limit = limit;
        self
    }

    /// Sets the maximum size of the lazy DFA cache.
    pub fn dfa_size_limit(mut self, limit: usize) -> Self {
        self.dfa_size_limit = limit;
        self
    }

    /// Sets the maximum nesting depth.
    pub fn nest_limit(mut self, limit: u32) -> Self {
        self.nest_limit = limit;
        self
    }

    /// Enables octal escapes.
    pub fn octal(mut self, yes: bool) -> Self {
        self.octal = yes;
        self
    }
}

/// Load options from a given path. Path must contain a valid TOML file or
/// this function will propagate the error.
pub fn load_options_from_file(
    options_file: &Path,
) -> Result<Options, figment::Error> {
    let options: Options =
        Figment::from(Serialized::defaults(Options::default()))
            .merge(Toml::file_exact(options_file))
            .extract()?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::{load_options_from_file, Options};

    #[test]
    fn defaults() {
        let options = Options::default();
        assert_eq!(options.size_limit, 10 * 1024 * 1024);
        assert_eq!(options.dfa_size_limit, 2 * 1024 * 1024);
        assert_eq!(options.nest_limit, 250);
        assert!(!options.octal);
    }

    #[test]
    fn builder() {
        let options = Options::new().size_limit(100).dfa_size_limit(0);
        assert_eq!(options.size_limit, 100);
        assert_eq!(options.dfa_size_limit, 0);
        assert_eq!(options.nest_limit, 250);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dfa_size_limit = 4096").unwrap();
        writeln!(file, "octal = true").unwrap();

        let options = load_options_from_file(file.path()).unwrap();

        assert_eq!(
            options,
            Options::default().dfa_size_limit(4096).octal(true)
        );
    }

    #[test]
    fn unknown_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_states = 10").unwrap();
        assert!(load_options_from_file(file.path()).is_err());
    }
}
