//! Match counts on "The Adventures of Sherlock Holmes".
//!
//! The corpus is not distributed with the crate. Its path is taken from the
//! `RURE_SHERLOCK_PATH` environment variable, and defaults to
//! `testdata/sherlock.txt`. The test is ignored by default, run it with
//! `cargo test -- --ignored` once the corpus is in place.

use std::path::PathBuf;

use pretty_assertions::assert_eq;

const COUNTS: &[(&str, usize)] = &[
    (r"Sherlock", 97),
    (r"Holmes", 461),
    (r"Sherlock Holmes", 91),
    (r"(?i)Sherlock", 102),
    (r"(?i)Holmes", 467),
    (r"(?i)Sherlock Holmes", 96),
    (r"Sherlock\s+Holmes", 97),
    (r"Sherlock|Street", 158),
    (r"Sherlock|Holmes", 558),
    (r"Sherlock|Holmes|Watson|Irene|Adler|John|Baker", 740),
    (r"(?i)Sherlock|Holmes|Watson|Irene|Adler|John|Baker", 753),
    (r"Sher[a-z]+|Hol[a-z]+", 582),
    (r"(?i)Sher[a-z]+|Hol[a-z]+", 697),
    (r"Sherlock|Holmes|Watson", 639),
    (r"(?i)Sherlock|Holmes|Watson", 650),
    (r"zqj", 0),
    (r"aqj", 0),
    (r"aei", 0),
    (r"the", 7218),
    (r"The", 741),
    (r"(?i)the", 7987),
    (r"the\s+\w+", 5410),
    (r".*", 13053),
    (r"(?s).*", 1),
    (r"\p{L}", 447160),
    (r"\p{Lu}", 14180),
    (r"\p{Ll}", 432980),
    (r"\w+", 109214),
    (r"\w+\s+Holmes", 319),
    (r"Holmes.{0,25}Watson|Watson.{0,25}Holmes", 7),
    (r"Holmes(?:\s*.+\s*){0,10}Watson|Watson(?:\s*.+\s*){0,10}Holmes", 51),
    (r#"["'][^"']{0,30}[?!.]["']"#, 767),
    (r"(?m)^Sherlock Holmes|Sherlock Holmes$", 34),
    (r"(?-u:\b)\w+n(?-u:\b)", 8366),
    (r"[a-q][^u-z]{13}x", 142),
    (r"[a-zA-Z]+ing", 2824),
    (r"\s[a-zA-Z]{0,12}ing\s", 2081),
];

fn corpus() -> Vec<u8> {
    let path = match std::env::var_os("RURE_SHERLOCK_PATH") {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join("sherlock.txt"),
    };
    std::fs::read(&path).unwrap_or_else(|err| {
        panic!(
            "can't read the Sherlock Holmes corpus at {}: {}",
            path.display(),
            err
        )
    })
}

#[test]
#[ignore = "needs the Sherlock Holmes corpus, see RURE_SHERLOCK_PATH"]
fn sherlock_counts() {
    let haystack = corpus();

    for (pattern, expected) in COUNTS {
        let re = rure::Regex::new(pattern).unwrap();
        assert_eq!(
            re.find_iter(&haystack).count(),
            *expected,
            "pattern: `{}`",
            pattern
        );
    }
}
