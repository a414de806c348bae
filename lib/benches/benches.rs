use criterion::{
    black_box, criterion_group, criterion_main, Criterion, Throughput,
};

macro_rules! gen_bench {
    ($name:ident, $desc:literal, $pattern:literal, $haystack:expr, $expected:expr) => {
        fn $name(c: &mut Criterion) {
            let re = rure::Regex::new($pattern).unwrap();
            let haystack: Vec<u8> = $haystack;

            c.bench_function($desc, |b| {
                b.iter(|| {
                    assert_eq!(
                        re.is_match(black_box(&haystack)),
                        $expected
                    );
                })
            });
        }
    };
}

gen_bench!(
    bench_literal,
    "Literal",
    "y",
    [&"x".repeat(50), "y"].concat().into_bytes(),
    true
);

gen_bench!(
    bench_not_literal,
    "Not literal",
    ".y",
    [&"x".repeat(50), "y"].concat().into_bytes(),
    true
);

gen_bench!(
    bench_match_class,
    "Match class",
    "[abcdw]",
    [&"xxxx".repeat(20), "w"].concat().into_bytes(),
    true
);

gen_bench!(
    bench_match_class_in_range,
    "Match class (in range)",
    "[ac]",
    [&"bbbb".repeat(20), "c"].concat().into_bytes(),
    true
);

gen_bench!(
    bench_anchored_literal_short_non_match,
    "Anchored literal (short, non-match)",
    "^zbc(d|e)",
    b"abcdefghijklmnopqrstuvwxyz".to_vec(),
    false
);

gen_bench!(
    bench_anchored_literal_long_non_match,
    "Anchored literal (long, non-match)",
    "^zbc(d|e)",
    b"abcdefghijklmnopqrstuvwxyz".repeat(1 << 15),
    false
);

gen_bench!(
    bench_anchored_short_match,
    "Anchored (short, match)",
    "^.bc(d|e)",
    b"abcdefghijklmnopqrstuvwxyz".to_vec(),
    true
);

gen_bench!(
    bench_anchored_long_match,
    "Anchored (long, match)",
    "^.bc(d|e)",
    b"abcdefghijklmnopqrstuvwxyz".repeat(1 << 15),
    true
);

gen_bench!(
    bench_one_pass_short_a,
    "One-pass (short A)",
    "^.bc(d|e)*$",
    b"abcddddddeeeededd".to_vec(),
    true
);

gen_bench!(
    bench_not_one_pass_short_a,
    "Not one-pass (short A)",
    ".bc(d|e)*$",
    b"abcddddddeeeededd".to_vec(),
    true
);

gen_bench!(
    bench_one_pass_short_b,
    "One-pass (short B)",
    "^.bc(?:d|e)*$",
    b"abcddddddeeeededd".to_vec(),
    true
);

gen_bench!(
    bench_not_one_pass_short_b,
    "Not one-pass (short B)",
    ".bc(?:d|e)*$",
    b"abcddddddeeeededd".to_vec(),
    true
);

gen_bench!(
    bench_one_pass_long_prefix,
    "One-pass (long prefix)",
    "^abcdefghijklmnopqrstuvwxyz.*$",
    b"abcdefghijklmnopqrstuvwxyz".to_vec(),
    true
);

gen_bench!(
    bench_one_pass_long_not_prefix,
    "One-pass (long, not prefix)",
    "^.bcdefghijklmnopqrstuvwxyz.*$",
    b"abcdefghijklmnopqrstuvwxyz".to_vec(),
    true
);

/// Pseudo-random printable text with a newline every 31 bytes on average.
fn make_text(n: usize) -> Vec<u8> {
    let mut text = Vec::with_capacity(n);
    let mut x = u32::MAX;
    for _ in 0..n {
        x = x.wrapping_add(x);
        x ^= 1;
        if (x as i32) < 0 {
            x ^= 0x88888eef;
        }
        if x % 31 == 0 {
            text.push(b'\n');
        } else {
            text.push((x % (0x7E + 1 - 0x20) + 0x20) as u8);
        }
    }
    text
}

fn bench_throughput(c: &mut Criterion) {
    let cases = [
        ("easy0", "ABCDEFGHIJKLMNOPQRSTUVWXYZ$"),
        ("easy0i", "(?i)ABCDEFGHIJklmnopqrstuvwxyz$"),
        ("easy1", "A[AB]B[BC]C[CD]D[DE]E[EF]F[FG]G[GH]H[HI]I[IJ]J$"),
        ("medium", "[XYZ]ABCDEFGHIJKLMNOPQRSTUVWXYZ$"),
        ("hard", "[ -~]*ABCDEFGHIJKLMNOPQRSTUVWXYZ$"),
        (
            "hard1",
            "ABCD|CDEF|EFGH|GHIJ|IJKL|KLMN|MNOP|OPQR|QRST|STUV|UVWX|WXYZ",
        ),
    ];

    let sizes = [("32", 32), ("1K", 1 << 10), ("32K", 32 << 10), ("1M", 1 << 20)];

    for (name, pattern) in cases {
        let re = rure::Regex::new(pattern).unwrap();
        let mut group = c.benchmark_group(format!("Match {}", name));
        for (size_name, size) in sizes {
            let text = make_text(size);
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_function(size_name, |b| {
                b.iter(|| assert!(!re.is_match(black_box(&text))))
            });
        }
        group.finish();
    }
}

fn bench_sherlock(c: &mut Criterion) {
    let path = std::env::var_os("RURE_SHERLOCK_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| {
            std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("testdata/sherlock.txt")
        });

    let haystack = match std::fs::read(path) {
        Ok(haystack) => haystack,
        Err(_) => return,
    };

    let queries = [
        ("Sherlock", r"Sherlock", 97),
        ("Holmes", r"Holmes", 461),
        ("Sherlock Holmes (case-insensitive)", r"(?i)Sherlock Holmes", 96),
        ("Name alternation", r"Sherlock|Holmes|Watson", 639),
        ("Words", r"\w+", 109214),
        ("Letters", r"\p{L}", 447160),
        ("Before Holmes", r"\w+\s+Holmes", 319),
        ("Quotes", r#"["'][^"']{0,30}[?!.]["']"#, 767),
    ];

    let mut group = c.benchmark_group("Sherlock");
    group.sample_size(10);
    group.throughput(Throughput::Bytes(haystack.len() as u64));

    for (name, pattern, expected) in queries {
        let re = rure::Regex::new(pattern).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| assert_eq!(re.find_iter(&haystack).count(), expected))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_literal,
    bench_not_literal,
    bench_match_class,
    bench_match_class_in_range,
    bench_anchored_literal_short_non_match,
    bench_anchored_literal_long_non_match,
    bench_anchored_short_match,
    bench_anchored_long_match,
    bench_one_pass_short_a,
    bench_not_one_pass_short_a,
    bench_one_pass_short_b,
    bench_not_one_pass_short_b,
    bench_one_pass_long_prefix,
    bench_one_pass_long_not_prefix,
    bench_throughput,
    bench_sherlock,
);

criterion_main!(benches);
