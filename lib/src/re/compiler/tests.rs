use pretty_assertions::assert_eq;

use super::Compiler;
use crate::errors::Error;
use crate::re::parser::Parser;

macro_rules! assert_re_code {
    ($re:expr, $fwd:expr, $bck:expr) => {{
        let hir = Parser::new().parse($re).unwrap();

        let fwd_code = Compiler::new().compile(&hir).unwrap();
        let bck_code = Compiler::new().reverse(true).compile(&hir).unwrap();

        assert_eq!($fwd, fwd_code.to_string());
        assert_eq!($bck, bck_code.to_string());
    }};
}

#[test]
fn re_code_1() {
    assert_re_code!(
        "abc",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: LIT 0x61
00005: LIT 0x62
00006: LIT 0x63
00007: SAVE 1
00008: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: LIT 0x63
00004: LIT 0x62
00005: LIT 0x61
00006: MATCH
"#
    );
}

#[test]
fn re_code_2() {
    assert_re_code!(
        "ab|cd|ef",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: SPLIT 00005, 00008
00005: LIT 0x61
00006: LIT 0x62
00007: JUMP 00014
00008: SPLIT 00009, 00012
00009: LIT 0x63
00010: LIT 0x64
00011: JUMP 00014
00012: LIT 0x65
00013: LIT 0x66
00014: SAVE 1
00015: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SPLIT 00004, 00007
00004: LIT 0x62
00005: LIT 0x61
00006: JUMP 00013
00007: SPLIT 00008, 00011
00008: LIT 0x64
00009: LIT 0x63
00010: JUMP 00013
00011: LIT 0x66
00012: LIT 0x65
00013: MATCH
"#
    );
}

#[test]
fn re_code_3() {
    assert_re_code!(
        "a*",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: SPLIT 00005, 00007
00005: LIT 0x61
00006: JUMP 00004
00007: SAVE 1
00008: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SPLIT 00004, 00006
00004: LIT 0x61
00005: JUMP 00003
00006: MATCH
"#
    );
}

#[test]
fn re_code_4() {
    assert_re_code!(
        "a*?",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: SPLIT 00007, 00005
00005: LIT 0x61
00006: JUMP 00004
00007: SAVE 1
00008: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SPLIT 00006, 00004
00004: LIT 0x61
00005: JUMP 00003
00006: MATCH
"#
    );
}

#[test]
fn re_code_5() {
    assert_re_code!(
        "a+",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: LIT 0x61
00005: SPLIT 00004, 00006
00006: SAVE 1
00007: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: LIT 0x61
00004: SPLIT 00003, 00005
00005: MATCH
"#
    );
}

#[test]
fn re_code_6() {
    assert_re_code!(
        "a{2,3}",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: LIT 0x61
00005: LIT 0x61
00006: SPLIT 00007, 00008
00007: LIT 0x61
00008: SAVE 1
00009: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: LIT 0x61
00004: LIT 0x61
00005: SPLIT 00006, 00007
00006: LIT 0x61
00007: MATCH
"#
    );
}

#[test]
fn re_code_7() {
    assert_re_code!(
        "(a)(?P<x>b)",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: SAVE 2
00005: LIT 0x61
00006: SAVE 3
00007: SAVE 4
00008: LIT 0x62
00009: SAVE 5
00010: SAVE 1
00011: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: LIT 0x62
00004: LIT 0x61
00005: MATCH
"#
    );
}

#[test]
fn re_code_8() {
    assert_re_code!(
        r"^a$",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: START
00005: LIT 0x61
00006: END
00007: SAVE 1
00008: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: END
00004: LIT 0x61
00005: START
00006: MATCH
"#
    );
}

#[test]
fn re_code_9() {
    assert_re_code!(
        "[a-c][ace](?i)x",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: RANGE 0x61-0x63
00005: CLASS 0x61 0x63 0x65
00006: CLASS 0x58 0x78
00007: SAVE 1
00008: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: CLASS 0x58 0x78
00004: CLASS 0x61 0x63 0x65
00005: RANGE 0x61-0x63
00006: MATCH
"#
    );
}

#[test]
fn re_code_10() {
    assert_re_code!(
        "[a☃]",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: SPLIT 00005, 00007
00005: LIT 0x61
00006: JUMP 00010
00007: LIT 0xe2
00008: LIT 0x98
00009: LIT 0x83
00010: SAVE 1
00011: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SPLIT 00004, 00006
00004: LIT 0x61
00005: JUMP 00009
00006: LIT 0x83
00007: LIT 0x98
00008: LIT 0xe2
00009: MATCH
"#
    );
}

#[test]
fn re_code_11() {
    assert_re_code!(
        "[α-β]",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: LIT 0xce
00005: RANGE 0xb1-0xb2
00006: SAVE 1
00007: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: RANGE 0xb1-0xb2
00004: LIT 0xce
00005: MATCH
"#
    );
}

#[test]
fn re_code_12() {
    assert_re_code!(
        "(a*)*",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: SPLIT 00005, 00011
00005: SAVE 2
00006: SPLIT 00007, 00009
00007: LIT 0x61
00008: JUMP 00006
00009: SAVE 3
00010: SPLIT 00005, 00011
00011: SAVE 1
00012: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SPLIT 00004, 00008
00004: SPLIT 00005, 00007
00005: LIT 0x61
00006: JUMP 00004
00007: SPLIT 00004, 00008
00008: MATCH
"#
    );
}

#[test]
fn re_code_13() {
    assert_re_code!(
        "(a*)*?",
        // Forward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SAVE 0
00004: SPLIT 00011, 00005
00005: SAVE 2
00006: SPLIT 00007, 00009
00007: LIT 0x61
00008: JUMP 00006
00009: SAVE 3
00010: SPLIT 00011, 00005
00011: SAVE 1
00012: MATCH
"#,
        // Backward code
        r#"
00000: SPLIT 00003, 00001
00001: RANGE 0x00-0xff
00002: JUMP 00000
00003: SPLIT 00008, 00004
00004: SPLIT 00005, 00007
00005: LIT 0x61
00006: JUMP 00004
00007: SPLIT 00008, 00004
00008: MATCH
"#
    );
}

#[test]
fn byte_classes() {
    let hir = Parser::new().parse("a").unwrap();
    let program = Compiler::new().compile(&hir).unwrap();

    assert_eq!(program.byte_classes.len(), 3);
    assert_eq!(program.byte_classes.get(0x00), 0);
    assert_eq!(program.byte_classes.get(0x60), 0);
    assert_eq!(program.byte_classes.get(b'a'), 1);
    assert_eq!(program.byte_classes.get(0x62), 2);
    assert_eq!(program.byte_classes.get(0xff), 2);

    let hir = Parser::new().parse(r"\bx").unwrap();
    let program = Compiler::new().compile(&hir).unwrap();

    // Non-ASCII bytes are never in the same class than ASCII ones when
    // there are Unicode word boundaries.
    assert_ne!(
        program.byte_classes.get(0x7f),
        program.byte_classes.get(0x80)
    );
    assert_ne!(
        program.byte_classes.get(b'\n'),
        program.byte_classes.get(b'\t')
    );
}

#[test]
fn slots() {
    let hir = Parser::new().parse("(a)(b)(?:c)").unwrap();
    assert_eq!(Compiler::new().compile(&hir).unwrap().slots, 6);
    assert_eq!(Compiler::new().reverse(true).compile(&hir).unwrap().slots, 2);
}

#[test]
fn too_large() {
    let hir = Parser::new().parse(r"\pL{100}").unwrap();
    let err = Compiler::new().size_limit(1000).compile(&hir).unwrap_err();

    assert!(matches!(err, Error::TooLarge { limit: 1000, .. }));
    assert!(err.to_string().starts_with("compiled program too large"));
}
