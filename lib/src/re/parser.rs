use regex_syntax as re;

use crate::errors::Error;
use crate::re::hir::Hir;

/// A regular expression parser.
///
/// Takes the source code of a regular expression and produces its
/// corresponding [`Hir`]. The parsing itself is done by `regex_syntax`, this
/// type configures it and translates its errors.
pub(crate) struct Parser {
    case_insensitive: bool,
    multi_line: bool,
    dot_matches_new_line: bool,
    swap_greed: bool,
    ignore_whitespace: bool,
    unicode: bool,
    octal: bool,
    nest_limit: u32,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            case_insensitive: false,
            multi_line: false,
            dot_matches_new_line: false,
            swap_greed: false,
            ignore_whitespace: false,
            unicode: true,
            octal: false,
            nest_limit: crate::config::DEFAULT_NEST_LIMIT,
        }
    }

    /// Makes the regexp case-insensitive by default, as if it started with
    /// `(?i)`.
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    /// `^` and `$` match at the start and end of lines.
    pub fn multi_line(mut self, yes: bool) -> Self {
        self.multi_line = yes;
        self
    }

    /// `.` matches every character, including `\n`.
    pub fn dot_matches_new_line(mut self, yes: bool) -> Self {
        self.dot_matches_new_line = yes;
        self
    }

    /// Swaps the meaning of `x*` and `x*?`.
    pub fn swap_greed(mut self, yes: bool) -> Self {
        self.swap_greed = yes;
        self
    }

    /// Whitespaces in the pattern are ignored, and `#` starts a comment.
    pub fn ignore_whitespace(mut self, yes: bool) -> Self {
        self.ignore_whitespace = yes;
        self
    }

    /// Enables Unicode-aware classes and case folding. When disabled, classes
    /// like `\w` or `.` match bytes instead of codepoints.
    pub fn unicode(mut self, yes: bool) -> Self {
        self.unicode = yes;
        self
    }

    /// Accepts octal escapes like `\141`.
    pub fn octal(mut self, yes: bool) -> Self {
        self.octal = yes;
        self
    }

    /// Maximum nesting depth allowed in the pattern.
    pub fn nest_limit(mut self, limit: u32) -> Self {
        self.nest_limit = limit;
        self
    }

    /// Parses the regexp and returns its HIR.
    pub fn parse(&self, pattern: &str) -> Result<Hir, Error> {
        let mut parser = re::ast::parse::ParserBuilder::new()
            .ignore_whitespace(self.ignore_whitespace)
            .octal(self.octal)
            .nest_limit(self.nest_limit)
            .build();

        let ast = parser.parse(pattern).map_err(|err| {
            let span = err.span().start.offset..err.span().end.offset;
            let msg = err.kind().to_string();
            match err.kind() {
                re::ast::ErrorKind::UnsupportedBackreference
                | re::ast::ErrorKind::UnsupportedLookAround => {
                    Error::Unsupported { msg, span }
                }
                _ => Error::Syntax { msg, span },
            }
        })?;

        // `utf8` is disabled so that `(?-u:\xFF)` and similar constructs that
        // match arbitrary bytes are accepted. Unicode-aware classes always
        // match valid UTF-8 sequences anyway.
        let mut translator = re::hir::translate::TranslatorBuilder::new()
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .swap_greed(self.swap_greed)
            .unicode(self.unicode)
            .utf8(false)
            .build();

        let hir = translator.translate(pattern, &ast).map_err(|err| {
            Error::Syntax {
                msg: err.kind().to_string(),
                span: err.span().start.offset..err.span().end.offset,
            }
        })?;

        Ok(Hir::from(hir))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Parser;
    use crate::errors::Error;

    fn syntax_error(pattern: &str) -> String {
        match Parser::new().parse(pattern) {
            Err(Error::Syntax { msg, .. }) => msg,
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn syntax_errors() {
        assert!(syntax_error("(").contains("unclosed group"));
        assert!(syntax_error("[a-z").contains("unclosed character class"));
        assert!(syntax_error(r"\j").contains("unrecognized escape sequence"));
        assert!(syntax_error("a{2,1}")
            .contains("invalid repetition count range"));
        assert!(syntax_error(r"\p{Foo}").contains("Unicode property not found"));
        assert!(syntax_error("(?z)").contains("unrecognized flag"));
    }

    #[test]
    fn error_span() {
        match Parser::new().parse("abc(") {
            Err(Error::Syntax { span, .. }) => assert_eq!(span, 3..4),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn unsupported() {
        assert!(matches!(
            Parser::new().parse(r"(a)\1"),
            Err(Error::Unsupported { .. })
        ));
        assert!(matches!(
            Parser::new().parse(r"(?=a)"),
            Err(Error::Unsupported { .. })
        ));
    }

    #[test]
    fn unicode_disabled() {
        assert!(Parser::new().unicode(false).parse(r"\pL").is_err());
        assert!(Parser::new().unicode(false).parse(r"\xFF").is_ok());
        assert!(Parser::new().parse(r"(?-u:\xFF)").is_ok());
    }

    #[test]
    fn nest_limit() {
        assert!(Parser::new().nest_limit(1).parse("(((a)))").is_err());
        assert!(Parser::new().nest_limit(10).parse("(((a)))").is_ok());
    }

    #[test]
    fn octal() {
        assert!(Parser::new().parse(r"\141").is_err());
        assert!(Parser::new().octal(true).parse(r"\141").is_ok());
    }
}
