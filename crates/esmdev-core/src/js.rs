//! JavaScript syntax helpers shared by the transforms.
//!
//! Sources are parsed with SWC purely to locate things (specifiers, top-level
//! declarations). Output is produced by splicing byte ranges of the original
//! text, so code that is not rewritten comes back byte-identical.

use crate::error::Error;
use std::fmt::Write;
use std::ops::Range;
use swc_common::{sync::Lrc, FileName, Globals, SourceMap, Span, GLOBALS};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax};

/// A parsed ES module together with the offset needed to map spans back
/// onto the source text.
#[derive(Debug)]
pub struct ParsedModule {
    pub module: Module,
    base: u32,
}

impl ParsedModule {
    /// Byte range in the original source covered by `span`.
    #[must_use]
    pub fn range(&self, span: Span) -> Range<usize> {
        (span.lo.0 - self.base) as usize..(span.hi.0 - self.base) as usize
    }
}

/// Parse `source` as an ES module. `file` is only used in error messages.
pub fn parse_module(source: &str, file: &str) -> Result<ParsedModule, Error> {
    let cm: Lrc<SourceMap> = Lrc::default();
    let fm = cm.new_source_file(
        Lrc::new(FileName::Custom(file.to_string())),
        source.to_string(),
    );

    GLOBALS.set(&Globals::default(), || {
        let lexer = Lexer::new(
            Syntax::Es(EsSyntax::default()),
            EsVersion::EsNext,
            StringInput::from(&*fm),
            None,
        );
        let mut parser = Parser::new_from(lexer);

        let module = parser
            .parse_module()
            .map_err(|e| Error::parse(file, format!("{:?}", e.kind())))?;

        let errors: Vec<String> = parser
            .take_errors()
            .into_iter()
            .map(|e| format!("{:?}", e.kind()))
            .collect();
        if !errors.is_empty() {
            return Err(Error::parse(file, errors.join(", ")));
        }

        Ok(ParsedModule {
            module,
            base: fm.start_pos.0,
        })
    })
}

/// Replace each range in `source` with its replacement text.
///
/// Ranges must not overlap; they may be given in any order.
#[must_use]
pub fn splice(source: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(source.len() + edits.len() * 16);
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&source[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Render `value` as a double-quoted JavaScript string literal.
///
/// Quotes, backslashes, line terminators and other control characters are
/// escaped so the literal is valid no matter what the input contains.
#[must_use]
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_module_ok() {
        let parsed = parse_module("import x from 'y';\nexport const z = x;", "a.js").unwrap();
        assert_eq!(parsed.module.body.len(), 2);
    }

    #[test]
    fn test_parse_module_error_names_file() {
        let err = parse_module("const = ;", "broken.js").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("broken.js"));
    }

    #[test]
    fn test_range_maps_back_to_source() {
        use swc_common::Spanned;

        let source = "const a = 1;\nlet b = 2;";
        let parsed = parse_module(source, "a.js").unwrap();
        let second = parsed.range(parsed.module.body[1].span());
        assert!(source[second].starts_with("let b = 2"));
    }

    #[test]
    fn test_splice_out_of_order() {
        let out = splice(
            "abcdef",
            vec![(4..5, "E".to_string()), (0..1, "A".to_string())],
        );
        assert_eq!(out, "AbcdEf");
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal("plain"), "\"plain\"");
        assert_eq!(string_literal(r#"a"b'c"#), r#""a\"b\'c""#);
        assert_eq!(string_literal("back\\slash"), r#""back\\slash""#);
        assert_eq!(string_literal("line\nbreak\r"), r#""line\nbreak\r""#);
        assert_eq!(string_literal("\u{1}"), r#""\u0001""#);
    }
}
