//! Literal-aware scanning shared by the preprocessing passes and the lexer.
//!
//! Three literal forms are recognized:
//!
//! - `"..."` and `'...'` with backslash escapes, ending at the closing quote or
//!   at the end of the line when unterminated,
//! - verbatim `@"..."` strings, where `""` escapes a quote and newlines are allowed.

/// A contiguous piece of text, either code or one complete literal (quotes included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Code(&'a str),
    Literal(&'a str),
}

/// True if the quote at `quote_pos` opens a verbatim `@"..."` string.
fn is_verbatim(bytes: &[u8], quote_pos: usize) -> bool {
    bytes[quote_pos] == b'"' && quote_pos > 0 && bytes[quote_pos - 1] == b'@'
}

/// Returns the byte offset one past the end of the literal starting at `start`.
///
/// `text[start]` must be a `"` or `'`.
pub(crate) fn literal_end(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let quote = bytes[start];
    let verbatim = is_verbatim(bytes, start);
    let mut i = start + 1;

    while i < bytes.len() {
        let b = bytes[i];
        if verbatim {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 2;
                    continue;
                }
                return i + 1;
            }
        } else if b == b'\\' {
            i += 2;
            continue;
        } else if b == quote {
            return i + 1;
        } else if b == b'\n' {
            return i;
        }
        i += 1;
    }

    bytes.len()
}

/// Splits `text` into alternating code and literal segments.
pub(crate) fn segments(text: &str) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut code_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'"' || bytes[i] == b'\'' {
            // A verbatim sigil belongs to the literal.
            let lit_start = if is_verbatim(bytes, i) { i - 1 } else { i };
            if lit_start > code_start {
                out.push(Segment::Code(&text[code_start..lit_start]));
            }
            let end = literal_end(text, i).min(bytes.len());
            out.push(Segment::Literal(&text[lit_start..end]));
            i = end;
            code_start = end;
        } else {
            i += 1;
        }
    }

    if code_start < bytes.len() {
        out.push(Segment::Code(&text[code_start..]));
    }

    out
}

/// Rewrites the code segments of `text`, leaving literals untouched.
pub(crate) fn map_code(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Code(code) => out.push_str(&f(code)),
            Segment::Literal(lit) => out.push_str(lit),
        }
    }
    out
}

/// Rewrites the literal segments of `text`, leaving code untouched.
pub(crate) fn map_literals(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Code(code) => out.push_str(code),
            Segment::Literal(lit) => out.push_str(&f(lit)),
        }
    }
    out
}

/// True if byte offset `pos` falls inside a literal.
pub(crate) fn inside_literal(text: &str, pos: usize) -> bool {
    let mut offset = 0;
    for segment in segments(text) {
        let (len, is_literal) = match segment {
            Segment::Code(code) => (code.len(), false),
            Segment::Literal(lit) => (lit.len(), true),
        };
        if pos < offset + len {
            return is_literal;
        }
        offset += len;
    }
    false
}

/// Strips the quotes (and a verbatim sigil) from a literal token; other text is returned trimmed.
pub(crate) fn unquote(token: &str) -> String {
    let token = token.trim();
    let (inner, verbatim) = if let Some(rest) = token.strip_prefix("@\"") {
        (rest.strip_suffix('"').unwrap_or(rest), true)
    } else if token.len() >= 2
        && ((token.starts_with('"') && token.ends_with('"'))
            || (token.starts_with('\'') && token.ends_with('\'')))
    {
        (&token[1..token.len() - 1], false)
    } else {
        return token.to_string();
    };

    if verbatim {
        inner.replace("\"\"", "\"")
    } else {
        inner.replace("\\\"", "\"").replace("\\\\", "\\")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_split_code_and_literals() {
        let segs = segments(r#"x = "a;b" + 'c';"#);
        assert_eq!(
            segs,
            vec![
                Segment::Code("x = "),
                Segment::Literal("\"a;b\""),
                Segment::Code(" + "),
                Segment::Literal("'c'"),
                Segment::Code(";"),
            ]
        );
    }

    #[test]
    fn test_escaped_quote_does_not_close_literal() {
        let text = r#""a\"b" rest"#;
        assert_eq!(literal_end(text, 0), 6);
    }

    #[test]
    fn test_verbatim_string_spans_lines_and_doubles_quotes() {
        let text = "@\"a\"\"b\nc\" tail";
        let segs = segments(text);
        assert_eq!(segs[0], Segment::Literal("@\"a\"\"b\nc\""));
        assert_eq!(segs[1], Segment::Code(" tail"));
    }

    #[test]
    fn test_unterminated_literal_stops_at_newline() {
        let segs = segments("it's\nSELECT");
        assert_eq!(
            segs,
            vec![
                Segment::Code("it"),
                Segment::Literal("'s"),
                Segment::Code("\nSELECT"),
            ]
        );
    }

    #[test]
    fn test_inside_literal() {
        let text = r#"a "b" c"#;
        assert!(!inside_literal(text, 0));
        assert!(inside_literal(text, 3));
        assert!(!inside_literal(text, 6));
    }

    #[test]
    fn test_unquote_forms() {
        assert_eq!(unquote("\"/a/b.ss\""), "/a/b.ss");
        assert_eq!(unquote("@\"C:\\x\"\"y\""), "C:\\x\"y");
        assert_eq!(unquote("'v'"), "v");
        assert_eq!(unquote("@Path"), "@Path");
    }
}
