//! Comment stripping and blank-line collapsing.

use super::literals::literal_end;

/// Removes `/* ... */` and `// ...` comments while copying string and char
/// literals verbatim. Line comments keep their terminating newline; an
/// unterminated block comment swallows the rest of the text.
pub fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copy_from = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(text, i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                out.push_str(&text[copy_from..i]);
                i = text[i..].find('\n').map(|n| i + n).unwrap_or(bytes.len());
                copy_from = i;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&text[copy_from..i]);
                i = text[i + 2..]
                    .find("*/")
                    .map(|n| i + 2 + n + 2)
                    .unwrap_or(bytes.len());
                copy_from = i;
            }
            _ => i += 1,
        }
    }

    out.push_str(&text[copy_from..]);
    out
}

/// Drops whitespace-only lines and trailing whitespace.
pub fn collapse_blank_lines(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_and_block_comments() {
        let text = "a = SSTREAM @x; // read input\n/* multi\nline */b = SELECT * FROM a;";
        assert_eq!(
            strip_comments(text),
            "a = SSTREAM @x; \nb = SELECT * FROM a;"
        );
    }

    #[test]
    fn test_comment_markers_inside_literals_survive() {
        let text = r#"#DECLARE @p string = "/shares//data/*x*/"; // tail"#;
        assert_eq!(
            strip_comments(text),
            r#"#DECLARE @p string = "/shares//data/*x*/"; "#
        );
    }

    #[test]
    fn test_escaped_quote_inside_literal() {
        let text = r#"x = "a\"//b"; // c"#;
        assert_eq!(strip_comments(text), r#"x = "a\"//b"; "#);
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(strip_comments("a /* never closed"), "a ");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a  \n\n   \nb\n"), "a\nb");
    }
}
