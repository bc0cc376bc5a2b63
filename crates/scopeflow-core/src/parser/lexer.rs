//! Literal-aware tokenizer for one statement.

use crate::error::{ParseError, ParseErrorKind};
use crate::preprocess::literals::literal_end;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare word: keyword, column, type or dotted-path segment.
    Ident,
    /// `@name`, or an unresolved `@@name@@` marker.
    Variable,
    /// `#DECLARE`, `#SET`, `#CS`, ...
    Directive,
    /// A quoted literal, quotes (and verbatim sigil) included.
    Str,
    Number,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset into the statement text.
    pub offset: usize,
}

impl<'a> Token<'a> {
    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }

    pub fn is_punct(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == punct
    }

    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

const MULTI_CHAR_PUNCT: &[&str] = &["==", "!=", ">=", "<=", "<>", "??", "&&", "||", "=>", "::"];

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Splits `text` into tokens, skipping whitespace.
///
/// Never fails on odd input: unknown characters become single-character
/// punctuation. The only error is an unterminated verbatim string, which would
/// otherwise silently swallow the rest of the statement.
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let start = i;

        let kind = if b.is_ascii_whitespace() {
            i += 1;
            continue;
        } else if b == b'@' && bytes.get(i + 1) == Some(&b'"') {
            i = literal_end(text, i + 1);
            if !text[start..i].ends_with('"') || i - start < 3 {
                return Err(ParseError::new("Unterminated verbatim string")
                    .at_offset(text, start)
                    .with_kind(ParseErrorKind::LexerError));
            }
            TokenKind::Str
        } else if b == b'"' || b == b'\'' {
            i = literal_end(text, i);
            TokenKind::Str
        } else if b == b'@' {
            while i < bytes.len() && bytes[i] == b'@' {
                i += 1;
            }
            while i < bytes.len() && is_word_byte(bytes[i]) {
                i += 1;
            }
            while i < bytes.len() && bytes[i] == b'@' {
                i += 1;
            }
            TokenKind::Variable
        } else if b == b'#' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
            i += 1;
            while i < bytes.len() && is_word_byte(bytes[i]) {
                i += 1;
            }
            TokenKind::Directive
        } else if b.is_ascii_digit() {
            i = number_end(bytes, i);
            TokenKind::Number
        } else if is_word_byte(b) {
            while i < bytes.len() && is_word_byte(bytes[i]) {
                i += 1;
            }
            TokenKind::Ident
        } else if let Some(op) = MULTI_CHAR_PUNCT.iter().find(|op| text[i..].starts_with(**op)) {
            i += op.len();
            TokenKind::Punct
        } else {
            i += text[i..].chars().next().map_or(1, char::len_utf8);
            TokenKind::Punct
        };

        tokens.push(Token {
            kind,
            text: &text[start..i],
            offset: start,
        });
    }

    Ok(tokens)
}

/// Digits, an optional fraction, an optional exponent and a type suffix (`L`, `UL`, `f`, `m`).
fn number_end(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_texts(text: &str) -> Vec<(TokenKind, &str)> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_basic_statement() {
        let tokens = kinds_and_texts(r#"x = SELECT a.b, @v FROM "p;q" WHERE c >= 1.5e3"#);
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Ident, "x"),
                (TokenKind::Punct, "="),
                (TokenKind::Ident, "SELECT"),
                (TokenKind::Ident, "a"),
                (TokenKind::Punct, "."),
                (TokenKind::Ident, "b"),
                (TokenKind::Punct, ","),
                (TokenKind::Variable, "@v"),
                (TokenKind::Ident, "FROM"),
                (TokenKind::Str, "\"p;q\""),
                (TokenKind::Ident, "WHERE"),
                (TokenKind::Ident, "c"),
                (TokenKind::Punct, ">="),
                (TokenKind::Number, "1.5e3"),
            ]
        );
    }

    #[test]
    fn test_directives_verbatim_strings_and_markers() {
        let tokens = kinds_and_texts(r#"#DECLARE @p string = @"C:\a" + @@Root@@;"#);
        assert_eq!(tokens[0], (TokenKind::Directive, "#DECLARE"));
        assert_eq!(tokens[1], (TokenKind::Variable, "@p"));
        assert_eq!(tokens[4], (TokenKind::Str, r#"@"C:\a""#));
        assert_eq!(tokens[6], (TokenKind::Variable, "@@Root@@"));
    }

    #[test]
    fn test_multi_char_operators() {
        let texts: Vec<_> = kinds_and_texts("a ?? b != c && d => e")
            .into_iter()
            .filter(|(k, _)| *k == TokenKind::Punct)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(texts, vec!["??", "!=", "&&", "=>"]);
    }

    #[test]
    fn test_number_suffix_and_offsets() {
        let tokens = tokenize("  10L").unwrap();
        assert_eq!(tokens[0].text, "10L");
        assert_eq!(tokens[0].offset, 2);
        assert_eq!(tokens[0].end(), 5);
    }

    #[test]
    fn test_unterminated_verbatim_string_is_an_error() {
        let err = tokenize("x = @\"abc").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::LexerError);
    }
}
