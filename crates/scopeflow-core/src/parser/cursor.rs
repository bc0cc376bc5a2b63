use super::lexer::{Token, TokenKind};
use crate::error::{ParseError, ParseErrorKind};

/// Keywords that end an open-ended clause at nesting depth zero.
pub(crate) const CLAUSE_KEYWORDS: &[&str] = &[
    "FROM",
    "WHERE",
    "GROUP",
    "HAVING",
    "ORDER",
    "UNION",
    "EXCEPT",
    "INTERSECT",
    "JOIN",
    "SEMIJOIN",
    "ANTISEMIJOIN",
    "LEFT",
    "RIGHT",
    "FULL",
    "INNER",
    "OUTER",
    "CROSS",
    "PAIR",
    "HASH",
    "BROADCASTLEFT",
    "BROADCASTRIGHT",
    "ON",
    "USING",
    "PRESORT",
    "PRODUCE",
    "TO",
    "CLUSTERED",
    "SORTED",
    "PARTITIONED",
    "WITH",
];

/// A position-tracking view over one statement's tokens.
///
/// Every grammar rule takes `&mut Cursor`; ordered alternatives are expressed
/// by saving [`Cursor::mark`] and rewinding with [`Cursor::reset`].
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    text: &'a str,
    pos: usize,
}

impl<'t, 'a> Cursor<'t, 'a> {
    pub fn new(text: &'a str, tokens: &'t [Token<'a>]) -> Self {
        Self {
            tokens,
            text,
            pos: 0,
        }
    }

    pub fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    pub fn peek_at(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + n)
    }

    pub fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn mark(&self) -> usize {
        self.pos
    }

    pub fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    pub fn check_ident(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_ident(word))
    }

    pub fn check_punct(&self, punct: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(punct))
    }

    pub fn check_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    pub fn eat_ident(&mut self, word: &str) -> bool {
        if self.check_ident(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn eat_punct(&mut self, punct: &str) -> bool {
        if self.check_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect_ident(&mut self, word: &str) -> Result<(), ParseError> {
        if self.eat_ident(word) {
            Ok(())
        } else {
            Err(self.error(format!("Expected {word}")))
        }
    }

    pub fn expect_punct(&mut self, punct: &str) -> Result<(), ParseError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.error(format!("Expected '{punct}'")))
        }
    }

    /// Consumes any identifier and returns its text.
    pub fn expect_name(&mut self) -> Result<&'a str, ParseError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Ident => {
                let text = token.text;
                self.pos += 1;
                Ok(text)
            }
            _ => Err(self.error("Expected identifier")),
        }
    }

    /// `Ident { . Ident }`, joined with dots.
    pub fn dotted_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_name()?.to_string();
        while self.check_punct(".") && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Ident) {
            self.pos += 1;
            name.push('.');
            name.push_str(self.expect_name()?);
        }
        Ok(name)
    }

    /// True at a depth-zero clause boundary: a clause keyword, `,`, `)` or the end.
    pub fn at_clause_boundary(&self) -> bool {
        match self.peek() {
            None => true,
            Some(t) => {
                t.is_punct(",")
                    || t.is_punct(")")
                    || (t.kind == TokenKind::Ident && CLAUSE_KEYWORDS.contains(&t.text))
            }
        }
    }

    /// Skips tokens, keeping parentheses, brackets and braces balanced, until
    /// `stop` matches a token at depth zero or the input ends. An unmatched
    /// closing bracket also stops the scan.
    pub fn skip_balanced_until(&mut self, stop: impl Fn(&Token<'a>) -> bool) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0 && stop(token) {
                return;
            }
            match token.text {
                "(" | "[" | "{" if token.kind == TokenKind::Punct => depth += 1,
                ")" | "]" | "}" if token.kind == TokenKind::Punct => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Skips one balanced `( ... )` group; the cursor must be on `(`.
    pub fn skip_group(&mut self) -> Result<(), ParseError> {
        self.expect_punct("(")?;
        self.skip_balanced_until(|_| false);
        self.expect_punct(")")
    }

    /// Source text covered by tokens `[from, to)`.
    pub fn text_between(&self, from: usize, to: usize) -> &'a str {
        if from >= to || from >= self.tokens.len() {
            return "";
        }
        let start = self.tokens[from].offset;
        let end = self.tokens[to.min(self.tokens.len()) - 1].end();
        &self.text[start..end]
    }

    /// Source text from token `from` up to the current position.
    pub fn text_since(&self, from: usize) -> &'a str {
        self.text_between(from, self.pos)
    }

    /// Source text of everything not consumed yet.
    pub fn rest_text(&self) -> &'a str {
        match self.peek() {
            Some(token) => self.text[token.offset..].trim(),
            None => "",
        }
    }

    pub fn error(&self, message: impl Into<String>) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::new(message).at_offset(self.text, token.offset),
            None => ParseError::new(message)
                .at_offset(self.text, self.text.len())
                .with_kind(ParseErrorKind::UnexpectedEof),
        }
    }

    /// Fails unless every token was consumed.
    pub fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("Unexpected token '{}'", token.text))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    #[test]
    fn test_dotted_name_and_text_between() {
        let text = "a.b.c(1, 2) rest";
        let tokens = tokenize(text).unwrap();
        let mut cursor = Cursor::new(text, &tokens);
        assert_eq!(cursor.dotted_name().unwrap(), "a.b.c");
        let start = cursor.mark();
        cursor.skip_group().unwrap();
        assert_eq!(cursor.text_since(start), "(1, 2)");
        assert_eq!(cursor.rest_text(), "rest");
    }

    #[test]
    fn test_skip_balanced_until_stops_at_depth_zero() {
        let text = "f(a, WHERE) , WHERE x";
        let tokens = tokenize(text).unwrap();
        let mut cursor = Cursor::new(text, &tokens);
        cursor.skip_balanced_until(|t| t.is_ident("WHERE"));
        assert!(cursor.check_ident("WHERE"));
        assert_eq!(cursor.text_since(0), "f(a, WHERE) ,");
    }

    #[test]
    fn test_error_at_end_is_unexpected_eof() {
        let text = "x =";
        let tokens = tokenize(text).unwrap();
        let mut cursor = Cursor::new(text, &tokens);
        cursor.advance();
        cursor.advance();
        let err = cursor.expect_name().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    }
}
