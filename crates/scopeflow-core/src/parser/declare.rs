//! `#DECLARE` and `#SET` directives.

use super::cursor::Cursor;
use super::lexer::TokenKind;
use crate::error::{ParseError, ParseErrorKind};

/// Type marker recorded for `MAP<...>` declarations.
pub const MAP_TYPE: &str = "MAP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub declared_type: Option<String>,
    pub rvalue: String,
}

fn expect_directive(c: &mut Cursor<'_, '_>, directive: &str) -> Result<(), ParseError> {
    match c.peek() {
        Some(t) if t.kind == TokenKind::Directive && t.text == directive => {
            c.advance();
            Ok(())
        }
        _ => Err(c.error(format!("Expected {directive}"))),
    }
}

fn parse_name(c: &mut Cursor<'_, '_>) -> Result<String, ParseError> {
    match c.peek() {
        Some(t) if matches!(t.kind, TokenKind::Variable | TokenKind::Ident) => {
            let name = t.text.to_string();
            c.advance();
            Ok(name)
        }
        _ => Err(c.error("Expected variable name")),
    }
}

fn parse_rvalue(c: &mut Cursor<'_, '_>) -> Result<String, ParseError> {
    let rvalue = c.rest_text();
    if rvalue.is_empty() {
        return Err(c.error("Missing value").with_kind(ParseErrorKind::MissingClause));
    }
    Ok(rvalue.to_string())
}

/// `#DECLARE name TYPE = rvalue`
pub(crate) fn parse_declare(c: &mut Cursor<'_, '_>) -> Result<Declaration, ParseError> {
    expect_directive(c, "#DECLARE")?;
    let name = parse_name(c)?;

    let type_start = c.mark();
    c.skip_balanced_until(|t| t.is_punct("="));
    let type_text = c.text_since(type_start).trim();
    if type_text.is_empty() {
        return Err(c.error("Expected type").with_kind(ParseErrorKind::MissingClause));
    }
    if !c.eat_punct("=") {
        return Err(c.error("Expected '='").with_kind(ParseErrorKind::MissingClause));
    }

    let declared_type = if type_text.starts_with(MAP_TYPE) {
        MAP_TYPE.to_string()
    } else {
        type_text.to_string()
    };

    Ok(Declaration {
        name,
        declared_type: Some(declared_type),
        rvalue: parse_rvalue(c)?,
    })
}

/// `#SET name = rvalue`; a conditional `IF(...)` right-hand side is not supported.
pub(crate) fn parse_set(c: &mut Cursor<'_, '_>) -> Result<Declaration, ParseError> {
    expect_directive(c, "#SET")?;
    let name = parse_name(c)?;
    c.expect_punct("=")?;

    if c.check_ident("IF") && c.peek_at(1).is_some_and(|t| t.is_punct("(")) {
        return Err(ParseError::unsupported("conditional #SET is not supported"));
    }

    Ok(Declaration {
        name,
        declared_type: None,
        rvalue: parse_rvalue(c)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    fn declare(text: &str) -> Result<Declaration, ParseError> {
        let tokens = tokenize(text).unwrap();
        let mut cursor = Cursor::new(text, &tokens);
        parse_declare(&mut cursor)
    }

    fn set(text: &str) -> Result<Declaration, ParseError> {
        let tokens = tokenize(text).unwrap();
        let mut cursor = Cursor::new(text, &tokens);
        parse_set(&mut cursor)
    }

    #[test]
    fn test_declare_keeps_raw_rvalue() {
        let decl = declare(r#"#DECLARE @Out string = @"/out/" + @Date.ToString("yyyyMMdd") + ".ss""#).unwrap();
        assert_eq!(decl.name, "@Out");
        assert_eq!(decl.declared_type.as_deref(), Some("string"));
        assert_eq!(decl.rvalue, r#"@"/out/" + @Date.ToString("yyyyMMdd") + ".ss""#);
    }

    #[test]
    fn test_map_declaration() {
        let decl = declare(r#"#DECLARE @m MAP<string, string> = new MAP<string, string>{{"a", "b"}}"#).unwrap();
        assert_eq!(decl.declared_type.as_deref(), Some(MAP_TYPE));
    }

    #[test]
    fn test_nullable_type() {
        let decl = declare("#DECLARE @n int? = 3").unwrap();
        assert_eq!(decl.declared_type.as_deref(), Some("int?"));
        assert_eq!(decl.rvalue, "3");
    }

    #[test]
    fn test_declare_without_value() {
        let err = declare("#DECLARE @x string").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingClause);
    }

    #[test]
    fn test_set() {
        let decl = set("#SET @Days = 7").unwrap();
        assert_eq!(decl.name, "@Days");
        assert_eq!(decl.rvalue, "7");
        assert!(decl.declared_type.is_none());
    }

    #[test]
    fn test_conditional_set_is_unsupported() {
        let err = set("#SET @x = IF(@a == 1, \"b\", \"c\")").unwrap_err();
        assert!(err.is_unsupported());
    }
}
