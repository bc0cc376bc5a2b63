//! Source items shared by the SELECT, PROCESS/REDUCE/COMBINE, OUTPUT and
//! input-statement grammars.

use super::cursor::{Cursor, CLAUSE_KEYWORDS};
use super::expr::{is_reserved, parse_operand, Expr, Literal};
use super::lexer::{Token, TokenKind};
use super::process::parse_process;
use super::select::parse_select_query;
use crate::error::{ParseError, ParseErrorKind};
use crate::preprocess::literals::unquote;
use crate::types::SourcePrefix;

const PROCESS_KEYWORDS: &[&str] = &["PROCESS", "REDUCE", "COMBINE"];

/// Source names and module parameters collected from one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceList {
    pub sources: Vec<String>,
    pub params: Vec<String>,
}

impl SourceList {
    pub fn push(&mut self, name: impl Into<String>) {
        self.sources.push(name.into());
    }

    pub fn append(&mut self, other: SourceList) {
        self.sources.extend(other.sources);
        self.params.extend(other.params);
    }
}

fn is_item_boundary(token: &Token<'_>) -> bool {
    token.is_punct(",")
        || token.is_ident("AS")
        || (token.kind == TokenKind::Ident && CLAUSE_KEYWORDS.contains(&token.text))
}

/// A resource path: a literal (unquoted), a variable, or a concatenation kept as written.
pub(crate) fn parse_resource_path(c: &mut Cursor<'_, '_>) -> Result<String, ParseError> {
    let start = c.mark();
    let expr = parse_operand(c)?;
    Ok(match expr {
        Expr::Literal(Literal::Str(raw)) => unquote(&raw),
        _ => c.text_since(start).to_string(),
    })
}

/// `SSTREAM [SPARSE] STREAMSET path PATTERN pattern RANGE key=[a, b]` or `SSTREAM path`.
pub(crate) fn parse_stream(c: &mut Cursor<'_, '_>) -> Result<(SourcePrefix, String), ParseError> {
    c.expect_ident("SSTREAM")?;
    c.eat_ident("SPARSE");

    if !c.eat_ident("STREAMSET") {
        let path = parse_resource_path(c)?;
        return Ok((SourcePrefix::Stream, path));
    }

    let path = parse_resource_path(c)?;
    if c.eat_ident("PATTERN") {
        parse_resource_path(c)?;
    }
    if c.eat_ident("RANGE") {
        c.skip_balanced_until(is_item_boundary);
    }
    Ok((SourcePrefix::Streamset, path))
}

/// `EXTRACT columns FROM path {, path} [USING extractor(args)]`; the first path wins.
pub(crate) fn parse_extract(c: &mut Cursor<'_, '_>) -> Result<String, ParseError> {
    c.expect_ident("EXTRACT")?;
    c.skip_balanced_until(|t| t.is_ident("FROM"));
    if !c.eat_ident("FROM") {
        return Err(c.error("EXTRACT requires FROM").with_kind(ParseErrorKind::MissingClause));
    }
    let path = parse_resource_path(c)?;
    while c.eat_punct(",") {
        parse_resource_path(c)?;
    }
    if c.eat_ident("USING") {
        c.dotted_name()?;
        if c.check_punct("(") {
            c.skip_group()?;
        }
    }
    Ok(path)
}

/// `VIEW path [PARAMS (...)]` or `IMPORT path [PARAMS (...)]`.
pub(crate) fn parse_view_like(c: &mut Cursor<'_, '_>, keyword: &str) -> Result<String, ParseError> {
    c.expect_ident(keyword)?;
    let path = parse_resource_path(c)?;
    if c.eat_ident("PARAMS") && c.check_punct("(") {
        c.skip_group()?;
    }
    Ok(path)
}

/// Parameters of a module invocation: plain identifiers only.
///
/// For `name = value` (or `name: value`) arguments the value side is taken;
/// variables, literals and compound expressions contribute nothing.
pub(crate) fn parse_module_params(c: &mut Cursor<'_, '_>) -> Result<Vec<String>, ParseError> {
    c.expect_punct("(")?;
    let mut params = Vec::new();
    let mut arg: Vec<Token<'_>> = Vec::new();
    let mut depth = 0usize;

    loop {
        let Some(token) = c.advance() else {
            return Err(c.error("Unterminated argument list"));
        };
        let at_top = depth == 0;
        match token.text {
            "(" | "[" | "{" if token.kind == TokenKind::Punct => depth += 1,
            ")" | "]" | "}" if token.kind == TokenKind::Punct && !at_top => depth -= 1,
            _ => {}
        }

        if at_top && (token.is_punct(")") || token.is_punct(",")) {
            if let Some(name) = plain_identifier(&arg) {
                params.push(name.to_string());
            }
            arg.clear();
            if token.is_punct(")") {
                return Ok(params);
            }
        } else {
            arg.push(token);
        }
    }
}

fn plain_identifier<'a>(arg: &[Token<'a>]) -> Option<&'a str> {
    let value = match arg {
        [_, sep, rest @ ..] if sep.is_punct("=") || sep.is_punct(":") => rest,
        _ => arg,
    };
    match value {
        [token] if token.kind == TokenKind::Ident && !is_reserved(token.text) => Some(token.text),
        _ => None,
    }
}

/// One source item followed by an optional alias.
///
/// Recognized shapes: a (dotted) table name, `(SELECT ...)`, a parenthesized
/// `PROCESS`/`REDUCE`/`COMBINE`, `SSTREAM ...`,
/// `EXTRACT ... FROM path`, `VIEW path` and a module call `Name.Func(args)`.
pub(crate) fn parse_source_item(c: &mut Cursor<'_, '_>, list: &mut SourceList) -> Result<(), ParseError> {
    if c.eat_punct("(") {
        if c.check_ident("SELECT") {
            let query = parse_select_query(c)?;
            list.append(query.sources);
        } else if let Some(keyword) = PROCESS_KEYWORDS.iter().find(|k| c.check_ident(k)) {
            let clause = parse_process(c, keyword)?;
            list.append(clause.sources);
            c.skip_balanced_until(|_| false);
        } else {
            parse_source_item(c, list)?;
        }
        c.expect_punct(")")?;
    } else if c.check_ident("SSTREAM") {
        let (prefix, path) = parse_stream(c)?;
        list.push(prefix.tag(&path));
    } else if c.check_ident("EXTRACT") {
        let path = parse_extract(c)?;
        list.push(SourcePrefix::Extract.tag(&path));
    } else if c.check_ident("VIEW") {
        let path = parse_view_like(c, "VIEW")?;
        list.push(SourcePrefix::View.tag(&path));
    } else if c.check_kind(TokenKind::Variable) {
        if let Some(token) = c.advance() {
            list.push(token.text);
        }
    } else {
        let word = c.peek().map(|t| t.text).unwrap_or_default();
        if is_reserved(word) {
            return Err(c.error(format!("Expected source, found '{word}'")));
        }
        let name = c.dotted_name()?;
        if c.check_punct("(") {
            let params = parse_module_params(c)?;
            list.push(SourcePrefix::Module.tag(&name));
            list.params.extend(params);
        } else {
            list.push(name);
        }
    }

    parse_alias(c)
}

/// `[AS] alias [(columns)]`
fn parse_alias(c: &mut Cursor<'_, '_>) -> Result<(), ParseError> {
    if c.eat_ident("AS") {
        c.expect_name()?;
        if c.check_punct("(") {
            c.skip_group()?;
        }
    } else if c
        .peek()
        .is_some_and(|t| t.kind == TokenKind::Ident && !is_reserved(t.text))
    {
        c.advance();
    }
    Ok(())
}
