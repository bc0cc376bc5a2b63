//! `SELECT` grammar.

use super::cursor::{Cursor, CLAUSE_KEYWORDS};
use super::expr::{parse_expr, parse_expr_list, parse_order_items, Expr};
use super::lexer::TokenKind;
use super::source::{parse_source_item, SourceList};
use crate::error::ParseError;
use crate::types::SourcePrefix;

const JOIN_MODIFIERS: &[&str] = &[
    "LEFT",
    "RIGHT",
    "FULL",
    "INNER",
    "OUTER",
    "HASH",
    "BROADCASTRIGHT",
    "BROADCASTLEFT",
    "PAIR",
    "CROSS",
];

const JOIN_KEYWORDS: &[&str] = &["JOIN", "SEMIJOIN", "ANTISEMIJOIN"];

/// A parsed `SELECT` query, including its union/except branches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub columns: Vec<String>,
    pub sources: SourceList,
}

/// `SELECT [DISTINCT] [TOP n] columns [FROM items] {JOIN ...} [WHERE ...]
/// [GROUP BY ...] [HAVING ...] [ORDER BY ...] {UNION|EXCEPT|INTERSECT select}`
pub(crate) fn parse_select_query(c: &mut Cursor<'_, '_>) -> Result<SelectQuery, ParseError> {
    c.expect_ident("SELECT")?;
    let mut query = SelectQuery::default();

    if !c.eat_ident("DISTINCT") {
        c.eat_ident("ALL");
    }
    if c.eat_ident("TOP") && c.advance().is_none() {
        return Err(c.error("TOP requires a row count"));
    }

    query.columns = parse_columns(c)?;

    if c.eat_ident("FROM") {
        loop {
            parse_source_item(c, &mut query.sources)?;
            if !c.eat_punct(",") {
                break;
            }
        }
        parse_joins(c, &mut query.sources)?;
    }

    if c.eat_ident("WHERE") {
        lenient_clause(c, |c| parse_expr(c).map(drop));
    }
    if c.eat_ident("GROUP") {
        c.expect_ident("BY")?;
        lenient_clause(c, |c| parse_expr_list(c, ")").map(drop));
    }
    if c.eat_ident("HAVING") {
        lenient_clause(c, |c| parse_expr(c).map(drop));
    }
    if c.eat_ident("ORDER") {
        c.expect_ident("BY")?;
        lenient_clause(c, |c| parse_order_items(c).map(drop));
    }

    if let Some(branch) = parse_set_operation(c)? {
        query.sources.append(branch.sources);
    }

    Ok(query)
}

fn parse_set_operation(c: &mut Cursor<'_, '_>) -> Result<Option<SelectQuery>, ParseError> {
    if c.eat_ident("UNION") {
        if !c.eat_ident("ALL") {
            c.eat_ident("DISTINCT");
        }
    } else if c.eat_ident("EXCEPT") || c.eat_ident("INTERSECT") {
        c.eat_ident("ALL");
    } else {
        return Ok(None);
    }

    let branch = if c.eat_punct("(") {
        let branch = parse_select_query(c)?;
        c.expect_punct(")")?;
        // The branch's own set operations come after its parentheses.
        let mut branch = branch;
        if let Some(next) = parse_set_operation(c)? {
            branch.sources.append(next.sources);
        }
        branch
    } else {
        parse_select_query(c)?
    };
    Ok(Some(branch))
}

fn parse_columns(c: &mut Cursor<'_, '_>) -> Result<Vec<String>, ParseError> {
    let mut columns = Vec::new();
    loop {
        columns.push(parse_column(c)?);
        if !c.eat_punct(",") {
            return Ok(columns);
        }
    }
}

/// One output column: its alias when present, else the expression text.
///
/// A strict expression is tried first; when it does not parse, the raw token
/// run up to the next `,` or `FROM` is used, preferring an alias-bearing
/// reading, then a generic dotted column, then the raw text itself.
fn parse_column(c: &mut Cursor<'_, '_>) -> Result<String, ParseError> {
    let start = c.mark();
    if let Ok(name) = strict_column(c, start) {
        return Ok(name);
    }
    c.reset(start);

    c.skip_balanced_until(|t| t.is_punct(",") || t.is_ident("FROM"));
    let end = c.mark();
    if end == start {
        return Err(c.error("Expected column"));
    }

    let cursor = c.clone();
    let run = start..end;
    Ok(alias_in_run(&cursor, run.clone())
        .or_else(|| generic_column(&cursor, run.clone()))
        .unwrap_or_else(|| cursor.text_between(run.start, run.end).to_string()))
}

fn strict_column(c: &mut Cursor<'_, '_>, start: usize) -> Result<String, ParseError> {
    parse_expr(c)?;
    let expr_end = c.mark();
    let alias = if c.eat_ident("AS") {
        Some(c.expect_name()?)
    } else {
        None
    };
    if !c.at_clause_boundary() {
        return Err(c.error("Unexpected token in column"));
    }
    Ok(match alias {
        Some(alias) => alias.to_string(),
        None => c.text_between(start, expr_end).to_string(),
    })
}

/// The identifier after the last depth-zero `AS` of a raw column run.
fn alias_in_run(c: &Cursor<'_, '_>, run: std::ops::Range<usize>) -> Option<String> {
    let mut scan = c.clone();
    scan.reset(run.start);
    let mut depth = 0usize;
    let mut alias = None;

    while scan.mark() < run.end {
        let token = scan.advance()?;
        match token.text {
            "(" | "[" | "{" if token.kind == TokenKind::Punct => depth += 1,
            ")" | "]" | "}" if token.kind == TokenKind::Punct => depth = depth.saturating_sub(1),
            "AS" if depth == 0 && token.kind == TokenKind::Ident => {
                alias = scan
                    .peek()
                    .filter(|t| t.kind == TokenKind::Ident && scan.mark() < run.end)
                    .map(|t| t.text.to_string());
            }
            _ => {}
        }
    }

    alias
}

/// A run that is exactly `Ident {. Ident}`.
fn generic_column(c: &Cursor<'_, '_>, run: std::ops::Range<usize>) -> Option<String> {
    let mut scan = c.clone();
    scan.reset(run.start);
    let name = scan.dotted_name().ok()?;
    (scan.mark() == run.end).then_some(name)
}

/// Joins and applies following the `FROM` list.
fn parse_joins(c: &mut Cursor<'_, '_>, sources: &mut SourceList) -> Result<(), ParseError> {
    loop {
        let mark = c.mark();
        while JOIN_MODIFIERS.iter().any(|word| c.eat_ident(word)) {}

        if JOIN_KEYWORDS.iter().any(|word| c.eat_ident(word)) {
            parse_source_item(c, sources)?;
            if c.eat_ident("ON") {
                lenient_clause(c, |c| parse_expr(c).map(drop));
            }
        } else if c.mark() > mark && c.eat_ident("APPLY") {
            parse_apply(c, sources)?;
        } else {
            c.reset(mark);
            return Ok(());
        }
    }
}

/// `CROSS APPLY expr [AS alias[(columns)]]`: a function call contributes a
/// `FUNC_` source, a plain table a table source.
fn parse_apply(c: &mut Cursor<'_, '_>, sources: &mut SourceList) -> Result<(), ParseError> {
    let expr = parse_expr(c)?;
    match &expr {
        Expr::Call { .. } => {
            if let Some(path) = expr.call_path() {
                sources.push(SourcePrefix::Func.tag(&path));
            }
        }
        Expr::Path(parts) => sources.push(parts.join(".")),
        _ => {}
    }

    if c.eat_ident("AS") {
        c.expect_name()?;
        if c.check_punct("(") {
            c.skip_group()?;
        }
    }
    Ok(())
}

/// Tries `rule`; when it fails or stops short of a clause boundary, skips
/// balanced tokens up to the next clause keyword instead.
fn lenient_clause(c: &mut Cursor<'_, '_>, rule: impl FnOnce(&mut Cursor<'_, '_>) -> Result<(), ParseError>) {
    let start = c.mark();
    if rule(c).is_ok() && c.at_clause_boundary() && !c.check_punct(",") {
        return;
    }
    c.reset(start);
    c.skip_balanced_until(|t| t.kind == TokenKind::Ident && CLAUSE_KEYWORDS.contains(&t.text));
}

/// `[assign =] SELECT ...` statement body.
pub(crate) fn parse_select_statement(c: &mut Cursor<'_, '_>) -> Result<SelectQuery, ParseError> {
    let query = parse_select_query(c)?;
    c.expect_end()?;
    Ok(query)
}
