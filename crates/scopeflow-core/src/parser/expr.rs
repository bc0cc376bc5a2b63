//! Shared expression grammar.
//!
//! One function per precedence level, lowest first:
//! ternary, null-coalescing, `OR`, `AND`, `NOT`, comparison, additive,
//! multiplicative, unary sign, cast, postfix chain, primary.

use super::cursor::{Cursor, CLAUSE_KEYWORDS};
use super::lexer::TokenKind;
use super::select::{parse_select_query, SelectQuery};
use crate::error::ParseError;

const AGGREGATES: &[&str] = &["SUM", "AVG", "MAX", "MIN", "COUNT", "FIRST", "LAST"];

const CAST_TYPES: &[&str] = &[
    "long", "ulong", "short", "int", "byte", "double", "float", "decimal", "string", "bool",
];

/// Words that never start an operand.
const RESERVED: &[&str] = &[
    "AND", "OR", "NOT", "IN", "LIKE", "IS", "BETWEEN", "AS", "ASC", "DESC", "SELECT", "DISTINCT",
    "TOP", "BY", "APPLY", "OVER", "PARTITION",
];

const COMPARISON_OPS: &[&str] = &["==", "=", "!=", "<>", "<", ">", "<=", ">="];

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Raw token text, quotes included.
    Str(String),
    Number(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Variable(String),
    /// A dotted identifier path: column, table-qualified column or type name.
    Path(Vec<String>),
    Star,
    Unary {
        op: String,
        expr: Box<Expr>,
    },
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    InQuery {
        expr: Box<Expr>,
        query: Box<SelectQuery>,
        negated: bool,
    },
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    Cast {
        ty: String,
        expr: Box<Expr>,
    },
    Member {
        base: Box<Expr>,
        name: String,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// `IF(condition, then, otherwise)`
    If {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Aggregate {
        name: String,
        distinct: bool,
        args: Vec<Expr>,
        windowed: bool,
    },
    New {
        ty: String,
        args: Vec<Expr>,
        initializers: Vec<Expr>,
    },
    Subquery(Box<SelectQuery>),
}

impl Expr {
    /// The dotted name of a path or member chain (`DateTime.Parse`, `@d.AddDays`).
    /// Calls inside the chain are looked through.
    pub fn dotted(&self) -> Option<String> {
        match self {
            Expr::Path(parts) => Some(parts.join(".")),
            Expr::Variable(name) => Some(name.clone()),
            Expr::Member { base, name } => base.dotted().map(|base| format!("{base}.{name}")),
            Expr::Call { callee, .. } => callee.dotted(),
            _ => None,
        }
    }

    /// The dotted callee of a call expression.
    pub fn call_path(&self) -> Option<String> {
        match self {
            Expr::Call { callee, .. } => callee.dotted(),
            _ => None,
        }
    }
}

pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word) || CLAUSE_KEYWORDS.contains(&word)
}

fn boxed(expr: Expr) -> Box<Expr> {
    Box::new(expr)
}

pub(crate) fn parse_expr(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    parse_ternary(c)
}

fn parse_ternary(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    let condition = parse_coalesce(c)?;
    if !c.eat_punct("?") {
        return Ok(condition);
    }
    let then = parse_ternary(c)?;
    c.expect_punct(":")?;
    let otherwise = parse_ternary(c)?;
    Ok(Expr::Ternary {
        condition: boxed(condition),
        then: boxed(then),
        otherwise: boxed(otherwise),
    })
}

fn parse_coalesce(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    let left = parse_or(c)?;
    if c.eat_punct("??") {
        let right = parse_coalesce(c)?;
        return Ok(binary("??", left, right));
    }
    Ok(left)
}

fn binary(op: &str, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op: op.to_string(),
        left: boxed(left),
        right: boxed(right),
    }
}

fn parse_or(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    let mut left = parse_and(c)?;
    while c.eat_ident("OR") || c.eat_punct("||") {
        let right = parse_and(c)?;
        left = binary("OR", left, right);
    }
    Ok(left)
}

fn parse_and(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    let mut left = parse_not(c)?;
    while c.eat_ident("AND") || c.eat_punct("&&") {
        let right = parse_not(c)?;
        left = binary("AND", left, right);
    }
    Ok(left)
}

fn parse_not(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    if c.eat_ident("NOT") {
        let expr = parse_not(c)?;
        return Ok(Expr::Unary {
            op: "NOT".to_string(),
            expr: boxed(expr),
        });
    }
    parse_comparison(c)
}

fn parse_comparison(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    let mut left = parse_additive(c)?;

    loop {
        if let Some(op) = COMPARISON_OPS.iter().find(|op| c.check_punct(op)) {
            c.advance();
            let right = parse_additive(c)?;
            left = binary(op, left, right);
            continue;
        }

        if c.eat_ident("IS") {
            let negated = c.eat_ident("NOT");
            c.expect_ident("NULL")?;
            left = Expr::IsNull {
                expr: boxed(left),
                negated,
            };
            continue;
        }

        let mark = c.mark();
        let negated = c.eat_ident("NOT");
        if c.eat_ident("IN") {
            left = parse_in(c, left, negated)?;
        } else if c.eat_ident("LIKE") {
            let pattern = parse_additive(c)?;
            left = Expr::Like {
                expr: boxed(left),
                pattern: boxed(pattern),
                negated,
            };
        } else if c.eat_ident("BETWEEN") {
            let low = parse_additive(c)?;
            c.expect_ident("AND")?;
            let high = parse_additive(c)?;
            left = Expr::Between {
                expr: boxed(left),
                low: boxed(low),
                high: boxed(high),
                negated,
            };
        } else {
            c.reset(mark);
            return Ok(left);
        }
    }
}

fn parse_in(c: &mut Cursor<'_, '_>, expr: Expr, negated: bool) -> Result<Expr, ParseError> {
    c.expect_punct("(")?;
    if c.check_ident("SELECT") {
        let query = parse_select_query(c)?;
        c.expect_punct(")")?;
        return Ok(Expr::InQuery {
            expr: boxed(expr),
            query: Box::new(query),
            negated,
        });
    }
    let list = parse_expr_list(c, ")")?;
    c.expect_punct(")")?;
    Ok(Expr::InList {
        expr: boxed(expr),
        list,
        negated,
    })
}

/// An operand without comparisons or boolean operators, such as a resource path.
pub(crate) fn parse_operand(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    parse_additive(c)
}

fn parse_additive(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    let mut left = parse_multiplicative(c)?;
    loop {
        let op = if c.check_punct("+") {
            "+"
        } else if c.check_punct("-") {
            "-"
        } else {
            return Ok(left);
        };
        c.advance();
        let right = parse_multiplicative(c)?;
        left = binary(op, left, right);
    }
}

fn parse_multiplicative(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    let mut left = parse_unary(c)?;
    loop {
        let Some(op) = ["*", "/", "%"].into_iter().find(|op| c.check_punct(op)) else {
            return Ok(left);
        };
        c.advance();
        let right = parse_unary(c)?;
        left = binary(op, left, right);
    }
}

fn parse_unary(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    for op in ["-", "+", "!", "~"] {
        if c.eat_punct(op) {
            let expr = parse_unary(c)?;
            return Ok(Expr::Unary {
                op: op.to_string(),
                expr: boxed(expr),
            });
        }
    }
    parse_cast(c)
}

/// `(type) expr` or `(type?) expr`; anything else is a postfix expression.
fn parse_cast(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    let is_cast_type = c
        .peek_at(1)
        .is_some_and(|t| t.kind == TokenKind::Ident && CAST_TYPES.contains(&t.text));

    if c.check_punct("(") && is_cast_type {
        let mark = c.mark();
        c.advance();
        let ty = c.expect_name()?.to_string();
        let nullable = c.eat_punct("?");
        if c.eat_punct(")") {
            let expr = parse_unary(c)?;
            return Ok(Expr::Cast {
                ty: if nullable { format!("{ty}?") } else { ty },
                expr: boxed(expr),
            });
        }
        c.reset(mark);
    }

    parse_postfix(c)
}

fn parse_postfix(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    let mut expr = parse_primary(c)?;

    loop {
        if c.check_punct(".") {
            match c.peek_at(1) {
                Some(t) if t.kind == TokenKind::Ident => {
                    let name = t.text.to_string();
                    c.advance();
                    c.advance();
                    expr = Expr::Member {
                        base: boxed(expr),
                        name,
                    };
                }
                Some(t) if t.is_punct("*") => {
                    c.advance();
                    c.advance();
                    expr = Expr::Member {
                        base: boxed(expr),
                        name: "*".to_string(),
                    };
                }
                _ => return Ok(expr),
            }
        } else if c.check_punct("(") && matches!(expr, Expr::Path(_) | Expr::Member { .. }) {
            let args = parse_call_args(c)?;
            expr = Expr::Call {
                callee: boxed(expr),
                args,
            };
        } else if c.eat_punct("[") {
            let index = parse_expr(c)?;
            c.expect_punct("]")?;
            expr = Expr::Index {
                base: boxed(expr),
                index: boxed(index),
            };
        } else {
            return Ok(expr);
        }
    }
}

fn parse_primary(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    let Some(token) = c.peek().copied() else {
        return Err(c.error("Expected expression"));
    };

    match token.kind {
        TokenKind::Str => {
            c.advance();
            Ok(Expr::Literal(Literal::Str(token.text.to_string())))
        }
        TokenKind::Number => {
            c.advance();
            Ok(Expr::Literal(Literal::Number(token.text.to_string())))
        }
        TokenKind::Variable => {
            c.advance();
            Ok(Expr::Variable(token.text.to_string()))
        }
        TokenKind::Punct if token.text == "*" => {
            c.advance();
            Ok(Expr::Star)
        }
        TokenKind::Punct if token.text == "(" => {
            c.advance();
            let expr = if c.check_ident("SELECT") {
                Expr::Subquery(Box::new(parse_select_query(c)?))
            } else {
                parse_expr(c)?
            };
            c.expect_punct(")")?;
            Ok(expr)
        }
        TokenKind::Ident => parse_word(c, token.text),
        _ => Err(c.error(format!("Unexpected token '{}'", token.text))),
    }
}

fn parse_word(c: &mut Cursor<'_, '_>, word: &str) -> Result<Expr, ParseError> {
    let followed_by_paren = c.peek_at(1).is_some_and(|t| t.is_punct("("));

    match word {
        "true" | "TRUE" => {
            c.advance();
            Ok(Expr::Literal(Literal::Bool(true)))
        }
        "false" | "FALSE" => {
            c.advance();
            Ok(Expr::Literal(Literal::Bool(false)))
        }
        "null" | "NULL" => {
            c.advance();
            Ok(Expr::Literal(Literal::Null))
        }
        "IF" if followed_by_paren => parse_if(c),
        "new" if c.peek_at(1).is_some_and(|t| t.kind == TokenKind::Ident) => parse_new(c),
        _ if followed_by_paren && AGGREGATES.contains(&word) => parse_aggregate(c),
        _ if is_reserved(word) => Err(c.error(format!("Unexpected keyword '{word}'"))),
        _ => {
            let path = c.dotted_name()?;
            Ok(Expr::Path(path.split('.').map(str::to_string).collect()))
        }
    }
}

fn parse_if(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    c.expect_ident("IF")?;
    c.expect_punct("(")?;
    let condition = parse_expr(c)?;
    c.expect_punct(",")?;
    let then = parse_expr(c)?;
    c.expect_punct(",")?;
    let otherwise = parse_expr(c)?;
    c.expect_punct(")")?;
    Ok(Expr::If {
        condition: boxed(condition),
        then: boxed(then),
        otherwise: boxed(otherwise),
    })
}

fn parse_aggregate(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    let name = c.expect_name()?.to_string();
    c.expect_punct("(")?;
    let distinct = c.eat_ident("DISTINCT");
    let args = parse_expr_list(c, ")")?;
    c.expect_punct(")")?;

    let windowed = c.eat_ident("OVER");
    if windowed {
        c.expect_punct("(")?;
        if c.eat_ident("PARTITION") {
            c.expect_ident("BY")?;
            parse_expr_list(c, ")")?;
        }
        if c.eat_ident("ORDER") {
            c.expect_ident("BY")?;
            parse_order_items(c)?;
        }
        c.expect_punct(")")?;
    }

    Ok(Expr::Aggregate {
        name,
        distinct,
        args,
        windowed,
    })
}

/// `new Type<...>(args) { initializers }`
fn parse_new(c: &mut Cursor<'_, '_>) -> Result<Expr, ParseError> {
    c.expect_ident("new")?;
    let mut ty = c.dotted_name()?;

    if c.check_punct("<") {
        let start = c.mark();
        c.advance();
        let mut depth = 1usize;
        while depth > 0 {
            match c.advance() {
                Some(t) if t.is_punct("<") => depth += 1,
                Some(t) if t.is_punct(">") => depth -= 1,
                Some(_) => {}
                None => return Err(c.error("Unterminated generic argument list")),
            }
        }
        ty.push_str(c.text_since(start));
    }

    let args = if c.check_punct("(") {
        parse_call_args(c)?
    } else {
        Vec::new()
    };

    let initializers = if c.eat_punct("{") {
        let items = parse_expr_list(c, "}")?;
        c.expect_punct("}")?;
        items
    } else {
        Vec::new()
    };

    Ok(Expr::New {
        ty,
        args,
        initializers,
    })
}

/// `( [arg {, arg}] )`; C# named arguments (`name: value`) keep only the value.
pub(crate) fn parse_call_args(c: &mut Cursor<'_, '_>) -> Result<Vec<Expr>, ParseError> {
    c.expect_punct("(")?;
    let mut args = Vec::new();
    if c.eat_punct(")") {
        return Ok(args);
    }
    loop {
        let named = c.check_kind(TokenKind::Ident) && c.peek_at(1).is_some_and(|t| t.is_punct(":"));
        if named {
            c.advance();
            c.advance();
        }
        args.push(parse_expr(c)?);
        if !c.eat_punct(",") {
            break;
        }
    }
    c.expect_punct(")")?;
    Ok(args)
}

/// Comma-separated expressions, possibly empty when `close` follows immediately.
pub(crate) fn parse_expr_list(c: &mut Cursor<'_, '_>, close: &str) -> Result<Vec<Expr>, ParseError> {
    let mut items = Vec::new();
    if c.check_punct(close) {
        return Ok(items);
    }
    loop {
        items.push(parse_expr(c)?);
        if !c.eat_punct(",") {
            return Ok(items);
        }
    }
}

/// `expr [ASC|DESC] {, expr [ASC|DESC]}`
pub(crate) fn parse_order_items(c: &mut Cursor<'_, '_>) -> Result<Vec<Expr>, ParseError> {
    let mut items = Vec::new();
    loop {
        items.push(parse_expr(c)?);
        if !c.eat_ident("ASC") {
            c.eat_ident("DESC");
        }
        if !c.eat_punct(",") {
            return Ok(items);
        }
    }
}

/// Parses `text` as one complete expression.
pub fn parse_expression(text: &str) -> Result<Expr, ParseError> {
    let tokens = super::lexer::tokenize(text)?;
    let mut cursor = Cursor::new(text, &tokens);
    let expr = parse_expr(&mut cursor)?;
    cursor.expect_end()?;
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Expr {
        Expr::Path(parts.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("a + b * c == d AND NOT e").unwrap();
        let Expr::Binary { op, left, .. } = expr else {
            panic!("expected AND");
        };
        assert_eq!(op, "AND");
        let Expr::Binary { op, left, .. } = *left else {
            panic!("expected ==");
        };
        assert_eq!(op, "==");
        assert!(matches!(*left, Expr::Binary { ref op, .. } if op == "+"));
    }

    #[test]
    fn test_function_chain() {
        let expr = parse_expression(r#"DateTime.Parse(@d).AddDays(-1).ToString("yyyyMMdd")"#).unwrap();
        assert_eq!(expr.call_path().as_deref(), Some("DateTime.Parse.AddDays.ToString"));
        let Expr::Call { callee, args } = expr else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        let Expr::Member { base, name } = *callee else {
            panic!("expected member");
        };
        assert_eq!(name, "ToString");
        assert!(matches!(*base, Expr::Call { .. }));
    }

    #[test]
    fn test_ternary_and_coalesce() {
        let expr = parse_expression("a == null ? b ?? c : (int?) d").unwrap();
        let Expr::Ternary { then, otherwise, .. } = expr else {
            panic!("expected ternary");
        };
        assert!(matches!(*then, Expr::Binary { ref op, .. } if op == "??"));
        assert!(matches!(*otherwise, Expr::Cast { ref ty, .. } if ty == "int?"));
    }

    #[test]
    fn test_sql_predicates() {
        assert!(matches!(
            parse_expression("a NOT IN (1, 2)").unwrap(),
            Expr::InList { negated: true, .. }
        ));
        assert!(matches!(
            parse_expression("a IN (SELECT b FROM t)").unwrap(),
            Expr::InQuery { negated: false, .. }
        ));
        assert!(matches!(
            parse_expression("a IS NOT NULL").unwrap(),
            Expr::IsNull { negated: true, .. }
        ));
        assert!(matches!(
            parse_expression("a BETWEEN 1 AND 2").unwrap(),
            Expr::Between { .. }
        ));
        assert!(matches!(
            parse_expression(r#"a LIKE "%x%""#).unwrap(),
            Expr::Like { .. }
        ));
    }

    #[test]
    fn test_aggregate_with_window() {
        let expr =
            parse_expression("COUNT(DISTINCT a) OVER (PARTITION BY b ORDER BY c DESC)").unwrap();
        assert!(matches!(
            expr,
            Expr::Aggregate {
                distinct: true,
                windowed: true,
                ..
            }
        ));
    }

    #[test]
    fn test_if_new_and_index() {
        assert!(matches!(
            parse_expression("IF(a > 1, b, c)").unwrap(),
            Expr::If { .. }
        ));
        assert!(matches!(
            parse_expression("new List<string>{ \"a\", \"b\" }").unwrap(),
            Expr::New { ref ty, ref initializers, .. } if ty == "List<string>" && initializers.len() == 2
        ));
        assert!(matches!(
            parse_expression("m[\"k\"].Trim()").unwrap(),
            Expr::Call { .. }
        ));
    }

    #[test]
    fn test_qualified_star_and_paths() {
        let expr = parse_expression("t.*").unwrap();
        assert_eq!(
            expr,
            Expr::Member {
                base: Box::new(path(&["t"])),
                name: "*".to_string()
            }
        );
        assert_eq!(parse_expression("a.b.c").unwrap(), path(&["a", "b", "c"]));
    }

    #[test]
    fn test_reserved_word_is_not_an_operand() {
        assert!(parse_expression("WHERE").is_err());
    }
}
