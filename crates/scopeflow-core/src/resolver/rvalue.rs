//! Typed evaluation of declared right-hand sides.

use std::sync::OnceLock;

use chrono::{Duration, NaiveDateTime};
use regex::{Captures, Regex};

use crate::dates::{csharp_to_strftime, fill_date_tokens, has_date_tokens, parse_datetime, strftime};
use crate::error::ResolveError;
use crate::parser::{Expr, Literal};
use crate::preprocess::literals::unquote;
use crate::types::{DeclareMap, Value};

const FORMAT_FUNCTIONS: &[&str] = &["String.Format", "string.Format"];

const STATIC_FUNCTIONS: &[&str] = &[
    "DateTime.Parse",
    "DateTime.ParseExact",
    "int.Parse",
    "Int32.Parse",
    "long.Parse",
    "Math.Abs",
];

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\d+)(?::([^}]*))?\}").expect("Invalid regex pattern"))
}

/// The recognized shapes of a right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Rvalue<'e> {
    /// A static parse function or a declared variable followed by method calls.
    FuncChain(&'e Expr),
    /// `String.Format(template, args...)`
    FormatStr {
        template: &'e Expr,
        args: &'e [Expr],
    },
    /// `+`-joined segments. A lone literal or variable is a single segment.
    StrCat(Vec<&'e Expr>),
}

impl<'e> Rvalue<'e> {
    pub(crate) fn classify(expr: &'e Expr) -> Option<Self> {
        match expr {
            Expr::Binary { op, .. } if op == "+" => {
                let mut segments = Vec::new();
                flatten_concat(expr, &mut segments);
                Some(Self::StrCat(segments))
            }
            Expr::Call { args, .. } if is_format_call(expr) => args
                .split_first()
                .map(|(template, args)| Self::FormatStr { template, args }),
            Expr::Call { .. } if chain_root(expr).is_some() => Some(Self::FuncChain(expr)),
            Expr::Literal(_) | Expr::Variable(_) | Expr::Unary { .. } => Some(Self::StrCat(vec![expr])),
            Expr::Binary { op, .. } if matches!(op.as_str(), "-" | "*" | "/" | "%") => {
                Some(Self::StrCat(vec![expr]))
            }
            _ => None,
        }
    }

    /// Literal text of the first segment, used when a concatenation fails.
    pub(crate) fn first_literal(&self) -> Option<String> {
        match self {
            Self::StrCat(segments) => segments.first().map(|segment| match segment {
                Expr::Literal(Literal::Str(raw)) => unquote(raw),
                Expr::Literal(Literal::Number(raw)) => raw.clone(),
                Expr::Variable(name) => name.clone(),
                other => other.dotted().unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

fn flatten_concat<'e>(expr: &'e Expr, out: &mut Vec<&'e Expr>) {
    match expr {
        Expr::Binary { op, left, right } if op == "+" => {
            flatten_concat(left, out);
            flatten_concat(right, out);
        }
        _ => out.push(expr),
    }
}

fn is_format_call(expr: &Expr) -> bool {
    expr.call_path()
        .is_some_and(|path| FORMAT_FUNCTIONS.contains(&path.as_str()))
}

/// Where a method chain starts.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ChainRoot<'e> {
    Static(&'static str, &'e [Expr]),
    Variable(&'e str),
}

/// One method call of a chain, in application order.
struct Method<'e> {
    name: &'e str,
    args: &'e [Expr],
}

fn chain_root(expr: &Expr) -> Option<ChainRoot<'_>> {
    match expr {
        Expr::Variable(name) => Some(ChainRoot::Variable(name)),
        Expr::Call { callee, args } => match callee.as_ref() {
            Expr::Path(_) => {
                let path = callee.dotted()?;
                STATIC_FUNCTIONS
                    .iter()
                    .find(|f| **f == path)
                    .map(|f| ChainRoot::Static(*f, args))
            }
            Expr::Member { base, .. } => chain_root(base),
            _ => None,
        },
        Expr::Member { base, .. } => chain_root(base),
        _ => None,
    }
}

/// Unwinds `root.A(x).B(y)` into its methods, innermost first.
fn chain_methods<'e>(expr: &'e Expr, out: &mut Vec<Method<'e>>) -> Result<(), ResolveError> {
    match expr {
        Expr::Variable(_) => Ok(()),
        Expr::Call { callee, args } => match callee.as_ref() {
            Expr::Path(_) => Ok(()),
            Expr::Member { base, name } => {
                chain_methods(base, out)?;
                out.push(Method { name, args });
                Ok(())
            }
            other => Err(ResolveError::Unrecognized(format!("{other:?}"))),
        },
        Expr::Member { name, .. } => Err(ResolveError::Unrecognized(format!(
            "property access '{name}' is not supported"
        ))),
        other => Err(ResolveError::Unrecognized(format!("{other:?}"))),
    }
}

fn integer_literal(raw: &str) -> Option<i64> {
    let digits = raw.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    digits.parse().ok()
}

/// Evaluates expressions against a declare map, remembering the last date
/// that participated so the caller can run the final `strftime` pass.
pub(crate) struct Evaluator<'m> {
    map: &'m DeclareMap,
    last_date: Option<NaiveDateTime>,
}

impl<'m> Evaluator<'m> {
    pub(crate) fn new(map: &'m DeclareMap) -> Self {
        Self {
            map,
            last_date: None,
        }
    }

    pub(crate) fn evaluate(&mut self, rvalue: &Rvalue<'_>) -> Result<Value, ResolveError> {
        match rvalue {
            Rvalue::FuncChain(expr) => self.func_chain(expr),
            Rvalue::FormatStr { template, args } => self.format_str(template, args),
            Rvalue::StrCat(segments) => self.str_cat(segments),
        }
    }

    /// Any expression: dispatches to the rvalue shape it has.
    fn expr(&mut self, expr: &Expr) -> Result<Value, ResolveError> {
        match Rvalue::classify(expr) {
            Some(Rvalue::StrCat(segments)) if segments.len() == 1 => self.segment(segments[0]),
            Some(rvalue) => self.evaluate(&rvalue),
            None => Err(ResolveError::Unrecognized(
                expr.dotted().unwrap_or_else(|| format!("{expr:?}")),
            )),
        }
    }

    fn segment(&mut self, expr: &Expr) -> Result<Value, ResolveError> {
        match expr {
            Expr::Literal(Literal::Str(raw)) => Ok(Value::String(unquote(raw))),
            Expr::Literal(Literal::Number(raw)) => Ok(integer_literal(raw)
                .map(Value::Integer)
                .unwrap_or_else(|| Value::String(raw.clone()))),
            Expr::Literal(Literal::Bool(b)) => Ok(Value::String(b.to_string())),
            Expr::Literal(Literal::Null) => Ok(Value::String(String::new())),
            // Undeclared variables stand for themselves.
            Expr::Variable(name) => Ok(self
                .map
                .get(name)
                .cloned()
                .unwrap_or_else(|| Value::String(name.clone()))),
            Expr::Unary { op, expr } if op == "-" => match self.segment(expr)? {
                Value::Integer(n) => Ok(Value::Integer(-n)),
                other => Err(ResolveError::TypeMismatch(format!("cannot negate '{other}'"))),
            },
            Expr::Unary { op, expr } if op == "+" => self.segment(expr),
            Expr::Unary { op, .. } => Err(ResolveError::Unrecognized(format!("operator '{op}'"))),
            Expr::Binary { op, left, right } if op != "+" => {
                let left = self.integer(left)?;
                let right = self.integer(right)?;
                arithmetic(op, left, right)
            }
            _ => self.expr(expr),
        }
    }

    fn integer(&mut self, expr: &Expr) -> Result<i64, ResolveError> {
        self.segment(expr).and_then(to_integer)
    }

    fn func_chain(&mut self, expr: &Expr) -> Result<Value, ResolveError> {
        let root = chain_root(expr).ok_or_else(|| ResolveError::Unrecognized(format!("{expr:?}")))?;

        let mut value = match root {
            ChainRoot::Variable(name) => self
                .map
                .get(name)
                .cloned()
                .ok_or_else(|| ResolveError::Unrecognized(name.to_string()))?,
            ChainRoot::Static(function, args) => self.static_call(function, args)?,
        };
        self.note_date(&value);

        let mut methods = Vec::new();
        chain_methods(expr, &mut methods)?;
        for method in methods {
            value = self.method(value, &method)?;
            self.note_date(&value);
        }

        Ok(value)
    }

    fn static_call(&mut self, function: &str, args: &[Expr]) -> Result<Value, ResolveError> {
        let arg = args
            .first()
            .ok_or_else(|| ResolveError::Unrecognized(format!("{function}()")))?;
        let value = self.segment(arg)?;

        match function {
            "DateTime.Parse" | "DateTime.ParseExact" => match value {
                Value::DateTime(dt) => Ok(Value::DateTime(dt)),
                other => parse_datetime(&other.to_string()).map(Value::DateTime),
            },
            "Math.Abs" => to_integer(value).map(|n| Value::Integer(n.abs())),
            _ => to_integer(value).map(Value::Integer),
        }
    }

    fn method(&mut self, receiver: Value, method: &Method<'_>) -> Result<Value, ResolveError> {
        match method.name {
            "AddDays" => {
                let Value::DateTime(dt) = receiver else {
                    return Err(ResolveError::TypeMismatch(format!(
                        "AddDays on non-date value '{receiver}'"
                    )));
                };
                let days = match method.args.first() {
                    Some(arg) => self.integer(arg)?,
                    None => return Err(ResolveError::Unrecognized("AddDays()".to_string())),
                };
                dt.checked_add_signed(Duration::days(days))
                    .map(Value::DateTime)
                    .ok_or_else(|| ResolveError::InvalidDate(format!("{dt} + {days} days")))
            }
            "ToString" => {
                let format = match method.args.first() {
                    Some(arg) => Some(self.segment(arg)?.to_string()),
                    None => None,
                };
                match (receiver, format) {
                    (Value::DateTime(dt), Some(format)) if has_date_tokens(&format) => {
                        Ok(Value::String(strftime(&csharp_to_strftime(&format), &dt)))
                    }
                    (receiver, _) => Ok(Value::String(receiver.to_string())),
                }
            }
            other => Err(ResolveError::Unrecognized(format!("method '{other}'"))),
        }
    }

    fn format_str(&mut self, template: &Expr, args: &[Expr]) -> Result<Value, ResolveError> {
        let template = self.segment(template)?.to_string();
        let values = args
            .iter()
            .map(|arg| self.segment(arg))
            .collect::<Result<Vec<_>, _>>()?;

        let mut missing = None;
        let mut date = None;
        let rendered = placeholder_regex().replace_all(&template, |caps: &Captures<'_>| {
            let index = &caps[1];
            let Some(value) = index.parse::<usize>().ok().and_then(|i| values.get(i)) else {
                missing.get_or_insert_with(|| index.to_string());
                return String::new();
            };
            match (value, caps.get(2).map(|m| m.as_str())) {
                (Value::DateTime(dt), Some(format)) if has_date_tokens(format) => {
                    date = Some(*dt);
                    fill_date_tokens(format, dt)
                }
                (Value::DateTime(dt), _) => {
                    date = Some(*dt);
                    value.to_string()
                }
                (value, _) => value.to_string(),
            }
        });

        if let Some(index) = missing {
            return Err(ResolveError::PlaceholderIndex(index));
        }
        let rendered = rendered.into_owned();
        if let Some(dt) = date {
            self.last_date = Some(dt);
        }
        Ok(Value::String(rendered))
    }

    fn str_cat(&mut self, segments: &[&Expr]) -> Result<Value, ResolveError> {
        let mut acc: Option<Value> = None;

        for segment in segments {
            let value = self.segment(segment)?;
            acc = Some(match acc {
                None => value,
                Some(left) => concat(left, value)?,
            });
        }

        acc.ok_or_else(|| ResolveError::Unrecognized(String::new()))
    }

    fn note_date(&mut self, value: &Value) {
        if let Value::DateTime(dt) = value {
            self.last_date = Some(*dt);
        }
    }

    /// Runs `result` through `strftime` with the last participating date.
    ///
    /// Any `%` directive in the text is interpreted, including ones that came
    /// from literals. Unknown directives stay as written.
    pub(crate) fn finish(&self, result: Value) -> Value {
        match (result, self.last_date) {
            (Value::String(text), Some(dt)) => Value::String(strftime(&text, &dt)),
            (result, _) => result,
        }
    }
}

fn to_integer(value: Value) -> Result<i64, ResolveError> {
    match value {
        Value::Integer(n) => Ok(n),
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| ResolveError::InvalidInteger(text)),
        other => Err(ResolveError::TypeMismatch(format!("'{other}' is not an integer"))),
    }
}

fn concat(left: Value, right: Value) -> Result<Value, ResolveError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_add(b)
            .map(Value::Integer)
            .ok_or_else(|| ResolveError::InvalidInteger(format!("{a} + {b}"))),
        (left @ Value::DateTime(_), right) | (left, right @ Value::DateTime(_)) => Err(
            ResolveError::TypeMismatch(format!("cannot concatenate '{left}' and '{right}'")),
        ),
        (left, right) => Ok(Value::String(format!("{left}{right}"))),
    }
}

fn arithmetic(op: &str, left: i64, right: i64) -> Result<Value, ResolveError> {
    let result = match op {
        "-" => left.checked_sub(right),
        "*" => left.checked_mul(right),
        "/" => left.checked_div(right),
        "%" => left.checked_rem(right),
        _ => None,
    };
    result
        .map(Value::Integer)
        .ok_or_else(|| ResolveError::TypeMismatch(format!("{left} {op} {right}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn shape(text: &str) -> &'static str {
        let expr = parse_expression(text).unwrap();
        match Rvalue::classify(&expr) {
            Some(Rvalue::FuncChain(_)) => "func_chain",
            Some(Rvalue::FormatStr { .. }) => "format_str",
            Some(Rvalue::StrCat(_)) => "str_cat",
            None => "unrecognized",
        }
    }

    #[test]
    fn test_classify_shapes() {
        assert_eq!(shape(r#"DateTime.Parse("2024-01-01")"#), "func_chain");
        assert_eq!(shape(r#"@d.AddDays(-1).ToString("yyyyMMdd")"#), "func_chain");
        assert_eq!(shape(r#"String.Format("{0}", @x)"#), "format_str");
        assert_eq!(shape(r#""a" + @x"#), "str_cat");
        assert_eq!(shape(r#""plain""#), "str_cat");
        assert_eq!(shape("Lib.Unknown(@x)"), "unrecognized");
        assert_eq!(shape("a == b"), "unrecognized");
    }

    #[test]
    fn test_concat_types() {
        assert_eq!(concat(Value::from(2), Value::from(3)).unwrap(), Value::from(5));
        assert_eq!(concat(Value::from("v"), Value::from(3)).unwrap(), Value::from("v3"));
        let dt = crate::dates::parse_datetime("2024-01-01").unwrap();
        assert!(matches!(
            concat(Value::from("v"), Value::from(dt)),
            Err(ResolveError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_integer_literal_suffix() {
        assert_eq!(integer_literal("10L"), Some(10));
        assert_eq!(integer_literal("1.5"), None);
    }
}
