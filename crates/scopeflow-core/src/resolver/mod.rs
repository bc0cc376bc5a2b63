//! Scope resolver: evaluates declared right-hand sides from their text alone.
//!
//! Three shapes are understood:
//!
//! - function chains such as `DateTime.Parse(@Start).AddDays(-1).ToString("yyyyMMdd")`
//!   or `@Date.AddDays(1)`, applied left to right;
//! - `String.Format(@"/data/{0}/{1:yyyy-MM-dd}.ss", @Root, @Date)`;
//! - `+` concatenations of literals, variables, numbers and function chains.
//!
//! When a date took part in producing a string, the whole string is passed through
//! `strftime` with that date, so `%Y/%m/%d` directives in stream paths are filled in.
//! Anything else is kept as written. Resolution never fails: a failure selects
//! fallback text and is reported through [`Resolution::fallback`].

mod rvalue;

use chrono::NaiveDate;

use crate::error::ResolveError;
use crate::parser::{parse_expression, MAP_TYPE};
use crate::preprocess::literals::unquote;
use crate::types::{default_reference_date, DeclareMap, Value};
use rvalue::{Evaluator, Rvalue};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// A resolved value plus the error that forced fallback text, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub value: Value,
    pub fallback: Option<ResolveError>,
}

impl Resolution {
    fn resolved(value: Value) -> Self {
        Self {
            value,
            fallback: None,
        }
    }
}

/// Typed resolution of `rvalue` against `declare_map`.
///
/// Unlike [`resolve`], errors are returned instead of being replaced by fallback text.
pub fn try_resolve(rvalue: &str, declare_map: &DeclareMap) -> Result<Value, ResolveError> {
    let expr = parse_expression(rvalue).map_err(|_| ResolveError::Unrecognized(rvalue.to_string()))?;
    let shape = Rvalue::classify(&expr).ok_or_else(|| ResolveError::Unrecognized(rvalue.to_string()))?;

    let mut evaluator = Evaluator::new(declare_map);
    let value = evaluator.evaluate(&shape)?;
    Ok(evaluator.finish(value))
}

/// Resolves `rvalue`, reporting which error (if any) selected the fallback text.
///
/// Unrecognized text is returned unchanged without a fallback error. A failing
/// concatenation yields the literal text of its first segment; any other
/// failure yields the original text.
pub fn resolve_detailed(rvalue: &str, declare_map: &DeclareMap) -> Resolution {
    let rvalue = rvalue.trim();
    let Ok(expr) = parse_expression(rvalue) else {
        return Resolution::resolved(strip_verbatim(rvalue));
    };
    let Some(shape) = Rvalue::classify(&expr) else {
        return Resolution::resolved(strip_verbatim(rvalue));
    };

    let mut evaluator = Evaluator::new(declare_map);
    match evaluator.evaluate(&shape) {
        Ok(value) => Resolution::resolved(post_process(evaluator.finish(value))),
        Err(err) => {
            let text = shape.first_literal().unwrap_or_else(|| rvalue.to_string());
            #[cfg(feature = "tracing")]
            warn!(rvalue, error = %err, fallback = %text, "declared value resolved to fallback text");
            Resolution {
                value: strip_verbatim(&text),
                fallback: Some(err),
            }
        }
    }
}

/// Resolves `rvalue` against `declare_map`; never fails.
pub fn resolve(rvalue: &str, declare_map: &DeclareMap) -> Value {
    resolve_detailed(rvalue, declare_map).value
}

/// One in-place pass over a map of raw right-hand sides, in declaration order.
///
/// A value that is exactly another declared name copies that entry's current
/// value; everything else is resolved against the map as it stands. Failures
/// keep the resolved fallback text.
pub fn resolve_declare(declare_map: &mut DeclareMap) {
    for index in 0..declare_map.len() {
        let Some(raw) = declare_map.get_index(index).and_then(|(_, v)| v.as_str()).map(str::to_string) else {
            continue;
        };
        let value = match declare_map.get(raw.trim()) {
            Some(aliased) => aliased.clone(),
            None => resolve(&raw, declare_map),
        };
        if let Some((_, slot)) = declare_map.get_index_mut(index) {
            *slot = value;
        }
    }
}

fn strip_verbatim(text: &str) -> Value {
    if text.starts_with("@\"") && text.ends_with('"') && text.len() >= 3 {
        Value::String(unquote(text))
    } else {
        Value::String(text.to_string())
    }
}

fn post_process(value: Value) -> Value {
    match value {
        Value::String(text) => strip_verbatim(&text),
        other => other,
    }
}

/// Owns the declare map of one analyzed unit.
#[derive(Debug, Clone)]
pub struct ScopeResolver {
    declare_map: DeclareMap,
    reference_date: NaiveDate,
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeResolver {
    pub fn new() -> Self {
        Self {
            declare_map: DeclareMap::new(),
            reference_date: default_reference_date(),
        }
    }

    /// Pins the reference date used to fill date directives during annotation.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Resolves and stores one `#DECLARE`/`#SET` value.
    ///
    /// `MAP`-typed declarations store the literal marker `"MAP"`. An rvalue that
    /// names an already declared variable copies its value.
    pub fn declare(&mut self, name: &str, rvalue: &str, declared_type: Option<&str>) -> Resolution {
        let resolution = if declared_type == Some(MAP_TYPE) {
            Resolution::resolved(Value::string(MAP_TYPE))
        } else if let Some(aliased) = self.declare_map.get(rvalue.trim()) {
            Resolution::resolved(aliased.clone())
        } else {
            resolve_detailed(rvalue, &self.declare_map)
        };

        #[cfg(feature = "tracing")]
        debug!(name, value = %resolution.value, "declared");

        self.declare_map.insert(name.to_string(), resolution.value.clone());
        resolution
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.declare_map.get(name)
    }

    pub fn declare_map(&self) -> &DeclareMap {
        &self.declare_map
    }

    pub fn into_declare_map(self) -> DeclareMap {
        self.declare_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::start_of_day;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::DateTime(start_of_day(NaiveDate::from_ymd_opt(y, m, d).unwrap()))
    }

    fn map(pairs: &[(&str, Value)]) -> DeclareMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_concatenation_with_variable() {
        let declared = map(&[("@x", Value::from("MID"))]);
        assert_eq!(resolve(r#""a" + @x + "b""#, &declared), Value::from("aMIDb"));
    }

    #[test]
    fn test_integer_addition_and_mixed_concat() {
        let declared = map(&[("@n", Value::from(4))]);
        assert_eq!(resolve("@n + 1", &declared), Value::from(5));
        assert_eq!(resolve(r#""v" + @n"#, &declared), Value::from("v4"));
        assert_eq!(resolve("-7", &declared), Value::from(-7));
    }

    #[test]
    fn test_format_placeholder_with_date_format() {
        let declared = map(&[("@d", date(2024, 3, 9))]);
        let value = resolve(r#"String.Format(@"/data/{0:yyyy-MM-dd}/x.ss", @d)"#, &declared);
        assert_eq!(value, Value::from("/data/2024-03-09/x.ss"));
    }

    #[test]
    fn test_format_repeated_placeholders_and_strftime_pass() {
        let declared = map(&[("@root", Value::from("/r")), ("@d", date(2023, 12, 1))]);
        let value = resolve(
            r#"String.Format("{0}/%Y/{1:yyyyMMdd}/{0}", @root, @d)"#,
            &declared,
        );
        assert_eq!(value, Value::from("/r/2023/20231201//r"));
    }

    #[test]
    fn test_format_missing_argument_falls_back() {
        let resolution = resolve_detailed(r#"String.Format("{0}{1}", "a")"#, &DeclareMap::new());
        assert_eq!(
            resolution.fallback,
            Some(ResolveError::PlaceholderIndex("1".to_string()))
        );
        assert_eq!(resolution.value, Value::from(r#"String.Format("{0}{1}", "a")"#));
    }

    #[test]
    fn test_func_chain_add_days_then_to_string() {
        let value = resolve(
            r#"DateTime.Parse("2024-03-01").AddDays(-1).ToString("yyyy-MM-dd")"#,
            &DeclareMap::new(),
        );
        assert_eq!(value, Value::from("2024-02-29"));
    }

    #[test]
    fn test_func_chain_on_declared_variable() {
        let declared = map(&[("@d", date(2024, 1, 31))]);
        assert_eq!(resolve("@d.AddDays(1)", &declared), date(2024, 2, 1));
        assert_eq!(
            resolve(r#"@d.AddDays(1).ToString("yyyyMMdd")"#, &declared),
            Value::from("20240201")
        );
    }

    #[test]
    fn test_parse_functions() {
        let declared = map(&[("@s", Value::from("-12"))]);
        assert_eq!(resolve("int.Parse(@s)", &declared), Value::from(-12));
        assert_eq!(resolve("Math.Abs(@s)", &declared), Value::from(12));
        assert_eq!(
            resolve(r#"DateTime.Parse("2024-05-06")"#, &declared),
            date(2024, 5, 6)
        );
    }

    #[test]
    fn test_concat_with_chain_fills_path_directives() {
        let declared = map(&[("@d", date(2024, 7, 20))]);
        let value = resolve(
            r#"@"/shares/x/%Y/%m/daily_%Y-%m-%d.ss?date=" + @d.AddDays(-3).ToString("yyyy-MM-dd")"#,
            &declared,
        );
        assert_eq!(
            value,
            Value::from("/shares/x/2024/07/daily_2024-07-17.ss?date=2024-07-17")
        );
    }

    #[test]
    fn test_stray_percent_keeps_path_directives() {
        let mut resolver = ScopeResolver::new();
        resolver.declare("@d", r#"DateTime.Parse("2024-01-05")"#, Some("DateTime"));
        let resolution = resolver.declare(
            "@p",
            r#""/a/%Y/%m/%d/" + @d.ToString("yyyyMMdd") + "?q=100%""#,
            Some("string"),
        );
        assert!(resolution.fallback.is_none());
        assert_eq!(resolution.value, Value::from("/a/2024/01/05/20240105?q=100%"));
    }

    #[test]
    fn test_concat_failure_returns_first_literal() {
        let declared = map(&[("@d", date(2024, 7, 20))]);
        let resolution = resolve_detailed(r#""/prefix/" + @d"#, &declared);
        assert_eq!(resolution.value, Value::from("/prefix/"));
        assert!(matches!(resolution.fallback, Some(ResolveError::TypeMismatch(_))));
    }

    #[test]
    fn test_unrecognized_text_is_unchanged() {
        let resolution = resolve_detailed("a == b ? 1 : 2", &DeclareMap::new());
        assert_eq!(resolution.value, Value::from("a == b ? 1 : 2"));
        assert!(resolution.fallback.is_none());
        assert!(try_resolve("a == b ? 1 : 2", &DeclareMap::new()).is_err());
    }

    #[test]
    fn test_verbatim_literal_is_unquoted() {
        assert_eq!(
            resolve(r#"@"/data/in.ss""#, &DeclareMap::new()),
            Value::from("/data/in.ss")
        );
    }

    #[test]
    fn test_resolve_declare_pass() {
        let mut declared = map(&[
            ("@root", Value::from(r#""/data""#)),
            ("@alias", Value::from("@root")),
            ("@path", Value::from(r#"@root + "/x.ss""#)),
        ]);
        resolve_declare(&mut declared);
        assert_eq!(declared["@root"], Value::from("/data"));
        assert_eq!(declared["@alias"], Value::from("/data"));
        assert_eq!(declared["@path"], Value::from("/data/x.ss"));
    }

    #[test]
    fn test_scope_resolver_declare() {
        let mut resolver = ScopeResolver::new();
        resolver.declare("@n", "5", Some("int"));
        resolver.declare("@m", "@n", Some("int"));
        let map_decl = resolver.declare("@lookup", "new MAP<string, string>{}", Some(MAP_TYPE));
        assert_eq!(map_decl.value, Value::from("MAP"));
        assert_eq!(resolver.get("@m"), Some(&Value::from(5)));
        let keys: Vec<_> = resolver.declare_map().keys().cloned().collect();
        assert_eq!(keys, vec!["@n", "@m", "@lookup"]);
    }
}
