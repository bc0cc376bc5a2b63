//! External parameter substitution (`@@NAME@@`).

use crate::dates::{fill_date_tokens, has_date_tokens, start_of_day};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

fn external_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@@(.*?)@@").expect("Invalid regex pattern"))
}

/// Replaces every `@@NAME@@` with `params[NAME]`; unknown markers are left as-is.
///
/// When a quoted value lands inside quotes (`"@@Path@@"` with `Path = "\"/a\""`),
/// the doubled quotes are repaired so the result is `"/a"` rather than `""/a""`.
pub fn substitute_external_params(text: &str, params: &HashMap<String, String>) -> String {
    let bytes = text.as_bytes();

    external_param_regex()
        .replace_all(text, |caps: &Captures<'_>| {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                return String::new();
            };
            let Some(value) = params.get(name.as_str()) else {
                return whole.as_str().to_string();
            };

            let quoted_before = whole.start() > 0 && bytes[whole.start() - 1] == b'"';
            let quoted_after = bytes.get(whole.end()) == Some(&b'"');

            let mut value = value.as_str();
            if quoted_before {
                value = value.strip_prefix('"').unwrap_or(value);
            }
            if quoted_after {
                value = value.strip_suffix('"').unwrap_or(value);
            }
            value.to_string()
        })
        .into_owned()
}

/// True for parameter names that carry a date or time.
fn is_date_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("date") || lower.contains("time")
}

/// Expands friendly date patterns in date-like parameters.
///
/// A parameter whose name mentions a date or time and whose value contains
/// `yyyy`/`MM`/`dd` tokens (for example `RunDate = yyyy-MM-dd`) is replaced by
/// the reference date rendered with those tokens. Literal values are kept.
pub fn normalize_date_params(
    params: &HashMap<String, String>,
    reference_date: NaiveDate,
) -> HashMap<String, String> {
    let reference = start_of_day(reference_date);

    params
        .iter()
        .map(|(name, value)| {
            let value = if is_date_param(name) && has_date_tokens(value) {
                fill_date_tokens(value, &reference)
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}
