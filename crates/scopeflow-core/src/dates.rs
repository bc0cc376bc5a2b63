//! Date helpers shared by parameter normalization, the resolver and annotation.
//!
//! Scripts use C#-style tokens (`yyyy`, `MM`, `dd`) in format strings and
//! `strftime`-style directives (`%Y`, `%m`, `%d`) in stream path patterns.

use crate::error::ResolveError;
use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::Write;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%m/%d/%Y", "%Y.%m.%d"];

/// True if `text` contains any of the C# date tokens `yyyy`, `MM`, `dd`.
pub fn has_date_tokens(text: &str) -> bool {
    text.contains("yyyy") || text.contains("MM") || text.contains("dd")
}

/// Translates C# date tokens to `strftime` directives.
pub fn csharp_to_strftime(format: &str) -> String {
    format
        .replace("yyyy", "%Y")
        .replace("MM", "%m")
        .replace("dd", "%d")
}

/// Substitutes the C# date tokens of `format` with zero-padded fields of `dt`,
/// leaving every other character literal.
pub fn fill_date_tokens(format: &str, dt: &NaiveDateTime) -> String {
    format
        .replace("yyyy", &dt.format("%Y").to_string())
        .replace("MM", &dt.format("%m").to_string())
        .replace("dd", &dt.format("%d").to_string())
}

/// Longest directive chrono accepts, `%` included (`%.3f`, `%-d`, `%:z`).
const MAX_DIRECTIVE_LEN: usize = 4;

/// Formats `dt` with a `strftime` pattern.
///
/// Each directive is formatted on its own. One chrono rejects, or cannot
/// render for a naive datetime, is copied through verbatim, so a stray `%`
/// never blocks the `%Y`/`%m`/`%d` around it.
pub fn strftime(pattern: &str, dt: &NaiveDateTime) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let len = directive_len(rest);
        let mark = out.len();
        let items = StrftimeItems::new(&rest[..len]);
        if len > 1 && write!(out, "{}", dt.format_with_items(items)).is_ok() {
            rest = &rest[len..];
        } else {
            out.truncate(mark);
            out.push('%');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Byte length of the shortest valid directive at the start of `text`, or 1
/// when none exists.
fn directive_len(text: &str) -> usize {
    text.char_indices()
        .skip(1)
        .take_while(|&(_, c)| c != '%' || text.starts_with("%%"))
        .map(|(i, c)| i + c.len_utf8())
        .take(MAX_DIRECTIVE_LEN - 1)
        .find(|&end| !StrftimeItems::new(&text[..end]).any(|item| matches!(item, Item::Error)))
        .unwrap_or(1)
}

pub fn parse_datetime(text: &str) -> Result<NaiveDateTime, ResolveError> {
    let text = text.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date.and_time(chrono::NaiveTime::MIN));
        }
    }

    Err(ResolveError::InvalidDate(text.to_string()))
}

/// Midnight of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        start_of_day(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_has_date_tokens() {
        assert!(has_date_tokens("yyyy/MM/dd"));
        assert!(has_date_tokens("dd"));
        assert!(!has_date_tokens("/shares/data"));
    }

    #[test]
    fn test_csharp_to_strftime() {
        assert_eq!(csharp_to_strftime("yyyy-MM-dd"), "%Y-%m-%d");
    }

    #[test]
    fn test_fill_date_tokens_keeps_other_characters() {
        assert_eq!(fill_date_tokens("yyyy/MM/dd_v2", &dt(2024, 2, 7)), "2024/02/07_v2");
    }

    #[test]
    fn test_strftime_keeps_unknown_directive() {
        assert_eq!(strftime("%Y-%Q", &dt(2024, 1, 1)), "2024-%Q");
        assert_eq!(strftime("%Y/%m", &dt(2024, 1, 1)), "2024/01");
    }

    #[rstest]
    #[case("/a/%Y/%m/%d/?q=100%", "/a/2024/01/05/?q=100%")]
    #[case("/a/b%20c/%Y%m%d.ss", "/a/b%20c/20240105.ss")]
    #[case("%-d/%m %%", "5/01 %")]
    #[case("%", "%")]
    #[case("%z/%d", "%z/05")]
    #[case("é%é%d", "é%é05")]
    fn test_strftime_stray_percent(#[case] pattern: &str, #[case] expected: &str) {
        assert_eq!(strftime(pattern, &dt(2024, 1, 5)), expected);
    }

    #[test]
    fn test_strftime_without_directives_is_identity() {
        assert_eq!(strftime("/a/b.ss", &dt(2024, 1, 1)), "/a/b.ss");
    }

    #[test]
    fn test_parse_datetime_layouts() {
        assert_eq!(parse_datetime("2024-03-01").unwrap(), dt(2024, 3, 1));
        assert_eq!(parse_datetime("2024/03/01").unwrap(), dt(2024, 3, 1));
        assert_eq!(parse_datetime("20240301").unwrap(), dt(2024, 3, 1));
        assert_eq!(
            parse_datetime("2024-03-01 10:20:30").unwrap().format("%H:%M").to_string(),
            "10:20"
        );
        assert!(parse_datetime("yesterday").is_err());
    }
}
