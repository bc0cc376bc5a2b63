//! Data-placement hint stripping (`[PARTITION=...]`, `[ROWCOUNT=...]`, ...).
//!
//! Hints are cosmetic for lineage purposes; they are removed from code only,
//! never from inside string literals.

use super::literals::map_code;
use regex::Regex;
use std::sync::OnceLock;

fn hint_regexes() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            // [KEY=(nested=kv)]
            r"\[\s*[A-Za-z_][\w.]*\s*=\s*\([^\[\]]*\)\s*\]",
            // [KEY=literal]
            r"\[\s*[A-Za-z_][\w.]*\s*=\s*[^\[\]\n]*\]",
            // [KEY(args)]
            r"\[\s*[A-Za-z_]\w*\s*\([^\[\]]*\)\s*\]",
            // [Privacy.X]
            r"\[\s*Privacy(?:\.\w+)+(?:\([^\[\]]*\))?\s*\]",
            // [KEYWORD, KEYWORD]
            r"\[\s*[A-Z][A-Z0-9_]*(?:\s*,\s*[A-Z][A-Z0-9_]*)*\s*\]",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("Invalid regex pattern"))
        .collect()
    })
}

fn strip_code_hints(code: &str) -> String {
    hint_regexes()
        .iter()
        .fold(code.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
}

/// Removes bracketed structural annotations.
pub fn strip_data_hints(text: &str) -> String {
    map_code(text, strip_code_hints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("[PARTITION=(PARTITIONCOUNT=100)]\nx = SELECT * FROM a;", "\nx = SELECT * FROM a;")]
    #[case("[ROWCOUNT=500] x = SELECT * FROM a;", " x = SELECT * FROM a;")]
    #[case("[LOWDISTINCTNESS(Market)] x = SELECT * FROM a;", " x = SELECT * FROM a;")]
    #[case("[Privacy.Asset.NonPersonal] x = SELECT * FROM a;", " x = SELECT * FROM a;")]
    #[case("[PIN, SKEW] x = SELECT * FROM a;", " x = SELECT * FROM a;")]
    fn test_strip_hint_shapes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_data_hints(input), expected);
    }

    #[test]
    fn test_literals_are_untouched() {
        let text = r#"x = EXTRACT a FROM "[ROWCOUNT=1].tsv" USING DefaultTextExtractor;"#;
        assert_eq!(strip_data_hints(text), text);
    }

    #[test]
    fn test_streamset_range_is_kept() {
        let text = "x = SSTREAM STREAMSET @root PATTERN @pat RANGE __date=[@start, @end];";
        assert_eq!(strip_data_hints(text), text);
    }
}
