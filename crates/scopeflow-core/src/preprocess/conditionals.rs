//! `#IF` / `#ELSE` / `#ENDIF` block resolution.

use regex::Regex;
use std::sync::OnceLock;

fn if_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)#IF\b[^\n]*\n(.*?)#ENDIF\b").expect("Invalid regex pattern"))
}

fn else_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#ELSE\b").expect("Invalid regex pattern"))
}

fn residual_directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*#(?:IF|ELSE|ENDIF)\b[^\n]*\n?").expect("Invalid regex pattern")
    })
}

/// One resolution pass: each innermost-first `#IF ... #ENDIF` span is replaced
/// by its body (or removed), and bare `#ELSE` markers are dropped.
fn resolve_pass(text: &str, keep_content: bool) -> String {
    let replaced = if keep_content {
        if_block_regex().replace_all(text, "$1")
    } else {
        if_block_regex().replace_all(text, "")
    };
    else_marker_regex().replace_all(&replaced, "").into_owned()
}

/// Resolves conditional compilation blocks.
///
/// With `keep_content`, `#IF A #ELSE B #ENDIF` becomes `A B`: every branch
/// survives so lineage covers all configurations. Two passes resolve one
/// level of nesting; any directive line still left is dropped.
pub fn resolve_conditionals(text: &str, keep_content: bool) -> String {
    let once = resolve_pass(text, keep_content);
    let twice = resolve_pass(&once, keep_content);
    residual_directive_regex().replace_all(&twice, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_mode_concatenates_branches() {
        let text = "A;\n#IF (@@Env@@ == \"prod\")\nB;\n#ELSE\nC;\n#ENDIF\nD;";
        let out = resolve_conditionals(text, true);
        assert!(out.contains("A;"));
        assert!(out.contains("B;"));
        assert!(out.contains("C;"));
        assert!(out.contains("D;"));
        assert!(!out.contains('#'));
    }

    #[test]
    fn test_drop_mode_removes_body() {
        let text = "A;\n#IF X\nB;\n#ENDIF\nD;";
        let out = resolve_conditionals(text, false);
        assert!(out.contains("A;"));
        assert!(!out.contains("B;"));
        assert!(out.contains("D;"));
    }

    #[test]
    fn test_one_level_of_nesting_in_keep_mode() {
        let text = "#IF X\n#IF Y\ninner;\n#ENDIF\nouter;\n#ENDIF\nafter;";
        let out = resolve_conditionals(text, true);
        assert!(out.contains("inner;"));
        assert!(out.contains("outer;"));
        assert!(out.contains("after;"));
        assert!(!out.contains("#IF"));
        assert!(!out.contains("#ENDIF"));
    }

    #[test]
    fn test_unmatched_directive_lines_are_dropped() {
        let text = "A;\n#ENDIF\nB;\n  #IF dangling\nC;";
        let out = resolve_conditionals(text, true);
        assert_eq!(out, "A;\nB;\nC;");
    }
}
