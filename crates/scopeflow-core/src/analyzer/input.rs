//! File-kind pre-pass: turns a request into the units analyzed independently.
//!
//! A `.script` is one unit. A `.view` loses its `CREATE VIEW ... AS BEGIN ... END;`
//! wrapper first. A `.module` yields one unit per `VIEW Name RETURN ... BEGIN ... END VIEW`
//! body, tagged with the view name.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{issue_codes, AnalyzeRequest, Issue, ScriptKind};

/// Script text analyzed as one builder pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnalysisUnit {
    /// Module view this unit was extracted from.
    pub(crate) view: Option<String>,
    pub(crate) text: String,
}

fn view_wrapper_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)CREATE\s+VIEW\s+.*?\bAS\s+BEGIN\b(.*)\bEND\s*;?\s*$")
            .expect("Invalid regex pattern")
    })
}

fn module_view_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\bVIEW\s+(\w+)\s+RETURN\b.*?\bBEGIN\b(.*?)\bEND\s+VIEW\b")
            .expect("Invalid regex pattern")
    })
}

/// Collects the analysis units of `request`.
///
/// An empty script, or a module without any view body, is rejected with an
/// `INVALID_REQUEST` issue.
pub(crate) fn collect_units(request: &AnalyzeRequest) -> Result<Vec<AnalysisUnit>, Issue> {
    if request.script.trim().is_empty() {
        return Err(Issue::error(
            issue_codes::INVALID_REQUEST,
            "No script text provided for analysis",
        ));
    }

    match request.script_kind {
        ScriptKind::Script => Ok(vec![AnalysisUnit {
            view: None,
            text: request.script.clone(),
        }]),
        ScriptKind::View => Ok(vec![AnalysisUnit {
            view: None,
            text: strip_view_wrapper(&request.script).to_string(),
        }]),
        ScriptKind::Module => {
            let units = module_views(&request.script);
            if units.is_empty() {
                return Err(Issue::error(
                    issue_codes::INVALID_REQUEST,
                    "Module defines no VIEW ... RETURN ... BEGIN ... END VIEW bodies",
                ));
            }
            Ok(units)
        }
    }
}

/// The body of a `CREATE VIEW ... AS BEGIN ... END;` file, or the text unchanged.
pub(crate) fn strip_view_wrapper(text: &str) -> &str {
    view_wrapper_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |body| body.as_str())
}

/// Every view body of a module, in declaration order.
pub(crate) fn module_views(text: &str) -> Vec<AnalysisUnit> {
    module_view_regex()
        .captures_iter(text)
        .map(|caps| AnalysisUnit {
            view: Some(caps[1].to_string()),
            text: caps[2].to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_script_is_invalid() {
        let err = collect_units(&AnalyzeRequest::new("  \n")).unwrap_err();
        assert_eq!(err.code, issue_codes::INVALID_REQUEST);
    }

    #[test]
    fn test_view_wrapper_is_stripped() {
        let text = "CREATE VIEW Daily SCHEMA (a:int)\nPARAMS (d string)\nAS BEGIN\nx = SSTREAM @In;\nEND;\n";
        assert_eq!(strip_view_wrapper(text).trim(), "x = SSTREAM @In;");
        assert_eq!(strip_view_wrapper("x = SSTREAM @In;"), "x = SSTREAM @In;");
    }

    #[test]
    fn test_module_views_in_order() {
        let text = r#"
MODULE "lib.module";
VIEW First RETURN Rows (a:int) PARAMS (p string)
BEGIN
    r = SSTREAM @p;
END VIEW

VIEW Second RETURN Other (b:int)
BEGIN
    o = SELECT * FROM First;
END VIEW
"#;
        let units = module_views(text);
        let names: Vec<_> = units.iter().map(|u| u.view.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert_eq!(units[0].text.trim(), "r = SSTREAM @p;");
    }

    #[test]
    fn test_module_without_views_is_invalid() {
        let request = AnalyzeRequest::new("x = SSTREAM @In;").with_kind(ScriptKind::Module);
        assert!(collect_units(&request).is_err());
    }
}
