//! Common types shared between request and response.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An issue encountered during script analysis (error, warning, or info).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Severity level
    pub severity: Severity,

    /// Machine-readable issue code
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Optional: which statement index this issue relates to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_index: Option<usize>,

    /// Optional: source file or view name where the issue occurred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

impl Issue {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            statement_index: None,
            source_name: None,
        }
    }

    pub fn with_statement(mut self, index: usize) -> Self {
        self.statement_index = Some(index);
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Summary statistics for the analysis result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Number of statements handed to the graph builder
    pub statement_count: usize,

    /// Total nodes, including every version of a reassigned variable
    pub node_count: usize,

    /// Total edges, including repeated dependencies
    pub edge_count: usize,

    /// Nodes classified as inputs (streams, extracts, modules, views, roots)
    pub input_count: usize,

    /// Output nodes
    pub output_count: usize,

    /// Issue counts by severity
    pub issue_count: IssueCount,

    /// Quick check: true if any errors were encountered
    pub has_errors: bool,
}

/// Counts of issues by severity level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct IssueCount {
    /// Number of error-level issues
    pub errors: usize,
    /// Number of warning-level issues
    pub warnings: usize,
    /// Number of info-level issues
    pub infos: usize,
}

impl IssueCount {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut count = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Error => count.errors += 1,
                Severity::Warning => count.warnings += 1,
                Severity::Info => count.infos += 1,
            }
        }
        count
    }
}

/// Machine-readable issue codes.
pub mod issue_codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const UNSUPPORTED_SYNTAX: &str = "UNSUPPORTED_SYNTAX";
    pub const UNRESOLVED_REFERENCE: &str = "UNRESOLVED_REFERENCE";
    pub const RESOLVE_FALLBACK: &str = "RESOLVE_FALLBACK";
    pub const HOST_CODE_BLOCK: &str = "HOST_CODE_BLOCK";
    pub const ANNOTATION_LOOKUP_FAILED: &str = "ANNOTATION_LOOKUP_FAILED";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_count_from_issues() {
        let issues = vec![
            Issue::error(issue_codes::INVALID_REQUEST, "empty"),
            Issue::warning(issue_codes::RESOLVE_FALLBACK, "fallback"),
            Issue::warning(issue_codes::PARSE_ERROR, "bad"),
            Issue::info(issue_codes::UNRESOLVED_REFERENCE, "root"),
        ];
        let count = IssueCount::from_issues(&issues);
        assert_eq!(count.errors, 1);
        assert_eq!(count.warnings, 2);
        assert_eq!(count.infos, 1);
    }

    #[test]
    fn test_issue_serializes_camel_case() {
        let issue = Issue::warning(issue_codes::PARSE_ERROR, "bad")
            .with_statement(3)
            .with_source_name("a.script");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["statementIndex"], 3);
        assert_eq!(json["sourceName"], "a.script");
        assert_eq!(json["severity"], "warning");
    }
}
