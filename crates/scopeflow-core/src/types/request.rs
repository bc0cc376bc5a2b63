//! Request types for the lineage analysis API.

use chrono::{Duration, Local, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A request to analyze a script for data lineage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// The script source text
    pub script: String,

    /// Which file-kind pre-pass to apply before preprocessing
    #[serde(default)]
    pub script_kind: ScriptKind,

    /// Optional source name (file path or script identifier) for issue attribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// External parameters substituted for `@@NAME@@` markers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub external_params: HashMap<String, String>,

    /// Optional analysis options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<AnalysisOptions>,
}

impl AnalyzeRequest {
    /// Creates a request for a plain `.script` source.
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: ScriptKind) -> Self {
        self.script_kind = kind;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.external_params.insert(name.into(), value.into());
        self
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// File kind of the analyzed source; selects the pre-pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    /// Parsed as-is.
    #[default]
    Script,
    /// `CREATE VIEW ... AS BEGIN ... END;` wrapper stripped first.
    View,
    /// Every `VIEW ... RETURN ... BEGIN ... END VIEW` body analyzed independently.
    Module,
}

impl ScriptKind {
    /// Picks the kind from a file extension (`.view`, `.module`, anything else is a script).
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("view") => Self::View,
            Some("module") => Self::Module,
            _ => Self::Script,
        }
    }
}

/// Whether the body of `#IF ... #ENDIF` blocks survives preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConditionalMode {
    /// Keep every branch (the union of all conditional bodies).
    #[default]
    Keep,
    /// Drop conditional bodies entirely.
    Drop,
}

impl ConditionalMode {
    pub fn keeps_content(self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Options controlling analysis behavior.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// How `#IF` blocks are resolved (default: keep)
    #[serde(default)]
    pub conditional_mode: ConditionalMode,

    /// Run the annotation post-pass (default: false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotate: Option<bool>,

    /// Reference date for date-pattern parameters and annotation (default: today minus five days)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub reference_date: Option<NaiveDate>,
}

impl AnalysisOptions {
    /// The effective reference date.
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(default_reference_date)
    }

    pub fn annotate(&self) -> bool {
        self.annotate.unwrap_or(false)
    }
}

/// Today minus five days, the date scripts are usually run against.
pub fn default_reference_date() -> NaiveDate {
    Local::now().date_naive() - Duration::days(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_kind_from_path() {
        assert_eq!(ScriptKind::from_path(Path::new("a/b.view")), ScriptKind::View);
        assert_eq!(ScriptKind::from_path(Path::new("m.MODULE")), ScriptKind::Module);
        assert_eq!(ScriptKind::from_path(Path::new("x.script")), ScriptKind::Script);
        assert_eq!(ScriptKind::from_path(Path::new("noext")), ScriptKind::Script);
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let options: AnalysisOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.conditional_mode, ConditionalMode::Keep);
        assert!(!options.annotate());
        assert!(options.reference_date.is_none());
    }

    #[test]
    fn test_options_reference_date_roundtrip() {
        let options: AnalysisOptions =
            serde_json::from_str(r#"{"conditionalMode":"drop","referenceDate":"2024-03-05"}"#)
                .unwrap();
        assert_eq!(options.conditional_mode, ConditionalMode::Drop);
        assert_eq!(
            options.reference_date(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn test_request_builder() {
        let request = AnalyzeRequest::new("x = SSTREAM @a;")
            .with_kind(ScriptKind::View)
            .with_param("Root", "/data");
        assert_eq!(request.script_kind, ScriptKind::View);
        assert_eq!(request.external_params["Root"], "/data");
    }
}
