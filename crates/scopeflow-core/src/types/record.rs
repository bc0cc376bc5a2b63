//! Normalized statement records produced by the grammar parsers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Statement kind of a parsed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum StatementKind {
    Declare,
    Set,
    Select,
    Process,
    Reduce,
    Combine,
    Output,
    ExtractInput,
    StreamInput,
    ViewInput,
    ModuleInput,
    Import,
    Using,
}

impl StatementKind {
    /// Kinds that bind a synthetic source node to their lvalue.
    pub fn is_input(self) -> bool {
        matches!(
            self,
            Self::ExtractInput | Self::StreamInput | Self::ViewInput | Self::ModuleInput | Self::Import
        )
    }

    /// Kinds that derive a node from upstream sources.
    pub fn is_transform(self) -> bool {
        matches!(self, Self::Select | Self::Process | Self::Reduce | Self::Combine)
    }
}

/// Resource-kind prefix of a synthetic source name (`SSTREAM_/data/a.ss`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SourcePrefix {
    #[serde(rename = "SSTREAM<STREAMSET>")]
    Streamset,
    #[serde(rename = "SSTREAM")]
    Stream,
    #[serde(rename = "EXTRACT")]
    Extract,
    #[serde(rename = "MODULE")]
    Module,
    #[serde(rename = "VIEW")]
    View,
    #[serde(rename = "FUNC")]
    Func,
    #[serde(rename = "IMPORT")]
    Import,
}

impl SourcePrefix {
    /// Longest prefixes first, so `SSTREAM<STREAMSET>_` is not read as `SSTREAM_`.
    pub const ALL: [SourcePrefix; 7] = [
        Self::Streamset,
        Self::Stream,
        Self::Extract,
        Self::Module,
        Self::View,
        Self::Func,
        Self::Import,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Streamset => "SSTREAM<STREAMSET>",
            Self::Stream => "SSTREAM",
            Self::Extract => "EXTRACT",
            Self::Module => "MODULE",
            Self::View => "VIEW",
            Self::Func => "FUNC",
            Self::Import => "IMPORT",
        }
    }

    /// `PREFIX_resource`
    pub fn tag(self, resource: &str) -> String {
        format!("{}_{resource}", self.as_str())
    }

    /// Splits a synthetic source name into its prefix and resource part.
    pub fn split(name: &str) -> Option<(SourcePrefix, &str)> {
        Self::ALL.into_iter().find_map(|prefix| {
            name.strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|resource| (prefix, resource))
        })
    }
}

/// One parsed statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatementRecord {
    /// Zero-based statement index inside the analyzed unit
    pub index: usize,

    pub kind: StatementKind,

    /// The variable this statement binds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assign_var: Option<String>,

    /// Referenced inputs in source order; duplicates are kept
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    /// Identifiers passed to a module-kind source
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,

    /// Implementation reference, used for labeling only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using_clause: Option<String>,

    /// External resource literal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Raw right-hand side of `#DECLARE` / `#SET`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rvalue: Option<String>,

    /// Declared type of `#DECLARE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,

    /// Output column names of a `SELECT`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
}

impl StatementRecord {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            index: 0,
            kind,
            assign_var: None,
            sources: Vec::new(),
            params: Vec::new(),
            using_clause: None,
            path: None,
            rvalue: None,
            declared_type: None,
            columns: Vec::new(),
        }
    }

    pub fn with_assign(mut self, name: impl Into<String>) -> Self {
        self.assign_var = Some(name.into());
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_using(mut self, using: impl Into<String>) -> Self {
        self.using_clause = Some(using.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_prefix_split_prefers_streamset() {
        assert_eq!(
            SourcePrefix::split("SSTREAM<STREAMSET>_/a/b"),
            Some((SourcePrefix::Streamset, "/a/b"))
        );
        assert_eq!(
            SourcePrefix::split("SSTREAM_@In"),
            Some((SourcePrefix::Stream, "@In"))
        );
        assert_eq!(SourcePrefix::split("SSTREAMX"), None);
        assert_eq!(SourcePrefix::split("Rows"), None);
    }

    #[test]
    fn test_source_prefix_tag() {
        assert_eq!(SourcePrefix::Module.tag("Lib.Func"), "MODULE_Lib.Func");
    }

    #[test]
    fn test_kind_groups() {
        assert!(StatementKind::Import.is_input());
        assert!(StatementKind::Combine.is_transform());
        assert!(!StatementKind::Output.is_input());
        assert!(!StatementKind::Declare.is_transform());
    }
}
