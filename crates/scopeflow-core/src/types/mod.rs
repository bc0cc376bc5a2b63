//! Types for the script lineage analysis API.
//!
//! This module defines the request and response types for the ScopeFlow analysis API.
//! The API accepts script source plus external parameters and returns the lineage
//! graph, the parsed statement records and the resolved declared values.

mod common;
mod record;
mod request;
mod response;
mod value;

// Re-export all public types
pub use common::{issue_codes, Issue, IssueCount, Severity, Summary};
pub use record::{SourcePrefix, StatementKind, StatementRecord};
pub use request::{
    default_reference_date, AnalysisOptions, AnalyzeRequest, ConditionalMode, ScriptKind,
};
pub use response::{AnalyzeResult, Edge, Node, NodeType};
pub use value::{DeclareMap, Value, DEFAULT_DATETIME_FORMAT};
