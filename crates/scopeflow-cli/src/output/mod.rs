//! Output formatting modules.

pub mod json;
pub mod table;

pub use json::format_json;
pub use table::format_table;

use scopeflow_core::AnalyzeResult;
use serde::Serialize;

/// Analysis result of one input script.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptReport {
    pub source: String,
    pub result: AnalyzeResult,
}
