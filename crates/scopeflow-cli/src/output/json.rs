//! JSON output formatting.

use super::ScriptReport;

/// Format the reports as JSON.
///
/// A single report is emitted as its bare `AnalyzeResult`; several reports
/// become an array of `{ "source", "result" }` objects. If `compact` is true,
/// outputs minified JSON without whitespace.
pub fn format_json(reports: &[ScriptReport], compact: bool) -> serde_json::Result<String> {
    let value = match reports {
        [single] => serde_json::to_value(&single.result)?,
        _ => serde_json::to_value(reports)?,
    };

    if compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    }
}
