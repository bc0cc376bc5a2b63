//! Human-readable table output formatting.

use super::ScriptReport;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use scopeflow_core::{AnalyzeResult, Node, NodeType, Severity};
use std::fmt::{self, Write};

/// Format the reports as human-readable text with optional colors.
pub fn format_table(reports: &[ScriptReport], quiet: bool, use_colors: bool) -> String {
    let colored = use_colors && std::io::stdout().is_terminal();
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = render(&mut out, reports, quiet, colored);
    out
}

fn render(out: &mut String, reports: &[ScriptReport], quiet: bool, colored: bool) -> fmt::Result {
    write_header(out, colored)?;
    for report in reports {
        writeln!(out, "Source: {}", report.source)?;
        writeln!(out)?;
        write_summary(out, &report.result, colored)?;
        write_endpoints(out, &report.result, colored)?;
        write_lineage(out, &report.result, colored)?;
        if !quiet {
            write_issues(out, &report.result, colored)?;
        }
    }
    Ok(())
}

fn heading(out: &mut String, text: &str, colored: bool) -> fmt::Result {
    if colored {
        writeln!(out, "{}", text.bold())
    } else {
        writeln!(out, "{text}")
    }
}

fn write_header(out: &mut String, colored: bool) -> fmt::Result {
    let line = "═".repeat(50);

    heading(out, "ScopeFlow Analysis", colored)?;
    if colored {
        writeln!(out, "{}", line.dimmed())
    } else {
        writeln!(out, "{line}")
    }
}

fn write_summary(out: &mut String, result: &AnalyzeResult, colored: bool) -> fmt::Result {
    let summary = &result.summary;
    let stats = format!(
        "Summary: {} statements | {} nodes | {} edges | {} inputs | {} outputs",
        summary.statement_count,
        summary.node_count,
        summary.edge_count,
        summary.input_count,
        summary.output_count
    );

    if colored {
        writeln!(out, "{}", stats.cyan())?;
    } else {
        writeln!(out, "{stats}")?;
    }
    writeln!(out)
}

/// Node name with its module view and resolved link, when known.
fn describe(node: &Node) -> String {
    let mut text = match &node.view {
        Some(view) => format!("{view}::{}", node.name),
        None => node.name.clone(),
    };
    if let Some(link) = &node.link {
        text.push_str(&format!(" ({link})"));
    }
    if let Some(size) = &node.size {
        text.push_str(&format!(" [{size}]"));
    }
    text
}

fn write_endpoints(out: &mut String, result: &AnalyzeResult, colored: bool) -> fmt::Result {
    for (title, node_type) in [("Inputs:", NodeType::Input), ("Outputs:", NodeType::Output)] {
        let nodes: Vec<_> = result
            .nodes
            .iter()
            .filter(|n| n.node_type == node_type)
            .collect();
        if nodes.is_empty() {
            continue;
        }

        heading(out, title, colored)?;
        for node in nodes {
            writeln!(out, "  {}", describe(node))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_lineage(out: &mut String, result: &AnalyzeResult, colored: bool) -> fmt::Result {
    if result.edges.is_empty() {
        return Ok(());
    }

    heading(out, "Lineage:", colored)?;
    let arrow = if colored {
        "→".green().to_string()
    } else {
        "→".to_string()
    };

    for edge in &result.edges {
        let using = result
            .nodes
            .get(edge.to)
            .and_then(|n| n.using.as_deref())
            .map(|u| format!(" [{u}]"))
            .unwrap_or_default();
        writeln!(out, "  {} {arrow} {}{using}", edge.from_name, edge.to_name)?;
    }
    writeln!(out)
}

fn write_issues(out: &mut String, result: &AnalyzeResult, colored: bool) -> fmt::Result {
    if result.issues.is_empty() {
        return Ok(());
    }

    let counts = &result.summary.issue_count;
    let mut parts = Vec::new();
    if counts.errors > 0 {
        parts.push(format!("{} errors", counts.errors));
    }
    if counts.warnings > 0 {
        parts.push(format!("{} warnings", counts.warnings));
    }
    if counts.infos > 0 {
        parts.push(format!("{} info", counts.infos));
    }

    heading(out, &format!("Issues ({}):", parts.join(", ")), colored)?;

    for issue in &result.issues {
        let severity = match (issue.severity, colored) {
            (Severity::Error, true) => "ERROR".red().to_string(),
            (Severity::Warning, true) => "WARN".yellow().to_string(),
            (Severity::Info, true) => "INFO".blue().to_string(),
            (Severity::Error, false) => "ERROR".to_string(),
            (Severity::Warning, false) => "WARN".to_string(),
            (Severity::Info, false) => "INFO".to_string(),
        };

        let location = issue
            .statement_index
            .map(|i| format!(" statement {i}:"))
            .unwrap_or_default();

        writeln!(out, "  [{severity}]{location} {}", issue.message)?;
    }
    writeln!(out)
}
