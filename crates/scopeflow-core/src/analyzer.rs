use crate::error::ParseError;
use crate::graph::{annotate_nodes, classify_nodes, Graph, GraphBuilder, StreamInfoProvider};
use crate::parser::{parse_tokens, tokenize};
use crate::preprocess::{normalize_date_params, preprocess, PreprocessOptions};
use crate::resolver::ScopeResolver;
use crate::statement::{classify, split_statements, RawStatement};
use crate::types::*;
use chrono::NaiveDate;
#[cfg(feature = "tracing")]
use tracing::{debug, info_span};

mod input;

use input::{collect_units, AnalysisUnit};

/// Main entry point for script analysis
pub fn analyze(request: &AnalyzeRequest) -> AnalyzeResult {
    analyze_with_provider(request, None)
}

/// Analyzes `request`, consulting `provider` for stream sizes when annotation is enabled.
pub fn analyze_with_provider(
    request: &AnalyzeRequest,
    provider: Option<&dyn StreamInfoProvider>,
) -> AnalyzeResult {
    #[cfg(feature = "tracing")]
    let _span = info_span!(
        "analyze_request",
        kind = ?request.script_kind,
        source = request.source_name.as_deref().unwrap_or("inline")
    )
    .entered();

    let mut analyzer = Analyzer::new(request, provider);
    analyzer.analyze()
}

/// Internal analyzer state
struct Analyzer<'a> {
    request: &'a AnalyzeRequest,
    provider: Option<&'a dyn StreamInfoProvider>,
    options: AnalysisOptions,
    reference_date: NaiveDate,
    issues: Vec<Issue>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    statements: Vec<StatementRecord>,
    declare_map: DeclareMap,
}

impl<'a> Analyzer<'a> {
    fn new(request: &'a AnalyzeRequest, provider: Option<&'a dyn StreamInfoProvider>) -> Self {
        let options = request.options.clone().unwrap_or_default();
        let reference_date = options.reference_date();

        Self {
            request,
            provider,
            options,
            reference_date,
            issues: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            statements: Vec::new(),
            declare_map: DeclareMap::new(),
        }
    }

    fn analyze(&mut self) -> AnalyzeResult {
        let units = match collect_units(self.request) {
            Ok(units) => units,
            Err(issue) => {
                self.push_issue(issue);
                return self.build_result();
            }
        };

        let params = normalize_date_params(&self.request.external_params, self.reference_date);
        let preprocess_options =
            PreprocessOptions::new(self.options.conditional_mode).with_params(params);

        for unit in units {
            #[cfg(feature = "tracing")]
            let _unit_span =
                info_span!("analyze_unit", view = unit.view.as_deref().unwrap_or("-")).entered();
            self.analyze_unit(unit, &preprocess_options);
        }

        self.build_result()
    }

    /// One builder pass over a script or module view, merged into the result
    /// with node ids and statement indices offset past what came before.
    fn analyze_unit(&mut self, unit: AnalysisUnit, preprocess_options: &PreprocessOptions) {
        let text = preprocess(&unit.text, preprocess_options);
        let split = split_statements(&text);

        let node_offset = self.nodes.len();
        let statement_offset = self.statements.len();
        let mut issues = Vec::new();

        let resolver = ScopeResolver::new().with_reference_date(self.reference_date);
        let mut builder = GraphBuilder::new(resolver);
        let mut statements = Vec::with_capacity(split.statements.len());

        for raw in &split.statements {
            #[cfg(feature = "tracing")]
            let _stmt_span = info_span!("analyze_statement", index = raw.index).entered();

            match parse_raw(raw) {
                Ok(Some(record)) => {
                    #[cfg(feature = "tracing")]
                    debug!(?record, "parsed statement");
                    builder.apply(&record);
                    statements.push(record);
                }
                Ok(None) => issues.push(
                    Issue::info(
                        issue_codes::UNSUPPORTED_SYNTAX,
                        "Statement not recognized; skipped",
                    )
                    .with_statement(raw.index),
                ),
                Err(e) if e.is_unsupported() => issues.push(
                    Issue::info(issue_codes::UNSUPPORTED_SYNTAX, e.message).with_statement(raw.index),
                ),
                Err(e) => issues.push(
                    Issue::error(issue_codes::PARSE_ERROR, e.to_string()).with_statement(raw.index),
                ),
            }
        }

        if let Some(offset) = split.halted_at {
            let line = text[..offset].matches('\n').count() + 1;
            issues.push(Issue::info(
                issue_codes::HOST_CODE_BLOCK,
                format!("Host code block near line {line}; the rest of the script is ignored"),
            ));
        }

        let Graph {
            mut nodes,
            edges,
            declare_map,
            issues: graph_issues,
        } = builder.finish();
        issues.extend(graph_issues);

        classify_nodes(&mut nodes);
        if self.options.annotate() {
            issues.extend(annotate_nodes(
                &mut nodes,
                &declare_map,
                self.reference_date,
                self.provider,
            ));
        }

        for mut node in nodes {
            node.id += node_offset;
            node.view = unit.view.clone();
            self.nodes.push(node);
        }
        self.edges.extend(edges.into_iter().map(|mut edge| {
            edge.from += node_offset;
            edge.to += node_offset;
            edge
        }));
        self.statements.extend(statements.into_iter().map(|mut record| {
            record.index += statement_offset;
            record
        }));
        for mut issue in issues {
            issue.statement_index = issue.statement_index.map(|i| i + statement_offset);
            self.push_issue(issue);
        }
        self.declare_map.extend(declare_map);
    }

    fn push_issue(&mut self, issue: Issue) {
        let issue = match (&self.request.source_name, &issue.source_name) {
            (Some(name), None) => issue.with_source_name(name.clone()),
            _ => issue,
        };
        self.issues.push(issue);
    }

    fn build_result(&mut self) -> AnalyzeResult {
        let issue_count = IssueCount::from_issues(&self.issues);
        let summary = Summary {
            statement_count: self.statements.len(),
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            input_count: count_nodes(&self.nodes, NodeType::Input),
            output_count: count_nodes(&self.nodes, NodeType::Output),
            has_errors: issue_count.errors > 0,
            issue_count,
        };

        AnalyzeResult {
            nodes: std::mem::take(&mut self.nodes),
            edges: std::mem::take(&mut self.edges),
            statements: std::mem::take(&mut self.statements),
            declare_map: std::mem::take(&mut self.declare_map),
            issues: std::mem::take(&mut self.issues),
            summary,
        }
    }
}

fn count_nodes(nodes: &[Node], node_type: NodeType) -> usize {
    nodes.iter().filter(|n| n.node_type == node_type).count()
}

/// Tokenizes, classifies and parses one statement. `Ok(None)` means no
/// statement keyword was recognized.
fn parse_raw(raw: &RawStatement) -> Result<Option<StatementRecord>, ParseError> {
    let tokens = tokenize(&raw.text)?;
    let Some(kind) = classify(&tokens) else {
        return Ok(None);
    };
    let mut record = parse_tokens(&raw.text, &tokens, kind)?;
    record.index = raw.index;
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(script: &str) -> AnalyzeResult {
        analyze(&AnalyzeRequest::new(script))
    }

    #[test]
    fn test_empty_request_is_invalid() {
        let result = run("   ");
        assert!(result.summary.has_errors);
        assert_eq!(result.issues[0].code, issue_codes::INVALID_REQUEST);
    }

    #[test]
    fn test_bad_statement_does_not_abort() {
        let result = run("a = SSTREAM @In;\nb = SELECT FROM;\nOUTPUT a TO \"/out.ss\";");
        assert_eq!(result.statements.len(), 2);
        let parse_errors: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.code == issue_codes::PARSE_ERROR)
            .collect();
        assert_eq!(parse_errors.len(), 1);
        assert_eq!(parse_errors[0].statement_index, Some(1));
        assert!(result.edge_names().contains(&("a", "/out.ss")));
    }

    #[test]
    fn test_host_code_block_reported() {
        let result = run("a = SSTREAM @In;\n#CS\npublic class X {}\n#ENDCS\nb = SELECT * FROM a;");
        assert_eq!(result.statements.len(), 1);
        assert!(result
            .issues
            .iter()
            .any(|i| i.code == issue_codes::HOST_CODE_BLOCK));
    }

    #[test]
    fn test_using_is_skipped_as_unsupported() {
        let result = run("USING Lib.Extras;\na = SSTREAM @In;");
        assert!(!result.summary.has_errors);
        assert_eq!(result.issues[0].code, issue_codes::UNSUPPORTED_SYNTAX);
        assert_eq!(result.summary.statement_count, 1);
    }

    #[test]
    fn test_module_views_are_merged_with_offsets() {
        let script = "VIEW A RETURN R (x:int)\nBEGIN\nr = SSTREAM @p;\nEND VIEW\n\nVIEW B RETURN S (y:int)\nBEGIN\ns = SSTREAM @q;\nEND VIEW\n";
        let request = AnalyzeRequest::new(script).with_kind(ScriptKind::Module);
        let result = analyze(&request);

        assert_eq!(result.nodes.len(), 4);
        let ids: Vec<_> = result.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(result.nodes[3].view.as_deref(), Some("B"));
        assert_eq!((result.edges[1].from, result.edges[1].to), (2, 3));
        assert_eq!(result.statements[1].index, 1);
    }
}
