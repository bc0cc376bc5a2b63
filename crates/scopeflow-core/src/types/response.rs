//! Response types for the lineage analysis API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{Issue, IssueCount, Summary};
use super::record::StatementRecord;
use super::value::DeclareMap;

/// The result of analyzing a script for data lineage.
///
/// `nodes` and `edges` are the snapshot handed to an external renderer: nodes are
/// in creation order, edges in emission order, and every edge endpoint is present
/// in `nodes`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    /// Every node created during the builder pass
    pub nodes: Vec<Node>,

    /// Directed dependencies, multiplicities preserved
    pub edges: Vec<Edge>,

    /// Parsed statement records in source order
    pub statements: Vec<StatementRecord>,

    /// Resolved declared values
    #[schemars(with = "std::collections::BTreeMap<String, super::value::Value>")]
    pub declare_map: DeclareMap,

    /// All issues encountered during analysis
    pub issues: Vec<Issue>,

    /// Summary statistics
    pub summary: Summary,
}

impl AnalyzeResult {
    /// Create an error result with a single issue.
    pub fn from_error(code: impl Into<String>, message: impl Into<String>) -> Self {
        let issues = vec![Issue::error(code, message)];
        Self {
            summary: Summary {
                issue_count: IssueCount::from_issues(&issues),
                has_errors: true,
                ..Summary::default()
            },
            issues,
            ..Self::default()
        }
    }

    /// All nodes carrying `name`, oldest version first.
    pub fn nodes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |node| node.name == name)
    }

    /// Edges as `(from_name, to_name)` pairs in emission order.
    pub fn edge_names(&self) -> Vec<(&str, &str)> {
        self.edges
            .iter()
            .map(|edge| (edge.from_name.as_str(), edge.to_name.as_str()))
            .collect()
    }
}

/// A node in the lineage graph.
///
/// Identity for renderers is the `name`; `id` distinguishes successive versions of
/// a reassigned variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Arena index, equal to the creation order
    pub id: usize,

    /// Variable name, prefixed source name, or output path
    pub name: String,

    /// Node type
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Display label (annotation may append lines)
    pub label: String,

    /// Cosmetic style hint for renderers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Cosmetic fill color derived from the name prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,

    /// Implementation (processor, reducer, combiner) that produced this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using: Option<String>,

    /// Resolved resource path attached by annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Stream size label attached by annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Visually flagged by annotation
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub highlighted: bool,

    /// Module view the node belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl Node {
    pub fn new(id: usize, name: impl Into<String>, node_type: NodeType) -> Self {
        let name = name.into();
        Self {
            id,
            label: name.clone(),
            name,
            node_type,
            style: None,
            fill_color: None,
            using: None,
            link: None,
            size: None,
            highlighted: false,
            view: None,
        }
    }

    /// Create an intermediate (variable) node.
    pub fn intermediate(id: usize, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeType::Intermediate)
    }

    /// Create an input (source) node.
    pub fn input(id: usize, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeType::Input)
    }

    /// Create an output (sink) node.
    pub fn output(id: usize, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeType::Output)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Input,
    Output,
    Intermediate,
}

/// A directed flow dependency between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Source node id
    pub from: usize,
    /// Target node id
    pub to: usize,
    /// Source node name
    pub from_name: String,
    /// Target node name
    pub to_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_constructors_default_label_to_name() {
        let node = Node::input(0, "SSTREAM_@In");
        assert_eq!(node.label, "SSTREAM_@In");
        assert_eq!(node.node_type, NodeType::Input);
        assert!(!node.highlighted);
    }

    #[test]
    fn test_node_serialization_skips_empty_attributes() {
        let node = Node::intermediate(4, "Rows");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "intermediate");
        assert!(json.get("fillColor").is_none());
        assert!(json.get("highlighted").is_none());
    }

    #[test]
    fn test_from_error_sets_has_errors() {
        let result = AnalyzeResult::from_error("INVALID_REQUEST", "empty script");
        assert!(result.summary.has_errors);
        assert_eq!(result.summary.issue_count.errors, 1);
        assert!(result.nodes.is_empty());
    }
}
