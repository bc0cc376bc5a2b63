//! Node classification by source-name prefix.

use crate::types::{Node, NodeType, SourcePrefix};

/// Name of the sentinel node created when a statement has neither a target
/// variable nor a previous result to continue.
pub const ROOT_NODE: &str = "ROOT";

/// Style hint set on every colored node.
pub const FILLED_STYLE: &str = "filled";

/// Fill color of nodes flagged by annotation.
pub const HIGHLIGHT_COLOR: &str = "gold";

const ROOT_COLOR: &str = "lightgrey";

/// Fixed display color of each input kind.
pub fn prefix_color(prefix: SourcePrefix) -> &'static str {
    match prefix {
        SourcePrefix::Streamset => "lightskyblue",
        SourcePrefix::Stream => "lightblue",
        SourcePrefix::Extract => "lightgreen",
        SourcePrefix::Module => "plum",
        SourcePrefix::View => "khaki",
        SourcePrefix::Func => "lightsalmon",
        SourcePrefix::Import => "thistle",
    }
}

/// Marks prefixed source nodes and `ROOT` sentinels as inputs and colors them.
///
/// Only names containing `_` are inspected for a prefix. Output nodes keep
/// their type whatever their path looks like.
pub fn classify_nodes(nodes: &mut [Node]) {
    for node in nodes.iter_mut().filter(|n| n.node_type != NodeType::Output) {
        let color = if node.name == ROOT_NODE {
            ROOT_COLOR
        } else if node.name.contains('_') {
            match SourcePrefix::split(&node.name) {
                Some((prefix, _)) => prefix_color(prefix),
                None => continue,
            }
        } else {
            continue;
        };

        node.node_type = NodeType::Input;
        node.style = Some(FILLED_STYLE.to_string());
        node.fill_color = Some(color.to_string());
    }
}
