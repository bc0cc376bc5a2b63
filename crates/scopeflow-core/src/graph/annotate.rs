//! Optional annotation pass: resolved resource links, stream sizes and
//! implementation labels.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::classify::{FILLED_STYLE, HIGHLIGHT_COLOR};
use crate::dates::{start_of_day, strftime};
use crate::error::AnnotationError;
use crate::types::{issue_codes, DeclareMap, Issue, Node, NodeType, SourcePrefix};

#[cfg(feature = "tracing")]
use tracing::warn;

/// External stream metadata lookup, consulted during annotation.
///
/// Implementations may block; each distinct resource is looked up at most once
/// per annotation pass.
pub trait StreamInfoProvider {
    /// A display label for the size of the stream at `path`.
    fn stream_size(&self, path: &str) -> Result<String, AnnotationError>;
}

/// Annotates `nodes` in place and returns the issues raised by failed lookups.
pub fn annotate_nodes(
    nodes: &mut [Node],
    declare_map: &DeclareMap,
    reference_date: NaiveDate,
    provider: Option<&dyn StreamInfoProvider>,
) -> Vec<Issue> {
    let mut annotator = Annotator {
        declare_map,
        reference_date,
        provider,
        sizes: HashMap::new(),
        issues: Vec::new(),
    };
    for node in nodes.iter_mut() {
        annotator.annotate(node);
    }
    annotator.issues
}

struct Annotator<'a> {
    declare_map: &'a DeclareMap,
    reference_date: NaiveDate,
    provider: Option<&'a dyn StreamInfoProvider>,
    /// Per-pass lookup cache; `None` records a failed lookup.
    sizes: HashMap<String, Option<String>>,
    issues: Vec<Issue>,
}

impl Annotator<'_> {
    fn annotate(&mut self, node: &mut Node) {
        if let Some(link) = self.link_for(node) {
            node.label = format!("{}\n{link}", node.label);
            if let Some(size) = self.size_of(&link) {
                node.label = format!("{}\n[{size}]", node.label);
                node.size = Some(size);
            }
            node.link = Some(link);
        }

        if let Some(using) = &node.using {
            node.label = format!("{}\n{using}", node.label);
            node.highlighted = true;
            node.style = Some(FILLED_STYLE.to_string());
            node.fill_color = Some(HIGHLIGHT_COLOR.to_string());
        }
    }

    /// The declared key of a stream input or output node.
    fn declared_key<'n>(node: &'n Node) -> Option<&'n str> {
        match node.node_type {
            NodeType::Output => Some(&node.name),
            NodeType::Input => match SourcePrefix::split(&node.name) {
                Some((SourcePrefix::Stream | SourcePrefix::Streamset, resource)) => Some(resource),
                _ => None,
            },
            NodeType::Intermediate => None,
        }
    }

    /// Resolved value without its query string, date directives filled with the
    /// reference date.
    fn link_for(&self, node: &Node) -> Option<String> {
        let value = self.declare_map.get(Self::declared_key(node)?)?.to_string();
        let path = match value.split_once('?') {
            Some((path, _)) => path.to_string(),
            None => value,
        };
        Some(strftime(&path, &start_of_day(self.reference_date)))
    }

    fn size_of(&mut self, link: &str) -> Option<String> {
        let provider = self.provider?;
        if let Some(cached) = self.sizes.get(link) {
            return cached.clone();
        }

        let size = match provider.stream_size(link) {
            Ok(size) => Some(size),
            Err(err) => {
                #[cfg(feature = "tracing")]
                warn!(link, error = %err, "stream lookup failed");
                self.issues.push(Issue::warning(
                    issue_codes::ANNOTATION_LOOKUP_FAILED,
                    format!("Size of '{link}' unavailable: {err}"),
                ));
                None
            }
        };
        self.sizes.insert(link.to_string(), size.clone());
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use std::cell::RefCell;

    struct CountingProvider {
        calls: RefCell<Vec<String>>,
        fail: bool,
    }

    impl StreamInfoProvider for CountingProvider {
        fn stream_size(&self, path: &str) -> Result<String, AnnotationError> {
            self.calls.borrow_mut().push(path.to_string());
            if self.fail {
                Err(AnnotationError::Unavailable("offline".to_string()))
            } else {
                Ok("1.2 GB".to_string())
            }
        }
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn declared() -> DeclareMap {
        let mut map = DeclareMap::new();
        map.insert("@In".to_string(), Value::from("/data/%Y/%m/%d/in.ss?x=1"));
        map.insert("@Out".to_string(), Value::from("/data/out.ss"));
        map
    }

    #[test]
    fn test_links_for_stream_inputs_and_outputs() {
        let mut nodes = vec![
            Node::input(0, "SSTREAM_@In"),
            Node::output(1, "@Out"),
            Node::input(2, "EXTRACT_@In"),
        ];
        let issues = annotate_nodes(&mut nodes, &declared(), reference(), None);
        assert!(issues.is_empty());
        assert_eq!(nodes[0].link.as_deref(), Some("/data/2024/06/03/in.ss"));
        assert_eq!(nodes[0].label, "SSTREAM_@In\n/data/2024/06/03/in.ss");
        assert_eq!(nodes[1].link.as_deref(), Some("/data/out.ss"));
        assert!(nodes[2].link.is_none());
    }

    #[test]
    fn test_link_with_encoded_space_still_fills_dates() {
        let mut declared = DeclareMap::new();
        declared.insert("@In".to_string(), Value::from("/data/my%20feed/%Y-%m-%d.ss?pct=5%"));
        let mut nodes = vec![Node::input(0, "SSTREAM_@In")];
        annotate_nodes(&mut nodes, &declared, reference(), None);
        assert_eq!(nodes[0].link.as_deref(), Some("/data/my%20feed/2024-06-03.ss"));
    }

    #[test]
    fn test_using_highlights_node() {
        let mut node = Node::intermediate(0, "Reduced");
        node.using = Some("TopKReducer".to_string());
        let mut nodes = vec![node];
        annotate_nodes(&mut nodes, &DeclareMap::new(), reference(), None);
        assert!(nodes[0].highlighted);
        assert_eq!(nodes[0].label, "Reduced\nTopKReducer");
        assert_eq!(nodes[0].fill_color.as_deref(), Some(HIGHLIGHT_COLOR));
    }

    #[test]
    fn test_provider_is_called_once_per_resource() {
        let provider = CountingProvider {
            calls: RefCell::new(Vec::new()),
            fail: false,
        };
        let mut nodes = vec![Node::input(0, "SSTREAM_@In"), Node::input(1, "SSTREAM_@In")];
        annotate_nodes(&mut nodes, &declared(), reference(), Some(&provider));
        assert_eq!(provider.calls.borrow().len(), 1);
        assert_eq!(nodes[1].size.as_deref(), Some("1.2 GB"));
    }

    #[test]
    fn test_failed_lookup_degrades_to_warning() {
        let provider = CountingProvider {
            calls: RefCell::new(Vec::new()),
            fail: true,
        };
        let mut nodes = vec![Node::output(0, "@Out"), Node::output(1, "@Out")];
        let issues = annotate_nodes(&mut nodes, &declared(), reference(), Some(&provider));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, issue_codes::ANNOTATION_LOOKUP_FAILED);
        assert!(nodes[0].size.is_none());
        assert_eq!(nodes[0].link.as_deref(), Some("/data/out.ss"));
        assert_eq!(provider.calls.borrow().len(), 1);
    }
}
