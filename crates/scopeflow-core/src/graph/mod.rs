//! Incremental lineage graph construction.
//!
//! The builder consumes [`StatementRecord`]s strictly in source order. Every
//! node lives in one arena and is addressed by its index, so rebinding a
//! variable creates a new node and leaves the previous version and its edges
//! untouched.

mod annotate;
mod classify;

pub use annotate::{annotate_nodes, StreamInfoProvider};
pub use classify::{classify_nodes, prefix_color, FILLED_STYLE, HIGHLIGHT_COLOR, ROOT_NODE};

use std::collections::HashMap;

use crate::resolver::ScopeResolver;
use crate::types::{
    issue_codes, DeclareMap, Edge, Issue, Node, SourcePrefix, StatementKind, StatementRecord,
};

#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Arena index of a node.
pub type NodeId = usize;

/// Mutable state of one builder pass.
#[derive(Debug, Default)]
pub struct BuilderContext {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Variable name to the node currently bound to it
    bindings: HashMap<String, NodeId>,
    /// Result of the most recent statement that produced a node
    last_node: Option<NodeId>,
    resolver: ScopeResolver,
    issues: Vec<Issue>,
}

impl BuilderContext {
    pub fn new(resolver: ScopeResolver) -> Self {
        Self {
            resolver,
            ..Self::default()
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn last_node(&self) -> Option<&Node> {
        self.last_node.map(|id| &self.nodes[id])
    }

    /// The node currently bound to `name`.
    pub fn bound(&self, name: &str) -> Option<&Node> {
        self.bindings.get(name).map(|id| &self.nodes[*id])
    }

    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    fn push_node(&mut self, mut node: Node) -> NodeId {
        let id = self.nodes.len();
        node.id = id;
        self.nodes.push(node);
        id
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let edge = Edge {
            from,
            to,
            from_name: self.nodes[from].name.clone(),
            to_name: self.nodes[to].name.clone(),
        };
        self.edges.push(edge);
    }

    fn bind(&mut self, name: &str, id: NodeId) {
        self.bindings.insert(name.to_string(), id);
    }

    /// The bound node for `name`, creating and binding a root node if absent.
    fn upsert(&mut self, name: &str, statement: usize) -> NodeId {
        if let Some(&id) = self.bindings.get(name) {
            return id;
        }

        let id = self.push_node(Node::input(0, name));
        self.bind(name, id);

        if SourcePrefix::split(name).is_none() {
            #[cfg(feature = "tracing")]
            info!(name, statement, "unbound source treated as root");
            self.issues.push(
                Issue::info(
                    issue_codes::UNRESOLVED_REFERENCE,
                    format!("'{name}' is not bound by an earlier statement; treated as an external source"),
                )
                .with_statement(statement),
            );
        }
        id
    }

    /// A fresh node for `name` that keeps the `using` label of the node it replaces.
    fn rebind(&mut self, name: &str) -> NodeId {
        let mut node = Node::intermediate(0, name);
        node.using = self.bound(name).and_then(|prior| prior.using.clone());
        let id = self.push_node(node);
        self.bind(name, id);
        id
    }
}

/// Consumes statement records and produces the lineage graph.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    ctx: BuilderContext,
}

impl GraphBuilder {
    pub fn new(resolver: ScopeResolver) -> Self {
        Self {
            ctx: BuilderContext::new(resolver),
        }
    }

    pub fn context(&self) -> &BuilderContext {
        &self.ctx
    }

    /// Applies one record to the graph.
    pub fn apply(&mut self, record: &StatementRecord) {
        #[cfg(feature = "tracing")]
        debug!(index = record.index, kind = ?record.kind, "applying statement");

        let ctx = &mut self.ctx;
        match record.kind {
            StatementKind::Declare | StatementKind::Set => apply_declare(ctx, record),
            StatementKind::Output => apply_output(ctx, record),
            StatementKind::Select
            | StatementKind::Process
            | StatementKind::Reduce
            | StatementKind::Combine => apply_transform(ctx, record),
            StatementKind::Using => {}
            _ => apply_input(ctx, record),
        }
    }

    /// Ends the pass, returning the graph snapshot.
    pub fn finish(self) -> Graph {
        Graph {
            nodes: self.ctx.nodes,
            edges: self.ctx.edges,
            declare_map: self.ctx.resolver.into_declare_map(),
            issues: self.ctx.issues,
        }
    }
}

/// Nodes, edges and declared values of one builder pass.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub declare_map: DeclareMap,
    pub issues: Vec<Issue>,
}

fn apply_declare(ctx: &mut BuilderContext, record: &StatementRecord) {
    let (Some(name), Some(rvalue)) = (&record.assign_var, &record.rvalue) else {
        return;
    };
    let resolution = ctx
        .resolver
        .declare(name, rvalue, record.declared_type.as_deref());

    if let Some(err) = resolution.fallback {
        ctx.issues.push(
            Issue::warning(
                issue_codes::RESOLVE_FALLBACK,
                format!("Could not resolve {name}: {err}; using '{}'", resolution.value),
            )
            .with_statement(record.index),
        );
    }
}

/// Synthetic source node, then the bound target.
fn apply_input(ctx: &mut BuilderContext, record: &StatementRecord) {
    let Some(source_name) = record.sources.first() else {
        return;
    };
    let source = ctx.push_node(Node::input(0, source_name));

    if SourcePrefix::split(source_name).is_some_and(|(prefix, _)| prefix == SourcePrefix::Module) {
        for param in &record.params {
            let param = ctx.upsert(param, record.index);
            ctx.add_edge(param, source);
        }
    }

    let target = match &record.assign_var {
        Some(name) => {
            let target = ctx.rebind(name);
            ctx.add_edge(source, target);
            target
        }
        None => source,
    };
    ctx.last_node = Some(target);
}

fn apply_transform(ctx: &mut BuilderContext, record: &StatementRecord) {
    let mut predecessors = Vec::with_capacity(record.sources.len());

    for name in &record.sources {
        let id = ctx.upsert(name, record.index);

        match SourcePrefix::split(name) {
            Some((SourcePrefix::Module, _)) => {
                for param in &record.params {
                    let param = ctx.upsert(param, record.index);
                    ctx.add_edge(param, id);
                }
            }
            Some(_) => {}
            None => {
                if let Some(prefix) = name.rsplit_once('.').and_then(|(p, _)| ctx.bindings.get(p).copied()) {
                    if prefix != id {
                        ctx.add_edge(prefix, id);
                    }
                }
            }
        }
        predecessors.push(id);
    }

    if record.sources.is_empty() {
        predecessors.extend(ctx.last_node);
    }

    let target = match (&record.assign_var, ctx.last_node) {
        (Some(name), _) => ctx.rebind(name),
        (None, Some(last)) => last,
        (None, None) => ctx.push_node(Node::intermediate(0, ROOT_NODE)),
    };

    for from in predecessors {
        if from != target {
            ctx.add_edge(from, target);
        }
    }
    if let Some(using) = &record.using_clause {
        ctx.nodes[target].using = Some(using.clone());
    }
    ctx.last_node = Some(target);
}

/// A fresh output node per statement; never bound and never the last result.
fn apply_output(ctx: &mut BuilderContext, record: &StatementRecord) {
    let path = record.path.as_deref().unwrap_or_default();
    let target = ctx.push_node(Node::output(0, path));

    let predecessors: Vec<NodeId> = if record.sources.is_empty() {
        ctx.last_node.into_iter().collect()
    } else {
        record
            .sources
            .iter()
            .map(|name| match (ctx.bindings.get(name).copied(), ctx.last_node) {
                (Some(id), _) => id,
                (None, Some(last)) => last,
                (None, None) => ctx.upsert(name, record.index),
            })
            .collect()
    };

    for from in predecessors {
        ctx.add_edge(from, target);
    }
}
