//! Builds a [`DataFlowDiagram`] from a DOT syntax tree.
//!
//! One [`Generator`] walks one statement list. A `subgraph` statement
//! registers a trust boundary on the root diagram and hands its body to a
//! fresh generator scoped to that boundary. Each generator keeps its own
//! identity registry, so a node referenced at top level and inside a
//! boundary yields two independent node values.
//!
//! Any invalid statement aborts the walk with an error.

use crate::error::{DfdError, Result};
use crate::graph::{
    parse_dot_id, Attribute, AttributeSetter, DataFlowDiagram, DfdGraph, Flow, Node, PortLabels,
    TrustBoundary, CLUSTER_PREFIX,
};
use crate::id::gen_id;
use dfd_dot::ast;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};

/// Build a diagram from a parsed DOT graph.
///
/// # Errors
///
/// Returns the first format error met: a malformed node identifier, an
/// unknown node kind, an unsupported attribute, a self flow or a directed
/// edge in an undirected graph.
pub fn generate(graph: &ast::Graph) -> Result<DataFlowDiagram> {
    let diagram = DataFlowDiagram::deserialize(&graph.id);
    Generator::new(&diagram)
        .directed(graph.directed)
        .add_stmts(&graph.stmts)?;
    debug!(
        "Generated diagram {} with {} nodes",
        diagram.external_id(),
        diagram.node_count()
    );
    Ok(diagram)
}

/// Statement interpreter for one graph or subgraph body.
pub struct Generator<'a> {
    diagram: &'a DataFlowDiagram,
    scope: &'a dyn DfdGraph,
    in_boundary: bool,
    directed: bool,
    // External ID to the node built for it in this scope
    ids: HashMap<String, Node>,
    // Nodes resolved inside an edge's subgraph vertex
    sub_nodes: Vec<Node>,
    // Start offsets into `sub_nodes`, innermost subgraph last
    sub_start: Vec<usize>,
}

impl<'a> Generator<'a> {
    /// Create a generator populating the diagram itself.
    pub fn new(diagram: &'a DataFlowDiagram) -> Self {
        Self::with_scope(diagram, diagram, false)
    }

    /// Create a generator populating `boundary`. Flows still go to
    /// `diagram`.
    pub fn for_boundary(diagram: &'a DataFlowDiagram, boundary: &'a TrustBoundary) -> Self {
        Self::with_scope(diagram, boundary, true)
    }

    fn with_scope(
        diagram: &'a DataFlowDiagram,
        scope: &'a dyn DfdGraph,
        in_boundary: bool,
    ) -> Self {
        Self {
            diagram,
            scope,
            in_boundary,
            directed: true,
            ids: HashMap::new(),
            sub_nodes: Vec::new(),
            sub_start: Vec::new(),
        }
    }

    /// Set whether the source graph is directed.
    pub fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    /// Apply statements in order, stopping at the first error.
    pub fn add_stmts(&mut self, stmts: &[ast::Stmt]) -> Result<()> {
        stmts.iter().try_for_each(|stmt| self.add_stmt(stmt))
    }

    /// Apply one statement.
    ///
    /// # Errors
    ///
    /// See [`generate`].
    pub fn add_stmt(&mut self, stmt: &ast::Stmt) -> Result<()> {
        match stmt {
            ast::Stmt::Node(stmt) => self.add_node_stmt(stmt),
            ast::Stmt::Edge(stmt) => self.add_edge_stmt(stmt),
            ast::Stmt::Attr(stmt) => {
                for attr in &stmt.attrs {
                    trace!("Default {} attribute {}={}", stmt.kind, attr.key, attr.val);
                    self.scope
                        .set_default_attribute(stmt.kind.into(), Attribute::from(attr));
                }
                Ok(())
            }
            ast::Stmt::Assign(attr) => {
                debug!("Ignoring graph assignment {}={}", attr.key, attr.val);
                Ok(())
            }
            ast::Stmt::Subgraph(sub) => self.add_subgraph_stmt(sub),
        }
    }

    fn add_node_stmt(&mut self, stmt: &ast::NodeStmt) -> Result<()> {
        let mut node = self.node(&stmt.node.id)?;
        if stmt.node.port.is_some() || !stmt.attrs.is_empty() {
            if let Some(port) = &stmt.node.port {
                node.port = Some(PortLabels::from(port));
            }
            for attr in &stmt.attrs {
                node.set_attribute(Attribute::from(attr))?;
            }
            self.scope.update_node(&node)?;
            if self.in_boundary {
                self.diagram.refresh_endpoint(&node);
            }
            self.ids.insert(node.external_id(), node.clone());
        }
        if self.is_in_subgraph() {
            self.sub_nodes.push(node);
        }
        Ok(())
    }

    fn add_subgraph_stmt(&mut self, sub: &ast::Subgraph) -> Result<()> {
        let mut tb_id = sub.id.replace(CLUSTER_PREFIX, "");
        if tb_id.is_empty() {
            tb_id = gen_id();
        }
        debug!("Entering trust boundary {tb_id}");
        let tb = self
            .diagram
            .insert_trust_boundary(TrustBoundary::deserialize(&tb_id));
        Generator::for_boundary(self.diagram, &tb)
            .directed(self.directed)
            .add_stmts(&sub.stmts)
    }

    fn add_edge_stmt(&mut self, stmt: &ast::EdgeStmt) -> Result<()> {
        let fs = self.add_vertex(&stmt.from)?;
        let ts = self.add_edge(&stmt.to, &stmt.attrs)?;
        self.connect(&fs, &stmt.from, &ts, &stmt.to, &stmt.attrs)
    }

    // Resolves one step of an edge chain and connects it to the rest.
    // Returns the nodes of this step's vertex.
    fn add_edge(&mut self, to: &ast::Edge, attrs: &[ast::Attr]) -> Result<Vec<Node>> {
        if !self.directed && to.directed {
            return Err(DfdError::DirectedEdgeInUndirectedGraph {
                vertex: to.vertex.to_string(),
            });
        }
        let fs = self.add_vertex(&to.vertex)?;
        if let Some(next) = &to.to {
            let ts = self.add_edge(next, attrs)?;
            self.connect(&fs, &to.vertex, &ts, next, attrs)?;
        }
        Ok(fs)
    }

    fn connect(
        &self,
        fs: &[Node],
        from: &ast::Vertex,
        ts: &[Node],
        to: &ast::Edge,
        attrs: &[ast::Attr],
    ) -> Result<()> {
        for f in fs {
            for t in ts {
                let mut flow = Flow::new(f.handle(), t.handle(), "");
                apply_ports(&mut flow, from, &to.vertex);
                for attr in attrs {
                    flow.set_attribute(Attribute::from(attr))?;
                }
                self.diagram.set_flow(flow, f, t)?;
            }
        }
        Ok(())
    }

    fn add_vertex(&mut self, vertex: &ast::Vertex) -> Result<Vec<Node>> {
        match vertex {
            ast::Vertex::Node(n) => {
                let node = self.node(&n.id)?;
                if self.is_in_subgraph() {
                    self.sub_nodes.push(node.clone());
                }
                Ok(vec![node])
            }
            ast::Vertex::Subgraph(sub) => {
                self.sub_start.push(self.sub_nodes.len());
                self.add_stmts(&sub.stmts)?;
                Ok(self.pop_subgraph())
            }
        }
    }

    // Resolve a DOT node identifier, building and registering the node on
    // first sight.
    fn node(&mut self, id: &str) -> Result<Node> {
        let (kind, external_id) = parse_dot_id(id)?;
        if let Some(node) = self.ids.get(external_id) {
            return Ok(node.clone());
        }

        let node = Node::deserialize(kind, external_id)?;
        trace!("Registering {kind} {external_id} in scope {}", self.scope.external_id());
        self.scope.add_node_elem(node.clone())?;
        // An endpoint stored earlier by a boundary's flow keeps its attributes
        let node = self.scope.find_node(external_id).unwrap_or(node);
        self.ids.insert(external_id.to_string(), node.clone());
        Ok(node)
    }

    fn is_in_subgraph(&self) -> bool {
        !self.sub_start.is_empty()
    }

    // Nodes touched since the innermost subgraph was entered, deduplicated.
    fn pop_subgraph(&mut self) -> Vec<Node> {
        let start = self.sub_start.pop().unwrap_or_default();
        let mut seen = HashSet::new();
        let nodes = self.sub_nodes[start..]
            .iter()
            .filter(|n| seen.insert(n.handle()))
            .cloned()
            .collect();
        if self.sub_start.is_empty() {
            self.sub_nodes.clear();
        }
        nodes
    }
}

fn apply_ports(flow: &mut Flow, from: &ast::Vertex, to: &ast::Vertex) {
    if let ast::Vertex::Node(ast::Node { port: Some(port), .. }) = from {
        flow.set_from_port(port.id.as_str(), port.compass);
    }
    if let ast::Vertex::Node(ast::Node { port: Some(port), .. }) = to {
        flow.set_to_port(port.id.as_str(), port.compass);
    }
}
