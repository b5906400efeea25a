//! The root data-flow diagram.

use super::attributes::{make_attribute, unquote, Attribute, AttributeKind, DefaultAttributes};
use super::boundary::TrustBoundary;
use super::flow::Flow;
use super::node::{Node, NodeKind};
use super::table::NodeTable;
use super::DfdGraph;
use crate::error::{DfdError, Result};
use crate::id::{gen_id, parse_handle, FlowKey, NodeId};
use log::{debug, trace};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub(crate) struct DiagramState {
    pub(crate) name: String,
    pub(crate) attrs: DefaultAttributes,
    pub(crate) nodes: NodeTable,
    pub(crate) trust_boundaries: BTreeMap<String, Arc<TrustBoundary>>,
}

impl DiagramState {
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.attrs.clear();
        let graph = [
            make_attribute("label", name),
            make_attribute("fontname", "Arial"),
            make_attribute("fontsize", "14"),
            make_attribute("labelloc", "t"),
            make_attribute("fontsize", "20"),
            make_attribute("nodesep", "1"),
            make_attribute("rankdir", "t"),
        ];
        let node = [
            make_attribute("fontname", "Arial"),
            make_attribute("fontsize", "14"),
        ];
        let edge = [
            make_attribute("shape", "none"),
            make_attribute("fontname", "Arial"),
            make_attribute("fontsize", "12"),
        ];
        self.attrs.graph = graph.into_iter().collect();
        self.attrs.node = node.into_iter().collect();
        self.attrs.edge = edge.into_iter().collect();
    }
}

/// A data-flow diagram: typed nodes, flows between them and trust
/// boundaries grouping them.
///
/// Every method locks the diagram for its whole duration, so a mutation is
/// never observed half applied. Methods that also touch a boundary take the
/// diagram lock first. Share the diagram between threads with an [`Arc`].
///
/// # Example
///
/// ```rust
/// use dfd::{DataFlowDiagram, DfdGraph, Node};
///
/// let diagram = DataFlowDiagram::initialize("WebApp");
/// let client = Node::process("Client");
/// let server = Node::process("Server");
/// diagram.add_node_elem(client.clone()).unwrap();
/// diagram.add_node_elem(server.clone()).unwrap();
/// diagram.add_flow(&client, &server, "HTTPS").unwrap();
///
/// assert_eq!(diagram.flows().len(), 1);
/// assert!(diagram.add_flow(&client, &client, "loop").is_err());
/// ```
#[derive(Debug)]
pub struct DataFlowDiagram {
    id: String,
    state: RwLock<DiagramState>,
}

impl DataFlowDiagram {
    /// Create a named diagram with a fresh random ID and default styling.
    pub fn initialize(name: &str) -> Self {
        let dfd = Self::deserialize(&gen_id());
        dfd.update_name(name);
        dfd
    }

    /// Create an empty, unstyled diagram with a known ID.
    pub fn deserialize(id: &str) -> Self {
        Self {
            id: id.to_string(),
            state: RwLock::new(DiagramState::default()),
        }
    }

    /// External ID.
    pub fn external_id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    /// Rename the diagram and regenerate all three attribute blocks.
    pub fn update_name(&self, name: &str) {
        self.write().set_name(name);
    }

    /// Snapshot of the default-attribute blocks.
    pub fn default_attributes(&self) -> DefaultAttributes {
        self.read().attrs.clone()
    }

    /// Top-level processes keyed by external ID.
    pub fn processes(&self) -> BTreeMap<String, Node> {
        self.read().nodes.typed(NodeKind::Process)
    }

    /// Top-level external services keyed by external ID.
    pub fn external_services(&self) -> BTreeMap<String, Node> {
        self.read().nodes.typed(NodeKind::ExternalService)
    }

    /// Top-level data stores keyed by external ID.
    pub fn data_stores(&self) -> BTreeMap<String, Node> {
        self.read().nodes.typed(NodeKind::DataStore)
    }

    /// Every node in the node table, ordered by handle.
    pub fn nodes(&self) -> Vec<Node> {
        self.read().nodes.sorted_nodes().into_iter().cloned().collect()
    }

    /// Nodes reachable from `id` by one flow.
    pub fn from(&self, id: NodeId) -> Vec<Node> {
        self.read().nodes.store.from(id).into_iter().cloned().collect()
    }

    /// Nodes with a flow into `id`.
    pub fn to(&self, id: NodeId) -> Vec<Node> {
        self.read().nodes.store.to(id).into_iter().cloned().collect()
    }

    /// Number of nodes in the node table.
    pub fn node_count(&self) -> usize {
        self.read().nodes.store.node_count()
    }

    /// Rename a node wherever it is stored: the node table and every
    /// boundary listing it.
    ///
    /// # Errors
    ///
    /// Returns [`DfdError::NodeNotFound`] if no copy of the node exists.
    pub fn rename_node(&self, id: &str, name: &str) -> Result<()> {
        let handle = parse_handle(id)?;
        let mut state = self.write();
        let mut found = false;
        if let Some(node) = state.nodes.store.node_mut(handle) {
            node.update_name(name);
            found = true;
        }
        for tb in state.trust_boundaries.values() {
            if let Some(node) = tb.write().nodes.store.node_mut(handle) {
                node.update_name(name);
                found = true;
            }
        }
        if !found {
            return Err(DfdError::NodeNotFound {
                node_id: id.to_string(),
            });
        }
        debug!("Renamed node {id} to {name:?}");
        Ok(())
    }

    /// Create a named trust boundary and register it.
    pub fn add_trust_boundary(&self, name: &str) -> Arc<TrustBoundary> {
        self.insert_trust_boundary(TrustBoundary::initialize(name))
    }

    /// Register a boundary under its external ID, replacing any boundary
    /// with the same ID.
    pub fn insert_trust_boundary(&self, tb: TrustBoundary) -> Arc<TrustBoundary> {
        let tb = Arc::new(tb);
        debug!("Registering trust boundary {} in diagram {}", tb.external_id(), self.id);
        self.write()
            .trust_boundaries
            .insert(tb.external_id().to_string(), Arc::clone(&tb));
        tb
    }

    /// Get a trust boundary by external ID.
    pub fn trust_boundary(&self, id: &str) -> Option<Arc<TrustBoundary>> {
        self.read().trust_boundaries.get(id).cloned()
    }

    /// All trust boundaries, keyed by external ID.
    pub fn trust_boundaries(&self) -> BTreeMap<String, Arc<TrustBoundary>> {
        self.read().trust_boundaries.clone()
    }

    /// Unregister a trust boundary. Its nodes stay in the node table.
    pub fn remove_trust_boundary(&self, id: &str) -> Option<Arc<TrustBoundary>> {
        debug!("Removing trust boundary {id} from diagram {}", self.id);
        self.write().trust_boundaries.remove(id)
    }

    /// Place a node inside a boundary.
    ///
    /// The node is listed in the boundary's typed collection and stored in
    /// the diagram's node table in one step.
    ///
    /// # Errors
    ///
    /// Returns [`DfdError::BoundaryNotFound`] for an unknown boundary and
    /// [`DfdError::NodeIdCollision`] if either side already holds the
    /// handle. Nothing is changed on error.
    pub fn add_node_to_boundary(&self, boundary_id: &str, node: Node) -> Result<()> {
        let mut state = self.write();
        let tb = state
            .trust_boundaries
            .get(boundary_id)
            .cloned()
            .ok_or_else(|| DfdError::BoundaryNotFound {
                boundary_id: boundary_id.to_string(),
            })?;
        let mut tb_state = tb.write();

        let handle = node.handle();
        if state.nodes.store.contains_node(handle) || tb_state.nodes.store.contains_node(handle) {
            return Err(DfdError::NodeIdCollision { handle });
        }
        debug!("Adding {} {handle} to trust boundary {boundary_id}", node.kind());
        tb_state.nodes.insert(node.clone())?;
        state.nodes.store.add_node(node)
    }

    /// Add a flow named `name` from `from` to `to`.
    ///
    /// Endpoints missing from the node table are stored without being
    /// listed in a typed collection. An existing flow between the same
    /// ordered pair is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`DfdError::SelfFlow`] if both endpoints are the same node.
    pub fn add_flow(&self, from: &Node, to: &Node, name: &str) -> Result<Flow> {
        let flow = Flow::new(from.handle(), to.handle(), name);
        self.set_flow(flow.clone(), from, to)?;
        Ok(flow)
    }

    /// Store a prepared flow whose endpoints are `from` and `to`.
    ///
    /// # Errors
    ///
    /// Returns [`DfdError::SelfFlow`] for a self flow and
    /// [`DfdError::NodeNotFound`] if `from`/`to` are not the flow's
    /// endpoints.
    pub fn set_flow(&self, flow: Flow, from: &Node, to: &Node) -> Result<()> {
        if flow.from() == flow.to() {
            return Err(DfdError::SelfFlow { handle: flow.from() });
        }
        for (handle, node) in [(flow.from(), from), (flow.to(), to)] {
            if handle != node.handle() {
                return Err(DfdError::NodeNotFound {
                    node_id: handle.to_string(),
                });
            }
        }

        let mut state = self.write();
        for node in [from, to] {
            if !state.nodes.store.contains_node(node.handle()) {
                trace!("Storing flow endpoint {}", node.dot_id());
                state.nodes.store.add_node(node.clone())?;
            }
        }
        debug!("Setting flow {}", flow.key());
        state.nodes.store.set_edge(flow)?;
        Ok(())
    }

    /// Remove the flow between two external IDs. No-op if absent.
    pub fn remove_flow(&self, src_id: &str, dst_id: &str) {
        let (Ok(u), Ok(v)) = (parse_handle(src_id), parse_handle(dst_id)) else {
            return;
        };
        debug!("Removing flow {}", FlowKey::new(u, v));
        self.write().nodes.store.remove_edge(u, v);
    }

    /// Get the flow `from -> to`.
    pub fn flow(&self, from: NodeId, to: NodeId) -> Option<Flow> {
        self.read().nodes.store.edge(from, to).cloned()
    }

    /// All flows keyed by their endpoints.
    pub fn flows(&self) -> BTreeMap<FlowKey, Flow> {
        self.read()
            .nodes
            .store
            .edges()
            .map(|flow| (flow.key(), flow.clone()))
            .collect()
    }

    /// Check if the node table stores `id`, listed or not.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.read().nodes.store.contains_node(id)
    }

    // Overwrite a stored flow endpoint that no typed collection lists.
    pub(crate) fn refresh_endpoint(&self, node: &Node) {
        let mut state = self.write();
        if state.nodes.lists(&node.external_id()) {
            return;
        }
        if let Some(slot) = state.nodes.store.node_mut(node.handle()) {
            if slot.kind() == node.kind() {
                trace!("Refreshing flow endpoint {}", node.dot_id());
                *slot = node.clone();
            }
        }
    }

    /// Number of flows.
    pub fn flow_count(&self) -> usize {
        self.read().nodes.store.edge_count()
    }

    /// Check the adjacency tables for dangling entries.
    pub fn is_consistent(&self) -> bool {
        self.read().nodes.store.is_consistent()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, DiagramState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, DiagramState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DfdGraph for DataFlowDiagram {
    fn external_id(&self) -> &str {
        &self.id
    }

    fn add_node_elem(&self, node: Node) -> Result<()> {
        debug!("Adding {} {} to diagram {}", node.kind(), node.handle(), self.id);
        self.write().nodes.insert(node)
    }

    fn remove_node_elem(&self, kind: NodeKind, id: &str) -> Option<Node> {
        debug!("Removing {kind} {id} from diagram {}", self.id);
        self.write().nodes.remove(kind, id)
    }

    /// Search the diagram's typed collections, then every trust boundary.
    fn find_node(&self, id: &str) -> Option<Node> {
        let state = self.read();
        if let Some(node) = state.nodes.find(id) {
            return Some(node.clone());
        }
        state
            .trust_boundaries
            .values()
            .find_map(|tb| tb.find_node(id))
    }

    fn update_node(&self, node: &Node) -> Result<()> {
        self.write().nodes.update(node)
    }

    fn set_default_attribute(&self, kind: AttributeKind, attr: Attribute) {
        let mut state = self.write();
        if kind == AttributeKind::Graph && attr.key == "label" {
            state.name = unquote(&attr.value).unwrap_or_else(|| attr.value.clone());
        }
        state.attrs.get_mut(kind).push(attr);
    }
}
