//! Trust boundaries: named subgraphs of a diagram.

use super::attributes::{make_attribute, unquote, Attribute, AttributeKind, DefaultAttributes};
use super::node::{Node, NodeKind};
use super::table::NodeTable;
use super::DfdGraph;
use crate::error::Result;
use crate::id::gen_id;
use log::debug;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Prefix that marks a DOT subgraph as a trust boundary.
pub const CLUSTER_PREFIX: &str = "cluster_";

#[derive(Debug, Default)]
pub(crate) struct BoundaryState {
    pub(crate) name: String,
    pub(crate) attrs: DefaultAttributes,
    pub(crate) nodes: NodeTable,
}

impl BoundaryState {
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.attrs.clear();
        for attr in graph_attributes(name) {
            self.attrs.graph.push(attr);
        }
    }
}

fn graph_attributes(name: &str) -> [Attribute; 5] {
    [
        make_attribute("label", name),
        make_attribute("fontsize", "10"),
        make_attribute("style", "dashed"),
        make_attribute("color", "grey35"),
        make_attribute("fontcolor", "grey35"),
    ]
}

/// A named group of nodes sharing a security perimeter.
///
/// The boundary owns its own node collections. Nodes listed here are also
/// expected in the parent diagram's node table; see
/// [`DataFlowDiagram::add_node_to_boundary`](super::DataFlowDiagram::add_node_to_boundary).
#[derive(Debug)]
pub struct TrustBoundary {
    id: String,
    state: RwLock<BoundaryState>,
}

impl TrustBoundary {
    /// Create a named boundary with a fresh random ID and default styling.
    pub fn initialize(name: &str) -> Self {
        let boundary = Self::deserialize(&gen_id());
        boundary.update_name(name);
        boundary
    }

    /// Create an empty, unstyled boundary with a known ID.
    pub fn deserialize(id: &str) -> Self {
        Self {
            id: id.to_string(),
            state: RwLock::new(BoundaryState::default()),
        }
    }

    /// External ID.
    pub fn external_id(&self) -> &str {
        &self.id
    }

    /// DOT subgraph identifier, `cluster_<id>`.
    pub fn dot_id(&self) -> String {
        format!("{CLUSTER_PREFIX}{}", self.id)
    }

    /// Display name.
    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    /// Rename the boundary and regenerate its graph attribute block.
    pub fn update_name(&self, name: &str) {
        self.write().set_name(name);
    }

    /// Snapshot of the default-attribute blocks.
    pub fn default_attributes(&self) -> DefaultAttributes {
        self.read().attrs.clone()
    }

    /// Processes keyed by external ID.
    pub fn processes(&self) -> BTreeMap<String, Node> {
        self.read().nodes.typed(NodeKind::Process)
    }

    /// External services keyed by external ID.
    pub fn external_services(&self) -> BTreeMap<String, Node> {
        self.read().nodes.typed(NodeKind::ExternalService)
    }

    /// Data stores keyed by external ID.
    pub fn data_stores(&self) -> BTreeMap<String, Node> {
        self.read().nodes.typed(NodeKind::DataStore)
    }

    /// Every node in the boundary, ordered by handle.
    pub fn nodes(&self) -> Vec<Node> {
        self.read().nodes.sorted_nodes().into_iter().cloned().collect()
    }

    /// Check if the boundary lists `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.read().nodes.lists(id)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, BoundaryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, BoundaryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DfdGraph for TrustBoundary {
    fn external_id(&self) -> &str {
        &self.id
    }

    fn add_node_elem(&self, node: Node) -> Result<()> {
        debug!("Adding {} {} to trust boundary {}", node.kind(), node.handle(), self.id);
        self.write().nodes.insert(node)
    }

    fn remove_node_elem(&self, kind: NodeKind, id: &str) -> Option<Node> {
        debug!("Removing {kind} {id} from trust boundary {}", self.id);
        self.write().nodes.remove(kind, id)
    }

    fn find_node(&self, id: &str) -> Option<Node> {
        self.read().nodes.find(id).cloned()
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
