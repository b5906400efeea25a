//! Data-flow diagram model.
//!
//! This module defines the building blocks:
//! - [`GraphStore`]: directed adjacency store with referential cleanup
//! - [`Node`] and [`Flow`]: typed nodes and labelled edges
//! - [`DataFlowDiagram`] and [`TrustBoundary`]: the root graph and its
//!   named subgraphs
//! - the attribute codec ([`Attribute`], [`Attributer`], [`AttributeSetter`])

mod attributes;
mod boundary;
mod diagram;
mod flow;
mod node;
mod store;
mod table;

pub use attributes::{
    make_attribute, quote, unquote, Attribute, AttributeKind, AttributeSetter, Attributer,
    Attributes, DefaultAttributes, PortLabels,
};
pub use boundary::{TrustBoundary, CLUSTER_PREFIX};
pub use diagram::DataFlowDiagram;
pub use flow::{format_flow_label, Flow};
pub use node::{parse_dot_id, Node, NodeKind, CIRCLE, CYLINDER, DIAMOND};
pub use store::{GraphEdge, GraphNode, GraphStore};

pub use dfd_dot::ast::CompassPoint;

pub(crate) use boundary::BoundaryState;

use crate::error::Result;

/// Operations shared by a diagram and its trust boundaries.
///
/// A generator populates whichever scope it was created for through this
/// trait.
pub trait DfdGraph {
    /// External ID of the graph.
    fn external_id(&self) -> &str;

    /// Register a node in the typed collection matching its kind.
    ///
    /// A node already stored as a flow endpoint keeps its stored copy and
    /// is only listed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DfdError::NodeIdCollision`] if a node with the same
    /// handle is already registered.
    fn add_node_elem(&self, node: Node) -> Result<()>;

    /// Remove the node `id` of `kind` and its edges. No-op if absent.
    fn remove_node_elem(&self, kind: NodeKind, id: &str) -> Option<Node>;

    /// Find a node by external ID.
    fn find_node(&self, id: &str) -> Option<Node>;

    /// Overwrite the stored copy of a registered node.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DfdError::NodeNotFound`] if the node is not stored.
    fn update_node(&self, node: &Node) -> Result<()>;

    /// Append to a default-attribute block.
    fn set_default_attribute(&self, kind: AttributeKind, attr: Attribute);

    /// Remove a process.
    fn remove_process(&self, id: &str) {
        self.remove_node_elem(NodeKind::Process, id);
    }

    /// Remove an external service.
    fn remove_external_service(&self, id: &str) {
        self.remove_node_elem(NodeKind::ExternalService, id);
    }

    /// Remove a data store.
    fn remove_data_store(&self, id: &str) {
        self.remove_node_elem(NodeKind::DataStore, id);
    }
}
