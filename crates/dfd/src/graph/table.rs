//! Node table shared by diagrams and trust boundaries.
//!
//! Pairs a [`GraphStore`] with the typed membership collections. The store
//! may hold nodes that no collection lists: a diagram's store also carries
//! boundary nodes pulled in by flows.

use super::flow::Flow;
use super::node::{Node, NodeKind};
use super::store::GraphStore;
use crate::error::{DfdError, Result};
use crate::id::{parse_handle, NodeId};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub(crate) struct NodeTable {
    pub(crate) store: GraphStore<Node, Flow>,
    processes: BTreeMap<String, NodeId>,
    external_services: BTreeMap<String, NodeId>,
    data_stores: BTreeMap<String, NodeId>,
}

impl NodeTable {
    fn index(&self, kind: NodeKind) -> &BTreeMap<String, NodeId> {
        match kind {
            NodeKind::Process => &self.processes,
            NodeKind::ExternalService => &self.external_services,
            NodeKind::DataStore => &self.data_stores,
        }
    }

    fn index_mut(&mut self, kind: NodeKind) -> &mut BTreeMap<String, NodeId> {
        match kind {
            NodeKind::Process => &mut self.processes,
            NodeKind::ExternalService => &mut self.external_services,
            NodeKind::DataStore => &mut self.data_stores,
        }
    }

    /// Register a node in its typed collection and the store.
    ///
    /// A node already stored as a flow endpoint but not yet listed is listed
    /// as is; its stored copy wins over `node`.
    pub(crate) fn insert(&mut self, node: Node) -> Result<()> {
        let (kind, handle) = (node.kind(), node.handle());
        let unlisted_endpoint = self.store.node(handle).is_some_and(|n| n.kind() == kind)
            && !self.lists(&node.external_id());
        if !unlisted_endpoint {
            self.store.add_node(node)?;
        }
        self.index_mut(kind).insert(handle.to_string(), handle);
        Ok(())
    }

    /// Drop `id` from the `kind` collection and remove the stored node if it
    /// is of that kind, together with its edges.
    pub(crate) fn remove(&mut self, kind: NodeKind, id: &str) -> Option<Node> {
        self.index_mut(kind).remove(id);
        let handle = parse_handle(id).ok()?;
        if self.store.node(handle)?.kind() != kind {
            return None;
        }
        self.store.remove_node(handle)
    }

    /// Find a node listed in one of the typed collections.
    pub(crate) fn find(&self, id: &str) -> Option<&Node> {
        NodeKind::ALL
            .into_iter()
            .find_map(|kind| self.index(kind).get(id))
            .and_then(|handle| self.store.node(*handle))
    }

    /// Check if `id` is listed in any typed collection.
    pub(crate) fn lists(&self, id: &str) -> bool {
        NodeKind::ALL
            .into_iter()
            .any(|kind| self.index(kind).contains_key(id))
    }

    /// Replace the stored copy of `node`.
    pub(crate) fn update(&mut self, node: &Node) -> Result<()> {
        let slot = self
            .store
            .node_mut(node.handle())
            .ok_or_else(|| DfdError::NodeNotFound {
                node_id: node.external_id(),
            })?;
        *slot = node.clone();
        Ok(())
    }

    /// Snapshot of one typed collection.
    pub(crate) fn typed(&self, kind: NodeKind) -> BTreeMap<String, Node> {
        self.index(kind)
            .iter()
            .filter_map(|(id, handle)| Some((id.clone(), self.store.node(*handle)?.clone())))
            .collect()
    }

    /// Every stored node ordered by handle.
    pub(crate) fn sorted_nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.store.nodes().collect();
        nodes.sort_by_key(|n| n.handle());
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_find() {
        let mut table = NodeTable::default();
        let node = Node::data_store("Users");
        table.insert(node.clone()).unwrap();

        assert_eq!(table.find(&node.external_id()), Some(&node));
        assert!(table.lists(&node.external_id()));
        assert_eq!(table.typed(NodeKind::DataStore).len(), 1);
        assert!(table.typed(NodeKind::Process).is_empty());
    }

    #[test]
    fn test_insert_collision_leaves_indexes_alone() {
        let mut table = NodeTable::default();
        let node = Node::deserialize(NodeKind::Process, "7").unwrap();
        table.insert(node).unwrap();

        let twin = Node::deserialize(NodeKind::DataStore, "7").unwrap();
        assert!(table.insert(twin).is_err());
        assert!(table.typed(NodeKind::DataStore).is_empty());
    }

    #[test]
    fn test_insert_lists_unlisted_endpoint() {
        let mut table = NodeTable::default();
        let mut endpoint = Node::deserialize(NodeKind::Process, "7").unwrap();
        endpoint.update_name("Client");
        table.store.add_node(endpoint).unwrap();

        table
            .insert(Node::deserialize(NodeKind::Process, "7").unwrap())
            .unwrap();
        assert!(table.lists("7"));
        assert_eq!(table.find("7").map(|n| n.name.as_str()), Some("Client"));
        assert!(table
            .insert(Node::deserialize(NodeKind::Process, "7").unwrap())
            .is_err());
    }

    #[test]
    fn test_insert_unlisted_endpoint_of_other_kind() {
        let mut table = NodeTable::default();
        table
            .store
            .add_node(Node::deserialize(NodeKind::Process, "7").unwrap())
            .unwrap();

        let twin = Node::deserialize(NodeKind::DataStore, "7").unwrap();
        assert!(table.insert(twin).is_err());
        assert!(!table.lists("7"));
    }

    #[test]
    fn test_remove_matches_kind() {
        let mut table = NodeTable::default();
        let node = Node::deserialize(NodeKind::Process, "7").unwrap();
        table.insert(node).unwrap();

        assert!(table.remove(NodeKind::DataStore, "7").is_none());
        assert!(table.store.contains_node(7));

        assert!(table.remove(NodeKind::Process, "7").is_some());
        assert!(!table.store.contains_node(7));
        assert!(!table.lists("7"));
    }
}
