//! Directed adjacency store.
//!
//! Nodes live in a table keyed by handle. Edges live once in the forward
//! map `from[u][v]`, mirrored by a reverse index `to[v] ∋ u`. Every
//! operation keeps the two in step, so a removed node or edge never leaves a
//! dangling reverse entry.

use crate::error::{DfdError, Result};
use crate::id::NodeId;
use log::trace;
use std::collections::{HashMap, HashSet};

/// A value stored as a graph node.
pub trait GraphNode {
    /// Handle of the node.
    fn handle(&self) -> NodeId;
}

/// A value stored as a directed graph edge.
pub trait GraphEdge {
    /// Handle of the source node.
    fn from(&self) -> NodeId;
    /// Handle of the destination node.
    fn to(&self) -> NodeId;
}

/// Directed graph with map-backed adjacency and no self edges.
///
/// Iteration order of [`nodes`](Self::nodes), [`edges`](Self::edges),
/// [`from`](Self::from) and [`to`](Self::to) is unspecified.
#[derive(Debug, Clone)]
pub struct GraphStore<N, E> {
    nodes: HashMap<NodeId, N>,
    from: HashMap<NodeId, HashMap<NodeId, E>>,
    to: HashMap<NodeId, HashSet<NodeId>>,
}

impl<N, E> Default for GraphStore<N, E> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            from: HashMap::new(),
            to: HashMap::new(),
        }
    }
}

impl<N: GraphNode, E: GraphEdge> GraphStore<N, E> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under its handle.
    ///
    /// # Errors
    ///
    /// Returns [`DfdError::NodeIdCollision`] if the handle is taken. The
    /// existing node is left untouched.
    pub fn add_node(&mut self, node: N) -> Result<()> {
        let id = node.handle();
        if self.nodes.contains_key(&id) {
            return Err(DfdError::NodeIdCollision { handle: id });
        }
        self.nodes.insert(id, node);
        self.from.insert(id, HashMap::new());
        self.to.insert(id, HashSet::new());
        Ok(())
    }

    /// Remove a node and every edge touching it. No-op if absent.
    pub fn remove_node(&mut self, id: NodeId) -> Option<N> {
        let node = self.nodes.remove(&id)?;

        if let Some(out) = self.from.remove(&id) {
            for succ in out.keys() {
                if let Some(preds) = self.to.get_mut(succ) {
                    preds.remove(&id);
                }
            }
        }
        if let Some(preds) = self.to.remove(&id) {
            for pred in preds {
                if let Some(out) = self.from.get_mut(&pred) {
                    out.remove(&id);
                }
            }
        }

        trace!("Removed node {id} and its edges");
        Some(node)
    }

    /// Insert or overwrite the edge between its endpoints.
    ///
    /// Returns the edge it replaced, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DfdError::SelfFlow`] if both endpoints are the same node and
    /// [`DfdError::NodeNotFound`] if either endpoint is not registered.
    pub fn set_edge(&mut self, edge: E) -> Result<Option<E>> {
        let (u, v) = (edge.from(), edge.to());
        if u == v {
            return Err(DfdError::SelfFlow { handle: u });
        }
        for id in [u, v] {
            if !self.nodes.contains_key(&id) {
                return Err(DfdError::NodeNotFound {
                    node_id: id.to_string(),
                });
            }
        }

        self.to.entry(v).or_default().insert(u);
        Ok(self.from.entry(u).or_default().insert(v, edge))
    }

    /// Remove the edge `u -> v`. No-op if absent.
    pub fn remove_edge(&mut self, u: NodeId, v: NodeId) -> Option<E> {
        let edge = self.from.get_mut(&u)?.remove(&v)?;
        if let Some(preds) = self.to.get_mut(&v) {
            preds.remove(&u);
        }
        Some(edge)
    }

    /// Get a node by handle.
    pub fn node(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by handle.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(&id)
    }

    /// Check if a node with this handle is registered.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get the edge `u -> v`.
    pub fn edge(&self, u: NodeId, v: NodeId) -> Option<&E> {
        self.from.get(&u)?.get(&v)
    }

    /// Get the edge `u -> v` mutably.
    pub fn edge_mut(&mut self, u: NodeId, v: NodeId) -> Option<&mut E> {
        self.from.get_mut(&u)?.get_mut(&v)
    }

    /// Check for an edge `u -> v`.
    pub fn has_edge_from_to(&self, u: NodeId, v: NodeId) -> bool {
        self.edge(u, v).is_some()
    }

    /// Check for an edge between `x` and `y` in either direction.
    pub fn has_edge_between(&self, x: NodeId, y: NodeId) -> bool {
        self.has_edge_from_to(x, y) || self.has_edge_from_to(y, x)
    }

    /// All nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.values()
    }

    /// All edges.
    pub fn edges(&self) -> impl Iterator<Item = &E> {
        self.from.values().flat_map(|out| out.values())
    }

    /// Nodes reachable from `id` by one edge.
    pub fn from(&self, id: NodeId) -> Vec<&N> {
        self.from
            .get(&id)
            .map(|out| out.keys().filter_map(|v| self.nodes.get(v)).collect())
            .unwrap_or_default()
    }

    /// Nodes with an edge into `id`.
    pub fn to(&self, id: NodeId) -> Vec<&N> {
        self.to
            .get(&id)
            .map(|preds| preds.iter().filter_map(|u| self.nodes.get(u)).collect())
            .unwrap_or_default()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.from.values().map(HashMap::len).sum()
    }

    /// Check that the forward map and reverse index describe the same edges
    /// and only reference registered nodes.
    pub fn is_consistent(&self) -> bool {
        let forward_ok = self.from.iter().all(|(u, out)| {
            self.nodes.contains_key(u)
                && out.iter().all(|(v, edge)| {
                    edge.from() == *u
                        && edge.to() == *v
                        && self.to.get(v).is_some_and(|preds| preds.contains(u))
                })
        });
        let reverse_ok = self.to.iter().all(|(v, preds)| {
            self.nodes.contains_key(v)
                && preds
                    .iter()
                    .all(|u| self.from.get(u).is_some_and(|out| out.contains_key(v)))
        });
        forward_ok && reverse_ok
    }
}
