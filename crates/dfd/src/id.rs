//! Node handles, external IDs and flow keys.
//!
//! A node's external ID is the decimal rendering of its handle. Keeping the
//! two numerically identical lets an edge statement resolve its endpoints
//! without an auxiliary index, so the equivalence is checked whenever a
//! handle is derived from text.

use crate::error::{DfdError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a node inside a graph's adjacency tables.
pub type NodeId = i64;

/// Generate a random non-negative 63-bit node handle.
///
/// Collisions are possible in principle but not checked for.
pub fn gen_handle() -> NodeId {
    rand::rng().random_range(0..i64::MAX)
}

/// Generate a random identifier as a decimal string.
pub fn gen_id() -> String {
    gen_handle().to_string()
}

/// Parse an external ID into the node handle it denotes.
///
/// # Errors
///
/// Returns [`DfdError::NonNumericId`] if `id` is not a decimal `i64`.
pub fn parse_handle(id: &str) -> Result<NodeId> {
    id.parse::<NodeId>().map_err(|_| DfdError::NonNumericId { id: id.to_string() })
}

/// Key of a flow: its ordered (source, destination) handle pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowKey {
    /// Source node handle
    pub from: NodeId,
    /// Destination node handle
    pub to: NodeId,
}

impl FlowKey {
    /// Create a key for the flow `from -> to`.
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}
