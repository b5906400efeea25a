//! Error types for data-flow diagram operations.
//!
//! All fallible operations return [`Result<T>`]. Errors fall into three
//! groups: identity errors (colliding or invalid node handles), format
//! errors (DOT input that does not describe a diagram) and I/O errors on the
//! diagram file.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for diagram operations.
pub type Result<T> = std::result::Result<T, DfdError>;

/// Comprehensive error type for all diagram operations.
#[derive(Error, Debug)]
pub enum DfdError {
    /// A node with the same handle is already registered
    #[error("Node ID collision: {handle}")]
    NodeIdCollision {
        /// The colliding handle
        handle: i64,
    },

    /// A flow from a node to itself was requested
    #[error("Self flow on node {handle} is not allowed")]
    SelfFlow {
        /// Handle of the node
        handle: i64,
    },

    /// A referenced node is not in the graph
    #[error("Node not found: {node_id}")]
    NodeNotFound {
        /// External ID or handle of the missing node
        node_id: String,
    },

    /// A referenced trust boundary is not in the diagram
    #[error("Trust boundary not found: {boundary_id}")]
    BoundaryNotFound {
        /// External ID of the missing boundary
        boundary_id: String,
    },

    /// A node external ID does not parse as a 64-bit integer
    #[error("External ID {id:?} is not numeric")]
    NonNumericId {
        /// The offending ID
        id: String,
    },

    /// A DOT node identifier is not of the form `<kind>_<id>`
    #[error("Malformed node ID: {id}")]
    MalformedNodeId {
        /// The offending identifier
        id: String,
    },

    /// A DOT node identifier names a kind this model does not know
    #[error("Unknown node kind {kind}")]
    UnknownNodeKind {
        /// The kind prefix found
        kind: String,
    },

    /// An attribute key is not recognised for the entity it was applied to
    #[error("Unable to unmarshal {entity} DOT attribute with key {key:?}")]
    UnsupportedAttribute {
        /// Entity kind (node, edge)
        entity: &'static str,
        /// The attribute key
        key: String,
    },

    /// A `->` edge appeared in an undirected graph
    #[error("Directed edge to {vertex} in undirected graph")]
    DirectedEdgeInUndirectedGraph {
        /// The edge target as written
        vertex: String,
    },

    /// The DOT text could not be parsed
    #[error(transparent)]
    Syntax(#[from] dfd_dot::DotError),

    /// Reading or writing the diagram file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be read
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DfdError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error from a message and optional source.
    pub fn config<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Whether a loader should fall back to an empty diagram.
    ///
    /// Only a missing file and a file that is not DOT at all qualify. A
    /// parseable file holding a bad statement is a hard failure.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Syntax(_) => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
