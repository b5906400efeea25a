//! # dfd
//!
//! Data-flow diagrams (DFDs) with lossless DOT round-tripping.
//!
//! A diagram is a directed graph of typed nodes (processes, external
//! services, data stores) joined by labelled flows and grouped into trust
//! boundaries. Diagrams are read from and written to Graphviz DOT so that a
//! load/save cycle reproduces the file exactly.
//!
//! ## Architecture
//!
//! ```text
//! Client (load/save a DOT file)
//!     ↓
//! Generator (DOT syntax tree → diagram)      Export (diagram → DOT)
//!     ↓                                         ↑
//! DataFlowDiagram / TrustBoundary (typed collections, one lock each)
//!     ↓
//! GraphStore (adjacency tables)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use dfd::{export_dot, parse_diagram, DataFlowDiagram, DfdGraph, Node};
//!
//! let diagram = DataFlowDiagram::initialize("WebApp");
//! let client = Node::process("Client");
//! let logs = Node::external_service("Logs");
//! diagram.add_node_elem(client.clone()).unwrap();
//! diagram.add_node_elem(logs.clone()).unwrap();
//! diagram.add_flow(&client, &logs, "HTTPS").unwrap();
//!
//! let dot = export_dot(&diagram).unwrap();
//! let reloaded = parse_diagram(&dot).unwrap();
//! assert_eq!(export_dot(&reloaded).unwrap(), dot);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod graph;
pub mod id;

// Re-export main types
pub use client::{load_from_path, parse_diagram, save_to_path, Client};
pub use config::ClientConfig;
pub use error::{DfdError, Result};
pub use export::{export_dot, export_dot_styled, DotOptions};
pub use generator::{generate, Generator};
pub use graph::{
    Attribute, AttributeKind, AttributeSetter, Attributer, Attributes, CompassPoint,
    DataFlowDiagram, DefaultAttributes, DfdGraph, Flow, GraphStore, Node, NodeKind, PortLabels,
    TrustBoundary,
};
pub use id::{gen_id, FlowKey, NodeId};
