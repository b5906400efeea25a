//! # dfd-dot
//!
//! Abstract syntax tree and parser for the DOT graph description language.
//!
//! This crate knows nothing about data-flow diagrams. It turns DOT text into
//! an [`ast::File`] whose statements a consumer walks to build its own graph
//! model.
//!
//! Identifiers are stored unquoted, while attribute values are kept exactly
//! as written so a consumer can write them back without loss:
//!
//! ```rust
//! use dfd_dot::{parse_graph, ast::Stmt};
//!
//! let graph = parse_graph(r#"digraph 1 { process_2 [label="Web Server"]; }"#).unwrap();
//! assert_eq!(graph.id, "1");
//! match &graph.stmts[0] {
//!     Stmt::Node(stmt) => {
//!         assert_eq!(stmt.node.id, "process_2");
//!         assert_eq!(stmt.attrs[0].val, "\"Web Server\"");
//!     }
//!     other => panic!("unexpected statement {other:?}"),
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod ast;
pub mod errors;
mod parser;

pub use errors::{DotError, DotResult};
pub use parser::{parse, parse_graph};
