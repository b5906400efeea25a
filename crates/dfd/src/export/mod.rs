//! Export module for writing diagrams back to text.
//!
//! - **DOT**: Graphviz text that the loader reads back unchanged

pub mod dot;

pub use dot::{export_dot, export_dot_styled, DotOptions};
