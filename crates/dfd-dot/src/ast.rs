//! Abstract syntax tree of a DOT file.
//!
//! The tree mirrors the DOT grammar closely. It performs no semantic
//! interpretation: node identifiers are not resolved, attribute keys are not
//! validated and default-attribute statements are not applied.

use std::fmt;

/// A parsed DOT file, holding one or more graphs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct File {
    /// Graphs in file order
    pub graphs: Vec<Graph>,
}

/// A top-level `graph` or `digraph`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    /// Whether the `strict` keyword was given
    pub strict: bool,
    /// `digraph` when true, `graph` otherwise
    pub directed: bool,
    /// Graph identifier, empty when anonymous
    pub id: String,
    /// Statements of the graph body
    pub stmts: Vec<Stmt>,
}

/// A statement inside a graph or subgraph body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `a [k=v]`
    Node(NodeStmt),
    /// `a -> b [k=v]`
    Edge(EdgeStmt),
    /// `graph|node|edge [k=v]`
    Attr(AttrStmt),
    /// Bare `k=v` at graph level
    Assign(Attr),
    /// `subgraph id { ... }`
    Subgraph(Subgraph),
}

/// A node statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStmt {
    /// The declared node
    pub node: Node,
    /// Attributes applied to the node
    pub attrs: Vec<Attr>,
}

/// A node reference, optionally carrying a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Node identifier (unquoted)
    pub id: String,
    /// Optional `:port:compass` suffix
    pub port: Option<Port>,
}

/// A named attachment point on a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Port {
    /// Port name, empty when only a compass point was given
    pub id: String,
    /// Compass point
    pub compass: CompassPoint,
}

/// Compass point of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompassPoint {
    /// No compass point
    #[default]
    None,
    /// `n`
    North,
    /// `ne`
    NorthEast,
    /// `e`
    East,
    /// `se`
    SouthEast,
    /// `s`
    South,
    /// `sw`
    SouthWest,
    /// `w`
    West,
    /// `nw`
    NorthWest,
    /// `c`
    Center,
    /// `_`
    Default,
}

impl CompassPoint {
    /// Parse a compass point keyword.
    pub fn from_keyword(s: &str) -> Option<Self> {
        let point = match s {
            "n" => Self::North,
            "ne" => Self::NorthEast,
            "e" => Self::East,
            "se" => Self::SouthEast,
            "s" => Self::South,
            "sw" => Self::SouthWest,
            "w" => Self::West,
            "nw" => Self::NorthWest,
            "c" => Self::Center,
            "_" => Self::Default,
            _ => return None,
        };
        Some(point)
    }

    /// Keyword for this compass point, empty for [`CompassPoint::None`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::North => "n",
            Self::NorthEast => "ne",
            Self::East => "e",
            Self::SouthEast => "se",
            Self::South => "s",
            Self::SouthWest => "sw",
            Self::West => "w",
            Self::NorthWest => "nw",
            Self::Center => "c",
            Self::Default => "_",
        }
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An edge statement: a vertex followed by one or more edge operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeStmt {
    /// Left-most vertex
    pub from: Vertex,
    /// First edge operation of the chain
    pub to: Edge,
    /// Attributes applied to every edge of the chain
    pub attrs: Vec<Attr>,
}

/// One `-> vertex` step of an edge chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// `->` when true, `--` otherwise
    pub directed: bool,
    /// Right-hand vertex of this step
    pub vertex: Vertex,
    /// Next step of the chain, if any
    pub to: Option<Box<Edge>>,
}

/// An edge endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vertex {
    /// A single node
    Node(Node),
    /// Every node touched inside the subgraph
    Subgraph(Subgraph),
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vertex::Node(node) => f.write_str(&node.id),
            Vertex::Subgraph(sub) if sub.id.is_empty() => f.write_str("{...}"),
            Vertex::Subgraph(sub) => write!(f, "subgraph {}", sub.id),
        }
    }
}

/// Target of a default-attribute statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `graph [...]`
    Graph,
    /// `node [...]`
    Node,
    /// `edge [...]`
    Edge,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Graph => f.write_str("graph"),
            Kind::Node => f.write_str("node"),
            Kind::Edge => f.write_str("edge"),
        }
    }
}

/// A default-attribute statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrStmt {
    /// What the attributes apply to
    pub kind: Kind,
    /// The attributes, in source order
    pub attrs: Vec<Attr>,
}

/// A `key=value` pair.
///
/// The key is unquoted; the value is the raw source text, so `"x"` keeps its
/// quotes and `<<b>x</b>>` keeps its angle brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// Attribute name
    pub key: String,
    /// Raw attribute value
    pub val: String,
}

impl Attr {
    /// Create an attribute.
    pub fn new(key: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            val: val.into(),
        }
    }
}

/// A subgraph, either as a statement or as an edge vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgraph {
    /// Subgraph identifier, empty when anonymous
    pub id: String,
    /// Statements of the subgraph body
    pub stmts: Vec<Stmt>,
}
