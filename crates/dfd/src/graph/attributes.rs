//! Attribute codec shared by nodes, flows and graph attribute blocks.
//!
//! Per-entity attributes overwrite a typed field. Graph-level default blocks
//! are append-only [`Attributes`] lists: setting a key twice emits it twice.

use crate::error::Result;
use dfd_dot::ast::CompassPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single DOT `key=value` pair. The value is raw DOT text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name
    pub key: String,
    /// Raw attribute value (quotes included)
    pub value: String,
}

impl Attribute {
    /// Create an attribute from a key and a raw value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl From<&dfd_dot::ast::Attr> for Attribute {
    fn from(attr: &dfd_dot::ast::Attr) -> Self {
        Self::new(attr.key.as_str(), attr.val.as_str())
    }
}

/// Something that exposes its DOT attributes in emission order.
pub trait Attributer {
    /// The attributes to write, empty values omitted.
    fn attributes(&self) -> Vec<Attribute>;
}

/// Something that accepts DOT attributes read from a file.
pub trait AttributeSetter {
    /// Apply one attribute.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DfdError::UnsupportedAttribute`] for keys the
    /// entity does not recognise.
    fn set_attribute(&mut self, attr: Attribute) -> Result<()>;
}

/// Append-only attribute list used for graph, node and edge default blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute, keeping any earlier one with the same key.
    pub fn push(&mut self, attr: Attribute) {
        self.0.push(attr);
    }

    /// Remove every attribute.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    /// Last value set for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    /// Number of attributes, duplicates included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Attributer for Attributes {
    fn attributes(&self) -> Vec<Attribute> {
        self.0.clone()
    }
}

impl AttributeSetter for Attributes {
    fn set_attribute(&mut self, attr: Attribute) -> Result<()> {
        self.push(attr);
        Ok(())
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Target of a default-attribute block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// `graph [...]`
    Graph,
    /// `node [...]`
    Node,
    /// `edge [...]`
    Edge,
}

impl AttributeKind {
    /// Blocks in emission order.
    pub const ALL: [AttributeKind; 3] = [Self::Graph, Self::Node, Self::Edge];

    /// DOT keyword of the block.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Node => "node",
            Self::Edge => "edge",
        }
    }
}

impl From<dfd_dot::ast::Kind> for AttributeKind {
    fn from(kind: dfd_dot::ast::Kind) -> Self {
        match kind {
            dfd_dot::ast::Kind::Graph => Self::Graph,
            dfd_dot::ast::Kind::Node => Self::Node,
            dfd_dot::ast::Kind::Edge => Self::Edge,
        }
    }
}

/// The three default-attribute accumulators of a graph or subgraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultAttributes {
    /// `graph [...]` block
    pub graph: Attributes,
    /// `node [...]` block
    pub node: Attributes,
    /// `edge [...]` block
    pub edge: Attributes,
}

impl DefaultAttributes {
    /// Accumulator for `kind`.
    pub fn get(&self, kind: AttributeKind) -> &Attributes {
        match kind {
            AttributeKind::Graph => &self.graph,
            AttributeKind::Node => &self.node,
            AttributeKind::Edge => &self.edge,
        }
    }

    /// Mutable accumulator for `kind`.
    pub fn get_mut(&mut self, kind: AttributeKind) -> &mut Attributes {
        match kind {
            AttributeKind::Graph => &mut self.graph,
            AttributeKind::Node => &mut self.node,
            AttributeKind::Edge => &mut self.edge,
        }
    }

    /// Reset all three accumulators.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.node.clear();
        self.edge.clear();
    }

    /// Check if no block holds an attribute.
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty() && self.node.is_empty() && self.edge.is_empty()
    }
}

/// A `port:compass` attachment point. Preserved, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortLabels {
    /// Port name
    pub port: String,
    /// Compass point, [`CompassPoint::None`] when absent
    #[serde(with = "compass_keyword")]
    pub compass: CompassPoint,
}

impl PortLabels {
    /// Create port labels.
    pub fn new(port: impl Into<String>, compass: CompassPoint) -> Self {
        Self {
            port: port.into(),
            compass,
        }
    }

    /// Check if neither a port nor a compass point is set.
    pub fn is_empty(&self) -> bool {
        self.port.is_empty() && self.compass == CompassPoint::None
    }
}

impl From<&dfd_dot::ast::Port> for PortLabels {
    fn from(port: &dfd_dot::ast::Port) -> Self {
        Self::new(port.id.as_str(), port.compass)
    }
}

// Compass points travel as their DOT keyword, "" for none.
mod compass_keyword {
    use dfd_dot::ast::CompassPoint;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(compass: &CompassPoint, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(compass.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<CompassPoint, D::Error> {
        let keyword = String::deserialize(d)?;
        if keyword.is_empty() {
            return Ok(CompassPoint::None);
        }
        CompassPoint::from_keyword(&keyword)
            .ok_or_else(|| D::Error::custom(format!("unknown compass point {keyword:?}")))
    }
}

/// Build an attribute whose value is the quoted form of `value`.
pub fn make_attribute(key: &str, value: &str) -> Attribute {
    Attribute::new(key, quote(value))
}

/// Quote `s` as a double-quoted string literal.
///
/// Printable characters pass through, including non-ASCII ones. Quotes,
/// backslashes and control characters are escaped.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Inverse of [`quote`]. Returns `None` if `s` is not a well-formed
/// double-quoted literal.
pub fn unquote(s: &str) -> Option<String> {
    let inner = s.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return None,
            '\\' => {
                let escaped = match chars.next()? {
                    '"' => '"',
                    '\\' => '\\',
                    '\'' => '\'',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'a' => '\u{7}',
                    'b' => '\u{8}',
                    'v' => '\u{b}',
                    'f' => '\u{c}',
                    'x' => hex_char(&mut chars, 2)?,
                    'u' => hex_char(&mut chars, 4)?,
                    'U' => hex_char(&mut chars, 8)?,
                    _ => return None,
                };
                out.push(escaped);
            }
            c => out.push(c),
        }
    }
    Some(out)
}

fn hex_char(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<char> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}
