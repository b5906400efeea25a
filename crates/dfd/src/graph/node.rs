//! Typed DFD nodes: processes, external services and data stores.

use super::attributes::{quote, unquote, Attribute, AttributeSetter, Attributer, PortLabels};
use super::store::GraphNode;
use crate::error::{DfdError, Result};
use crate::id::{gen_handle, parse_handle, NodeId};
use dfd_dot::ast::CompassPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape written for processes.
pub const CIRCLE: &str = "circle";
/// Shape written for external services.
pub const DIAMOND: &str = "diamond";
/// Shape written for data stores.
pub const CYLINDER: &str = "cylinder";

/// The closed set of DFD node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// A process transforming data
    Process,
    /// A system outside the modelled scope
    ExternalService,
    /// Data at rest
    DataStore,
}

impl NodeKind {
    /// All kinds, in collection order.
    pub const ALL: [NodeKind; 3] = [Self::Process, Self::ExternalService, Self::DataStore];

    /// Prefix of the DOT identifier, as in `process_42`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::ExternalService => "externalservice",
            Self::DataStore => "datastore",
        }
    }

    /// Fixed shape of the kind.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Process => CIRCLE,
            Self::ExternalService => DIAMOND,
            Self::DataStore => CYLINDER,
        }
    }

    /// Resolve a DOT identifier prefix.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process => write!(f, "Process"),
            Self::ExternalService => write!(f, "ExternalService"),
            Self::DataStore => write!(f, "DataStore"),
        }
    }
}

/// Split a DOT node identifier into its kind and external ID.
///
/// # Errors
///
/// Returns [`DfdError::MalformedNodeId`] unless `id` has exactly one `_`,
/// and [`DfdError::UnknownNodeKind`] if the prefix names no kind.
pub fn parse_dot_id(id: &str) -> Result<(NodeKind, &str)> {
    let mut parts = id.split('_');
    let (Some(prefix), Some(external_id), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(DfdError::MalformedNodeId { id: id.to_string() });
    };
    let kind = NodeKind::from_prefix(prefix).ok_or_else(|| DfdError::UnknownNodeKind {
        kind: prefix.to_string(),
    })?;
    Ok((kind, external_id))
}

/// A DFD node.
///
/// The external ID is the decimal form of the handle, so the two never
/// disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    handle: NodeId,
    kind: NodeKind,
    /// Display name
    pub name: String,
    /// Raw `label` attribute, normally the quoted name
    pub label: String,
    /// Raw `shape` attribute
    pub shape: String,
    /// Raw `style` attribute
    pub style: String,
    /// Raw `dir` attribute
    pub dir: String,
    /// Port given on the node statement, if any
    pub port: Option<PortLabels>,
}

impl Node {
    /// Create a node of `kind` with a fresh random handle.
    pub fn new(kind: NodeKind, name: &str) -> Self {
        let mut node = Self::with_handle(kind, gen_handle());
        node.update_name(name);
        node
    }

    /// Create a process.
    pub fn process(name: &str) -> Self {
        Self::new(NodeKind::Process, name)
    }

    /// Create an external service.
    pub fn external_service(name: &str) -> Self {
        Self::new(NodeKind::ExternalService, name)
    }

    /// Create a data store.
    pub fn data_store(name: &str) -> Self {
        Self::new(NodeKind::DataStore, name)
    }

    /// Rebuild a node from a previously written external ID. Name and
    /// label start empty.
    ///
    /// # Errors
    ///
    /// Returns [`DfdError::NonNumericId`] if `id` is not a decimal `i64`.
    pub fn deserialize(kind: NodeKind, id: &str) -> Result<Self> {
        Ok(Self::with_handle(kind, parse_handle(id)?))
    }

    fn with_handle(kind: NodeKind, handle: NodeId) -> Self {
        Self {
            handle,
            kind,
            name: String::new(),
            label: String::new(),
            shape: kind.shape().to_string(),
            style: String::new(),
            dir: String::new(),
            port: None,
        }
    }

    /// Node handle.
    pub fn handle(&self) -> NodeId {
        self.handle
    }

    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// External ID, the decimal form of the handle.
    pub fn external_id(&self) -> String {
        self.handle.to_string()
    }

    /// DOT identifier, `<kind>_<external id>`.
    pub fn dot_id(&self) -> String {
        format!("{}_{}", self.kind.prefix(), self.handle)
    }

    /// Set the name and regenerate the quoted label.
    pub fn update_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.label = quote(name);
    }

    /// Attach port labels.
    pub fn set_port(&mut self, port: impl Into<String>, compass: CompassPoint) {
        self.port = Some(PortLabels::new(port, compass));
    }
}

impl GraphNode for Node {
    fn handle(&self) -> NodeId {
        self.handle
    }
}

impl AttributeSetter for Node {
    fn set_attribute(&mut self, attr: Attribute) -> Result<()> {
        match attr.key.as_str() {
            "label" => {
                self.name = unquote(&attr.value).unwrap_or_else(|| attr.value.clone());
                self.label = attr.value;
            }
            "shape" => self.shape = attr.value,
            "style" => self.style = attr.value,
            "dir" => self.dir = attr.value,
            _ => {
                return Err(DfdError::UnsupportedAttribute {
                    entity: "node",
                    key: attr.key,
                })
            }
        }
        Ok(())
    }
}

impl Attributer for Node {
    fn attributes(&self) -> Vec<Attribute> {
        [
            ("label", &self.label),
            ("shape", &self.shape),
            ("style", &self.style),
            ("dir", &self.dir),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| Attribute::new(key, value.as_str()))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_nodes() {
        for name in ["node 1", "node1", "node_1", ""] {
            let process = Node::process(name);
            assert_eq!(process.name, name);
            assert_eq!(process.label, quote(name));
            assert_eq!(process.shape, CIRCLE);

            assert_eq!(Node::external_service(name).shape, DIAMOND);
            assert_eq!(Node::data_store(name).shape, CYLINDER);
        }
    }

    #[test]
    fn test_deserialize() {
        for id in ["1234", "4321", "0", "-1"] {
            let node = Node::deserialize(NodeKind::DataStore, id).unwrap();
            assert_eq!(node.external_id(), id);
            assert_eq!(node.handle(), id.parse::<i64>().unwrap());
            assert_eq!(node.shape, CYLINDER);
            assert!(node.label.is_empty());
        }
        assert!(matches!(
            Node::deserialize(NodeKind::Process, "web"),
            Err(DfdError::NonNumericId { .. })
        ));
    }

    #[test]
    fn test_dot_id() {
        let node = Node::deserialize(NodeKind::ExternalService, "42").unwrap();
        assert_eq!(node.dot_id(), "externalservice_42");
        assert_eq!(
            parse_dot_id(&node.dot_id()).unwrap(),
            (NodeKind::ExternalService, "42")
        );
    }

    #[test]
    fn test_parse_dot_id_errors() {
        assert!(matches!(
            parse_dot_id("widget_123"),
            Err(DfdError::UnknownNodeKind { kind }) if kind == "widget"
        ));
        assert!(matches!(
            parse_dot_id("process"),
            Err(DfdError::MalformedNodeId { .. })
        ));
        assert!(matches!(
            parse_dot_id("process_1_2"),
            Err(DfdError::MalformedNodeId { .. })
        ));
    }

    #[test]
    fn test_set_attribute() {
        let mut node = Node::deserialize(NodeKind::Process, "1").unwrap();
        node.set_attribute(Attribute::new("label", "\"Web \\\"Server\\\"\""))
            .unwrap();
        node.set_attribute(Attribute::new("style", "filled")).unwrap();

        assert_eq!(node.label, "\"Web \\\"Server\\\"\"");
        assert_eq!(node.name, "Web \"Server\"");
        assert_eq!(node.style, "filled");

        let err = node
            .set_attribute(Attribute::new("color", "red"))
            .unwrap_err();
        assert!(matches!(err, DfdError::UnsupportedAttribute { entity: "node", .. }));
    }

    #[test]
    fn test_attribute_order() {
        let mut node = Node::process("Client");
        node.dir = "both".to_string();
        node.style = "bold".to_string();

        let keys: Vec<_> = node.attributes().into_iter().map(|a| a.key).collect();
        assert_eq!(keys, vec!["label", "shape", "style", "dir"]);

        let mut bare = Node::deserialize(NodeKind::Process, "1").unwrap();
        bare.shape.clear();
        assert!(bare.attributes().is_empty());
    }
}
