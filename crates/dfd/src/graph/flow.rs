//! Flows: labelled directed edges between DFD nodes.

use super::attributes::{Attribute, AttributeSetter, Attributer, PortLabels};
use super::store::GraphEdge;
use crate::error::{DfdError, Result};
use crate::id::{FlowKey, NodeId};
use dfd_dot::ast::CompassPoint;
use serde::{Deserialize, Serialize};

/// Render a flow name as the HTML-like table label written to DOT.
///
/// `&`, `<` and `>` in the name are written as entities so the label stays
/// well-formed.
pub fn format_flow_label(name: &str) -> String {
    let name = name
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        r#"<<table border="0" cellborder="0" cellpadding="2"><tr><td><b>{name}</b></td></tr></table>>"#
    )
}

/// A directed data flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    from: NodeId,
    to: NodeId,
    /// Raw `label` attribute
    pub label: String,
    /// Raw `dir` attribute
    pub dir: String,
    /// Port on the source node
    pub from_port: PortLabels,
    /// Port on the destination node
    pub to_port: PortLabels,
}

impl Flow {
    /// Create a flow labelled with `name`.
    pub fn new(from: NodeId, to: NodeId, name: &str) -> Self {
        Self {
            from,
            to,
            label: format_flow_label(name),
            dir: String::new(),
            from_port: PortLabels::default(),
            to_port: PortLabels::default(),
        }
    }

    /// Source node handle.
    pub fn from(&self) -> NodeId {
        self.from
    }

    /// Destination node handle.
    pub fn to(&self) -> NodeId {
        self.to
    }

    /// Key of the flow.
    pub fn key(&self) -> FlowKey {
        FlowKey::new(self.from, self.to)
    }

    /// Set the port on the source node.
    pub fn set_from_port(&mut self, port: impl Into<String>, compass: CompassPoint) {
        self.from_port = PortLabels::new(port, compass);
    }

    /// Set the port on the destination node.
    pub fn set_to_port(&mut self, port: impl Into<String>, compass: CompassPoint) {
        self.to_port = PortLabels::new(port, compass);
    }
}

impl GraphEdge for Flow {
    fn from(&self) -> NodeId {
        self.from
    }

    fn to(&self) -> NodeId {
        self.to
    }
}

impl AttributeSetter for Flow {
    fn set_attribute(&mut self, attr: Attribute) -> Result<()> {
        match attr.key.as_str() {
            "label" => self.label = attr.value,
            "dir" => self.dir = attr.value,
            _ => {
                return Err(DfdError::UnsupportedAttribute {
                    entity: "edge",
                    key: attr.key,
                })
            }
        }
        Ok(())
    }
}

impl Attributer for Flow {
    fn attributes(&self) -> Vec<Attribute> {
        let mut attrs = Vec::new();
        if !self.label.is_empty() {
            attrs.push(Attribute::new("label", self.label.as_str()));
        }
        if !self.dir.is_empty() {
            attrs.push(Attribute::new("dir", self.dir.as_str()));
        }
        attrs
    }
}
