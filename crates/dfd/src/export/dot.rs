//! DOT format export.
//!
//! Writes a diagram as `strict digraph` text: the default-attribute blocks,
//! one `subgraph cluster_<id>` block per trust boundary, every node of the
//! node table and finally every flow. Nodes are ordered by handle and flows
//! by (source, destination), so the output is stable across runs and a
//! load/export cycle reproduces the file byte for byte.

use crate::graph::{
    quote, Attribute, AttributeKind, Attributer, DataFlowDiagram, DefaultAttributes, Flow, Node,
    PortLabels, TrustBoundary,
};
use crate::graph::{BoundaryState, GraphStore};
use crate::Result;
use dfd_dot::ast::CompassPoint;
use log::trace;
use std::sync::Arc;

/// Layout options for DOT export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotOptions {
    /// Written at the start of every line
    pub prefix: String,
    /// Written once per nesting level after the prefix
    pub indent: String,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            indent: "\t".to_string(),
        }
    }
}

/// Export a diagram to DOT with tab indentation.
pub fn export_dot(diagram: &DataFlowDiagram) -> Result<String> {
    export_dot_styled(diagram, DotOptions::default())
}

/// Export a diagram to DOT with custom layout.
///
/// The diagram is locked exclusively for the whole traversal.
pub fn export_dot_styled(diagram: &DataFlowDiagram, options: DotOptions) -> Result<String> {
    let state = diagram.write();
    let mut boundaries: Vec<&Arc<TrustBoundary>> = state.trust_boundaries.values().collect();
    boundaries.sort_by(|a, b| boundary_order(a.external_id()).cmp(&boundary_order(b.external_id())));

    let mut p = Printer::new(&options);
    p.buf.push_str(&options.prefix);
    p.buf.push_str("strict digraph");
    if !diagram.external_id().is_empty() {
        p.buf.push(' ');
        p.buf.push_str(&quote_id(diagram.external_id()));
    }
    p.open_block(" {");
    p.write_attribute_complex(&state.attrs);

    for tb in boundaries {
        p.buf.push('\n');
        p.write_subgraph(&tb.dot_id(), &tb.read());
    }

    p.write_nodes(&state.nodes.store);
    p.write_edges(&state.nodes.store);
    p.close_block("}");

    trace!("Exported diagram {} ({} bytes)", diagram.external_id(), p.buf.len());
    Ok(p.buf)
}

// Numeric IDs first, in numeric order.
fn boundary_order(id: &str) -> (bool, i64, &str) {
    match id.parse::<i64>() {
        Ok(n) => (false, n, id),
        Err(_) => (true, 0, id),
    }
}

struct Printer<'a> {
    buf: String,
    prefix: &'a str,
    indent: &'a str,
    depth: usize,
}

impl<'a> Printer<'a> {
    fn new(options: &'a DotOptions) -> Self {
        Self {
            buf: String::new(),
            prefix: &options.prefix,
            indent: &options.indent,
            depth: 0,
        }
    }

    fn newline(&mut self) {
        self.buf.push('\n');
        self.buf.push_str(self.prefix);
        for _ in 0..self.depth {
            self.buf.push_str(self.indent);
        }
    }

    fn open_block(&mut self, open: &str) {
        self.buf.push_str(open);
        self.depth += 1;
    }

    fn close_block(&mut self, close: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.newline();
        self.buf.push_str(close);
    }

    fn write_subgraph(&mut self, id: &str, state: &BoundaryState) {
        self.buf.push_str(self.prefix);
        for _ in 0..self.depth {
            self.buf.push_str(self.indent);
        }
        self.buf.push_str("subgraph ");
        self.buf.push_str(&quote_id(id));
        self.open_block(" {");
        self.write_attribute_complex(&state.attrs);
        self.write_nodes(&state.nodes.store);
        self.write_edges(&state.nodes.store);
        self.close_block("}");
    }

    // Non-empty default blocks, always in block form.
    fn write_attribute_complex(&mut self, attrs: &DefaultAttributes) {
        let mut written = false;
        for kind in AttributeKind::ALL {
            let block = attrs.get(kind);
            if block.is_empty() {
                continue;
            }
            if written {
                self.buf.push(';');
            }
            self.newline();
            self.buf.push_str(kind.as_str());
            self.open_block(" [");
            self.write_attributes(&block.attributes());
            self.close_block("]");
            written = true;
        }
        if written {
            self.buf.push_str(";\n");
        }
    }

    fn write_attributes(&mut self, attrs: &[Attribute]) {
        for attr in attrs {
            self.newline();
            self.write_attribute(attr);
        }
    }

    fn write_attribute(&mut self, attr: &Attribute) {
        self.buf.push_str(&quote_id(&attr.key));
        self.buf.push('=');
        self.buf.push_str(&quote_id(&attr.value));
    }

    // One attribute inline, several in block form.
    fn write_attribute_list(&mut self, attrs: &[Attribute]) {
        match attrs {
            [] => {}
            [attr] => {
                self.buf.push_str(" [");
                self.write_attribute(attr);
                self.buf.push(']');
            }
            _ => {
                self.open_block(" [");
                self.write_attributes(attrs);
                self.close_block("]");
            }
        }
    }

    fn write_nodes(&mut self, store: &GraphStore<Node, Flow>) {
        let mut nodes: Vec<&Node> = store.nodes().collect();
        nodes.sort_by_key(|n| n.handle());

        for (i, node) in nodes.into_iter().enumerate() {
            if i == 0 {
                self.newline();
                self.buf.push_str("// Node definitions.");
            }
            self.newline();
            self.buf.push_str(&quote_id(&node.dot_id()));
            if let Some(port) = &node.port {
                self.write_port(port);
            }
            self.write_attribute_list(&node.attributes());
            self.buf.push(';');
        }
    }

    fn write_edges(&mut self, store: &GraphStore<Node, Flow>) {
        let mut flows: Vec<&Flow> = store.edges().collect();
        flows.sort_by_key(|f| f.key());

        let mut header = false;
        for flow in flows {
            let (Some(from), Some(to)) = (store.node(flow.from()), store.node(flow.to())) else {
                continue;
            };
            if !header {
                self.buf.push('\n');
                self.newline();
                self.buf.push_str("// Edge definitions.");
                header = true;
            }
            self.newline();
            self.buf.push_str(&quote_id(&from.dot_id()));
            self.write_port(&flow.from_port);
            self.buf.push_str(" -> ");
            self.buf.push_str(&quote_id(&to.dot_id()));
            self.write_port(&flow.to_port);
            self.write_attribute_list(&flow.attributes());
            self.buf.push(';');
        }
    }

    fn write_port(&mut self, port: &PortLabels) {
        if !port.port.is_empty() {
            self.buf.push(':');
            self.buf.push_str(&quote_id(&port.port));
        }
        if port.compass != CompassPoint::None {
            self.buf.push(':');
            self.buf.push_str(port.compass.as_str());
        }
    }
}

/// Write `s` as is when it is a valid DOT ID, quoted otherwise.
fn quote_id(s: &str) -> String {
    if is_id(s) {
        s.to_string()
    } else {
        quote(s)
    }
}

fn is_id(s: &str) -> bool {
    (is_ident(s) && !is_keyword(s)) || is_numeral(s) || is_quoted(s) || is_html(s)
}

fn is_keyword(s: &str) -> bool {
    ["strict", "graph", "digraph", "subgraph", "node", "edge"]
        .iter()
        .any(|kw| kw.eq_ignore_ascii_case(s))
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || !c.is_ascii() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii())
}

fn is_numeral(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    match frac {
        None => !int.is_empty() && all_digits(int),
        Some(frac) => {
            all_digits(int) && all_digits(frac) && !(int.is_empty() && frac.is_empty())
        }
    }
}

fn is_quoted(s: &str) -> bool {
    let Some(inner) = s.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) else {
        return false;
    };
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.next().is_none() => return false,
            '"' => return false,
            _ => {}
        }
    }
    true
}

fn is_html(s: &str) -> bool {
    if !(s.starts_with('<') && s.ends_with('>')) {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = match depth.checked_sub(1) {
                    Some(d) => d,
                    None => return false,
                };
                if depth == 0 && i != s.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
