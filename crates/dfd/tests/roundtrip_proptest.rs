//! Property tests: any diagram built through the API survives a DOT round trip.

use dfd::{export_dot, parse_diagram, CompassPoint, DataFlowDiagram, DfdGraph, Flow, Node, NodeKind};
use proptest::prelude::*;

type PortPlan = Option<(String, CompassPoint)>;

#[derive(Debug, Clone)]
struct NodePlan {
    kind: NodeKind,
    name: String,
    boundary: Option<usize>,
    port: PortPlan,
}

#[derive(Debug, Clone)]
struct FlowPlan {
    from: usize,
    to: usize,
    name: String,
    from_port: PortPlan,
    to_port: PortPlan,
}

#[derive(Debug, Clone)]
struct DiagramPlan {
    name: String,
    boundaries: Vec<String>,
    nodes: Vec<NodePlan>,
    flows: Vec<FlowPlan>,
}

// ===================
// Strategies
// ===================

/// Display names: printable ASCII (quotes, backslashes and markup
/// included) or arbitrary non-control text.
fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[ -~]{0,12}", "\\PC{0,8}"]
}

fn compass_strategy() -> impl Strategy<Value = CompassPoint> {
    prop::sample::select(vec![
        CompassPoint::None,
        CompassPoint::North,
        CompassPoint::NorthEast,
        CompassPoint::East,
        CompassPoint::SouthEast,
        CompassPoint::South,
        CompassPoint::SouthWest,
        CompassPoint::West,
        CompassPoint::NorthWest,
        CompassPoint::Center,
        CompassPoint::Default,
    ])
}

fn port_strategy() -> impl Strategy<Value = PortPlan> {
    prop::option::of(("[a-z][a-z0-9]{0,5}|", compass_strategy()))
}

fn node_strategy() -> impl Strategy<Value = NodePlan> {
    (
        prop::sample::select(NodeKind::ALL.to_vec()),
        name_strategy(),
        prop::option::of(0usize..4),
        port_strategy(),
    )
        .prop_map(|(kind, name, boundary, port)| NodePlan {
            kind,
            name,
            boundary,
            port,
        })
}

fn flow_strategy() -> impl Strategy<Value = FlowPlan> {
    (0usize..16, 0usize..16, name_strategy(), port_strategy(), port_strategy()).prop_map(
        |(from, to, name, from_port, to_port)| FlowPlan {
            from,
            to,
            name,
            from_port,
            to_port,
        },
    )
}

fn diagram_strategy() -> impl Strategy<Value = DiagramPlan> {
    (
        name_strategy(),
        prop::collection::vec(name_strategy(), 0..3),
        prop::collection::vec(node_strategy(), 1..8),
        prop::collection::vec(flow_strategy(), 0..12),
    )
        .prop_map(|(name, boundaries, nodes, flows)| DiagramPlan {
            name,
            boundaries,
            nodes,
            flows,
        })
}

// ===================
// Diagram construction
// ===================

fn build(plan: &DiagramPlan) -> DataFlowDiagram {
    let diagram = DataFlowDiagram::initialize(&plan.name);
    let boundaries: Vec<_> = plan
        .boundaries
        .iter()
        .map(|name| diagram.add_trust_boundary(name))
        .collect();

    let nodes: Vec<Node> = plan
        .nodes
        .iter()
        .map(|spec| {
            let mut node = Node::new(spec.kind, &spec.name);
            if let Some((port, compass)) = &spec.port {
                node.set_port(port.as_str(), *compass);
            }
            match spec.boundary {
                Some(i) if !boundaries.is_empty() => {
                    let tb = &boundaries[i % boundaries.len()];
                    diagram
                        .add_node_to_boundary(tb.external_id(), node.clone())
                        .unwrap();
                }
                _ => diagram.add_node_elem(node.clone()).unwrap(),
            }
            node
        })
        .collect();

    for spec in &plan.flows {
        let from = &nodes[spec.from % nodes.len()];
        let to = &nodes[spec.to % nodes.len()];
        if from.handle() == to.handle() {
            continue;
        }
        let mut flow = Flow::new(from.handle(), to.handle(), &spec.name);
        if let Some((port, compass)) = &spec.from_port {
            flow.set_from_port(port.as_str(), *compass);
        }
        if let Some((port, compass)) = &spec.to_port {
            flow.set_to_port(port.as_str(), *compass);
        }
        diagram.set_flow(flow, from, to).unwrap();
    }
    diagram
}

// ===================
// Property Test Functions
// ===================

fn check_round_trip(plan: &DiagramPlan) -> Result<(), TestCaseError> {
    let diagram = build(plan);
    let dot = export_dot(&diagram).unwrap();

    let reloaded = parse_diagram(&dot);
    prop_assert!(
        reloaded.is_ok(),
        "exported DOT does not load: {:?}\n{dot}",
        reloaded.as_ref().err()
    );
    let reloaded = reloaded.unwrap();

    prop_assert_eq!(reloaded.external_id(), diagram.external_id());
    prop_assert_eq!(reloaded.node_count(), diagram.node_count());
    prop_assert_eq!(reloaded.flow_count(), diagram.flow_count());
    prop_assert_eq!(
        reloaded.trust_boundaries().len(),
        diagram.trust_boundaries().len()
    );
    prop_assert_eq!(export_dot(&reloaded).unwrap(), dot);
    Ok(())
}

fn check_nodes_found_after_reload(plan: &DiagramPlan) -> Result<(), TestCaseError> {
    let diagram = build(plan);
    let reloaded = parse_diagram(&export_dot(&diagram).unwrap()).unwrap();

    for node in diagram.nodes() {
        let found = reloaded.find_node(&node.external_id());
        prop_assert_eq!(found.map(|n| n.external_id()), Some(node.external_id()));
    }
    Ok(())
}

// ===================
// Proptest Wrappers
// ===================

proptest! {
    #[test]
    fn api_diagrams_round_trip(plan in diagram_strategy()) {
        check_round_trip(&plan)?;
    }

    #[test]
    fn node_identity_survives_reload(plan in diagram_strategy()) {
        check_nodes_found_after_reload(&plan)?;
    }
}
