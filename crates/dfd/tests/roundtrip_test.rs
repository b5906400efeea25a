//! Integration tests for DOT export and load/export round trips.

use dfd::{
    export_dot, parse_diagram, DataFlowDiagram, DfdGraph, FlowKey, Node, NodeKind, TrustBoundary,
};
use pretty_assertions::assert_eq;

const WEB_APP: &str = "strict digraph 1552575689497326632 {
\tgraph [
\t\tlabel=\"WebApp Thing\"
\t\tfontname=\"Arial\"
\t\tfontsize=\"14\"
\t\tlabelloc=\"t\"
\t\tfontsize=\"20\"
\t\tnodesep=\"1\"
\t\trankdir=\"t\"
\t];
\tnode [
\t\tfontname=\"Arial\"
\t\tfontsize=\"14\"
\t];
\tedge [
\t\tshape=\"none\"
\t\tfontname=\"Arial\"
\t\tfontsize=\"12\"
\t];

\tsubgraph cluster_2377452644169062617 {
\t\tgraph [
\t\t\tlabel=\"Browser\"
\t\t\tfontsize=\"10\"
\t\t\tstyle=\"dashed\"
\t\t\tcolor=\"grey35\"
\t\t\tfontcolor=\"grey35\"
\t\t];

\t\t// Node definitions.
\t\tprocess_6384522904477046688 [
\t\t\tlabel=\"Client\"
\t\t\tshape=circle
\t\t];
\t}
\tsubgraph cluster_7626181850182627084 {
\t\tgraph [
\t\t\tlabel=\"AWS\"
\t\t\tfontsize=\"10\"
\t\t\tstyle=\"dashed\"
\t\t\tcolor=\"grey35\"
\t\t\tfontcolor=\"grey35\"
\t\t];

\t\t// Node definitions.
\t\texternalservice_4258120822598301454 [
\t\t\tlabel=\"Logs\"
\t\t\tshape=diamond
\t\t];
\t\tprocess_6865082864924295608 [
\t\t\tlabel=\"Web Server\"
\t\t\tshape=circle
\t\t];
\t}
\t// Node definitions.
\texternalservice_4258120822598301454 [
\t\tlabel=\"Logs\"
\t\tshape=diamond
\t];
\tprocess_4404728580455388596 [
\t\tlabel=\"Google Analytics\"
\t\tshape=circle
\t];
\tprocess_6384522904477046688 [
\t\tlabel=\"Client\"
\t\tshape=circle
\t];
\tprocess_6865082864924295608 [
\t\tlabel=\"Web Server\"
\t\tshape=circle
\t];

\t// Edge definitions.
\tprocess_6384522904477046688 -> externalservice_4258120822598301454 [label=<<table border=\"0\" cellborder=\"0\" cellpadding=\"2\"><tr><td><b>HTTPS</b></td></tr></table>>];
\tprocess_6384522904477046688 -> process_6865082864924295608 [label=<<table border=\"0\" cellborder=\"0\" cellpadding=\"2\"><tr><td><b>HTTPS</b></td></tr></table>>];
\tprocess_6865082864924295608 -> externalservice_4258120822598301454 [label=<<table border=\"0\" cellborder=\"0\" cellpadding=\"2\"><tr><td><b>TCP</b></td></tr></table>>];
}";

fn node(kind: NodeKind, id: &str, name: &str) -> Node {
    let mut node = Node::deserialize(kind, id).unwrap();
    node.update_name(name);
    node
}

fn boundary(id: &str, name: &str) -> TrustBoundary {
    let tb = TrustBoundary::deserialize(id);
    tb.update_name(name);
    tb
}

/// The web application diagram, built through the API.
fn web_app() -> DataFlowDiagram {
    let diagram = DataFlowDiagram::deserialize("1552575689497326632");
    diagram.update_name("WebApp Thing");

    let browser = boundary("2377452644169062617", "Browser");
    let aws = boundary("7626181850182627084", "AWS");

    let analytics = node(NodeKind::Process, "4404728580455388596", "Google Analytics");
    let client = node(NodeKind::Process, "6384522904477046688", "Client");
    let logs = node(NodeKind::ExternalService, "4258120822598301454", "Logs");
    let web_server = node(NodeKind::Process, "6865082864924295608", "Web Server");

    diagram.add_node_elem(analytics).unwrap();
    browser.add_node_elem(client.clone()).unwrap();
    aws.add_node_elem(logs.clone()).unwrap();
    aws.add_node_elem(web_server.clone()).unwrap();
    diagram.insert_trust_boundary(browser);
    diagram.insert_trust_boundary(aws);

    diagram.add_flow(&web_server, &logs, "TCP").unwrap();
    diagram.add_flow(&client, &web_server, "HTTPS").unwrap();
    diagram.add_flow(&client, &logs, "HTTPS").unwrap();
    diagram
}

#[test]
fn test_export_web_app() {
    let dot = export_dot(&web_app()).unwrap();
    assert_eq!(dot, WEB_APP);
}

#[test]
fn test_export_is_stable() {
    let diagram = web_app();
    let first = export_dot(&diagram).unwrap();
    let second = export_dot(&diagram).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_round_trip_web_app() {
    let diagram = parse_diagram(WEB_APP).unwrap();
    assert_eq!(export_dot(&diagram).unwrap(), WEB_APP);
}

#[test]
fn test_round_trip_preserves_identity() {
    let diagram = parse_diagram(WEB_APP).unwrap();

    assert_eq!(diagram.external_id(), "1552575689497326632");
    assert_eq!(diagram.name(), "WebApp Thing");
    assert_eq!(diagram.node_count(), 4);
    assert_eq!(diagram.flow_count(), 3);

    let boundaries = diagram.trust_boundaries();
    assert_eq!(boundaries.len(), 2);
    let browser = &boundaries["2377452644169062617"];
    assert_eq!(browser.name(), "Browser");
    assert!(browser.contains("6384522904477046688"));
    let aws = &boundaries["7626181850182627084"];
    assert_eq!(aws.name(), "AWS");
    assert!(aws.external_services().contains_key("4258120822598301454"));
    assert!(aws.processes().contains_key("6865082864924295608"));

    let client = diagram.find_node("6384522904477046688").unwrap();
    assert_eq!(client.name, "Client");
    assert_eq!(client.kind(), NodeKind::Process);

    let flow = diagram
        .flow(6865082864924295608, 4258120822598301454)
        .unwrap();
    assert!(flow.label.contains("<b>TCP</b>"));
}

#[test]
fn test_round_trip_after_edit() {
    let diagram = parse_diagram(WEB_APP).unwrap();
    let db = Node::data_store("Sessions");
    diagram
        .add_node_to_boundary("7626181850182627084", db.clone())
        .unwrap();
    let web_server = diagram.find_node("6865082864924295608").unwrap();
    diagram.add_flow(&web_server, &db, "SQL").unwrap();
    diagram.remove_flow("6384522904477046688", "4258120822598301454");

    let dot = export_dot(&diagram).unwrap();
    assert!(dot.contains(&format!("{} [", db.dot_id())));
    assert!(dot.contains("shape=cylinder"));
    assert!(!dot.contains(
        "process_6384522904477046688 -> externalservice_4258120822598301454"
    ));

    let reloaded = parse_diagram(&dot).unwrap();
    assert_eq!(export_dot(&reloaded).unwrap(), dot);
    let keys: Vec<FlowKey> = reloaded.flows().into_keys().collect();
    assert_eq!(keys.len(), 3);
    assert!(keys.contains(&FlowKey::new(6865082864924295608, db.handle())));
}

#[test]
fn test_round_trip_ports_and_dir() {
    let text = "strict digraph 7 {
\t// Node definitions.
\tprocess_1 [
\t\tlabel=\"API\"
\t\tshape=circle
\t\tdir=both
\t];
\tdatastore_2:p:n [
\t\tlabel=\"Users\"
\t\tshape=cylinder
\t];

\t// Edge definitions.
\tprocess_1:out:e -> datastore_2:p:n [
\t\tlabel=\"reads\"
\t\tdir=back
\t];
}";
    let diagram = parse_diagram(text).unwrap();
    assert_eq!(export_dot(&diagram).unwrap(), text);
}

#[test]
fn test_empty_diagram() {
    let diagram = DataFlowDiagram::deserialize("42");
    let dot = export_dot(&diagram).unwrap();
    assert_eq!(dot, "strict digraph 42 {\n}");
    let reloaded = parse_diagram(&dot).unwrap();
    assert_eq!(reloaded.external_id(), "42");
    assert_eq!(reloaded.node_count(), 0);
}
