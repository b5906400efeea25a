//! Recursive-descent DOT parser built on winnow combinators.
//!
//! Every parser takes `&mut &str` and advances it past what it consumed.
//! Once a construct is recognised by lookahead (`{`, `subgraph`, `->`, ...)
//! the parser commits to it, so a failure points at the offending token
//! rather than at the start of the enclosing statement.

use log::trace;
use winnow::ascii::{digit0, digit1, multispace1, till_line_ending};
use winnow::combinator::{alt, delimited, opt, repeat};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{any, one_of, take_until, take_while};

use crate::ast::{
    Attr, AttrStmt, CompassPoint, Edge, EdgeStmt, File, Graph, Kind, Node, NodeStmt, Port, Stmt,
    Subgraph, Vertex,
};
use crate::errors::{DotError, DotResult};

type PResult<T> = winnow::Result<T>;

/// Parse every graph in `source`.
///
/// # Errors
///
/// Returns [`DotError::NoGraph`] for input without any graph and
/// [`DotError::Syntax`] when the grammar is violated.
pub fn parse(source: &str) -> DotResult<File> {
    let mut input = source;
    let mut graphs = Vec::new();
    loop {
        let _ = trivia(&mut input);
        if input.is_empty() {
            break;
        }
        let graph = graph(&mut input).map_err(|_| syntax_error(source, input))?;
        trace!("Parsed graph {:?} with {} statements", graph.id, graph.stmts.len());
        graphs.push(graph);
    }
    if graphs.is_empty() {
        return Err(DotError::NoGraph);
    }
    Ok(File { graphs })
}

/// Parse `source` and return its first graph.
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_graph(source: &str) -> DotResult<Graph> {
    let file = parse(source)?;
    file.graphs.into_iter().next().ok_or(DotError::NoGraph)
}

fn syntax_error(source: &str, rest: &str) -> DotError {
    let offset = source.len() - rest.len();
    let context = rest.lines().next().unwrap_or("").trim();
    let message = if context.is_empty() {
        "unexpected end of input".to_string()
    } else if context.chars().count() > 40 {
        let head: String = context.chars().take(40).collect();
        format!("unexpected `{head}...`")
    } else {
        format!("unexpected `{context}`")
    };
    DotError::at(source, offset, message)
}

fn backtrack<T>() -> PResult<T> {
    Err(ContextError::new())
}

/// An identifier as written and as meant.
struct Id {
    raw: String,
    text: String,
}

impl Id {
    fn plain(s: &str) -> Self {
        Self {
            raw: s.to_string(),
            text: s.to_string(),
        }
    }

    fn quoted(inner: String) -> Self {
        let text = unescape(&inner);
        Self {
            raw: format!("\"{inner}\""),
            text,
        }
    }

    fn html(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            text: raw[1..raw.len() - 1].to_string(),
        }
    }
}

/// Resolve the escapes DOT defines for quoted strings: `\"` and line
/// continuations. Every other backslash sequence is kept for the renderer.
fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('"') => {
                out.push('"');
                chars.next();
            }
            Some('\n') => {
                chars.next();
            }
            Some('\r') => {
                chars.next();
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            _ => out.push('\\'),
        }
    }
    out
}

fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_id_continue(c: char) -> bool {
    is_id_start(c) || c.is_ascii_digit()
}

/// Whitespace, comments and `#` preprocessor lines.
fn trivia(input: &mut &str) -> PResult<()> {
    repeat(
        0..,
        alt((
            multispace1.void(),
            ("//", till_line_ending).void(),
            ("/*", take_until(0.., "*/"), "*/").void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)
}

fn keyword<'s>(kw: &'static str) -> impl FnMut(&mut &'s str) -> PResult<&'s str> {
    move |input: &mut &'s str| {
        let start = *input;
        let word = take_while(1.., is_id_continue).parse_next(input)?;
        if word.eq_ignore_ascii_case(kw) {
            Ok(word)
        } else {
            *input = start;
            backtrack()
        }
    }
}

fn identifier(input: &mut &str) -> PResult<Id> {
    alt((quoted_id, html_id, numeral_id, plain_id)).parse_next(input)
}

fn plain_id(input: &mut &str) -> PResult<Id> {
    (take_while(1, is_id_start), take_while(0.., is_id_continue))
        .take()
        .map(Id::plain)
        .parse_next(input)
}

fn numeral_id(input: &mut &str) -> PResult<Id> {
    (
        opt('-'),
        alt((('.', digit1).void(), (digit1, opt(('.', digit0))).void())),
    )
        .take()
        .map(Id::plain)
        .parse_next(input)
}

fn quoted_body<'s>(input: &mut &'s str) -> PResult<&'s str> {
    delimited(
        '"',
        repeat::<_, _, (), _, _>(
            0..,
            alt((
                ('\\', any).void(),
                take_while(1.., |c: char| c != '"' && c != '\\').void(),
            )),
        )
        .take(),
        '"',
    )
    .parse_next(input)
}

/// A quoted string, including `"a" + "b"` concatenation.
fn quoted_id(input: &mut &str) -> PResult<Id> {
    let mut inner = quoted_body.parse_next(input)?.to_string();
    loop {
        let checkpoint = *input;
        trivia(input)?;
        if opt('+').parse_next(input)?.is_none() {
            *input = checkpoint;
            break;
        }
        trivia(input)?;
        inner.push_str(quoted_body.parse_next(input)?);
    }
    Ok(Id::quoted(inner))
}

fn html_id(input: &mut &str) -> PResult<Id> {
    html_string.take().map(Id::html).parse_next(input)
}

/// `<...>` with arbitrarily nested angle brackets.
fn html_string(input: &mut &str) -> PResult<()> {
    '<'.parse_next(input)?;
    loop {
        take_while(0.., |c: char| c != '<' && c != '>').parse_next(input)?;
        if input.starts_with('<') {
            html_string(input)?;
        } else {
            '>'.parse_next(input)?;
            return Ok(());
        }
    }
}

fn graph(input: &mut &str) -> PResult<Graph> {
    let strict = opt(keyword("strict")).parse_next(input)?.is_some();
    trivia(input)?;
    let directed = alt((
        keyword("digraph").value(true),
        keyword("graph").value(false),
    ))
    .parse_next(input)?;
    trivia(input)?;
    let id = if input.starts_with('{') {
        String::new()
    } else {
        identifier(input)?.text
    };
    trivia(input)?;
    let stmts = block(input)?;
    Ok(Graph {
        strict,
        directed,
        id,
        stmts,
    })
}

fn block(input: &mut &str) -> PResult<Vec<Stmt>> {
    '{'.parse_next(input)?;
    let mut stmts = Vec::new();
    loop {
        trivia(input)?;
        if opt('}').parse_next(input)?.is_some() {
            return Ok(stmts);
        }
        stmts.push(stmt(input)?);
        trivia(input)?;
        opt(';').parse_next(input)?;
    }
}

fn stmt(input: &mut &str) -> PResult<Stmt> {
    if starts_attr_stmt(input) {
        return attr_stmt(input).map(Stmt::Attr);
    }
    if starts_assignment(input) {
        return assignment(input).map(Stmt::Assign);
    }

    let from = vertex(input)?;
    let checkpoint = *input;
    trivia(input)?;
    if starts_edge_op(input) {
        let to = edge_rhs(input)?;
        let attrs = attr_lists(input)?;
        return Ok(Stmt::Edge(EdgeStmt { from, to, attrs }));
    }

    match from {
        Vertex::Subgraph(sub) => {
            *input = checkpoint;
            Ok(Stmt::Subgraph(sub))
        }
        Vertex::Node(node) => {
            let attrs = attr_lists(input)?;
            Ok(Stmt::Node(NodeStmt { node, attrs }))
        }
    }
}

fn attr_kind(input: &mut &str) -> PResult<Kind> {
    alt((
        keyword("graph").value(Kind::Graph),
        keyword("node").value(Kind::Node),
        keyword("edge").value(Kind::Edge),
    ))
    .parse_next(input)
}

fn starts_attr_stmt(input: &str) -> bool {
    let mut probe = input;
    attr_kind(&mut probe).is_ok() && trivia(&mut probe).is_ok() && probe.starts_with('[')
}

fn starts_assignment(input: &str) -> bool {
    let mut probe = input;
    identifier(&mut probe).is_ok() && trivia(&mut probe).is_ok() && probe.starts_with('=')
}

fn starts_edge_op(input: &str) -> bool {
    input.starts_with("->") || input.starts_with("--")
}

fn starts_subgraph(input: &str) -> bool {
    let mut probe = input;
    input.starts_with('{') || keyword("subgraph").parse_next(&mut probe).is_ok()
}

fn attr_stmt(input: &mut &str) -> PResult<AttrStmt> {
    let kind = attr_kind(input)?;
    let attrs = attr_lists(input)?;
    Ok(AttrStmt { kind, attrs })
}

/// Zero or more `[...]` lists, flattened.
fn attr_lists(input: &mut &str) -> PResult<Vec<Attr>> {
    let mut attrs = Vec::new();
    loop {
        let checkpoint = *input;
        trivia(input)?;
        if !input.starts_with('[') {
            *input = checkpoint;
            return Ok(attrs);
        }
        attrs.extend(attr_list(input)?);
    }
}

fn attr_list(input: &mut &str) -> PResult<Vec<Attr>> {
    '['.parse_next(input)?;
    let mut attrs = Vec::new();
    loop {
        trivia(input)?;
        if opt(']').parse_next(input)?.is_some() {
            return Ok(attrs);
        }
        attrs.push(assignment(input)?);
        trivia(input)?;
        opt(one_of([',', ';'])).parse_next(input)?;
    }
}

fn assignment(input: &mut &str) -> PResult<Attr> {
    let key = identifier(input)?;
    trivia(input)?;
    '='.parse_next(input)?;
    trivia(input)?;
    let val = identifier(input)?;
    Ok(Attr {
        key: key.text,
        val: val.raw,
    })
}

fn vertex(input: &mut &str) -> PResult<Vertex> {
    if starts_subgraph(input) {
        return subgraph(input).map(Vertex::Subgraph);
    }
    node_id(input).map(Vertex::Node)
}

fn subgraph(input: &mut &str) -> PResult<Subgraph> {
    let mut id = String::new();
    if opt(keyword("subgraph")).parse_next(input)?.is_some() {
        trivia(input)?;
        if !input.starts_with('{') {
            id = identifier(input)?.text;
        }
        trivia(input)?;
    }
    let stmts = block(input)?;
    Ok(Subgraph { id, stmts })
}

fn node_id(input: &mut &str) -> PResult<Node> {
    let id = identifier(input)?.text;
    let port = opt(port).parse_next(input)?;
    Ok(Node { id, port })
}

fn port(input: &mut &str) -> PResult<Port> {
    trivia(input)?;
    ':'.parse_next(input)?;
    trivia(input)?;
    let id = identifier(input)?.text;
    let checkpoint = *input;
    trivia(input)?;
    if opt(':').parse_next(input)?.is_none() {
        *input = checkpoint;
        return Ok(Port {
            id,
            compass: CompassPoint::None,
        });
    }
    trivia(input)?;
    let compass = take_while(1.., |c: char| c.is_ascii_lowercase() || c == '_')
        .verify_map(CompassPoint::from_keyword)
        .parse_next(input)?;
    Ok(Port { id, compass })
}

fn edge_rhs(input: &mut &str) -> PResult<Edge> {
    let directed = alt(("->".value(true), "--".value(false))).parse_next(input)?;
    trivia(input)?;
    let vertex = vertex(input)?;
    let checkpoint = *input;
    trivia(input)?;
    let to = if starts_edge_op(input) {
        Some(Box::new(edge_rhs(input)?))
    } else {
        *input = checkpoint;
        None
    };
    Ok(Edge {
        directed,
        vertex,
        to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            port: None,
        }
    }

    #[test]
    fn test_empty_input_has_no_graph() {
        assert_eq!(parse(""), Err(DotError::NoGraph));
        assert_eq!(parse("  // only a comment\n"), Err(DotError::NoGraph));
    }

    #[test]
    fn test_graph_header() {
        let g = parse_graph("strict digraph 1552575689497326632 {}").unwrap();
        assert!(g.strict);
        assert!(g.directed);
        assert_eq!(g.id, "1552575689497326632");
        assert!(g.stmts.is_empty());

        let g = parse_graph("GRAPH { }").unwrap();
        assert!(!g.strict);
        assert!(!g.directed);
        assert_eq!(g.id, "");
    }

    #[test]
    fn test_attribute_values_are_raw() {
        let g = parse_graph(
            r#"digraph { a [label="Web \"Server\"" shape=circle, html=<<b>x</b>>]; }"#,
        )
        .unwrap();
        let Stmt::Node(stmt) = &g.stmts[0] else {
            panic!("expected node statement");
        };
        assert_eq!(stmt.node, node("a"));
        assert_eq!(
            stmt.attrs,
            vec![
                Attr::new("label", r#""Web \"Server\"""#),
                Attr::new("shape", "circle"),
                Attr::new("html", "<<b>x</b>>"),
            ]
        );
    }

    #[test]
    fn test_quoted_identifiers_are_unquoted() {
        let g = parse_graph(r#"digraph "my graph" { "process_-1" [label="a" + "b"] }"#).unwrap();
        assert_eq!(g.id, "my graph");
        let Stmt::Node(stmt) = &g.stmts[0] else {
            panic!("expected node statement");
        };
        assert_eq!(stmt.node.id, "process_-1");
        assert_eq!(stmt.attrs[0].val, "\"ab\"");
    }

    #[test]
    fn test_default_attribute_statements() {
        let g = parse_graph("digraph { graph [a=1]; node [b=2] [c=3]; edge []; rankdir=LR }")
            .unwrap();
        assert_eq!(
            g.stmts,
            vec![
                Stmt::Attr(AttrStmt {
                    kind: Kind::Graph,
                    attrs: vec![Attr::new("a", "1")]
                }),
                Stmt::Attr(AttrStmt {
                    kind: Kind::Node,
                    attrs: vec![Attr::new("b", "2"), Attr::new("c", "3")]
                }),
                Stmt::Attr(AttrStmt {
                    kind: Kind::Edge,
                    attrs: vec![]
                }),
                Stmt::Assign(Attr::new("rankdir", "LR")),
            ]
        );
    }

    #[test]
    fn test_edge_chain_with_ports() {
        let g = parse_graph("digraph { a:out:se -> b -> c:in [label=x] }").unwrap();
        let Stmt::Edge(stmt) = &g.stmts[0] else {
            panic!("expected edge statement");
        };
        assert_eq!(
            stmt.from,
            Vertex::Node(Node {
                id: "a".to_string(),
                port: Some(Port {
                    id: "out".to_string(),
                    compass: CompassPoint::SouthEast
                }),
            })
        );
        assert!(stmt.to.directed);
        assert_eq!(stmt.to.vertex, Vertex::Node(node("b")));
        let next = stmt.to.to.as_ref().unwrap();
        assert_eq!(
            next.vertex,
            Vertex::Node(Node {
                id: "c".to_string(),
                port: Some(Port {
                    id: "in".to_string(),
                    compass: CompassPoint::None
                }),
            })
        );
        assert!(next.to.is_none());
        assert_eq!(stmt.attrs, vec![Attr::new("label", "x")]);
    }

    #[test]
    fn test_subgraph_statement_and_vertex() {
        let g = parse_graph(
            "digraph {\n subgraph cluster_7 { graph [label=\"AWS\"]; p_1 }\n a -> { b c }\n}",
        )
        .unwrap();
        assert_eq!(g.stmts.len(), 2);
        let Stmt::Subgraph(sub) = &g.stmts[0] else {
            panic!("expected subgraph statement");
        };
        assert_eq!(sub.id, "cluster_7");
        assert_eq!(sub.stmts.len(), 2);

        let Stmt::Edge(stmt) = &g.stmts[1] else {
            panic!("expected edge statement");
        };
        let Vertex::Subgraph(group) = &stmt.to.vertex else {
            panic!("expected subgraph vertex");
        };
        assert_eq!(group.id, "");
        assert_eq!(group.stmts.len(), 2);
    }

    #[test]
    fn test_comments_are_skipped() {
        let g = parse_graph(
            "# preamble\ndigraph {\n // Node definitions.\n a /* inline */ [x=1];\n}",
        )
        .unwrap();
        assert_eq!(g.stmts.len(), 1);
    }

    #[test]
    fn test_undirected_edge_operator() {
        let g = parse_graph("graph { a -- b }").unwrap();
        let Stmt::Edge(stmt) = &g.stmts[0] else {
            panic!("expected edge statement");
        };
        assert!(!stmt.to.directed);
    }

    #[test]
    fn test_syntax_error_location() {
        let err = parse("digraph {\n  a -> ;\n}").unwrap_err();
        match err {
            DotError::Syntax { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains(';'), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_graph() {
        assert!(matches!(
            parse("digraph { a [label=\"x\"]"),
            Err(DotError::Syntax { .. })
        ));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#"a\"b"#), "a\"b");
        assert_eq!(unescape("a\\\nb"), "ab");
        assert_eq!(unescape(r"a\lb"), r"a\lb");
    }
}
