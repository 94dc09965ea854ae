//! Export: node/edge CSV tables and Graphviz DOT text.
//!
//! Writers stream to any [`std::io::Write`] and return the number of rows or
//! statements written. Layout and rendering of the DOT output stay external.

use crate::graph::{CitationEdge, GraphStore, WalkNode};
use citesurf_common::errors::Result;
use std::borrow::Cow;
use std::io::Write;

/// Fill color of nodes without any color tag
pub const DEFAULT_COLOR: &str = "#ADACAC";

/// Fill color of nodes matching several distinct colors
pub const MIXED_COLOR: &str = "#D8C292";

/// Nodes cited at least this often by walked nodes get a label
pub const LABEL_MIN_CITATIONS: usize = 3;

const SEED_PEN_WIDTH: u32 = 7;
const NODE_PEN_WIDTH: u32 = 2;

// Graphviz sizes are inches; node size is treated as an area in points²
const AREA_PER_SIZE_UNIT: f64 = 20.0;
const POINTS_PER_INCH: f64 = 72.0;

/// Quote a CSV field when it holds a delimiter, quote or line break
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn dot_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Export every node as CSV, most visited first.
///
/// Columns: `identifier,title,author,score,times_seen`
pub fn write_nodes_csv<W: Write>(store: &GraphStore, writer: &mut W) -> Result<usize> {
    writeln!(writer, "identifier,title,author,score,times_seen")?;

    let mut nodes: Vec<&WalkNode> = store.iter().collect();
    nodes.sort_by(|a, b| b.counter().cmp(&a.counter()));

    for node in &nodes {
        let document = &node.document;
        writeln!(
            writer,
            "{},{},{},{},{}",
            csv_field(node.identifier()),
            csv_field(document.title.as_deref().unwrap_or_default()),
            csv_field(document.first_author().unwrap_or_default()),
            node.score(),
            node.counter(),
        )?;
    }
    Ok(nodes.len())
}

/// Export derived edges as CSV.
///
/// Columns: `citing,cited`
pub fn write_edges_csv<W: Write>(edges: &[CitationEdge], writer: &mut W) -> Result<usize> {
    writeln!(writer, "citing,cited")?;
    for edge in edges {
        writeln!(writer, "{},{}", csv_field(&edge.citing), csv_field(&edge.cited))?;
    }
    Ok(edges.len())
}

/// Relative node size: visits plus three per step of depth
pub fn node_size(node: &WalkNode) -> u32 {
    node.counter().max(1) + 3 * node.depth()
}

/// Fill color from the node's color tags
pub fn fill_color(node: &WalkNode) -> &str {
    let mut colors = node.colors().iter();
    match (colors.next(), colors.next()) {
        (None, _) => DEFAULT_COLOR,
        (Some(color), None) => color.as_str(),
        (Some(_), Some(_)) => MIXED_COLOR,
    }
}

fn node_label(store: &GraphStore, node: &WalkNode) -> String {
    if node.is_seed() || store.citation_count(node.identifier()) >= LABEL_MIN_CITATIONS {
        node.label()
    } else {
        String::new()
    }
}

/// Export the graph as Graphviz DOT.
///
/// Returns the number of node and edge statements written.
pub fn write_dot<W: Write>(store: &GraphStore, edges: &[CitationEdge], writer: &mut W) -> Result<usize> {
    writeln!(writer, "digraph citesurf {{")?;
    writeln!(writer, "  node [shape=circle, style=filled, fixedsize=true, fontsize=10];")?;

    let mut statements = 0;
    for node in store.iter() {
        let width = (node_size(node) as f64 * AREA_PER_SIZE_UNIT).sqrt() / POINTS_PER_INCH;
        let pen_width = if node.is_seed() { SEED_PEN_WIDTH } else { NODE_PEN_WIDTH };
        writeln!(
            writer,
            "  \"{}\" [label=\"{}\", width={:.3}, fillcolor=\"{}\", penwidth={}];",
            dot_escape(node.identifier()),
            dot_escape(&node_label(store, node)),
            width,
            dot_escape(fill_color(node)),
            pen_width,
        )?;
        statements += 1;
    }

    for edge in edges {
        writeln!(
            writer,
            "  \"{}\" -> \"{}\";",
            dot_escape(&edge.citing),
            dot_escape(&edge.cited)
        )?;
        statements += 1;
    }

    writeln!(writer, "}}")?;
    Ok(statements)
}
