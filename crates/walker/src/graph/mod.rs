//! Walk graph representation
//!
//! Nodes are keyed by citation identifier. Parent links are identifier sets on
//! each node; edges are derived from them on demand.

mod node;
mod store;

pub use node::{NodeCategory, WalkNode};
pub use store::{CitationEdge, GraphStore};
