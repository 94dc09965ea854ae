//! Document decorated with walk metadata

use citesurf_common::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether a node came from the seed corpus or from the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Seed,
    Discovered,
}

/// A document in the graph store.
///
/// `depth` only ever decreases and `parents` only ever grows; both are kept
/// private so the invariants hold outside this module.
#[derive(Debug, Clone)]
pub struct WalkNode {
    pub document: Document,
    score: f64,
    counter: u32,
    depth: u32,
    /// Identifiers of the nodes this one was reached from by a followed citation
    parents: BTreeSet<String>,
    category: NodeCategory,
    colors: BTreeSet<String>,
}

impl WalkNode {
    /// Seed node: depth 0, never visited, no parents
    pub fn seed(document: Document, score: f64, colors: BTreeSet<String>) -> Self {
        Self {
            document,
            score,
            counter: 0,
            depth: 0,
            parents: BTreeSet::new(),
            category: NodeCategory::Seed,
            colors,
        }
    }

    /// Node found by the walk at `depth` steps from a seed
    pub fn discovered(document: Document, depth: u32, score: f64, colors: BTreeSet<String>) -> Self {
        Self {
            document,
            score,
            counter: 0,
            depth,
            parents: BTreeSet::new(),
            category: NodeCategory::Discovered,
            colors,
        }
    }

    pub fn identifier(&self) -> &str {
        self.document.identifier()
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Times the walk followed a citation into this node
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn parents(&self) -> &BTreeSet<String> {
        &self.parents
    }

    pub fn category(&self) -> NodeCategory {
        self.category
    }

    pub fn is_seed(&self) -> bool {
        self.category == NodeCategory::Seed
    }

    pub fn colors(&self) -> &BTreeSet<String> {
        &self.colors
    }

    pub fn label(&self) -> String {
        self.document.label()
    }

    pub(crate) fn visit(&mut self) {
        self.counter += 1;
    }

    /// Lower the depth to `depth` if that is shallower. Returns true on change.
    pub(crate) fn lower_depth(&mut self, depth: u32) -> bool {
        if depth < self.depth {
            self.depth = depth;
            true
        } else {
            false
        }
    }

    /// Record a predecessor. Seeds never take parents.
    pub(crate) fn add_parent(&mut self, parent: &str) -> bool {
        if self.is_seed() {
            return false;
        }
        self.parents.insert(parent.to_string())
    }

    pub(crate) fn rename_parent(&mut self, old: &str, new: &str) {
        if self.parents.remove(old) {
            self.parents.insert(new.to_string());
        }
    }

    #[cfg(test)]
    pub(crate) fn force_depth(&mut self, depth: u32) {
        self.depth = depth;
    }
}

impl PartialEq for WalkNode {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl Eq for WalkNode {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_only_decreases() {
        let mut node = WalkNode::discovered(Document::new("10.1/a"), 3, 0.0, BTreeSet::new());
        assert!(!node.lower_depth(5));
        assert_eq!(node.depth(), 3);
        assert!(node.lower_depth(1));
        assert_eq!(node.depth(), 1);
    }

    #[test]
    fn test_seed_never_takes_parents() {
        let mut seed = WalkNode::seed(Document::new("10.1/s"), 0.0, BTreeSet::new());
        assert!(!seed.add_parent("10.1/p"));
        assert!(seed.parents().is_empty());
        assert_eq!(seed.depth(), 0);
        assert_eq!(seed.counter(), 0);
    }

    #[test]
    fn test_nodes_equal_by_identifier() {
        let a = WalkNode::seed(Document::new("10.1/a").with_title("one"), 1.0, BTreeSet::new());
        let b = WalkNode::discovered(Document::new("10.1/A"), 4, 9.0, BTreeSet::new());
        assert_eq!(a, b);
    }

    #[test]
    fn test_parents_accumulate() {
        let mut node = WalkNode::discovered(Document::new("10.1/a"), 1, 0.0, BTreeSet::new());
        assert!(node.add_parent("10.1/p"));
        assert!(!node.add_parent("10.1/p"));
        assert!(node.add_parent("10.1/q"));
        assert_eq!(node.parents().len(), 2);
    }
}
