//! Identifier-keyed node store
//!
//! Single-threaded: the store is owned by one engine and mutated in place.
//! Wrap it in a lock before sharing it between tasks.

use super::node::WalkNode;
use citesurf_common::errors::{AppError, Result};
use citesurf_common::DocumentPatch;
use std::collections::BTreeMap;

/// Followed citation: `citing` listed `cited` among its references
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CitationEdge {
    /// Parent node the walk came from
    pub citing: String,

    /// Node the walk moved to
    pub cited: String,
}

/// All nodes discovered by a walk
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: BTreeMap<String, WalkNode>,

    /// Cache filled by [`GraphStore::derive_edges`]
    edges: Vec<CitationEdge>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under its identifier
    pub(crate) fn add(&mut self, node: WalkNode) -> Result<()> {
        let id = node.identifier().to_string();
        if id.is_empty() {
            return Err(AppError::Validation {
                message: "node identifier is empty".to_string(),
                field: Some("identifier".to_string()),
            });
        }
        if self.nodes.contains_key(&id) {
            return Err(AppError::DuplicateNode { id });
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&WalkNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &WalkNode> {
        self.nodes.values()
    }

    /// Node at position `index` in identifier order
    pub fn nth(&self, index: usize) -> Option<&WalkNode> {
        self.nodes.values().nth(index)
    }

    /// Mutate a node in place
    pub(crate) fn update<T>(&mut self, id: &str, f: impl FnOnce(&mut WalkNode) -> T) -> Result<T> {
        self.nodes
            .get_mut(id)
            .map(f)
            .ok_or_else(|| AppError::NodeNotFound { id: id.to_string() })
    }

    /// Record that the walk reached `child` by following a citation from `parent`.
    ///
    /// Returns true when the parent link is new. Seeds and self-citations are
    /// left untouched.
    pub(crate) fn record_parent(&mut self, child: &str, parent: &str) -> Result<bool> {
        if !self.contains(parent) {
            return Err(AppError::NodeNotFound { id: parent.to_string() });
        }
        if child == parent {
            return Ok(false);
        }
        self.update(child, |node| node.add_parent(parent))
    }

    /// Move a node to a new identifier and rewrite every parent link to it.
    ///
    /// The node's document takes the normalized identifier too, so the key
    /// and `identifier()` never disagree. Returns the normalized identifier.
    pub(crate) fn rekey(&mut self, old: &str, new: &str) -> Result<String> {
        self.apply_patch(
            old,
            DocumentPatch {
                identifier: Some(new.to_string()),
                ..Default::default()
            },
        )
    }

    /// Apply a metadata correction to a stored node.
    ///
    /// Returns the node's identifier after the patch.
    pub(crate) fn apply_patch(&mut self, id: &str, patch: DocumentPatch) -> Result<String> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| AppError::NodeNotFound { id: id.to_string() })?;

        // Check for a collision before touching anything
        let mut document = node.document.clone();
        let previous = document.apply(patch);
        let new_id = document.identifier().to_string();
        if previous.is_some() {
            if new_id.is_empty() {
                return Err(AppError::Validation {
                    message: "node identifier is empty".to_string(),
                    field: Some("identifier".to_string()),
                });
            }
            if self.contains(&new_id) {
                return Err(AppError::DuplicateNode { id: new_id });
            }
        }

        let mut node = self
            .nodes
            .remove(id)
            .ok_or_else(|| AppError::NodeNotFound { id: id.to_string() })?;
        node.document = document;
        self.nodes.insert(new_id.clone(), node);
        if previous.is_some() {
            for node in self.nodes.values_mut() {
                node.rename_parent(id, &new_id);
            }
        }
        Ok(new_id)
    }

    /// Rebuild the edge list from the parent sets.
    ///
    /// Deterministic: edges come out sorted, and calling this twice without
    /// intervening mutations yields the same list.
    pub fn derive_edges(&mut self) -> &[CitationEdge] {
        let mut edges: Vec<CitationEdge> = self
            .nodes
            .values()
            .flat_map(|node| {
                node.parents().iter().map(move |parent| CitationEdge {
                    citing: parent.clone(),
                    cited: node.identifier().to_string(),
                })
            })
            .collect();
        edges.sort();
        self.edges = edges;
        &self.edges
    }

    /// Edges from the last [`GraphStore::derive_edges`] call
    pub fn edges(&self) -> &[CitationEdge] {
        &self.edges
    }

    /// Walked nodes that cite `id`
    pub fn citation_count(&self, id: &str) -> usize {
        self.get(id).map(|node| node.parents().len()).unwrap_or(0)
    }

    /// Walked nodes cited by `id`
    pub fn reference_count(&self, id: &str) -> usize {
        self.nodes
            .values()
            .filter(|node| node.parents().contains(id))
            .count()
    }

    /// Discovered nodes with the most citing parents, ties broken by identifier
    pub fn top_cited(&self, limit: usize) -> Vec<&WalkNode> {
        let mut nodes: Vec<&WalkNode> = self.nodes.values().filter(|node| !node.is_seed()).collect();
        nodes.sort_by(|a, b| b.parents().len().cmp(&a.parents().len()));
        nodes.truncate(limit);
        nodes
    }

    /// Nodes the walk entered most often, ties broken by identifier
    pub fn most_visited(&self, limit: usize) -> Vec<&WalkNode> {
        let mut nodes: Vec<&WalkNode> = self.nodes.values().collect();
        nodes.sort_by(|a, b| b.counter().cmp(&a.counter()));
        nodes.truncate(limit);
        nodes
    }
}
