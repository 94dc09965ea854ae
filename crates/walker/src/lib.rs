//! citesurf walk engine
//!
//! Explores a citation network from a seed corpus with a randomized,
//! relevance-weighted walk and accumulates every visited document into a
//! graph annotated with visit counts, depth from the seeds, relevance score
//! and the citations actually followed.
//!
//! - [`scoring`]: keyword/author relevance heuristic and tiers
//! - [`graph`]: walk nodes and the graph store
//! - [`engine`]: the step state machine
//! - [`export`]: CSV and DOT reports

pub mod engine;
pub mod export;
pub mod graph;
pub mod scoring;

pub use engine::{Transition, WalkEngine, WalkSummary};
pub use graph::{CitationEdge, GraphStore, NodeCategory, WalkNode};
pub use scoring::{ColorTable, ImportantAuthors, KeywordTable, ScoringContext, Tier};

#[cfg(test)]
pub(crate) mod testing;
