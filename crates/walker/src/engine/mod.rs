//! Walk engine
//!
//! One call to [`WalkEngine::iterate`] performs one step:
//! 1. Current node has no references: jump to a random known node
//! 2. With the back-to-start probability: jump to a random seed
//! 3. Otherwise follow a random reference, resolving it when unseen
//!    (up to `max_reference_attempts` tries, then fall back to 1)
//!
//! Following a citation records the previous node as a parent of the new one.
//! Discovering a document adopts the back-to-start weight of its tier for
//! the following steps.

mod transition;

pub use transition::Transition;

use crate::graph::{CitationEdge, GraphStore, WalkNode};
use crate::scoring::{ScoringContext, Tier};
use citesurf_common::config::{TierWeights, Validate, WalkConfig};
use citesurf_common::errors::{AppError, Result};
use citesurf_common::metrics::{record_skipped_reference, record_step, LookupTimer};
use citesurf_common::{Document, DocumentPatch, LookupProvider};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where a step landed
#[derive(Debug)]
struct Outcome {
    id: String,
    depth: u32,
    transition: Transition,
}

/// Totals of a [`WalkEngine::run`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkSummary {
    pub steps: usize,
    pub nodes: usize,
    pub transitions: BTreeMap<String, usize>,
}

/// Randomized, relevance-weighted walk over citation references.
///
/// Owns the graph store; the random source and the lookup provider are
/// injected so a run can be reproduced.
pub struct WalkEngine<R = StdRng> {
    store: GraphStore,
    seeds: Vec<String>,
    context: ScoringContext,
    lookup: Arc<dyn LookupProvider>,
    rng: R,
    current: String,
    current_depth: u32,
    last_transition: Transition,
    back_to_start_weight: f64,
    tiers: TierWeights,
    max_attempts: usize,
    steps: usize,
}

impl<R: Rng> WalkEngine<R> {
    /// Build an engine from already resolved seed documents.
    ///
    /// Seed authors are imported into the scoring context before any seed is
    /// scored. Seeds without an identifier and repeated seeds are skipped.
    pub fn new(
        seeds: Vec<Document>,
        mut context: ScoringContext,
        lookup: Arc<dyn LookupProvider>,
        config: &WalkConfig,
        mut rng: R,
    ) -> Result<Self> {
        config.validate().map_err(|e| AppError::Validation {
            message: e.to_string(),
            field: None,
        })?;

        for seed in &seeds {
            let added = context.import_seed_authors(seed);
            if added > 0 {
                debug!(seed = %seed.identifier(), added, "Imported seed authors");
            }
        }

        let mut store = GraphStore::new();
        let mut seed_ids = Vec::with_capacity(seeds.len());
        for document in seeds {
            if document.identifier().is_empty() {
                warn!(title = ?document.title, "Skipping seed without identifier");
                continue;
            }
            if store.contains(document.identifier()) {
                debug!(seed = %document.identifier(), "Skipping repeated seed");
                continue;
            }
            let score = context.score(&document);
            let colors = context.colors_for(&document);
            seed_ids.push(document.identifier().to_string());
            store.add(WalkNode::seed(document, score, colors))?;
        }

        let current = seed_ids.choose(&mut rng).cloned().ok_or(AppError::NoSeeds)?;

        info!(
            seeds = seed_ids.len(),
            important_authors = context.important_authors.len(),
            start = %current,
            "Walk engine ready"
        );

        Ok(Self {
            store,
            seeds: seed_ids,
            context,
            lookup,
            rng,
            current,
            current_depth: 0,
            last_transition: Transition::StartingDocument,
            back_to_start_weight: config.back_to_start_weight,
            tiers: config.tiers,
            max_attempts: config.max_reference_attempts.max(1),
            steps: 0,
        })
    }

    /// Resolve seed identifiers through the lookup provider, then build the engine.
    ///
    /// Identifiers that fail to resolve are logged and skipped.
    pub async fn from_identifiers<I, S>(
        identifiers: I,
        context: ScoringContext,
        lookup: Arc<dyn LookupProvider>,
        config: &WalkConfig,
        rng: R,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seeds = Vec::new();
        for identifier in identifiers {
            let identifier = identifier.as_ref();
            let timer = LookupTimer::start(lookup.name());
            match lookup.resolve(identifier).await {
                Ok(document) => {
                    timer.finish(true);
                    seeds.push(document);
                }
                Err(e) => {
                    timer.finish(false);
                    warn!(identifier, error = %e, "Failed to import seed");
                }
            }
        }
        Self::new(seeds, context, lookup, config, rng)
    }

    /// Advance one step using the engine's current back-to-start weight
    pub async fn iterate(&mut self) -> Result<&WalkNode> {
        let probability = self.back_to_start_weight;
        self.iterate_with_probability(probability).await
    }

    /// Advance one step with an explicit back-to-start probability.
    ///
    /// The override applies to this call only; a `NewDocument` outcome still
    /// updates the stored weight.
    #[instrument(skip(self))]
    pub async fn iterate_with_probability(&mut self, probability: f64) -> Result<&WalkNode> {
        validate_probability(probability)?;

        let previous = self.current.clone();
        let outcome = self.step(probability).await?;

        if outcome.transition.is_follow() {
            self.store.record_parent(&outcome.id, &previous)?;
        }
        if let Transition::NewDocument(tier) = outcome.transition {
            self.back_to_start_weight = tier.back_to_start_weight(&self.tiers);
        }

        self.steps += 1;
        debug!(
            step = self.steps,
            from = %previous,
            to = %outcome.id,
            depth = outcome.depth,
            transition = %outcome.transition,
            "Walk step"
        );
        record_step(outcome.transition.as_str(), self.store.len());

        self.current = outcome.id;
        self.current_depth = outcome.depth;
        self.last_transition = outcome.transition;

        self.store
            .get(&self.current)
            .ok_or_else(|| AppError::NodeNotFound { id: self.current.clone() })
    }

    /// Run `iterations` steps and tally the transitions
    pub async fn run(&mut self, iterations: usize) -> Result<WalkSummary> {
        let mut summary = WalkSummary::default();
        for _ in 0..iterations {
            self.iterate().await?;
            *summary
                .transitions
                .entry(self.last_transition.as_str().to_string())
                .or_insert(0) += 1;
            summary.steps += 1;
        }
        summary.nodes = self.store.len();
        info!(steps = summary.steps, nodes = summary.nodes, "Walk finished");
        Ok(summary)
    }

    async fn step(&mut self, probability: f64) -> Result<Outcome> {
        let has_references = self
            .store
            .get(&self.current)
            .map(|node| node.document.has_references())
            .ok_or_else(|| AppError::NodeNotFound { id: self.current.clone() })?;

        if !has_references {
            return self.jump_to_random_node();
        }

        if self.rng.gen::<f64>() < probability {
            return self.back_to_start();
        }

        let running_depth = self.current_depth + 1;
        for attempt in 1..=self.max_attempts {
            let reference = self
                .store
                .get(&self.current)
                .and_then(|node| node.document.references.choose(&mut self.rng))
                .cloned();
            let Some(reference) = reference else {
                break;
            };

            let Some(id) = reference.identifier().map(str::to_string) else {
                debug!(attempt, reference = reference.describe(), "Reference has no identifier");
                record_skipped_reference("no_identifier");
                continue;
            };

            if self.store.contains(&id) {
                return self.revisit(&id, running_depth);
            }

            let timer = LookupTimer::start(self.lookup.name());
            let document = match self.lookup.resolve(&id).await {
                Ok(document) => {
                    timer.finish(true);
                    document
                }
                Err(e) => {
                    timer.finish(false);
                    warn!(attempt, identifier = %id, error = %e, "Failed to resolve reference");
                    record_skipped_reference("lookup_failed");
                    continue;
                }
            };

            // The provider may answer with a canonical identifier we already hold
            let resolved = document.identifier().to_string();
            if resolved.is_empty() {
                warn!(attempt, identifier = %id, "Resolved document has no identifier");
                record_skipped_reference("no_identifier");
                continue;
            }
            if self.store.contains(&resolved) {
                return self.revisit(&resolved, running_depth);
            }

            return self.discover(document, running_depth);
        }

        warn!(
            from = %self.current,
            attempts = self.max_attempts,
            "No usable reference, jumping"
        );
        self.jump_to_random_node()
    }

    fn discover(&mut self, document: Document, depth: u32) -> Result<Outcome> {
        let score = self.context.score(&document);
        let colors = self.context.colors_for(&document);
        let tier = Tier::from_score(score);
        let id = document.identifier().to_string();

        let mut node = WalkNode::discovered(document, depth, score, colors);
        node.visit();
        self.store.add(node)?;

        debug!(identifier = %id, score, tier = tier.as_str(), depth, "Discovered document");
        Ok(Outcome {
            id,
            depth,
            transition: Transition::NewDocument(tier),
        })
    }

    fn revisit(&mut self, id: &str, running_depth: u32) -> Result<Outcome> {
        let depth = self.store.update(id, |node| {
            node.lower_depth(running_depth);
            node.visit();
            node.depth()
        })?;
        Ok(Outcome {
            id: id.to_string(),
            depth,
            transition: Transition::PreviouslySeen,
        })
    }

    fn jump_to_random_node(&mut self) -> Result<Outcome> {
        let node = if self.store.is_empty() {
            self.seeds
                .choose(&mut self.rng)
                .and_then(|id| self.store.get(id))
        } else {
            let index = self.rng.gen_range(0..self.store.len());
            self.store.nth(index)
        };
        let node = node.ok_or(AppError::NoSeeds)?;
        Ok(Outcome {
            id: node.identifier().to_string(),
            depth: node.depth(),
            transition: Transition::InvalidReferences,
        })
    }

    fn back_to_start(&mut self) -> Result<Outcome> {
        let id = self.seeds.choose(&mut self.rng).cloned().ok_or(AppError::NoSeeds)?;
        let depth = self
            .store
            .get(&id)
            .map(WalkNode::depth)
            .ok_or_else(|| AppError::NodeNotFound { id: id.clone() })?;
        if depth != 0 {
            return Err(AppError::InvariantViolation {
                message: format!("seed {id} has depth {depth} after back-to-start"),
            });
        }
        Ok(Outcome {
            id,
            depth,
            transition: Transition::BackToStart,
        })
    }

    /// Apply a metadata correction, keeping the current pointer and seed list
    /// in sync when the identifier changes
    pub fn apply_patch(&mut self, id: &str, patch: DocumentPatch) -> Result<String> {
        let new_id = self.store.apply_patch(id, patch)?;
        self.follow_rename(id, &new_id);
        Ok(new_id)
    }

    /// Move a node to a new identifier, e.g. once a canonical DOI is known
    pub fn rekey(&mut self, old: &str, new: &str) -> Result<String> {
        let new_id = self.store.rekey(old, new)?;
        self.follow_rename(old, &new_id);
        Ok(new_id)
    }

    fn follow_rename(&mut self, old: &str, new_id: &str) {
        if new_id == old {
            return;
        }
        if self.current == old {
            self.current = new_id.to_string();
        }
        for seed in self.seeds.iter_mut().filter(|seed| seed.as_str() == old) {
            *seed = new_id.to_string();
        }
    }

    pub fn set_back_to_start_weight(&mut self, weight: f64) -> Result<()> {
        validate_probability(weight)?;
        self.back_to_start_weight = weight;
        Ok(())
    }
}

impl<R> WalkEngine<R> {
    /// Read-only view of every discovered node
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Rebuild and return the followed-citation edges for export
    pub fn derive_edges(&mut self) -> &[CitationEdge] {
        self.store.derive_edges()
    }

    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    pub fn current_node(&self) -> Option<&WalkNode> {
        self.store.get(&self.current)
    }

    pub fn current_depth(&self) -> u32 {
        self.current_depth
    }

    pub fn last_transition(&self) -> Transition {
        self.last_transition
    }

    pub fn back_to_start_weight(&self) -> f64 {
        self.back_to_start_weight
    }

    pub fn context(&self) -> &ScoringContext {
        &self.context
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

/// Back-to-start probability supplied at call time
#[derive(Debug, Validate)]
struct ProbabilityOverride {
    #[validate(range(min = 0.0, max = 1.0))]
    back_to_start_weight: f64,
}

fn validate_probability(probability: f64) -> Result<()> {
    let field = Some("back_to_start_weight".to_string());
    if !probability.is_finite() {
        return Err(AppError::Validation {
            message: format!("back-to-start probability {probability} is not finite"),
            field,
        });
    }
    ProbabilityOverride {
        back_to_start_weight: probability,
    }
    .validate()
    .map_err(|e| AppError::Validation {
        message: e.to_string(),
        field,
    })
}
