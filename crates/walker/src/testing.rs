//! Shared fixtures: the reference graph `0→{1,2,3}`, `4→{1}`, `1→{5}`, `6→{}`

use crate::engine::WalkEngine;
use crate::scoring::ScoringContext;
use citesurf_common::config::WalkConfig;
use citesurf_common::lookup::StaticLookup;
use citesurf_common::{Author, Document, LookupProvider, Reference};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

fn doc(id: &str, family: &str, year: i32, references: &[&str]) -> Document {
    Document::new(id)
        .with_title(format!("Paper {id}"))
        .with_authors(vec![Author::new(family)])
        .with_year(year)
        .with_references(references.iter().map(Reference::to).collect())
}

pub(crate) fn corpus() -> Vec<Document> {
    vec![
        doc("0", "Adams", 2001, &["1", "2", "3"]),
        doc("1", "Baker", 1995, &["5"]),
        doc("2", "Clark", 1990, &[]),
        doc("3", "Davis", 1991, &[]),
        doc("4", "Evans", 2005, &["1"]),
        doc("5", "Fox", 1980, &[]),
        doc("6", "Gray", 2010, &[]),
    ]
}

pub(crate) fn corpus_lookup() -> Arc<dyn LookupProvider> {
    Arc::new(StaticLookup::from_documents(corpus()))
}

pub(crate) fn walk_config() -> WalkConfig {
    WalkConfig::default()
}

/// Engine over the fixture corpus with the given seeds and RNG seed
pub(crate) async fn engine_with_seeds(seeds: &[&str], rng_seed: u64) -> WalkEngine {
    WalkEngine::from_identifiers(
        seeds.iter().copied(),
        ScoringContext::default(),
        corpus_lookup(),
        &walk_config(),
        StdRng::seed_from_u64(rng_seed),
    )
    .await
    .unwrap()
}
