//! Relevance scoring
//!
//! A document's score is `3 × title score + author score`:
//! - title score: sum of the weights of every keyword found in the folded title
//! - author score: partial credit when the first or last author is an
//!   important author, capped at [`MAX_AUTHOR_SCORE`]
//!
//! Missing metadata never fails scoring; absent fields contribute zero.

mod tables;

pub use tables::{ColorTable, ImportantAuthors, KeywordTable};

use citesurf_common::config::TierWeights;
use citesurf_common::text::fold;
use citesurf_common::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Multiplier applied to the title score
pub const TITLE_WEIGHT: f64 = 3.0;

/// Credit for an important first or last author (25 × 0.375)
pub const AUTHOR_CREDIT: f64 = 25.0 * 0.375;

/// Upper bound of the author score
pub const MAX_AUTHOR_SCORE: f64 = 25.0;

/// Sum of keyword weights whose key occurs in the folded title
pub fn title_score(document: &Document, keywords: &KeywordTable) -> f64 {
    let Some(title) = document.title.as_deref() else {
        return 0.0;
    };
    let title = fold(title);
    keywords
        .iter()
        .filter(|(key, _)| title.contains(key))
        .map(|(_, weight)| weight)
        .sum()
}

/// Partial credit for important first and last authors
pub fn author_score(document: &Document, important_authors: &ImportantAuthors) -> f64 {
    let positions = [document.first_author(), document.last_author()];
    let score: f64 = positions
        .into_iter()
        .flatten()
        .filter(|family| important_authors.matches(family))
        .map(|_| AUTHOR_CREDIT)
        .sum();
    score.min(MAX_AUTHOR_SCORE)
}

/// Combined relevance score
pub fn total_score(
    document: &Document,
    keywords: &KeywordTable,
    important_authors: &ImportantAuthors,
) -> f64 {
    TITLE_WEIGHT * title_score(document, keywords) + author_score(document, important_authors)
}

/// Relevance bucket of a newly discovered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Low,
    Moderate,
    Good,
    Excellent,
}

impl Tier {
    /// `≤ 10` low, `(10, 20)` moderate, `> 40` excellent, otherwise good
    pub fn from_score(score: f64) -> Self {
        if score <= 10.0 {
            Tier::Low
        } else if score < 20.0 {
            Tier::Moderate
        } else if score > 40.0 {
            Tier::Excellent
        } else {
            Tier::Good
        }
    }

    /// Back-to-start weight to use after discovering a document of this tier
    pub fn back_to_start_weight(&self, weights: &TierWeights) -> f64 {
        match self {
            Tier::Low => weights.low,
            Tier::Moderate => weights.moderate,
            Tier::Good => weights.good,
            Tier::Excellent => weights.excellent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Moderate => "moderate",
            Tier::Good => "good",
            Tier::Excellent => "excellent",
        }
    }
}

/// Everything the scorer consults, threaded explicitly through the engine.
///
/// The important-author list grows as seed documents are imported, which
/// changes the scores of every document discovered afterwards.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext {
    pub keywords: KeywordTable,
    pub important_authors: ImportantAuthors,
    pub colors: ColorTable,
}

impl ScoringContext {
    pub fn new(keywords: KeywordTable, important_authors: ImportantAuthors, colors: ColorTable) -> Self {
        Self {
            keywords,
            important_authors,
            colors,
        }
    }

    pub fn score(&self, document: &Document) -> f64 {
        total_score(document, &self.keywords, &self.important_authors)
    }

    /// Color tags for the keywords found in the document's title
    pub fn colors_for(&self, document: &Document) -> BTreeSet<String> {
        match document.title.as_deref() {
            Some(title) => self.colors.matching(&fold(title)),
            None => BTreeSet::new(),
        }
    }

    /// Add the seed's first and last author to the important-author list.
    ///
    /// Returns how many names were new.
    pub fn import_seed_authors(&mut self, seed: &Document) -> usize {
        [seed.first_author(), seed.last_author()]
            .into_iter()
            .flatten()
            .filter(|family| self.important_authors.add(family))
            .count()
    }
}
