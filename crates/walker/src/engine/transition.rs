//! Outcome of a walk step

use crate::scoring::Tier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened during the last step.
///
/// A jump moves the current pointer without following a citation; a follow
/// moves it along a citation and records a parent link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tier", rename_all = "snake_case")]
pub enum Transition {
    /// Initial state, before the first step
    StartingDocument,
    /// Current node had no usable reference; jumped to a random known node
    InvalidReferences,
    /// Jumped back to a random seed
    BackToStart,
    /// Followed a citation to a document not seen before
    NewDocument(Tier),
    /// Followed a citation to a document already in the store
    PreviouslySeen,
}

impl Transition {
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Transition::StartingDocument | Transition::InvalidReferences | Transition::BackToStart
        )
    }

    pub fn is_follow(&self) -> bool {
        !self.is_jump()
    }

    /// Relevance tier, for `NewDocument` only
    pub fn tier(&self) -> Option<Tier> {
        match self {
            Transition::NewDocument(tier) => Some(*tier),
            _ => None,
        }
    }

    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::StartingDocument => "starting_document",
            Transition::InvalidReferences => "invalid_references",
            Transition::BackToStart => "back_to_start",
            Transition::NewDocument(Tier::Low) => "new_document_low",
            Transition::NewDocument(Tier::Moderate) => "new_document_moderate",
            Transition::NewDocument(Tier::Good) => "new_document_good",
            Transition::NewDocument(Tier::Excellent) => "new_document_excellent",
            Transition::PreviouslySeen => "previously_seen",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
