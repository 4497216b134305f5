mod flashcards;
mod matching;

// Public API of the activity subsystem.
pub use flashcards::{FlashcardMachine, FlashcardState};
pub use matching::{
    BoardCard, BoardState, CardSide, MISMATCH_REVEAL_DELAY_MS, MatchingMachine, SelectOutcome,
};

use study_core::model::WordItem;

use crate::error::LoadError;

/// The two drill variants the engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Flashcards,
    Matching,
}

/// Aggregated view of drill progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityProgress {
    pub position: usize,
    pub total: usize,
    pub is_finished: bool,
}

/// The live drill, tagged by variant.
///
/// Both variants reduce to "produce exactly one boolean outcome per word,
/// in any order, then stop", which keeps the aggregator and the sync
/// coordinator variant-agnostic. Events are dispatched through the
/// variant's typed methods.
#[derive(Debug)]
pub enum Activity {
    Flashcards(FlashcardMachine),
    Matching(MatchingMachine),
}

impl Activity {
    /// Build the requested drill over the prepared word list.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` when the word list cannot seat the drill.
    pub fn new(kind: ActivityKind, words: Vec<WordItem>) -> Result<Self, LoadError> {
        match kind {
            ActivityKind::Flashcards => Ok(Self::Flashcards(FlashcardMachine::new(words)?)),
            ActivityKind::Matching => Ok(Self::Matching(MatchingMachine::new(&words)?)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ActivityKind {
        match self {
            Self::Flashcards(_) => ActivityKind::Flashcards,
            Self::Matching(_) => ActivityKind::Matching,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        match self {
            Self::Flashcards(machine) => machine.is_finished(),
            Self::Matching(machine) => machine.is_finished(),
        }
    }

    /// Items this drill will score: words for flashcards, pairs for matching.
    #[must_use]
    pub fn total_items(&self) -> usize {
        match self {
            Self::Flashcards(machine) => machine.total_items(),
            Self::Matching(machine) => machine.total_pairs(),
        }
    }

    #[must_use]
    pub fn progress(&self) -> ActivityProgress {
        match self {
            Self::Flashcards(machine) => machine.progress(),
            Self::Matching(machine) => machine.progress(),
        }
    }
}
