use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::warn;

use study_core::model::{ItemOutcome, SessionSummary, WordId};

use crate::error::OutcomeError;

/// Accumulates per-item outcomes and derives the session summary.
///
/// Push model: the active state machine emits outcomes as the user works
/// through the drill, and `finish` seals the sequence into a summary
/// exactly once. Outcomes are never retracted or overwritten; a second
/// outcome for the same word is an engineering bug and is rejected.
#[derive(Debug)]
pub struct ResultAggregator {
    total_count: u32,
    started_at: DateTime<Utc>,
    outcomes: Vec<ItemOutcome>,
    seen: HashSet<WordId>,
    summary: Option<SessionSummary>,
}

impl ResultAggregator {
    /// Start aggregating for a session of `total_count` items.
    ///
    /// `started_at` should come from the engine clock; the session duration
    /// is measured from here to the single `finish` call.
    #[must_use]
    pub fn new(total_count: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            total_count,
            started_at,
            outcomes: Vec::new(),
            seen: HashSet::new(),
            summary: None,
        }
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    #[must_use]
    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    /// Running count of correct outcomes.
    #[must_use]
    pub fn correct_count(&self) -> u32 {
        u32::try_from(self.outcomes.iter().filter(|o| o.correct).count()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn summary(&self) -> Option<SessionSummary> {
        self.summary
    }

    /// Append one outcome to the sequence.
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::AlreadyFinished` after the summary has been
    /// derived, `Overflow` when the sequence is already full, and
    /// `Duplicate` when the word already has an outcome. Rejected outcomes
    /// leave the sequence untouched.
    pub fn record(&mut self, outcome: ItemOutcome) -> Result<(), OutcomeError> {
        if self.summary.is_some() {
            return Err(OutcomeError::AlreadyFinished);
        }
        if self.outcomes.len() >= self.total_count as usize {
            return Err(OutcomeError::Overflow);
        }
        if !self.seen.insert(outcome.word_id) {
            warn!(word_id = %outcome.word_id, "duplicate outcome rejected");
            return Err(OutcomeError::Duplicate {
                word_id: outcome.word_id,
            });
        }

        self.outcomes.push(outcome);
        Ok(())
    }

    /// Append a batch of outcomes, stopping at the first rejection.
    ///
    /// # Errors
    ///
    /// Propagates the first `record` failure.
    pub fn record_all(
        &mut self,
        outcomes: impl IntoIterator<Item = ItemOutcome>,
    ) -> Result<(), OutcomeError> {
        for outcome in outcomes {
            self.record(outcome)?;
        }
        Ok(())
    }

    /// Seal the sequence and derive the summary.
    ///
    /// The duration is measured here, once; later calls fail rather than
    /// recompute.
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::AlreadyFinished` on a second call, and
    /// summary validation errors otherwise.
    pub fn finish(&mut self, completed_at: DateTime<Utc>) -> Result<SessionSummary, OutcomeError> {
        if self.summary.is_some() {
            return Err(OutcomeError::AlreadyFinished);
        }

        let summary = SessionSummary::from_outcomes(
            &self.outcomes,
            self.total_count,
            self.started_at,
            completed_at,
        )?;
        self.summary = Some(summary);
        Ok(summary)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
