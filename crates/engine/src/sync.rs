use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use client::{ReviewSink, SessionCloser};
use study_core::model::{ItemOutcome, SessionId, SessionSummary, WordId};

use crate::error::SyncError;

//
// ─── SUBMISSION REPORT ─────────────────────────────────────────────────────────
//

/// What the two-phase submission actually delivered.
///
/// Exists only for the network phase; `session_ended` is the overall close
/// flag, `failed` lists the words whose review post did not land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub submitted: usize,
    pub failed: Vec<WordId>,
    pub session_ended: bool,
}

impl SubmissionReport {
    /// True when at least one review post failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.submitted + self.failed.len()
    }
}

//
// ─── COORDINATOR ───────────────────────────────────────────────────────────────
//

/// Reports session results to the remote store in two phases.
///
/// Phase 1 posts one review per outcome, all in flight at once; the server
/// must treat them as a set, not a sequence. Phase 2 posts the single
/// authoritative session close, and is attempted even when every phase-1
/// call failed: a partial outcome report is preferable to none. No
/// automatic retries; a retry policy would plug in here.
pub struct SyncCoordinator {
    reviews: Arc<dyn ReviewSink>,
    sessions: Arc<dyn SessionCloser>,
}

impl SyncCoordinator {
    #[must_use]
    pub fn new(reviews: Arc<dyn ReviewSink>, sessions: Arc<dyn SessionCloser>) -> Self {
        Self { reviews, sessions }
    }

    /// Run both submission phases for a finished session.
    ///
    /// Callers invoke this at most once per session; the session-end
    /// request is issued exactly once per call.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::SessionEnd` when the phase-2 close fails.
    /// Phase-1 failures never error; they are collected into the report's
    /// `failed` list for the caller to surface.
    pub async fn submit(
        &self,
        session_id: SessionId,
        outcomes: &[ItemOutcome],
        summary: &SessionSummary,
    ) -> Result<SubmissionReport, SyncError> {
        let posts = outcomes.iter().map(|outcome| {
            let reviews = Arc::clone(&self.reviews);
            let word_id = outcome.word_id;
            let correct = outcome.correct;
            async move {
                let result = reviews.submit_review(session_id, word_id, correct).await;
                (word_id, result)
            }
        });

        let mut failed = Vec::new();
        for (word_id, result) in join_all(posts).await {
            if let Err(err) = result {
                warn!(%session_id, %word_id, error = %err, "review submission failed");
                failed.push(word_id);
            }
        }

        self.sessions
            .end_session(session_id, Some(summary))
            .await
            .map_err(SyncError::SessionEnd)?;

        let submitted = outcomes.len() - failed.len();
        info!(
            %session_id,
            submitted,
            failed = failed.len(),
            "session closed"
        );

        Ok(SubmissionReport {
            submitted,
            failed,
            session_ended: true,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
