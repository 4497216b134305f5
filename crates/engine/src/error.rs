//! Shared error types for the engine crate.

use thiserror::Error;

use client::ApiError;
use study_core::model::{LaunchParamError, SessionSummaryError, WordId};

/// Errors emitted by `WordSetLoader`. All are fatal; no session starts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("no words available in this group")]
    EmptyWordSet,

    #[error("a matching board needs at least 2 words, got {found}")]
    NotEnoughWords { found: usize },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Rejected state-machine events.
///
/// These are engine misuse, not crashes: the event is dropped, the session
/// continues, and no outcome is recorded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("answer dispatched before the card was revealed")]
    AnswerBeforeReveal,

    #[error("the activity is already finished")]
    AlreadyFinished,
}

/// Violations of the one-outcome-per-word contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OutcomeError {
    #[error("outcome for word {word_id} was already recorded")]
    Duplicate { word_id: WordId },

    #[error("more outcomes recorded than session items")]
    Overflow,

    #[error("summary already derived for this session")]
    AlreadyFinished,

    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}

/// Failures in the two-phase submission protocol.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    /// One or more phase-1 review posts failed. Non-fatal: the session
    /// still closes and the summary stays available.
    #[error("{failed} of {total} review submissions failed")]
    Partial { failed: usize, total: usize },

    /// The phase-2 close failed. Fatal for persistence; the in-memory
    /// summary remains valid.
    #[error("session end request failed")]
    SessionEnd(#[source] ApiError),
}

/// Errors emitted by the session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Precondition(#[from] LaunchParamError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Outcome(#[from] OutcomeError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("session already started")]
    AlreadyStarted,

    #[error("no activity is running")]
    NotActive,

    #[error("event does not apply to the active drill variant")]
    WrongActivity,
}
