#![forbid(unsafe_code)]

pub mod activity;
pub mod controller;
pub mod error;
pub mod loader;
pub mod outcomes;
pub mod sync;

pub use study_core::Clock;

pub use activity::{
    Activity, ActivityKind, ActivityProgress, BoardCard, BoardState, CardSide, FlashcardMachine,
    FlashcardState, MISMATCH_REVEAL_DELAY_MS, MatchingMachine, SelectOutcome,
};
pub use controller::{CloseOutcome, SessionController, SessionObserver, SessionPhase};
pub use error::{LoadError, OutcomeError, SessionError, SyncError, TransitionError};
pub use loader::{LoadedWordSet, MAX_BOARD_PAIRS, WordSetLoader};
pub use outcomes::ResultAggregator;
pub use sync::{SubmissionReport, SyncCoordinator};
