use std::sync::Arc;

use tracing::{debug, info};

use client::Portal;
use study_core::Clock;
use study_core::model::{SessionDescriptor, SessionSummary};

use crate::activity::{Activity, ActivityKind, ActivityProgress, SelectOutcome};
use crate::error::{SessionError, SyncError};
use crate::loader::WordSetLoader;
use crate::outcomes::ResultAggregator;
use crate::sync::SyncCoordinator;

//
// ─── LIFECYCLE ─────────────────────────────────────────────────────────────────
//

/// Why a session reached `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Completed,
    Abandoned,
    Errored,
}

/// Session lifecycle. `Closed` is terminal; `Active` is never re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    Active,
    Summarizing,
    Syncing,
    Closed(CloseOutcome),
}

/// Callbacks the host renders. All methods default to no-ops.
pub trait SessionObserver: Send + Sync {
    fn on_phase_change(&self, _phase: &SessionPhase) {}
    fn on_finished(&self, _summary: &SessionSummary) {}
    fn on_error(&self, _error: &SessionError) {}
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Orchestrates one drill session end to end.
///
/// Drives `Idle → Loading → Active → Summarizing → Syncing → Closed`,
/// owning the activity and the aggregator for exactly one run. Submission
/// errors are surfaced to the host but never hide the score.
pub struct SessionController {
    descriptor: SessionDescriptor,
    portal: Portal,
    clock: Clock,
    observer: Option<Arc<dyn SessionObserver>>,
    phase: SessionPhase,
    activity: Option<Activity>,
    aggregator: Option<ResultAggregator>,
    group_name: Option<String>,
    summary: Option<SessionSummary>,
}

impl SessionController {
    #[must_use]
    pub fn new(descriptor: SessionDescriptor, portal: Portal, clock: Clock) -> Self {
        Self {
            descriptor,
            portal,
            clock,
            observer: None,
            phase: SessionPhase::Idle,
            activity: None,
            aggregator: None,
            group_name: None,
            summary: None,
        }
    }

    /// Build a controller from the host's raw launch parameters.
    ///
    /// This is the precondition gate: nothing else runs until both ids
    /// parse.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Precondition` when either parameter is
    /// missing or invalid.
    pub fn from_params(
        session_id: Option<&str>,
        group_id: Option<&str>,
        portal: Portal,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        let descriptor = SessionDescriptor::from_params(session_id, group_id)?;
        Ok(Self::new(descriptor, portal, clock))
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn descriptor(&self) -> SessionDescriptor {
        self.descriptor
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }

    /// The derived summary, available from `Summarizing` onwards.
    #[must_use]
    pub fn summary(&self) -> Option<SessionSummary> {
        self.summary
    }

    #[must_use]
    pub fn progress(&self) -> Option<ActivityProgress> {
        self.activity.as_ref().map(Activity::progress)
    }

    /// The flashcard currently shown, during a flashcard drill.
    #[must_use]
    pub fn current_item(&self) -> Option<&study_core::model::WordItem> {
        match &self.activity {
            Some(Activity::Flashcards(machine)) => machine.current_item(),
            _ => None,
        }
    }

    /// The matching board, during a matching drill.
    #[must_use]
    pub fn board(&self) -> Option<&[crate::activity::BoardCard]> {
        match &self.activity {
            Some(Activity::Matching(machine)) => Some(machine.cards()),
            _ => None,
        }
    }

    /// Seconds the matching drill timer has counted so far.
    #[must_use]
    pub fn elapsed_seconds(&self) -> Option<u64> {
        match &self.activity {
            Some(Activity::Matching(machine)) => Some(machine.elapsed_seconds()),
            _ => None,
        }
    }

    /// Load the word set and enter `Active` with the requested drill.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the controller is
    /// `Idle`. Load failures close the session (`Closed(Errored)`) without
    /// it ever becoming active, and are also delivered to the observer.
    pub async fn start(&mut self, kind: ActivityKind) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        self.set_phase(SessionPhase::Loading);

        let loader = WordSetLoader::new(Arc::clone(&self.portal.words));
        let set = match loader.load(self.descriptor.group_id(), kind).await {
            Ok(set) => set,
            Err(err) => return Err(self.close_with_load_error(err.into())),
        };
        self.group_name = set.group_name;

        let activity = match Activity::new(kind, set.words) {
            Ok(activity) => activity,
            Err(err) => return Err(self.close_with_load_error(err.into())),
        };

        let total = u32::try_from(activity.total_items()).unwrap_or(u32::MAX);
        self.aggregator = Some(ResultAggregator::new(total, self.clock.now()));
        self.activity = Some(activity);
        self.set_phase(SessionPhase::Active);
        Ok(())
    }

    /// Reveal the current flashcard.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside `Active`,
    /// `WrongActivity` during a matching drill, and transition errors from
    /// the machine. Rejected events never corrupt recorded outcomes.
    pub fn flip(&mut self) -> Result<(), SessionError> {
        let machine = self.flashcards_mut()?;
        machine.flip().map_err(|err| {
            debug!(error = %err, "flip rejected");
            SessionError::Transition(err)
        })
    }

    /// Answer the revealed flashcard; finishing the last card runs the
    /// summary and submission phases before returning.
    ///
    /// # Errors
    ///
    /// Transition errors as for `flip`; submission failures surface as
    /// `SessionError::Sync` after the session has closed.
    pub async fn answer(&mut self, correct: bool) -> Result<(), SessionError> {
        let machine = self.flashcards_mut()?;
        let outcome = machine.answer(correct).map_err(|err| {
            debug!(error = %err, "answer rejected");
            SessionError::Transition(err)
        })?;
        let finished = machine.is_finished();

        self.aggregator
            .as_mut()
            .ok_or(SessionError::NotActive)?
            .record(outcome)?;

        if finished {
            self.finalize(CloseOutcome::Completed).await?;
        }
        Ok(())
    }

    /// Select a board card; matching the last pair runs the summary and
    /// submission phases before returning.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` / `WrongActivity` for misrouted
    /// events; submission failures surface as `SessionError::Sync`.
    pub async fn select_card(&mut self, index: usize) -> Result<SelectOutcome, SessionError> {
        let machine = self.matching_mut()?;
        let outcome = machine.select_card(index);

        if matches!(outcome, SelectOutcome::Matched { finished: true }) {
            self.finalize(CloseOutcome::Completed).await?;
        }
        Ok(outcome)
    }

    /// Turn a mismatched pair back down after the reveal delay.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` / `WrongActivity` for misrouted
    /// events.
    pub fn resolve_mismatch(&mut self) -> Result<(), SessionError> {
        self.matching_mut()?.resolve_mismatch();
        Ok(())
    }

    /// Advance the matching drill timer by one second.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` / `WrongActivity` for misrouted
    /// events.
    pub fn tick(&mut self) -> Result<(), SessionError> {
        self.matching_mut()?.tick();
        Ok(())
    }

    /// Close the session before the drill finishes.
    ///
    /// Matching reports every pair with its current matched flag (unmatched
    /// pairs as incorrect); flashcards report the answers given so far
    /// against the planned total. Submission then runs as usual.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside `Active`; submission
    /// failures surface as `SessionError::Sync`.
    pub async fn abandon(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Active {
            return Err(SessionError::NotActive);
        }
        self.finalize(CloseOutcome::Abandoned).await
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
        if let Some(observer) = &self.observer {
            observer.on_phase_change(&phase);
        }
    }

    fn report(&self, error: &SessionError) {
        if let Some(observer) = &self.observer {
            observer.on_error(error);
        }
    }

    fn close_with_load_error(&mut self, err: SessionError) -> SessionError {
        self.report(&err);
        self.set_phase(SessionPhase::Closed(CloseOutcome::Errored));
        err
    }

    fn flashcards_mut(&mut self) -> Result<&mut crate::activity::FlashcardMachine, SessionError> {
        if self.phase != SessionPhase::Active {
            return Err(SessionError::NotActive);
        }
        match self.activity.as_mut() {
            Some(Activity::Flashcards(machine)) => Ok(machine),
            Some(Activity::Matching(_)) => Err(SessionError::WrongActivity),
            None => Err(SessionError::NotActive),
        }
    }

    fn matching_mut(&mut self) -> Result<&mut crate::activity::MatchingMachine, SessionError> {
        if self.phase != SessionPhase::Active {
            return Err(SessionError::NotActive);
        }
        match self.activity.as_mut() {
            Some(Activity::Matching(machine)) => Ok(machine),
            Some(Activity::Flashcards(_)) => Err(SessionError::WrongActivity),
            None => Err(SessionError::NotActive),
        }
    }

    /// Derive the summary and run the two-phase submission.
    ///
    /// The activity is consumed here: its state ends with the session.
    async fn finalize(&mut self, close: CloseOutcome) -> Result<(), SessionError> {
        self.set_phase(SessionPhase::Summarizing);

        let activity = self.activity.take().ok_or(SessionError::NotActive)?;
        let mut aggregator = self.aggregator.take().ok_or(SessionError::NotActive)?;

        // Matching records lazily: one outcome per pair, drained at the end.
        if let Activity::Matching(machine) = &activity {
            aggregator.record_all(machine.outcomes())?;
        }
        drop(activity);

        let summary = aggregator.finish(self.clock.now())?;
        self.summary = Some(summary);
        if let Some(observer) = &self.observer {
            observer.on_finished(&summary);
        }

        self.set_phase(SessionPhase::Syncing);
        let coordinator = SyncCoordinator::new(
            Arc::clone(&self.portal.reviews),
            Arc::clone(&self.portal.sessions),
        );
        let session_id = self.descriptor.session_id();
        match coordinator
            .submit(session_id, aggregator.outcomes(), &summary)
            .await
        {
            Ok(report) => {
                if report.is_partial() {
                    let err = SessionError::Sync(SyncError::Partial {
                        failed: report.failed.len(),
                        total: report.total(),
                    });
                    self.report(&err);
                }
                info!(%session_id, ?close, "session closed");
                self.set_phase(SessionPhase::Closed(close));
                Ok(())
            }
            Err(err) => {
                // The drill still closes with its outcome: the summary is
                // valid and displayable even though persistence failed.
                let err = SessionError::Sync(err);
                self.report(&err);
                self.set_phase(SessionPhase::Closed(close));
                Err(err)
            }
        }
    }
}
