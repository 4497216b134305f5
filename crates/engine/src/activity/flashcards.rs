use study_core::model::{ItemOutcome, WordItem};

use crate::activity::ActivityProgress;
use crate::error::{LoadError, TransitionError};

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

/// Closed state space of the flashcard drill.
///
/// `Presenting` shows the front face with answering disabled; `Revealed`
/// shows the back face with answering enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashcardState {
    Presenting(usize),
    Revealed(usize),
    Finished,
}

//
// ─── MACHINE ───────────────────────────────────────────────────────────────────
//

/// Steps through the shuffled word list one card at a time.
///
/// Each card yields exactly one outcome, in presentation order; answering
/// the last card finishes the drill.
#[derive(Debug)]
pub struct FlashcardMachine {
    items: Vec<WordItem>,
    state: FlashcardState,
}

impl FlashcardMachine {
    /// Create a drill over the prepared word list.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::EmptyWordSet` if no words are provided.
    pub fn new(items: Vec<WordItem>) -> Result<Self, LoadError> {
        if items.is_empty() {
            return Err(LoadError::EmptyWordSet);
        }
        Ok(Self {
            items,
            state: FlashcardState::Presenting(0),
        })
    }

    #[must_use]
    pub fn state(&self) -> FlashcardState {
        self.state
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, FlashcardState::Finished)
    }

    #[must_use]
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// The card currently shown, if the drill is still running.
    #[must_use]
    pub fn current_item(&self) -> Option<&WordItem> {
        match self.state {
            FlashcardState::Presenting(i) | FlashcardState::Revealed(i) => self.items.get(i),
            FlashcardState::Finished => None,
        }
    }

    /// Number of cards already answered.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        match self.state {
            FlashcardState::Presenting(i) | FlashcardState::Revealed(i) => i,
            FlashcardState::Finished => self.items.len(),
        }
    }

    #[must_use]
    pub fn progress(&self) -> ActivityProgress {
        let position = match self.state {
            FlashcardState::Presenting(i) | FlashcardState::Revealed(i) => i + 1,
            FlashcardState::Finished => self.items.len(),
        };
        ActivityProgress {
            position,
            total: self.items.len(),
            is_finished: self.is_finished(),
        }
    }

    /// Reveal the current card's back face.
    ///
    /// Re-flipping an already revealed card is a visual toggle only and
    /// leaves answering enabled, so it is a no-op here.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::AlreadyFinished` after the last answer.
    pub fn flip(&mut self) -> Result<(), TransitionError> {
        match self.state {
            FlashcardState::Presenting(i) => {
                self.state = FlashcardState::Revealed(i);
                Ok(())
            }
            FlashcardState::Revealed(_) => Ok(()),
            FlashcardState::Finished => Err(TransitionError::AlreadyFinished),
        }
    }

    /// Record the user's self-assessment for the revealed card and advance.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::AnswerBeforeReveal` while the front face is
    /// showing, and `AlreadyFinished` once the drill is over. A rejected
    /// answer records nothing and loses nothing.
    pub fn answer(&mut self, correct: bool) -> Result<ItemOutcome, TransitionError> {
        match self.state {
            FlashcardState::Revealed(i) => {
                let outcome = ItemOutcome::new(self.items[i].id(), correct);
                let next = i + 1;
                self.state = if next == self.items.len() {
                    FlashcardState::Finished
                } else {
                    FlashcardState::Presenting(next)
                };
                Ok(outcome)
            }
            FlashcardState::Presenting(_) => Err(TransitionError::AnswerBeforeReveal),
            FlashcardState::Finished => Err(TransitionError::AlreadyFinished),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::WordId;

    fn build_words(count: u64) -> Vec<WordItem> {
        (1..=count)
            .map(|id| WordItem::new(WordId::new(id), format!("w{id}"), format!("t{id}"), "").unwrap())
            .collect()
    }

    #[test]
    fn starts_presenting_the_first_card() {
        let machine = FlashcardMachine::new(build_words(3)).unwrap();
        assert_eq!(machine.state(), FlashcardState::Presenting(0));
        assert_eq!(machine.current_item().unwrap().id(), WordId::new(1));
        assert_eq!(machine.progress().position, 1);
        assert_eq!(machine.progress().total, 3);
    }

    #[test]
    fn empty_word_list_is_rejected() {
        let err = FlashcardMachine::new(Vec::new()).unwrap_err();
        assert!(matches!(err, LoadError::EmptyWordSet));
    }

    #[test]
    fn answer_before_flip_is_rejected_without_losing_state() {
        let mut machine = FlashcardMachine::new(build_words(2)).unwrap();

        let err = machine.answer(true).unwrap_err();
        assert!(matches!(err, TransitionError::AnswerBeforeReveal));
        assert_eq!(machine.state(), FlashcardState::Presenting(0));
    }

    #[test]
    fn flip_reveals_and_re_flip_is_a_no_op() {
        let mut machine = FlashcardMachine::new(build_words(2)).unwrap();

        machine.flip().unwrap();
        assert_eq!(machine.state(), FlashcardState::Revealed(0));

        machine.flip().unwrap();
        assert_eq!(machine.state(), FlashcardState::Revealed(0));
        assert!(machine.answer(true).is_ok());
    }

    #[test]
    fn answering_advances_in_presentation_order_and_finishes() {
        let mut machine = FlashcardMachine::new(build_words(3)).unwrap();
        let mut outcomes = Vec::new();

        for correct in [true, false, true] {
            machine.flip().unwrap();
            outcomes.push(machine.answer(correct).unwrap());
        }

        assert!(machine.is_finished());
        assert_eq!(machine.current_item(), None);
        let ids: Vec<u64> = outcomes.iter().map(|o| o.word_id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(
            outcomes.iter().filter(|o| o.correct).count(),
            2
        );
    }

    #[test]
    fn events_after_finish_are_rejected() {
        let mut machine = FlashcardMachine::new(build_words(1)).unwrap();
        machine.flip().unwrap();
        machine.answer(true).unwrap();

        assert!(matches!(
            machine.flip().unwrap_err(),
            TransitionError::AlreadyFinished
        ));
        assert!(matches!(
            machine.answer(false).unwrap_err(),
            TransitionError::AlreadyFinished
        ));
    }

    #[test]
    fn progress_tracks_the_presented_card() {
        let mut machine = FlashcardMachine::new(build_words(2)).unwrap();
        assert_eq!(machine.answered_count(), 0);

        machine.flip().unwrap();
        machine.answer(false).unwrap();
        assert_eq!(machine.answered_count(), 1);
        assert_eq!(machine.progress().position, 2);

        machine.flip().unwrap();
        machine.answer(true).unwrap();
        assert_eq!(machine.answered_count(), 2);
        assert!(machine.progress().is_finished);
    }
}
