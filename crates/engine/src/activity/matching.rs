use rand::rng;
use rand::seq::SliceRandom;

use study_core::model::{ItemOutcome, WordId, WordItem};

use crate::activity::ActivityProgress;
use crate::error::LoadError;

/// Fixed delay before a mismatched pair is turned face-down again.
pub const MISMATCH_REVEAL_DELAY_MS: u64 = 1_000;

//
// ─── BOARD CARDS ───────────────────────────────────────────────────────────────
//

/// Which face of a word a board card carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSide {
    Native,
    Translation,
}

/// One card on the matching board.
#[derive(Debug, Clone)]
pub struct BoardCard {
    word_id: WordId,
    side: CardSide,
    text: String,
    face_up: bool,
    matched: bool,
}

impl BoardCard {
    fn new(word_id: WordId, side: CardSide, text: String) -> Self {
        Self {
            word_id,
            side,
            text,
            face_up: false,
            matched: false,
        }
    }

    #[must_use]
    pub fn word_id(&self) -> WordId {
        self.word_id
    }

    #[must_use]
    pub fn side(&self) -> CardSide {
        self.side
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_face_up(&self) -> bool {
        self.face_up
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.matched
    }
}

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

/// Closed state space of the matching board.
///
/// `Locked` is the comparison gate: while two cards are face-up being
/// compared, further selections are ignored. It is left on every exit
/// path, immediately on a match and via `resolve_mismatch` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardState {
    Idle,
    OneSelected(usize),
    Locked { first: usize, second: usize },
    Finished,
}

/// What a `select_card` dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The event was dropped: board locked, card out of range, already
    /// face-up, or already matched.
    Ignored,
    /// First card of a prospective pair turned face-up.
    Selected,
    /// The pair matched and stays face-up permanently.
    Matched { finished: bool },
    /// The pair did not match; the board is locked until the host calls
    /// `resolve_mismatch` after the reveal delay.
    Mismatch,
}

//
// ─── MACHINE ───────────────────────────────────────────────────────────────────
//

/// Pair-matching drill over a board of `2 × pairs` shuffled cards.
///
/// Pair results are kept lazily: every word starts as unmatched and flips
/// to matched at most once, so `outcomes` always yields exactly one entry
/// per pair regardless of when the session ends.
#[derive(Debug)]
pub struct MatchingMachine {
    cards: Vec<BoardCard>,
    pairs: Vec<(WordId, bool)>,
    state: BoardState,
    matched_pairs: usize,
    elapsed_seconds: u64,
}

impl MatchingMachine {
    /// Build and shuffle the board from the prepared word list.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::NotEnoughWords` when fewer than two words are
    /// provided; a board needs at least one pair to compare against another
    /// card.
    pub fn new(words: &[WordItem]) -> Result<Self, LoadError> {
        if words.len() < 2 {
            return Err(LoadError::NotEnoughWords { found: words.len() });
        }

        let mut cards: Vec<BoardCard> = words
            .iter()
            .flat_map(|word| {
                [
                    BoardCard::new(word.id(), CardSide::Native, word.native_text().to_owned()),
                    BoardCard::new(
                        word.id(),
                        CardSide::Translation,
                        word.translation().to_owned(),
                    ),
                ]
            })
            .collect();

        let mut rng = rng();
        cards.as_mut_slice().shuffle(&mut rng);

        Ok(Self {
            cards,
            pairs: words.iter().map(|word| (word.id(), false)).collect(),
            state: BoardState::Idle,
            matched_pairs: 0,
            elapsed_seconds: 0,
        })
    }

    #[must_use]
    pub fn state(&self) -> BoardState {
        self.state
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, BoardState::Finished)
    }

    #[must_use]
    pub fn cards(&self) -> &[BoardCard] {
        &self.cards
    }

    #[must_use]
    pub fn total_pairs(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn progress(&self) -> ActivityProgress {
        ActivityProgress {
            position: self.matched_pairs,
            total: self.pairs.len(),
            is_finished: self.is_finished(),
        }
    }

    /// Advance the running drill timer by one second.
    ///
    /// Stops counting once the board is finished.
    pub fn tick(&mut self) {
        if !self.is_finished() {
            self.elapsed_seconds += 1;
        }
    }

    /// Turn a card face-up and, with a second card showing, evaluate the
    /// pair: a match needs the same word on opposite sides.
    pub fn select_card(&mut self, index: usize) -> SelectOutcome {
        if matches!(self.state, BoardState::Locked { .. } | BoardState::Finished) {
            return SelectOutcome::Ignored;
        }
        let Some(card) = self.cards.get(index) else {
            return SelectOutcome::Ignored;
        };
        if card.face_up || card.matched {
            return SelectOutcome::Ignored;
        }

        match self.state {
            BoardState::Idle => {
                self.cards[index].face_up = true;
                self.state = BoardState::OneSelected(index);
                SelectOutcome::Selected
            }
            BoardState::OneSelected(first) => {
                self.cards[index].face_up = true;
                let is_match = self.cards[first].word_id == self.cards[index].word_id
                    && self.cards[first].side != self.cards[index].side;

                if is_match {
                    self.cards[first].matched = true;
                    self.cards[index].matched = true;
                    self.mark_pair_matched(self.cards[index].word_id);

                    if self.matched_pairs == self.pairs.len() {
                        self.state = BoardState::Finished;
                        SelectOutcome::Matched { finished: true }
                    } else {
                        self.state = BoardState::Idle;
                        SelectOutcome::Matched { finished: false }
                    }
                } else {
                    self.state = BoardState::Locked {
                        first,
                        second: index,
                    };
                    SelectOutcome::Mismatch
                }
            }
            BoardState::Locked { .. } | BoardState::Finished => SelectOutcome::Ignored,
        }
    }

    /// Turn a mismatched pair face-down and release the board.
    ///
    /// Called by the host once the reveal delay elapses. A no-op unless the
    /// board is locked, so stray timer callbacks cannot lose state.
    pub fn resolve_mismatch(&mut self) {
        if let BoardState::Locked { first, second } = self.state {
            self.cards[first].face_up = false;
            self.cards[second].face_up = false;
            self.state = BoardState::Idle;
        }
    }

    /// One outcome per pair, in board word order: matched pairs are
    /// correct, pairs never matched are incorrect.
    #[must_use]
    pub fn outcomes(&self) -> Vec<ItemOutcome> {
        self.pairs
            .iter()
            .map(|&(word_id, matched)| ItemOutcome::new(word_id, matched))
            .collect()
    }

    fn mark_pair_matched(&mut self, word_id: WordId) {
        if let Some(pair) = self.pairs.iter_mut().find(|(id, _)| *id == word_id) {
            if !pair.1 {
                pair.1 = true;
                self.matched_pairs += 1;
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn build_words(count: u64) -> Vec<WordItem> {
        (1..=count)
            .map(|id| WordItem::new(WordId::new(id), format!("w{id}"), format!("t{id}"), "").unwrap())
            .collect()
    }

    /// Board index of the given word's card on the given side; shuffle-proof.
    fn find_card(machine: &MatchingMachine, word: u64, side: CardSide) -> usize {
        machine
            .cards()
            .iter()
            .position(|c| c.word_id() == WordId::new(word) && c.side() == side)
            .unwrap()
    }

    fn match_pair(machine: &mut MatchingMachine, word: u64) -> SelectOutcome {
        let native = find_card(machine, word, CardSide::Native);
        assert_eq!(machine.select_card(native), SelectOutcome::Selected);
        let translation = find_card(machine, word, CardSide::Translation);
        machine.select_card(translation)
    }

    #[test]
    fn board_has_two_cards_per_word() {
        let machine = MatchingMachine::new(&build_words(4)).unwrap();
        assert_eq!(machine.cards().len(), 8);
        assert_eq!(machine.total_pairs(), 4);
        assert_eq!(machine.state(), BoardState::Idle);
    }

    #[test]
    fn one_word_is_not_a_board() {
        let err = MatchingMachine::new(&build_words(1)).unwrap_err();
        assert!(matches!(err, LoadError::NotEnoughWords { found: 1 }));
    }

    #[test]
    fn matching_needs_same_word_on_opposite_sides() {
        let mut machine = MatchingMachine::new(&build_words(3)).unwrap();

        // Same word, opposite sides: a match.
        assert_eq!(
            match_pair(&mut machine, 1),
            SelectOutcome::Matched { finished: false }
        );
        assert_eq!(machine.matched_pairs(), 1);
        assert_eq!(machine.state(), BoardState::Idle);

        // Different words: a mismatch that locks the board.
        let a = find_card(&machine, 2, CardSide::Native);
        let b = find_card(&machine, 3, CardSide::Translation);
        assert_eq!(machine.select_card(a), SelectOutcome::Selected);
        assert_eq!(machine.select_card(b), SelectOutcome::Mismatch);
        assert!(matches!(machine.state(), BoardState::Locked { .. }));
    }

    #[test]
    fn same_word_same_side_never_happens_on_a_real_board() {
        // The second card of the same word on the same side does not exist,
        // so the closest misuse is re-selecting the face-up card.
        let mut machine = MatchingMachine::new(&build_words(2)).unwrap();
        let native = find_card(&machine, 1, CardSide::Native);

        assert_eq!(machine.select_card(native), SelectOutcome::Selected);
        assert_eq!(machine.select_card(native), SelectOutcome::Ignored);
        assert_eq!(machine.state(), BoardState::OneSelected(native));
    }

    #[test]
    fn selections_are_ignored_while_locked() {
        let mut machine = MatchingMachine::new(&build_words(3)).unwrap();
        let a = find_card(&machine, 1, CardSide::Native);
        let b = find_card(&machine, 2, CardSide::Translation);
        let c = find_card(&machine, 3, CardSide::Native);

        machine.select_card(a);
        assert_eq!(machine.select_card(b), SelectOutcome::Mismatch);
        assert_eq!(machine.select_card(c), SelectOutcome::Ignored);
        assert!(!machine.cards()[c].is_face_up());
    }

    #[test]
    fn mismatch_reveal_reverts_and_reopens_the_board() {
        let mut machine = MatchingMachine::new(&build_words(3)).unwrap();
        let a = find_card(&machine, 1, CardSide::Native);
        let b = find_card(&machine, 2, CardSide::Translation);

        machine.select_card(a);
        machine.select_card(b);
        machine.resolve_mismatch();

        assert_eq!(machine.state(), BoardState::Idle);
        assert!(!machine.cards()[a].is_face_up());
        assert!(!machine.cards()[b].is_face_up());
    }

    #[test]
    fn repeated_mismatches_never_lose_the_board() {
        let mut machine = MatchingMachine::new(&build_words(4)).unwrap();

        for _ in 0..5 {
            let a = find_card(&machine, 1, CardSide::Native);
            let b = find_card(&machine, 2, CardSide::Translation);
            machine.select_card(a);
            assert_eq!(machine.select_card(b), SelectOutcome::Mismatch);
            machine.resolve_mismatch();
            assert_eq!(machine.state(), BoardState::Idle);
        }

        // The board still plays to completion afterwards.
        for word in 1..=4 {
            assert!(matches!(
                match_pair(&mut machine, word),
                SelectOutcome::Matched { .. }
            ));
        }
        assert!(machine.is_finished());
    }

    #[test]
    fn resolve_without_a_lock_is_a_no_op() {
        let mut machine = MatchingMachine::new(&build_words(2)).unwrap();
        machine.resolve_mismatch();
        assert_eq!(machine.state(), BoardState::Idle);

        let a = find_card(&machine, 1, CardSide::Native);
        machine.select_card(a);
        machine.resolve_mismatch();
        assert_eq!(machine.state(), BoardState::OneSelected(a));
    }

    #[test]
    fn matched_cards_stay_up_and_cannot_be_reselected() {
        let mut machine = MatchingMachine::new(&build_words(2)).unwrap();
        match_pair(&mut machine, 1);

        let native = find_card(&machine, 1, CardSide::Native);
        assert!(machine.cards()[native].is_matched());
        assert!(machine.cards()[native].is_face_up());
        assert_eq!(machine.select_card(native), SelectOutcome::Ignored);
    }

    #[test]
    fn last_pair_finishes_the_board() {
        let mut machine = MatchingMachine::new(&build_words(2)).unwrap();

        assert_eq!(
            match_pair(&mut machine, 1),
            SelectOutcome::Matched { finished: false }
        );
        assert_eq!(
            match_pair(&mut machine, 2),
            SelectOutcome::Matched { finished: true }
        );
        assert!(machine.is_finished());
        assert_eq!(machine.select_card(0), SelectOutcome::Ignored);
    }

    #[test]
    fn outcomes_cover_every_pair_exactly_once() {
        let mut machine = MatchingMachine::new(&build_words(3)).unwrap();
        match_pair(&mut machine, 2);

        let outcomes = machine.outcomes();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes.iter().filter(|o| o.correct).count(),
            1
        );
        assert!(
            outcomes
                .iter()
                .find(|o| o.word_id == WordId::new(2))
                .unwrap()
                .correct
        );
    }

    #[test]
    fn tick_counts_only_while_running() {
        let mut machine = MatchingMachine::new(&build_words(2)).unwrap();
        machine.tick();
        machine.tick();
        assert_eq!(machine.elapsed_seconds(), 2);

        match_pair(&mut machine, 1);
        match_pair(&mut machine, 2);
        assert!(machine.is_finished());

        machine.tick();
        assert_eq!(machine.elapsed_seconds(), 2);
    }
}
