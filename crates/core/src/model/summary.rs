use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ItemOutcome;
use crate::time::seconds_between;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("a session must contain at least one item")]
    EmptySession,

    #[error("correct count ({correct}) exceeds total count ({total})")]
    CountExceedsTotal { correct: u32, total: u32 },
}

/// Aggregate score for a completed drill session.
///
/// Derived exactly once when the activity reaches its terminal state and
/// immutable afterwards. A session with zero items is an error, not a zero
/// score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    correct_count: u32,
    total_count: u32,
    score_percent: u32,
    duration_seconds: u64,
}

impl SessionSummary {
    /// Build a summary from raw counts and the session's time span.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::EmptySession` when `total_count` is zero,
    /// `CountExceedsTotal` when more correct answers than items are claimed,
    /// and `InvalidTimeRange` when `completed_at` is before `started_at`.
    pub fn from_counts(
        correct_count: u32,
        total_count: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        if total_count == 0 {
            return Err(SessionSummaryError::EmptySession);
        }
        if correct_count > total_count {
            return Err(SessionSummaryError::CountExceedsTotal {
                correct: correct_count,
                total: total_count,
            });
        }

        Ok(Self {
            correct_count,
            total_count,
            score_percent: score_percent(correct_count, total_count),
            duration_seconds: seconds_between(started_at, completed_at),
        })
    }

    /// Build a summary by counting correct outcomes against a known total.
    ///
    /// The total is supplied by the caller rather than taken from the slice:
    /// a matching board knows its pair count even when not every pair has an
    /// outcome recorded yet.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::CountExceedsTotal` if more outcomes are
    /// supplied than the total admits, plus the `from_counts` failures.
    pub fn from_outcomes(
        outcomes: &[ItemOutcome],
        total_count: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionSummaryError> {
        let recorded = u32::try_from(outcomes.len()).unwrap_or(u32::MAX);
        if recorded > total_count {
            return Err(SessionSummaryError::CountExceedsTotal {
                correct: recorded,
                total: total_count,
            });
        }

        let mut correct = 0_u32;
        for outcome in outcomes {
            if outcome.correct {
                correct = correct.saturating_add(1);
            }
        }

        Self::from_counts(correct, total_count, started_at, completed_at)
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// Rounded percentage in `0..=100`.
    #[must_use]
    pub fn score_percent(&self) -> u32 {
        self.score_percent
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.total_count - self.correct_count
    }
}

/// `round(correct / total * 100)`, half away from zero.
///
/// Callers must guarantee `total > 0`.
#[must_use]
fn score_percent(correct: u32, total: u32) -> u32 {
    // Counts are bounded by the board size, far below f64 precision limits.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = ((f64::from(correct) / f64::from(total)) * 100.0).round() as u32;
    percent
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WordId;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn summary_counts_and_scores() {
        let now = fixed_now();
        let outcomes = vec![
            ItemOutcome::new(WordId::new(1), true),
            ItemOutcome::new(WordId::new(2), true),
            ItemOutcome::new(WordId::new(3), true),
            ItemOutcome::new(WordId::new(4), false),
            ItemOutcome::new(WordId::new(5), false),
        ];

        let summary =
            SessionSummary::from_outcomes(&outcomes, 5, now, now + Duration::seconds(90)).unwrap();

        assert_eq!(summary.correct_count(), 3);
        assert_eq!(summary.total_count(), 5);
        assert_eq!(summary.score_percent(), 60);
        assert_eq!(summary.incorrect_count(), 2);
        assert_eq!(summary.duration_seconds(), 90);
    }

    #[test]
    fn empty_session_is_an_error_not_a_zero_score() {
        let now = fixed_now();
        let err = SessionSummary::from_outcomes(&[], 0, now, now).unwrap_err();
        assert!(matches!(err, SessionSummaryError::EmptySession));
    }

    #[test]
    fn completed_before_started_is_rejected() {
        let now = fixed_now();
        let err = SessionSummary::from_counts(1, 2, now, now - Duration::seconds(1)).unwrap_err();
        assert!(matches!(err, SessionSummaryError::InvalidTimeRange));
    }

    #[test]
    fn more_correct_than_total_is_rejected() {
        let now = fixed_now();
        let err = SessionSummary::from_counts(3, 2, now, now).unwrap_err();
        assert!(matches!(
            err,
            SessionSummaryError::CountExceedsTotal { correct: 3, total: 2 }
        ));
    }

    #[test]
    fn more_outcomes_than_total_is_rejected() {
        let now = fixed_now();
        let outcomes = vec![
            ItemOutcome::new(WordId::new(1), false),
            ItemOutcome::new(WordId::new(2), false),
        ];
        let err = SessionSummary::from_outcomes(&outcomes, 1, now, now).unwrap_err();
        assert!(matches!(err, SessionSummaryError::CountExceedsTotal { .. }));
    }

    #[test]
    fn score_rounds_half_up() {
        let now = fixed_now();
        // 1/3 = 33.33 -> 33, 2/3 = 66.67 -> 67, 1/8 = 12.5 -> 13
        assert_eq!(
            SessionSummary::from_counts(1, 3, now, now).unwrap().score_percent(),
            33
        );
        assert_eq!(
            SessionSummary::from_counts(2, 3, now, now).unwrap().score_percent(),
            67
        );
        assert_eq!(
            SessionSummary::from_counts(1, 8, now, now).unwrap().score_percent(),
            13
        );
    }

    #[test]
    fn fewer_outcomes_than_total_still_summarizes() {
        // An abandoned flashcard run: three answered out of five planned.
        let now = fixed_now();
        let outcomes = vec![
            ItemOutcome::new(WordId::new(1), true),
            ItemOutcome::new(WordId::new(2), false),
            ItemOutcome::new(WordId::new(3), true),
        ];
        let summary = SessionSummary::from_outcomes(&outcomes, 5, now, now).unwrap();
        assert_eq!(summary.correct_count(), 2);
        assert_eq!(summary.total_count(), 5);
        assert_eq!(summary.score_percent(), 40);
    }
}
