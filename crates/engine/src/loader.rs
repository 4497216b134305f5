use std::sync::Arc;

use rand::rng;
use rand::seq::SliceRandom;
use tracing::debug;

use client::WordProvider;
use study_core::model::{GroupId, WordItem};

use crate::activity::ActivityKind;
use crate::error::LoadError;

/// Upper bound on a matching board: 8 pairs, 16 cards.
pub const MAX_BOARD_PAIRS: usize = 8;

const FLASHCARD_FETCH_LIMIT: u32 = 100;
const MATCHING_FETCH_LIMIT: u32 = 20;

/// The prepared item pool for one session.
#[derive(Debug, Clone)]
pub struct LoadedWordSet {
    pub words: Vec<WordItem>,
    pub group_name: Option<String>,
}

/// Fetches and prepares the word set a drill runs against.
///
/// Words are shuffled once, independent of server order; the shuffle is
/// never re-triggered mid-session.
pub struct WordSetLoader {
    words: Arc<dyn WordProvider>,
}

impl WordSetLoader {
    #[must_use]
    pub fn new(words: Arc<dyn WordProvider>) -> Self {
        Self { words }
    }

    /// Load, validate, and shuffle the group's words for the given drill.
    ///
    /// The group display name is best-effort: a metadata failure is logged
    /// and the session proceeds without it. No retries at this layer.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Api` when the word fetch fails,
    /// `LoadError::EmptyWordSet` when the group has no words, and
    /// `LoadError::NotEnoughWords` when a matching board cannot seat a
    /// single pair.
    pub async fn load(
        &self,
        group_id: GroupId,
        kind: ActivityKind,
    ) -> Result<LoadedWordSet, LoadError> {
        let per_page = match kind {
            ActivityKind::Flashcards => FLASHCARD_FETCH_LIMIT,
            ActivityKind::Matching => MATCHING_FETCH_LIMIT,
        };

        let mut words = self.words.fetch_words(group_id, per_page).await?;
        if words.is_empty() {
            return Err(LoadError::EmptyWordSet);
        }
        if kind == ActivityKind::Matching && words.len() < 2 {
            return Err(LoadError::NotEnoughWords { found: words.len() });
        }

        let mut rng = rng();
        words.as_mut_slice().shuffle(&mut rng);
        if kind == ActivityKind::Matching {
            // Cap after the shuffle so the seated subset is also random.
            words.truncate(MAX_BOARD_PAIRS);
        }

        let group_name = match self.words.fetch_group_name(group_id).await {
            Ok(name) => Some(name),
            Err(err) => {
                debug!(%group_id, error = %err, "group name unavailable");
                None
            }
        };

        Ok(LoadedWordSet { words, group_name })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use client::{ApiError, InMemoryPortal};
    use study_core::model::WordId;

    fn build_word(id: u64) -> WordItem {
        WordItem::new(WordId::new(id), format!("w{id}"), format!("t{id}"), "").unwrap()
    }

    fn seeded_portal(group: GroupId, count: u64) -> InMemoryPortal {
        let portal = InMemoryPortal::new();
        portal.insert_words(group, (1..=count).map(build_word).collect());
        portal
    }

    #[tokio::test]
    async fn flashcards_load_all_words_shuffled() {
        let group = GroupId::new(1);
        let portal = seeded_portal(group, 12);
        portal.insert_group_name(group, "Basics");
        let loader = WordSetLoader::new(Arc::new(portal));

        let set = loader.load(group, ActivityKind::Flashcards).await.unwrap();

        assert_eq!(set.words.len(), 12);
        assert_eq!(set.group_name.as_deref(), Some("Basics"));
        let mut ids: Vec<u64> = set.words.iter().map(|w| w.id().value()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn matching_caps_the_board_at_eight_pairs() {
        let group = GroupId::new(1);
        let loader = WordSetLoader::new(Arc::new(seeded_portal(group, 15)));

        let set = loader.load(group, ActivityKind::Matching).await.unwrap();

        assert_eq!(set.words.len(), MAX_BOARD_PAIRS);
    }

    #[tokio::test]
    async fn empty_group_aborts_the_session() {
        let group = GroupId::new(1);
        let portal = InMemoryPortal::new();
        portal.insert_words(group, Vec::new());
        let loader = WordSetLoader::new(Arc::new(portal));

        let err = loader.load(group, ActivityKind::Flashcards).await.unwrap_err();
        assert!(matches!(err, LoadError::EmptyWordSet));
    }

    #[tokio::test]
    async fn matching_needs_at_least_one_pair() {
        let group = GroupId::new(1);
        let loader = WordSetLoader::new(Arc::new(seeded_portal(group, 1)));

        let err = loader.load(group, ActivityKind::Matching).await.unwrap_err();
        assert!(matches!(err, LoadError::NotEnoughWords { found: 1 }));
    }

    #[tokio::test]
    async fn fetch_failure_is_fatal() {
        let group = GroupId::new(1);
        let portal = seeded_portal(group, 5);
        portal.fail_word_fetch(true);
        let loader = WordSetLoader::new(Arc::new(portal));

        let err = loader.load(group, ActivityKind::Flashcards).await.unwrap_err();
        assert!(matches!(err, LoadError::Api(ApiError::Connection(_))));
    }

    #[tokio::test]
    async fn missing_group_name_is_not_fatal() {
        let group = GroupId::new(1);
        let loader = WordSetLoader::new(Arc::new(seeded_portal(group, 3)));

        let set = loader.load(group, ActivityKind::Flashcards).await.unwrap();
        assert!(set.group_name.is_none());
        assert_eq!(set.words.len(), 3);
    }
}
