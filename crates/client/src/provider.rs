use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use study_core::model::{GroupId, SessionId, SessionSummary, WordId, WordItem};

/// Errors surfaced by remote-portal adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Read side of the portal: the word set and group metadata.
#[async_trait]
pub trait WordProvider: Send + Sync {
    /// Fetch the member words of a group, up to `per_page` items.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown groups, or other transport
    /// errors. An existing but empty group yields an empty vec; rejecting
    /// that is the caller's concern.
    async fn fetch_words(&self, group_id: GroupId, per_page: u32)
        -> Result<Vec<WordItem>, ApiError>;

    /// Fetch the group's display name. Best effort; callers may proceed
    /// without it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the group metadata cannot be read.
    async fn fetch_group_name(&self, group_id: GroupId) -> Result<String, ApiError>;
}

/// Write side of the portal: one review record per outcome.
///
/// Idempotency is not assumed; submitting the same word twice may
/// double-count, so callers submit at most once per word per session.
#[async_trait]
pub trait ReviewSink: Send + Sync {
    /// Record one word's result against the session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the record could not be stored.
    async fn submit_review(
        &self,
        session_id: SessionId,
        word_id: WordId,
        correct: bool,
    ) -> Result<(), ApiError>;
}

/// The authoritative close signal for a session.
#[async_trait]
pub trait SessionCloser: Send + Sync {
    /// Mark the session finished, optionally attaching the summary.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the session store rejected the close.
    async fn end_session(
        &self,
        session_id: SessionId,
        summary: Option<&SessionSummary>,
    ) -> Result<(), ApiError>;
}

//
// ─── IN-MEMORY PORTAL ──────────────────────────────────────────────────────────
//

/// Simple in-memory portal implementation for testing and prototyping.
///
/// Clones share state, so a test can keep a handle and inspect what the
/// engine submitted. The `fail_*` knobs inject failures for the
/// partial-submission and sync-error paths.
#[derive(Clone, Default)]
pub struct InMemoryPortal {
    words: Arc<Mutex<HashMap<GroupId, Vec<WordItem>>>>,
    group_names: Arc<Mutex<HashMap<GroupId, String>>>,
    reviews: Arc<Mutex<Vec<(SessionId, WordId, bool)>>>,
    ended: Arc<Mutex<Vec<(SessionId, Option<SessionSummary>)>>>,
    failing_reviews: Arc<Mutex<HashSet<WordId>>>,
    fail_words: Arc<Mutex<bool>>,
    fail_end: Arc<Mutex<bool>>,
}

impl InMemoryPortal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a group with words.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert_words(&self, group_id: GroupId, words: Vec<WordItem>) {
        self.words.lock().expect("portal lock").insert(group_id, words);
    }

    /// Seed a group's display name.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert_group_name(&self, group_id: GroupId, name: impl Into<String>) {
        self.group_names
            .lock()
            .expect("portal lock")
            .insert(group_id, name.into());
    }

    /// Make `submit_review` fail for the given word.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_review_for(&self, word_id: WordId) {
        self.failing_reviews.lock().expect("portal lock").insert(word_id);
    }

    /// Make `fetch_words` fail with a connection error.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_word_fetch(&self, fail: bool) {
        *self.fail_words.lock().expect("portal lock") = fail;
    }

    /// Make `end_session` fail with a connection error.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_session_end(&self, fail: bool) {
        *self.fail_end.lock().expect("portal lock") = fail;
    }

    /// Reviews recorded so far, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn submitted_reviews(&self) -> Vec<(SessionId, WordId, bool)> {
        self.reviews.lock().expect("portal lock").clone()
    }

    /// End-session calls recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn ended_sessions(&self) -> Vec<(SessionId, Option<SessionSummary>)> {
        self.ended.lock().expect("portal lock").clone()
    }
}

#[async_trait]
impl WordProvider for InMemoryPortal {
    async fn fetch_words(
        &self,
        group_id: GroupId,
        per_page: u32,
    ) -> Result<Vec<WordItem>, ApiError> {
        if *self
            .fail_words
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))?
        {
            return Err(ApiError::Connection("injected word fetch failure".into()));
        }

        let guard = self
            .words
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))?;
        let words = guard.get(&group_id).ok_or(ApiError::NotFound)?;
        let limit = usize::try_from(per_page).unwrap_or(usize::MAX);
        Ok(words.iter().take(limit).cloned().collect())
    }

    async fn fetch_group_name(&self, group_id: GroupId) -> Result<String, ApiError> {
        let guard = self
            .group_names
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))?;
        guard.get(&group_id).cloned().ok_or(ApiError::NotFound)
    }
}

#[async_trait]
impl ReviewSink for InMemoryPortal {
    async fn submit_review(
        &self,
        session_id: SessionId,
        word_id: WordId,
        correct: bool,
    ) -> Result<(), ApiError> {
        if self
            .failing_reviews
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))?
            .contains(&word_id)
        {
            return Err(ApiError::Connection(format!(
                "injected review failure for word {word_id}"
            )));
        }

        self.reviews
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))?
            .push((session_id, word_id, correct));
        Ok(())
    }
}

#[async_trait]
impl SessionCloser for InMemoryPortal {
    async fn end_session(
        &self,
        session_id: SessionId,
        summary: Option<&SessionSummary>,
    ) -> Result<(), ApiError> {
        if *self
            .fail_end
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))?
        {
            return Err(ApiError::Connection("injected session end failure".into()));
        }

        self.ended
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))?
            .push((session_id, summary.copied()));
        Ok(())
    }
}

//
// ─── PORTAL AGGREGATE ──────────────────────────────────────────────────────────
//

/// Aggregates the portal contracts behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Portal {
    pub words: Arc<dyn WordProvider>,
    pub reviews: Arc<dyn ReviewSink>,
    pub sessions: Arc<dyn SessionCloser>,
}

impl Portal {
    #[must_use]
    pub fn new(
        words: Arc<dyn WordProvider>,
        reviews: Arc<dyn ReviewSink>,
        sessions: Arc<dyn SessionCloser>,
    ) -> Self {
        Self {
            words,
            reviews,
            sessions,
        }
    }

    /// Portal over a shared in-memory fake.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::wrapping(InMemoryPortal::new())
    }

    /// Portal whose three contracts are all served by one implementation.
    #[must_use]
    pub fn wrapping<P>(portal: P) -> Self
    where
        P: WordProvider + ReviewSink + SessionCloser + Clone + 'static,
    {
        let words: Arc<dyn WordProvider> = Arc::new(portal.clone());
        let reviews: Arc<dyn ReviewSink> = Arc::new(portal.clone());
        let sessions: Arc<dyn SessionCloser> = Arc::new(portal);
        Self {
            words,
            reviews,
            sessions,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
