use thiserror::Error;

use crate::model::ids::WordId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised while building a `WordItem`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WordError {
    #[error("native text must not be blank")]
    BlankNativeText,

    #[error("translation must not be blank")]
    BlankTranslation,
}

//
// ─── WORD ITEM ─────────────────────────────────────────────────────────────────
//

/// A single drillable vocabulary item.
///
/// Owned by the word-set loader after fetch and read-only afterwards;
/// activities and the aggregator refer to it by `id` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordItem {
    id: WordId,
    native_text: String,
    translation: String,
    transliteration: String,
}

impl WordItem {
    /// Build a word item, validating the two faces a drill depends on.
    ///
    /// The transliteration is display-only and may be empty.
    ///
    /// # Errors
    ///
    /// Returns `WordError` if the native text or translation is blank.
    pub fn new(
        id: WordId,
        native_text: impl Into<String>,
        translation: impl Into<String>,
        transliteration: impl Into<String>,
    ) -> Result<Self, WordError> {
        let native_text = native_text.into();
        let translation = translation.into();

        if native_text.trim().is_empty() {
            return Err(WordError::BlankNativeText);
        }
        if translation.trim().is_empty() {
            return Err(WordError::BlankTranslation);
        }

        Ok(Self {
            id,
            native_text,
            translation,
            transliteration: transliteration.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> WordId {
        self.id
    }

    /// The front face of a flashcard, and the native-side card on a board.
    #[must_use]
    pub fn native_text(&self) -> &str {
        &self.native_text
    }

    /// The back face of a flashcard, and the translation-side card on a board.
    #[must_use]
    pub fn translation(&self) -> &str {
        &self.translation
    }

    #[must_use]
    pub fn transliteration(&self) -> &str {
        &self.transliteration
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
