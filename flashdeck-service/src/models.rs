//! Records exchanged with the persistence boundary and API callers.

use serde::{Deserialize, Serialize};

/// A validated question/answer pair as returned by the generation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardCandidate {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FlashcardCandidate {
    /// Attach the candidate to a deck with fresh review counters.
    pub fn into_new_flashcard(self, deck_id: i64) -> NewFlashcard {
        NewFlashcard {
            deck_id,
            question: self.question,
            answer: self.answer,
            hint: self.hint,
            mastery_level: 0,
            times_reviewed: 0,
        }
    }
}

/// Flashcard record ready to be inserted by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFlashcard {
    pub deck_id: i64,
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub mastery_level: i32,
    pub times_reviewed: i32,
}

/// Page count and size of an uploaded document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMetadata {
    pub page_count: u32,
    pub file_size: u64,
    pub file_size_mb: f64,
}

impl DocumentMetadata {
    pub fn new(page_count: u32, file_size: u64) -> Self {
        let megabytes = file_size as f64 / (1024.0 * 1024.0);
        Self {
            page_count,
            file_size,
            file_size_mb: (megabytes * 100.0).round() / 100.0,
        }
    }
}
