//! Prompt text for flashcard generation.

/// System prompt for topic-only generation.
pub fn topic_system_prompt(topic: &str) -> String {
    format!(
        "You are an expert in {topic} and a helpful assistant that creates educational \
         flashcards. Always respond with valid JSON only."
    )
}

/// User prompt for topic-only generation.
pub fn topic_user_prompt(topic: &str, count: u32, include_hints: bool) -> String {
    let (pairs, example, hint_rule) = if include_hints {
        (
            "question-answer-hint sets",
            HINTED_FORMAT,
            "\n- Hints should nudge toward the answer without giving it away",
        )
    } else {
        ("question-answer pairs", PLAIN_FORMAT, "")
    };

    format!(
        "Generate {count} flashcard {pairs} about: {topic}\n\n\
         Return ONLY a JSON array with this exact format:\n{example}\n\n\
         Rules:\n\
         - Questions should be clear and specific\n\
         - Answers should be concise but complete\n\
         - Cover different aspects of the topic\n\
         - Make questions progressively more detailed{hint_rule}\n\
         - Return ONLY valid JSON, no other text"
    )
}

pub const DOCUMENT_SYSTEM_PROMPT: &str = "You are an expert educator who creates flashcards \
from study material. Cover the core concepts found in the supplied content. Add the prerequisite \
concepts a learner needs to understand that content, even when the content does not state them. \
Order the flashcards from foundational to advanced. Include practical examples where they help. \
Always respond with valid JSON only.";

/// User prompt for generation grounded in uploaded documents. Hints are
/// always requested.
pub fn document_user_prompt(content: &str, instructions: Option<&str>, count: u32) -> String {
    let instructions = instructions
        .map(|text| format!("Learning instructions from the user:\n{text}\n\n"))
        .unwrap_or_default();

    format!(
        "Generate {count} flashcard question-answer-hint sets from the document content below.\n\n\
         {instructions}\
         Document content:\n{content}\n\n\
         Return ONLY a JSON array with this exact format:\n{HINTED_FORMAT}\n\n\
         Rules:\n\
         - Every flashcard must include a question, an answer and a hint\n\
         - Questions should be clear and specific\n\
         - Answers should be concise but complete\n\
         - Hints should nudge toward the answer without giving it away\n\
         - Return ONLY valid JSON, no other text"
    )
}

const PLAIN_FORMAT: &str = r#"[
  {"question": "Question text here?", "answer": "Answer text here"},
  {"question": "Another question?", "answer": "Another answer"}
]"#;

const HINTED_FORMAT: &str = r#"[
  {"question": "Question text here?", "answer": "Answer text here", "hint": "Hint text here"},
  {"question": "Another question?", "answer": "Another answer", "hint": "Another hint"}
]"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_prompt_without_hints() {
        let prompt = topic_user_prompt("Rust lifetimes", 5, false);
        assert!(prompt.starts_with("Generate 5 flashcard question-answer pairs about: Rust lifetimes"));
        assert!(prompt.contains(PLAIN_FORMAT));
        assert!(!prompt.contains("\"hint\""));
    }

    #[test]
    fn test_topic_prompt_with_hints() {
        let prompt = topic_user_prompt("Photosynthesis", 3, true);
        assert!(prompt.contains("question-answer-hint sets"));
        assert!(prompt.contains(HINTED_FORMAT));
    }

    #[test]
    fn test_document_prompt_embeds_content_and_instructions() {
        let prompt = document_user_prompt("=== Page 1 ===\nCells", Some("Focus on organelles"), 8);
        assert!(prompt.contains("Generate 8 flashcard"));
        assert!(prompt.contains("Learning instructions from the user:\nFocus on organelles"));
        assert!(prompt.contains("Document content:\n=== Page 1 ===\nCells"));
        assert!(prompt.contains(HINTED_FORMAT));

        let without = document_user_prompt("Cells", None, 8);
        assert!(!without.contains("Learning instructions"));
    }

    #[test]
    fn test_document_system_prompt_persona() {
        assert!(DOCUMENT_SYSTEM_PROMPT.contains("prerequisite"));
        assert!(DOCUMENT_SYSTEM_PROMPT.contains("foundational to advanced"));
    }
}
