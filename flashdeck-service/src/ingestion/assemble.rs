//! Fit aggregated content into the generation context budget.

use tracing::info;

use crate::generation::GenerationRequest;

/// Appended to content cut at the character budget, after `TRUNCATION_SEPARATOR`.
pub const TRUNCATION_MARKER: &str = "[... content truncated due to length ...]";

const TRUNCATION_SEPARATOR: &str = "\n\n";

/// Source content ready for a document-grounded generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContent {
    pub source_content: String,
    pub user_instructions: Option<String>,
    pub truncated: bool,
}

impl AssembledContent {
    pub fn into_request(self, count: u32) -> GenerationRequest {
        GenerationRequest::from_documents(self.source_content, self.user_instructions, count)
    }
}

/// Truncate `content` to `max_chars` characters and attach the instructions.
///
/// Lengths are counted in characters, so a cut never splits a code point.
/// Instructions are passed through whole; blank instructions are dropped.
pub fn assemble_content(
    content: String,
    instructions: Option<&str>,
    max_chars: usize,
) -> AssembledContent {
    let user_instructions = instructions
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    let (source_content, truncated) = match content.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            info!(
                max_chars = max_chars,
                original_bytes = content.len(),
                "Truncating source content"
            );
            let mut truncated = content;
            truncated.truncate(cut);
            truncated.push_str(TRUNCATION_SEPARATOR);
            truncated.push_str(TRUNCATION_MARKER);
            (truncated, true)
        }
        None => (content, false),
    };

    AssembledContent {
        source_content,
        user_instructions,
        truncated,
    }
}
