//! Parsing of model output into flashcard candidates.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::models::FlashcardCandidate;

/// Outcome of parsing a generation response. Either every element is a valid
/// card or the whole response is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Cards(Vec<FlashcardCandidate>),
    Rejected(Rejection),
}

/// Why a response was rejected, and which element was at fault if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub index: Option<usize>,
    pub reason: String,
}

impl Rejection {
    fn whole(reason: impl Into<String>) -> Self {
        Self {
            index: None,
            reason: reason.into(),
        }
    }

    fn element(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "flashcard {}: {}", index, self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

#[derive(Deserialize)]
struct RawCard {
    question: String,
    answer: String,
    #[serde(default)]
    hint: Option<String>,
}

/// Remove a surrounding ``` fence, with or without a language tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // The language tag may sit on its own line or run straight into the body.
    let body = rest.trim_start_matches(is_language_tag_char);

    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn is_language_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Parse raw model output. `hints_required` makes `hint` a required field.
pub fn parse_flashcards(raw: &str, hints_required: bool) -> ParsedResponse {
    let value: Value = match serde_json::from_str(strip_code_fence(raw)) {
        Ok(value) => value,
        Err(e) => return ParsedResponse::Rejected(Rejection::whole(format!("invalid JSON: {}", e))),
    };

    let Value::Array(elements) = value else {
        return ParsedResponse::Rejected(Rejection::whole(format!(
            "expected a JSON array, got {}",
            json_kind(&value)
        )));
    };

    let mut cards = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        if !element.is_object() {
            return ParsedResponse::Rejected(Rejection::element(
                index,
                format!("expected an object, got {}", json_kind(&element)),
            ));
        }

        let card: RawCard = match serde_json::from_value(element) {
            Ok(card) => card,
            Err(e) => return ParsedResponse::Rejected(Rejection::element(index, e.to_string())),
        };

        if hints_required && card.hint.is_none() {
            return ParsedResponse::Rejected(Rejection::element(index, "missing field `hint`"));
        }

        cards.push(FlashcardCandidate {
            question: card.question,
            answer: card.answer,
            hint: card.hint,
        });
    }

    ParsedResponse::Cards(cards)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
