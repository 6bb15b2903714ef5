//! Flashcard generation.
//!
//! Two modes share one response contract:
//! - topic-only: a quick pass on the fast model profile
//! - document-grounded: assembled document content on the strong profile,
//!   with hints always required

pub mod prompts;
pub mod response;

use tracing::{debug, info, warn};

use crate::config::{ModelProfile, ModelsConfig, OpenAiConfig};
use crate::error::GenerationError;
use crate::models::FlashcardCandidate;
use crate::openai::{ChatMessage, ChatModel, ChatRequest, classify_provider_error};

use response::{ParsedResponse, parse_flashcards};

/// Number of key characters echoed back in a format error.
const KEY_PREVIEW_CHARS: usize = 4;

/// Inputs for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub source_content: Option<String>,
    pub user_instructions: Option<String>,
    pub topic: Option<String>,
    pub count: u32,
    pub hints_enabled: bool,
}

impl GenerationRequest {
    pub fn from_topic(topic: impl Into<String>, count: u32, include_hints: bool) -> Self {
        Self {
            source_content: None,
            user_instructions: None,
            topic: Some(topic.into()),
            count,
            hints_enabled: include_hints,
        }
    }

    pub fn from_documents(
        source_content: String,
        user_instructions: Option<String>,
        count: u32,
    ) -> Self {
        Self {
            source_content: Some(source_content),
            user_instructions,
            topic: None,
            count,
            hints_enabled: true,
        }
    }

    fn mode(&self) -> Result<GenerationMode<'_>, GenerationError> {
        if let Some(content) = &self.source_content {
            return Ok(GenerationMode::Documents {
                content,
                instructions: self.user_instructions.as_deref(),
            });
        }

        match self.topic.as_deref().map(str::trim) {
            Some(topic) if !topic.is_empty() => Ok(GenerationMode::Topic {
                topic,
                include_hints: self.hints_enabled,
            }),
            _ => Err(GenerationError::InvalidRequest {
                message: "Either a topic or source content is required".to_string(),
            }),
        }
    }
}

enum GenerationMode<'a> {
    Topic {
        topic: &'a str,
        include_hints: bool,
    },
    Documents {
        content: &'a str,
        instructions: Option<&'a str>,
    },
}

impl GenerationMode<'_> {
    fn hints_required(&self) -> bool {
        match self {
            Self::Topic { include_hints, .. } => *include_hints,
            Self::Documents { .. } => true,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Topic { .. } => "topic",
            Self::Documents { .. } => "documents",
        }
    }
}

/// Check that an API key is present and carries the provider's prefix.
pub fn validate_credential(config: &OpenAiConfig) -> Result<(), GenerationError> {
    let key = config.api_key.as_deref().map(str::trim).unwrap_or_default();

    if key.is_empty() {
        return Err(GenerationError::Configuration {
            message: "OpenAI API key not configured. Please set FLASHDECK__OPENAI__API_KEY \
                      or openai.api_key in the config file. Get your key from: \
                      https://platform.openai.com/api-keys"
                .to_string(),
        });
    }

    if !key.starts_with(&config.key_prefix) {
        let preview: String = key.chars().take(KEY_PREVIEW_CHARS).collect();
        return Err(GenerationError::Configuration {
            message: format!(
                "Invalid OpenAI API key format. Key should start with '{}' but got: {}...",
                config.key_prefix, preview
            ),
        });
    }

    Ok(())
}

/// Builds prompts, calls the chat model and validates the cards it returns.
pub struct FlashcardGenerator<'a, M> {
    model: &'a M,
    openai: &'a OpenAiConfig,
    models: &'a ModelsConfig,
}

impl<'a, M: ChatModel> FlashcardGenerator<'a, M> {
    pub fn new(model: &'a M, openai: &'a OpenAiConfig, models: &'a ModelsConfig) -> Self {
        Self {
            model,
            openai,
            models,
        }
    }

    /// Generate flashcards. Returns every card the model produced, in order,
    /// or an error; never a partial list.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<FlashcardCandidate>, GenerationError> {
        validate_credential(self.openai)?;

        if request.count == 0 {
            return Err(GenerationError::InvalidRequest {
                message: "Flashcard count must be at least 1".to_string(),
            });
        }

        let mode = request.mode()?;
        let chat_request = self.build_request(&mode, request.count);

        info!(
            mode = mode.label(),
            model = %chat_request.model,
            count = request.count,
            "Generating flashcards"
        );

        let raw = self
            .model
            .complete(&chat_request)
            .await
            .map_err(classify_provider_error)?;

        debug!(response_chars = raw.len(), "Received generation response");

        let hints_required = mode.hints_required();
        match parse_flashcards(&raw, hints_required) {
            ParsedResponse::Cards(mut cards) => {
                if !hints_required {
                    for card in &mut cards {
                        card.hint = None;
                    }
                }
                info!(mode = mode.label(), generated = cards.len(), "Generated flashcards");
                Ok(cards)
            }
            ParsedResponse::Rejected(rejection) => {
                warn!(
                    mode = mode.label(),
                    index = ?rejection.index,
                    reason = %rejection.reason,
                    "Rejected generation response"
                );
                Err(GenerationError::MalformedResponse {
                    detail: rejection.to_string(),
                })
            }
        }
    }

    fn build_request(&self, mode: &GenerationMode<'_>, count: u32) -> ChatRequest {
        let (profile, messages): (&ModelProfile, _) = match mode {
            GenerationMode::Topic {
                topic,
                include_hints,
            } => (
                &self.models.fast,
                vec![
                    ChatMessage::system(prompts::topic_system_prompt(topic)),
                    ChatMessage::user(prompts::topic_user_prompt(topic, count, *include_hints)),
                ],
            ),
            GenerationMode::Documents {
                content,
                instructions,
            } => (
                &self.models.strong,
                vec![
                    ChatMessage::system(prompts::DOCUMENT_SYSTEM_PROMPT),
                    ChatMessage::user(prompts::document_user_prompt(
                        content,
                        *instructions,
                        count,
                    )),
                ],
            ),
        };

        ChatRequest::new(profile, messages)
    }
}
