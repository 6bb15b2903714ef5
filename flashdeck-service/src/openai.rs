use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, warn};

use crate::config::{ModelProfile, OpenAiConfig};
use crate::error::{GenerationError, ProviderError, ServiceError, ServiceResult};

/// A chat completion backend returning one textual completion per request.
pub trait ChatModel: Send + Sync {
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

/// OpenAI-compatible chat completions client
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ServiceError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl ChatModel for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let url = self.completions_url();
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            prompt_chars = request
                .messages
                .iter()
                .map(|message| message.text().len())
                .sum::<usize>(),
            max_tokens = request.max_tokens,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Connection {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, model = %request.model, "Chat completion request rejected");
            return Err(parse_api_error(status, &body));
        }

        let completion: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    message: e.to_string(),
                })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyCompletion)
    }
}

/// Turn a non-success response body into a provider error, keeping the
/// structured `code`/`type` fields when the body carries them.
fn parse_api_error(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => ProviderError::Api {
            status,
            code: envelope.error.code,
            kind: envelope.error.kind,
            message: envelope.error.message,
        },
        Err(_) => ProviderError::Api {
            status,
            code: None,
            kind: None,
            message: body.to_string(),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorClass {
    Authentication,
    Quota,
}

/// Provider error codes (and error types) with a known meaning.
const PROVIDER_ERROR_CODES: &[(&str, ErrorClass)] = &[
    ("invalid_api_key", ErrorClass::Authentication),
    ("invalid_authentication", ErrorClass::Authentication),
    ("authentication_error", ErrorClass::Authentication),
    ("insufficient_quota", ErrorClass::Quota),
    ("billing_hard_limit_reached", ErrorClass::Quota),
];

fn class_for_code(code: &str) -> Option<ErrorClass> {
    PROVIDER_ERROR_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, class)| *class)
}

fn error_class(error: &ProviderError) -> Option<ErrorClass> {
    if let ProviderError::Api {
        status, code, kind, ..
    } = error
    {
        let structured = code
            .as_deref()
            .and_then(class_for_code)
            .or_else(|| kind.as_deref().and_then(class_for_code));
        if structured.is_some() {
            return structured;
        }
        if *status == 401 {
            return Some(ErrorClass::Authentication);
        }
    }

    // Last resort for errors without a recognised code: match on the text.
    let text = error.to_string().to_lowercase();
    if text.contains("authentication") || text.contains("api key") {
        Some(ErrorClass::Authentication)
    } else if text.contains("quota") || text.contains("insufficient") {
        Some(ErrorClass::Quota)
    } else {
        None
    }
}

/// Map an opaque provider failure onto the generation error taxonomy.
pub fn classify_provider_error(error: ProviderError) -> GenerationError {
    match error_class(&error) {
        Some(ErrorClass::Authentication) => GenerationError::Authentication { source: error },
        Some(ErrorClass::Quota) => GenerationError::QuotaExceeded { source: error },
        None => GenerationError::Provider(error),
    }
}

/// Chat completion request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(profile: &ModelProfile, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: profile.model.clone(),
            messages,
            temperature: profile.temperature,
            max_tokens: profile.max_tokens,
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message with a base64 PNG attached as a data URI
    pub fn user_with_image(content: impl Into<String>, png_base64: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: content.into(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/png;base64,{}", png_base64),
                    },
                },
            ]),
        }
    }

    /// Plain text of the message, ignoring image parts
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

// Internal wire types

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16, code: Option<&str>, message: &str) -> ProviderError {
        ProviderError::Api {
            status,
            code: code.map(str::to_string),
            kind: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_structured_codes_take_precedence() {
        // Message mentions quota but the code says the key is bad.
        let error = api_error(429, Some("invalid_api_key"), "quota check failed");
        assert!(matches!(
            classify_provider_error(error),
            GenerationError::Authentication { .. }
        ));

        let error = api_error(429, Some("insufficient_quota"), "You exceeded your plan");
        assert!(matches!(
            classify_provider_error(error),
            GenerationError::QuotaExceeded { .. }
        ));
    }

    #[test]
    fn test_unauthorized_status_is_authentication() {
        let error = api_error(401, None, "denied");
        assert!(matches!(
            classify_provider_error(error),
            GenerationError::Authentication { .. }
        ));
    }

    #[test]
    fn test_message_heuristics_are_the_fallback() {
        let error = api_error(400, None, "Incorrect API key provided");
        assert!(matches!(
            classify_provider_error(error),
            GenerationError::Authentication { .. }
        ));

        let error = ProviderError::InvalidResponse {
            message: "Insufficient funds".to_string(),
        };
        assert!(matches!(
            classify_provider_error(error),
            GenerationError::QuotaExceeded { .. }
        ));

        let error = api_error(500, Some("server_error"), "The server had an error");
        assert!(matches!(
            classify_provider_error(error),
            GenerationError::Provider(_)
        ));
    }

    #[test]
    fn test_parse_api_error_reads_envelope() {
        let body = r#"{"error":{"message":"Bad key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        match parse_api_error(401, body) {
            ProviderError::Api {
                status,
                code,
                kind,
                message,
            } => {
                assert_eq!(status, 401);
                assert_eq!(code.as_deref(), Some("invalid_api_key"));
                assert_eq!(kind.as_deref(), Some("invalid_request_error"));
                assert_eq!(message, "Bad key");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        match parse_api_error(502, "<html>bad gateway</html>") {
            ProviderError::Api { code, message, .. } => {
                assert!(code.is_none());
                assert_eq!(message, "<html>bad gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_image_message_serializes_as_data_uri_part() {
        let message = ChatMessage::user_with_image("This is page 3", "aGVsbG8=");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "This is page 3");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(
            json["content"][1]["image_url"]["url"],
            "data:image/png;base64,aGVsbG8="
        );
        assert_eq!(message.text(), "This is page 3");
    }

    #[test]
    fn test_request_omits_unset_temperature() {
        let profile = ModelProfile {
            model: "vision-model".to_string(),
            temperature: None,
            max_tokens: 4096,
        };
        let request = ChatRequest::new(&profile, vec![ChatMessage::system("hi")]);
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["messages"][0]["content"], "hi");
    }
}
