use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};

/// Service configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default = "default_storage")]
    pub storage: StorageConfig,

    #[serde(default = "default_openai")]
    pub openai: OpenAiConfig,

    #[serde(default = "default_models")]
    pub models: ModelsConfig,

    #[serde(default = "default_ingestion")]
    pub ingestion: IngestionConfig,

    #[serde(default = "default_limits")]
    pub limits: LimitsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory uploaded documents are staged in while a request runs.
    /// Falls back to the system temp directory when unset.
    #[serde(default)]
    pub upload_dir: Option<PathBuf>,
}

/// Generation provider credentials and transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Every valid credential starts with this literal.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl OpenAiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Model selection for each kind of request
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Cheaper model used for topic-only generation
    #[serde(default = "default_fast_profile")]
    pub fast: ModelProfile,

    /// Stronger model used for document-grounded generation
    #[serde(default = "default_strong_profile")]
    pub strong: ModelProfile,

    /// Vision-capable model used to transcribe rasterized pages
    #[serde(default = "default_vision_profile")]
    pub vision: ModelProfile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelProfile {
    pub model: String,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Hybrid text/vision extraction settings
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// Pages with fewer non-whitespace characters fall back to vision
    #[serde(default = "default_min_meaningful_chars")]
    pub min_meaningful_chars: usize,

    #[serde(default = "default_render_dpi")]
    pub render_dpi: u32,

    /// Aggregated document text is cut to this many characters before generation
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

/// Upload limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_document_size")]
    pub max_document_size_bytes: u64,

    #[serde(default = "default_max_documents_per_request")]
    pub max_documents_per_request: usize,

    #[serde(default = "default_max_flashcards_per_request")]
    pub max_flashcards_per_request: u32,
}

impl AppConfig {
    /// Load configuration from an optional `config` file and `FLASHDECK__*` env vars
    pub fn load() -> ServiceResult<Self> {
        Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("FLASHDECK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ServiceError::Config {
                message: format!("Failed to build config: {}", e),
            })?
            .try_deserialize()
            .map_err(|e| ServiceError::Config {
                message: format!("Failed to deserialize config: {}", e),
            })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            openai: default_openai(),
            models: default_models(),
            ingestion: default_ingestion(),
            limits: default_limits(),
        }
    }
}

// ==================== Default Value Functions ====================

fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_storage() -> StorageConfig {
    StorageConfig { upload_dir: None }
}

fn default_openai() -> OpenAiConfig {
    OpenAiConfig {
        api_key: None,
        base_url: default_openai_base_url(),
        key_prefix: default_key_prefix(),
        request_timeout_secs: default_request_timeout_secs(),
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_key_prefix() -> String {
    "sk-".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_models() -> ModelsConfig {
    ModelsConfig {
        fast: default_fast_profile(),
        strong: default_strong_profile(),
        vision: default_vision_profile(),
    }
}

fn default_fast_profile() -> ModelProfile {
    ModelProfile {
        model: "gpt-3.5-turbo".to_string(),
        temperature: Some(0.7),
        max_tokens: 2000,
    }
}

fn default_strong_profile() -> ModelProfile {
    ModelProfile {
        model: "gpt-4o-mini".to_string(),
        temperature: Some(0.7),
        max_tokens: 4096,
    }
}

fn default_vision_profile() -> ModelProfile {
    ModelProfile {
        model: "gpt-4o-mini".to_string(),
        temperature: None,
        max_tokens: 4096,
    }
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_ingestion() -> IngestionConfig {
    IngestionConfig {
        min_meaningful_chars: default_min_meaningful_chars(),
        render_dpi: default_render_dpi(),
        max_content_chars: default_max_content_chars(),
    }
}

fn default_min_meaningful_chars() -> usize {
    50
}

fn default_render_dpi() -> u32 {
    200
}

fn default_max_content_chars() -> usize {
    50_000
}

fn default_limits() -> LimitsConfig {
    LimitsConfig {
        max_document_size_bytes: default_max_document_size(),
        max_documents_per_request: default_max_documents_per_request(),
        max_flashcards_per_request: default_max_flashcards_per_request(),
    }
}

fn default_max_document_size() -> u64 {
    50 * 1024 * 1024
}

fn default_max_documents_per_request() -> usize {
    10
}

fn default_max_flashcards_per_request() -> u32 {
    100
}
