mod cancellation;
mod generation;
mod upload;

pub use generation::DocumentFlashcards;
pub use upload::UploadedFile;

use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AppConfig;
use crate::error::ServiceResult;
use crate::ingestion::PdfiumReader;
use crate::openai::OpenAiClient;

/// Main service coordinator
///
/// Generic over the document reader and chat model so the pipeline can run
/// against in-memory fakes; production uses PDFium and the OpenAI client.
pub struct FlashdeckService<R = PdfiumReader, M = OpenAiClient> {
    pub config: Arc<AppConfig>,
    reader: R,
    model: M,
    /// Cancellation tokens for in-flight document generations, keyed by request id
    generation_tokens: DashMap<String, CancellationToken>,
}

impl FlashdeckService {
    /// Create a new service instance
    pub fn new(config: AppConfig) -> ServiceResult<Self> {
        info!("Initializing Flashdeck service");

        let model = OpenAiClient::new(config.openai.clone())?;
        info!(
            url = %config.openai.base_url,
            fast_model = %config.models.fast.model,
            strong_model = %config.models.strong.model,
            vision_model = %config.models.vision.model,
            "OpenAI client initialized"
        );

        Ok(Self::with_components(config, PdfiumReader, model))
    }
}

impl<R, M> FlashdeckService<R, M> {
    pub fn with_components(config: AppConfig, reader: R, model: M) -> Self {
        Self {
            config: Arc::new(config),
            reader,
            model,
            generation_tokens: DashMap::new(),
        }
    }
}
