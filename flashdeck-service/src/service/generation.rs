//! Flashcard generation workflows: topic-only and document-grounded.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{ProcessingError, ServiceError, ServiceResult};
use crate::generation::{FlashcardGenerator, GenerationRequest, validate_credential};
use crate::ingestion::{
    DocumentAggregator, DocumentReader, DocumentSummary, IngestionReport, SourceDocument,
    VisionExtractor, assemble_content,
};
use crate::models::NewFlashcard;
use crate::openai::ChatModel;
use crate::service::{FlashdeckService, UploadedFile};

/// Response for a document-grounded generation
#[derive(Debug, Serialize)]
pub struct DocumentFlashcards {
    pub request_id: String,
    pub flashcards: Vec<NewFlashcard>,
    pub documents: Vec<DocumentSummary>,
    /// Whether the combined document content was cut to fit the context budget
    pub truncated: bool,
}

impl<R: DocumentReader, M: ChatModel> FlashdeckService<R, M> {
    fn generator(&self) -> FlashcardGenerator<'_, M> {
        FlashcardGenerator::new(&self.model, &self.config.openai, &self.config.models)
    }

    fn check_count(&self, count: u32) -> ServiceResult<()> {
        let max = self.config.limits.max_flashcards_per_request;
        if count == 0 || count > max {
            return Err(ServiceError::InvalidRequest {
                message: format!("Flashcard count must be between 1 and {}", max),
            });
        }
        Ok(())
    }

    /// Generate flashcards about a topic for a deck.
    pub async fn generate_from_topic(
        &self,
        deck_id: i64,
        topic: &str,
        count: u32,
        include_hints: bool,
    ) -> ServiceResult<Vec<NewFlashcard>> {
        self.check_count(count)?;

        let request = GenerationRequest::from_topic(topic, count, include_hints);
        let cards = self.generator().generate(&request).await?;

        info!(deck_id = deck_id, cards = cards.len(), "Generated topic flashcards");
        Ok(cards
            .into_iter()
            .map(|card| card.into_new_flashcard(deck_id))
            .collect())
    }

    /// Run hybrid extraction over `documents` in order.
    pub async fn ingest_documents(
        &self,
        documents: &[SourceDocument],
        cancel: &CancellationToken,
    ) -> ServiceResult<IngestionReport> {
        let vision = VisionExtractor::new(&self.model, &self.config.models.vision);
        let aggregator = DocumentAggregator::new(&self.reader, &vision, &self.config.ingestion);
        Ok(aggregator.aggregate(documents, cancel).await?)
    }

    /// Stage uploaded PDFs and generate flashcards grounded in their content.
    pub async fn generate_from_documents(
        &self,
        deck_id: i64,
        files: &[UploadedFile],
        instructions: Option<&str>,
        count: u32,
        request_id: Option<String>,
    ) -> ServiceResult<DocumentFlashcards> {
        self.check_count(count)?;
        let batch = self.stage_uploads(files)?;
        let request_id = request_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        self.generate_from_sources(deck_id, &batch.documents, instructions, count, &request_id)
            .await
    }

    /// Generate flashcards from documents already on disk.
    ///
    /// The credential is checked before any page is sent to the vision model.
    /// The request can be cancelled through [`FlashdeckService::cancel_generation`]
    /// until the generation call starts.
    pub async fn generate_from_sources(
        &self,
        deck_id: i64,
        documents: &[SourceDocument],
        instructions: Option<&str>,
        count: u32,
        request_id: &str,
    ) -> ServiceResult<DocumentFlashcards> {
        self.check_count(count)?;
        validate_credential(&self.config.openai)?;

        let registration = self.register_generation(request_id)?;
        let report = self.ingest_documents(documents, registration.token()).await?;

        if registration.token().is_cancelled() {
            return Err(ProcessingError::Cancelled {
                document_id: request_id.to_string(),
            }
            .into());
        }

        let assembled = assemble_content(
            report.render(),
            instructions,
            self.config.ingestion.max_content_chars,
        );
        let truncated = assembled.truncated;

        let cards = self
            .generator()
            .generate(&assembled.into_request(count))
            .await?;
        drop(registration);

        info!(
            request_id = %request_id,
            deck_id = deck_id,
            documents = documents.len(),
            cards = cards.len(),
            truncated = truncated,
            "Generated document flashcards"
        );

        Ok(DocumentFlashcards {
            request_id: request_id.to_string(),
            flashcards: cards
                .into_iter()
                .map(|card| card.into_new_flashcard(deck_id))
                .collect(),
            documents: report.summaries(),
            truncated,
        })
    }
}
