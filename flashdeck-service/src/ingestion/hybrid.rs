//! Per-page text extraction with vision fallback.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::IngestionConfig;
use crate::error::ProcessingError;
use crate::ingestion::sufficiency::is_text_sufficient;
use crate::ingestion::{
    DocumentContent, DocumentReader, ExtractionMethod, PageText, SourceDocument,
    VisionTranscriber,
};

/// Reads a document page by page, using the text layer where it is usable
/// and a rendered image plus vision model where it is not.
pub struct HybridPageProcessor<'a, R, V> {
    reader: &'a R,
    vision: &'a V,
    settings: &'a IngestionConfig,
}

impl<'a, R: DocumentReader, V: VisionTranscriber> HybridPageProcessor<'a, R, V> {
    pub fn new(reader: &'a R, vision: &'a V, settings: &'a IngestionConfig) -> Self {
        Self {
            reader,
            vision,
            settings,
        }
    }

    /// Process every page of `document` in ascending order.
    ///
    /// Fails only when the text layer cannot be read at all or the token is
    /// cancelled. A page whose fallback fails becomes a placeholder page.
    pub async fn process(
        &self,
        document: &SourceDocument,
        cancel: &CancellationToken,
    ) -> Result<DocumentContent, ProcessingError> {
        let page_texts = self.reader.page_texts(&document.path)?;

        info!(
            doc_id = %document.id,
            filename = %document.filename,
            pages = page_texts.len(),
            "Processing document pages"
        );

        let mut pages = Vec::with_capacity(page_texts.len());
        for (page_number, text) in page_texts {
            if cancel.is_cancelled() {
                info!(doc_id = %document.id, page = page_number, "Document processing cancelled");
                return Err(ProcessingError::Cancelled {
                    document_id: document.id.clone(),
                });
            }

            pages.push(self.process_page(document, page_number, text).await);
        }

        let content = DocumentContent {
            document_id: document.id.clone(),
            filename: document.filename.clone(),
            pages,
        };

        info!(
            doc_id = %document.id,
            text_pages = content.count_pages(ExtractionMethod::TextExtraction),
            vision_pages = content.count_pages(ExtractionMethod::VisionFallback),
            failed_pages = content.count_pages(ExtractionMethod::ExtractionError),
            "Document processed"
        );

        Ok(content)
    }

    async fn process_page(
        &self,
        document: &SourceDocument,
        page_number: u32,
        text: String,
    ) -> PageText {
        if is_text_sufficient(&text, self.settings.min_meaningful_chars) {
            debug!(doc_id = %document.id, page = page_number, "Using text extraction");
            return PageText::extracted(&document.id, page_number, text);
        }

        debug!(
            doc_id = %document.id,
            page = page_number,
            "Insufficient text extracted, falling back to vision"
        );

        match self.vision_fallback(&document.path, page_number).await {
            Ok(transcription) => PageText::transcribed(&document.id, page_number, transcription),
            Err(e) => {
                warn!(
                    doc_id = %document.id,
                    page = page_number,
                    error = %e,
                    "Failed to process page with vision fallback"
                );
                PageText::failed(&document.id, page_number, &e)
            }
        }
    }

    async fn vision_fallback(
        &self,
        path: &Path,
        page_number: u32,
    ) -> Result<String, ProcessingError> {
        let image = self
            .reader
            .render_page(path, page_number, self.settings.render_dpi)?;
        self.vision.transcribe(&image, page_number).await
    }
}
