//! Multi-document aggregation.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::IngestionConfig;
use crate::error::ProcessingError;
use crate::ingestion::{
    DocumentContent, DocumentReader, ExtractionMethod, HybridPageProcessor, SourceDocument,
    VisionTranscriber,
};

const DOCUMENT_RULE_WIDTH: usize = 80;

/// Result of ingesting one document of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Processed(DocumentContent),
    Failed {
        document_id: String,
        filename: String,
        error: String,
    },
}

impl DocumentOutcome {
    pub fn filename(&self) -> &str {
        match self {
            Self::Processed(content) => &content.filename,
            Self::Failed { filename, .. } => filename,
        }
    }

    fn render(&self) -> String {
        let rule = "=".repeat(DOCUMENT_RULE_WIDTH);
        let body = match self {
            Self::Processed(content) => content.render(),
            Self::Failed { error, .. } => format!("[Error: {}]", error),
        };
        format!(
            "{rule}\nDocument: {}\n{rule}\n\n{}",
            self.filename(),
            body,
            rule = rule
        )
    }

    fn summary(&self) -> DocumentSummary {
        match self {
            Self::Processed(content) => DocumentSummary {
                document_id: content.document_id.clone(),
                filename: content.filename.clone(),
                pages: content.pages.len(),
                text_pages: content.count_pages(ExtractionMethod::TextExtraction),
                vision_pages: content.count_pages(ExtractionMethod::VisionFallback),
                failed_pages: content.count_pages(ExtractionMethod::ExtractionError),
                error: None,
            },
            Self::Failed {
                document_id,
                filename,
                error,
            } => DocumentSummary {
                document_id: document_id.clone(),
                filename: filename.clone(),
                pages: 0,
                text_pages: 0,
                vision_pages: 0,
                failed_pages: 0,
                error: Some(error.clone()),
            },
        }
    }
}

/// Per-document counts returned alongside generated flashcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub filename: String,
    pub pages: usize,
    pub text_pages: usize,
    pub vision_pages: usize,
    pub failed_pages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcomes for a batch of documents, in input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IngestionReport {
    pub documents: Vec<DocumentOutcome>,
}

impl IngestionReport {
    /// Combined source content: one ruled block per document.
    pub fn render(&self) -> String {
        self.documents
            .iter()
            .map(DocumentOutcome::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn summaries(&self) -> Vec<DocumentSummary> {
        self.documents.iter().map(DocumentOutcome::summary).collect()
    }
}

/// Runs the hybrid processor over several documents, isolating failures.
pub struct DocumentAggregator<'a, R, V> {
    processor: HybridPageProcessor<'a, R, V>,
}

impl<'a, R: DocumentReader, V: VisionTranscriber> DocumentAggregator<'a, R, V> {
    pub fn new(reader: &'a R, vision: &'a V, settings: &'a IngestionConfig) -> Self {
        Self {
            processor: HybridPageProcessor::new(reader, vision, settings),
        }
    }

    /// Process `documents` in order.
    ///
    /// A document that cannot be processed becomes a `Failed` outcome and the
    /// rest of the batch continues. Cancellation aborts the whole batch.
    pub async fn aggregate(
        &self,
        documents: &[SourceDocument],
        cancel: &CancellationToken,
    ) -> Result<IngestionReport, ProcessingError> {
        let mut report = IngestionReport::default();

        for document in documents {
            if cancel.is_cancelled() {
                return Err(ProcessingError::Cancelled {
                    document_id: document.id.clone(),
                });
            }

            let outcome = match self.processor.process(document, cancel).await {
                Ok(content) => DocumentOutcome::Processed(content),
                Err(e @ ProcessingError::Cancelled { .. }) => return Err(e),
                Err(e) => {
                    warn!(
                        doc_id = %document.id,
                        filename = %document.filename,
                        error = %e,
                        "Failed to process document"
                    );
                    DocumentOutcome::Failed {
                        document_id: document.id.clone(),
                        filename: document.filename.clone(),
                        error: e.to_string(),
                    }
                }
            };
            report.documents.push(outcome);
        }

        info!(documents = report.documents.len(), "Aggregated documents");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::testing::{FakeReader, FakeVision, readable_page};
    use std::path::PathBuf;

    fn source(path: &str) -> SourceDocument {
        SourceDocument {
            id: format!("id-{}", path),
            filename: path.to_string(),
            path: PathBuf::from(path),
        }
    }

    #[tokio::test]
    async fn test_documents_rendered_in_input_order() {
        let reader = FakeReader::default()
            .with_document("a.pdf", &[&readable_page("Alpha")])
            .with_document("b.pdf", &[&readable_page("Beta")]);
        let vision = FakeVision::default();
        let settings = AppConfig::default().ingestion;
        let aggregator = DocumentAggregator::new(&reader, &vision, &settings);

        let report = aggregator
            .aggregate(&[source("a.pdf"), source("b.pdf")], &CancellationToken::new())
            .await
            .unwrap();
        let rendered = report.render();

        let rule = "=".repeat(80);
        assert!(rendered.starts_with(&format!("{rule}\nDocument: a.pdf\n{rule}\n\n=== Page 1 ===\nAlpha")));
        let a = rendered.find("Document: a.pdf").unwrap();
        let b = rendered.find("Document: b.pdf").unwrap();
        assert!(a < b);
        assert!(rendered.contains(&format!("used directly.\n\n{rule}\nDocument: b.pdf")));
    }

    #[tokio::test]
    async fn test_document_order_holds_with_page_failures() {
        let reader = FakeReader::default()
            .with_document("a.pdf", &["", &readable_page("Alpha")])
            .with_document("b.pdf", &[&readable_page("Beta"), ""])
            .with_render_failure("a.pdf", 1);
        let vision = FakeVision::failing_on(&[2]);
        let settings = AppConfig::default().ingestion;
        let aggregator = DocumentAggregator::new(&reader, &vision, &settings);

        let report = aggregator
            .aggregate(&[source("a.pdf"), source("b.pdf")], &CancellationToken::new())
            .await
            .unwrap();
        let rendered = report.render();

        let b_header = rendered.find("Document: b.pdf").unwrap();
        let a_error = rendered.find("=== Page 1 ===\n[Error processing page]").unwrap();
        let a_last = rendered.find(&readable_page("Alpha")).unwrap() + readable_page("Alpha").len();
        let b_first = rendered.find("Beta discusses").unwrap();
        let b_error = rendered.rfind("=== Page 2 ===\n[Error processing page]").unwrap();

        assert!(rendered.starts_with(&format!("{}\nDocument: a.pdf", "=".repeat(80))));
        assert!(a_error < a_last);
        assert!(a_last < b_header);
        assert!(b_header < b_first);
        assert!(b_first < b_error);
        assert!(rendered.ends_with("=== Page 2 ===\n[Error processing page]"));

        let summaries = report.summaries();
        assert_eq!(summaries[0].failed_pages, 1);
        assert_eq!(summaries[1].failed_pages, 1);
    }

    #[tokio::test]
    async fn test_failed_document_is_isolated() {
        let reader = FakeReader::default()
            .with_document("a.pdf", &[&readable_page("Alpha")])
            .with_unreadable("broken.pdf", "trailer not found")
            .with_document("c.pdf", &[&readable_page("Gamma")]);
        let vision = FakeVision::default();
        let settings = AppConfig::default().ingestion;
        let aggregator = DocumentAggregator::new(&reader, &vision, &settings);

        let report = aggregator
            .aggregate(
                &[source("a.pdf"), source("broken.pdf"), source("c.pdf")],
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.documents.len(), 3);
        assert!(matches!(report.documents[0], DocumentOutcome::Processed(_)));
        assert!(matches!(report.documents[2], DocumentOutcome::Processed(_)));

        let rendered = report.render();
        let rule = "=".repeat(80);
        assert!(rendered.contains(&format!(
            "Document: broken.pdf\n{rule}\n\n\
             [Error: Failed to extract text from document: trailer not found]"
        )));
        assert!(rendered.contains("Gamma discusses"));

        let summaries = report.summaries();
        assert_eq!(summaries[1].pages, 0);
        assert!(summaries[1].error.as_deref().unwrap().contains("trailer not found"));
        assert_eq!(summaries[2].text_pages, 1);
    }

    #[tokio::test]
    async fn test_summaries_count_methods() {
        let reader = FakeReader::default()
            .with_document("a.pdf", &[&readable_page("One"), "", ""])
            .with_render_failure("a.pdf", 3);
        let vision = FakeVision::default();
        let settings = AppConfig::default().ingestion;
        let aggregator = DocumentAggregator::new(&reader, &vision, &settings);

        let report = aggregator
            .aggregate(&[source("a.pdf")], &CancellationToken::new())
            .await
            .unwrap();
        let summary = &report.summaries()[0];

        assert_eq!(summary.pages, 3);
        assert_eq!(summary.text_pages, 1);
        assert_eq!(summary.vision_pages, 1);
        assert_eq!(summary.failed_pages, 1);
        assert_eq!(summary.error, None);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_batch() {
        let reader = FakeReader::default().with_document("a.pdf", &[&readable_page("Alpha")]);
        let vision = FakeVision::default();
        let settings = AppConfig::default().ingestion;
        let aggregator = DocumentAggregator::new(&reader, &vision, &settings);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let error = aggregator
            .aggregate(&[source("a.pdf")], &cancel)
            .await
            .unwrap_err();

        assert!(matches!(error, ProcessingError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_empty_batch_renders_nothing() {
        let reader = FakeReader::default();
        let vision = FakeVision::default();
        let settings = AppConfig::default().ingestion;
        let aggregator = DocumentAggregator::new(&reader, &vision, &settings);

        let report = aggregator
            .aggregate(&[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.render(), "");
        assert!(report.summaries().is_empty());
    }
}
