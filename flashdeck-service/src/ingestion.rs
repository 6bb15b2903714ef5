//! Document ingestion.
//!
//! Turns uploaded PDFs into labelled page text:
//! - per-page text extraction, with a vision-model fallback for pages whose
//!   text layer is missing or too thin
//! - aggregation of several documents into one block of source content
//! - truncation of that content to the generation context budget

pub mod aggregate;
pub mod assemble;
pub mod hash;
pub mod hybrid;
pub mod pdf;
pub mod sufficiency;
pub mod vision;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::Serialize;

use crate::error::ProcessingError;
use crate::models::DocumentMetadata;

pub use aggregate::{DocumentAggregator, DocumentSummary, IngestionReport};
pub use assemble::assemble_content;
pub use hybrid::HybridPageProcessor;
pub use pdf::PdfiumReader;
pub use vision::{VisionExtractor, VisionTranscriber};

/// Text shown in place of a page that could not be read by either method.
pub const PAGE_ERROR_PLACEHOLDER: &str = "[Error processing page]";

/// Access to the pages of a document on disk.
pub trait DocumentReader: Send + Sync {
    /// Text of every page, keyed by 1-indexed page number. Pages without a
    /// text layer map to an empty string.
    fn page_texts(&self, path: &Path) -> Result<BTreeMap<u32, String>, ProcessingError>;

    /// Render a single 1-indexed page at the given resolution.
    fn render_page(
        &self,
        path: &Path,
        page_number: u32,
        dpi: u32,
    ) -> Result<DynamicImage, ProcessingError>;

    fn metadata(&self, path: &Path) -> Result<DocumentMetadata, ProcessingError>;
}

/// How a page's text was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    TextExtraction,
    VisionFallback,
    ExtractionError,
}

/// Text for one page of one document
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub document_id: String,
    pub page_number: u32,
    pub raw_text: String,
    pub method: ExtractionMethod,
    /// Why the fallback failed, for `ExtractionError` pages. Never rendered.
    pub error: Option<String>,
}

impl PageText {
    pub fn extracted(document_id: &str, page_number: u32, text: String) -> Self {
        Self {
            document_id: document_id.to_string(),
            page_number,
            raw_text: text,
            method: ExtractionMethod::TextExtraction,
            error: None,
        }
    }

    pub fn transcribed(document_id: &str, page_number: u32, text: String) -> Self {
        Self {
            document_id: document_id.to_string(),
            page_number,
            raw_text: text,
            method: ExtractionMethod::VisionFallback,
            error: None,
        }
    }

    pub fn failed(document_id: &str, page_number: u32, error: &ProcessingError) -> Self {
        Self {
            document_id: document_id.to_string(),
            page_number,
            raw_text: PAGE_ERROR_PLACEHOLDER.to_string(),
            method: ExtractionMethod::ExtractionError,
            error: Some(error.to_string()),
        }
    }

    pub fn header(&self) -> String {
        match self.method {
            ExtractionMethod::VisionFallback => {
                format!("=== Page {} (Vision API) ===", self.page_number)
            }
            ExtractionMethod::TextExtraction | ExtractionMethod::ExtractionError => {
                format!("=== Page {} ===", self.page_number)
            }
        }
    }

    pub fn render(&self) -> String {
        format!("{}\n{}", self.header(), self.raw_text)
    }
}

/// All pages of one document, in ascending page order
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContent {
    pub document_id: String,
    pub filename: String,
    pub pages: Vec<PageText>,
}

impl DocumentContent {
    pub fn render(&self) -> String {
        self.pages
            .iter()
            .map(PageText::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn count_pages(&self, method: ExtractionMethod) -> usize {
        self.pages.iter().filter(|page| page.method == method).count()
    }
}

/// An uploaded document staged on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub id: String,
    pub filename: String,
    pub path: PathBuf,
}
