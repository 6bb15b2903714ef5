//! PDF access through PDFium.
//!
//! - Per-page text extraction
//! - Full-page rasterization for the vision fallback
//! - Page count and size lookup for upload validation

pub mod render;
pub mod text;

use std::collections::BTreeMap;
use std::path::Path;

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::ProcessingError;
use crate::ingestion::DocumentReader;
use crate::models::DocumentMetadata;

pub use render::render_page;
pub use text::extract_page_texts;

/// Create a new Pdfium instance (dynamically linked).
///
/// Searches for libpdfium in:
/// 1. Current directory (./libpdfium.so)
/// 2. vendor/pdfium/lib/
/// 3. System library paths
pub fn create_pdfium() -> Result<Pdfium, String> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "./vendor/pdfium/lib/",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| format!("Failed to load PDFium library: {:?}", e))?;

    Ok(Pdfium::new(bindings))
}

/// [`DocumentReader`] backed by a freshly bound PDFium per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumReader;

impl DocumentReader for PdfiumReader {
    fn page_texts(&self, path: &Path) -> Result<BTreeMap<u32, String>, ProcessingError> {
        let pdfium = create_pdfium().map_err(|message| ProcessingError::DocumentParse { message })?;
        extract_page_texts(&pdfium, path)
    }

    fn render_page(
        &self,
        path: &Path,
        page_number: u32,
        dpi: u32,
    ) -> Result<DynamicImage, ProcessingError> {
        let pdfium = create_pdfium().map_err(|message| ProcessingError::Rasterization {
            page: page_number,
            message,
        })?;
        render_page(&pdfium, path, page_number, dpi)
    }

    fn metadata(&self, path: &Path) -> Result<DocumentMetadata, ProcessingError> {
        let pdfium = create_pdfium().map_err(|message| ProcessingError::DocumentParse { message })?;
        let document =
            pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| ProcessingError::DocumentParse {
                    message: format!("Failed to load PDF: {}", e),
                })?;

        let page_count = document.pages().len() as u32;
        let file_size = std::fs::metadata(path)
            .map_err(ProcessingError::Io)?
            .len();

        debug!(
            path = %path.display(),
            pages = page_count,
            bytes = file_size,
            "Read PDF metadata"
        );

        Ok(DocumentMetadata::new(page_count, file_size))
    }
}
