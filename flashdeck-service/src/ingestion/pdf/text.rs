//! PDF text extraction.

use std::collections::BTreeMap;
use std::path::Path;

use pdfium_render::prelude::*;
use tracing::{debug, info};

use crate::error::ProcessingError;

/// Extract the text layer of every page.
///
/// Page numbers are 1-indexed and contiguous. A page without text maps to an
/// empty string. Any failure, for the document or a single page, is reported
/// as one `DocumentParse` error.
pub fn extract_page_texts(
    pdfium: &Pdfium,
    path: &Path,
) -> Result<BTreeMap<u32, String>, ProcessingError> {
    let document =
        pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| ProcessingError::DocumentParse {
                message: format!("Failed to load PDF: {}", e),
            })?;

    let page_count = document.pages().len();
    info!(pages = page_count, path = %path.display(), "Extracting PDF page text");

    let mut page_texts = BTreeMap::new();
    for (page_index, page) in document.pages().iter().enumerate() {
        let page_number = page_index as u32 + 1;

        let text = page.text().map_err(|e| ProcessingError::DocumentParse {
            message: format!("Failed to extract text from page {}: {}", page_number, e),
        })?;

        page_texts.insert(page_number, text.all());
    }

    debug!(
        pages = page_texts.len(),
        empty_pages = page_texts.values().filter(|t| t.trim().is_empty()).count(),
        "PDF text extracted"
    );

    Ok(page_texts)
}
