//! Full-page rendering using pdfium-render.

use std::path::Path;

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::ProcessingError;

/// PDF user space is 72 points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Render one page (1-indexed) at the given DPI.
pub fn render_page(
    pdfium: &Pdfium,
    pdf_path: &Path,
    page_number: u32,
    dpi: u32,
) -> Result<DynamicImage, ProcessingError> {
    let rasterization_error = |message: String| ProcessingError::Rasterization {
        page: page_number,
        message,
    };

    let page_index = page_number
        .checked_sub(1)
        .and_then(|index| u16::try_from(index).ok())
        .ok_or_else(|| rasterization_error(format!("Invalid page number {}", page_number)))?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| rasterization_error(format!("Failed to load PDF for render: {}", e)))?;

    let pages = document.pages();
    let page = pages
        .get(page_index)
        .map_err(|e| rasterization_error(format!("Failed to get page: {}", e)))?;

    let pixels_per_point = dpi as f32 / POINTS_PER_INCH;
    let width = (page.width().value * pixels_per_point).ceil() as i32;
    let height = (page.height().value * pixels_per_point).ceil() as i32;

    debug!(
        page = page_number,
        dpi = dpi,
        size = format!("{}x{}", width, height),
        "Rendering page"
    );

    let config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height);

    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| rasterization_error(format!("Failed to render page: {}", e)))?;

    let image: DynamicImage = bitmap.as_image();
    if image.width() == 0 || image.height() == 0 {
        return Err(rasterization_error(
            "Renderer produced an empty image".to_string(),
        ));
    }

    Ok(image)
}
