//! Page transcription with a vision-capable chat model.

use std::future::Future;
use std::io::Cursor;

use base64::Engine;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::config::ModelProfile;
use crate::error::{ProcessingError, format_error_chain};
use crate::openai::{ChatMessage, ChatModel, ChatRequest};

/// Dense pages (equations, tables) need room; never ask for less than this.
pub const MIN_VISION_OUTPUT_TOKENS: u32 = 4096;

const VISION_SYSTEM_PROMPT: &str = "You are an expert at extracting text and understanding content \
from document images. Extract all text, equations, diagrams, and meaningful content from the image. \
Preserve mathematical notation and formatting.";

/// Turns a rendered page into text.
pub trait VisionTranscriber: Send + Sync {
    fn transcribe(
        &self,
        image: &DynamicImage,
        page_number: u32,
    ) -> impl Future<Output = Result<String, ProcessingError>> + Send;
}

/// [`VisionTranscriber`] that asks a chat model to transcribe the page.
pub struct VisionExtractor<'a, M> {
    model: &'a M,
    profile: &'a ModelProfile,
}

impl<'a, M: ChatModel> VisionExtractor<'a, M> {
    pub fn new(model: &'a M, profile: &'a ModelProfile) -> Self {
        Self { model, profile }
    }

    fn build_request(&self, png_base64: &str, page_number: u32) -> ChatRequest {
        let prompt = format!(
            "This is page {} of a document. Please extract and describe all content, including \
             text, equations, diagrams, and any visual elements that convey information.",
            page_number
        );

        let mut request = ChatRequest::new(
            self.profile,
            vec![
                ChatMessage::system(VISION_SYSTEM_PROMPT),
                ChatMessage::user_with_image(prompt, png_base64),
            ],
        );
        request.max_tokens = request.max_tokens.max(MIN_VISION_OUTPUT_TOKENS);
        request
    }
}

impl<M: ChatModel> VisionTranscriber for VisionExtractor<'_, M> {
    async fn transcribe(
        &self,
        image: &DynamicImage,
        page_number: u32,
    ) -> Result<String, ProcessingError> {
        let png_base64 =
            encode_png_base64(image).map_err(|e| ProcessingError::VisionExtraction {
                page: page_number,
                message: format!("Failed to encode page image: {}", e),
            })?;

        debug!(
            page = page_number,
            encoded_bytes = png_base64.len(),
            model = %self.profile.model,
            "Transcribing page with vision model"
        );

        let request = self.build_request(&png_base64, page_number);
        self.model
            .complete(&request)
            .await
            .map_err(|e| ProcessingError::VisionExtraction {
                page: page_number,
                message: format_error_chain(&e),
            })
    }
}

/// Encode an image as PNG and then base64 for a data URI.
pub fn encode_png_base64(image: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(buffer.into_inner()))
}
