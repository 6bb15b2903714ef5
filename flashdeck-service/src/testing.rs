//! In-memory stand-ins for PDFium and the chat provider.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::DynamicImage;

use crate::error::{ProcessingError, ProviderError};
use crate::ingestion::{DocumentReader, VisionTranscriber};
use crate::models::DocumentMetadata;
use crate::openai::{ChatModel, ChatRequest};

/// Chat model that replays canned completions and records every request.
pub struct FakeChatModel {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeChatModel {
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(error)])),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ChatModel for FakeChatModel {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::EmptyCompletion))
    }
}

/// Document reader over in-memory page text.
#[derive(Default)]
pub struct FakeReader {
    documents: HashMap<PathBuf, Vec<String>>,
    unreadable: HashMap<PathBuf, String>,
    render_failures: HashSet<(PathBuf, u32)>,
    render_calls: Mutex<Vec<(PathBuf, u32)>>,
}

impl FakeReader {
    pub fn with_document(mut self, path: &str, pages: &[&str]) -> Self {
        self.documents.insert(
            PathBuf::from(path),
            pages.iter().map(|page| page.to_string()).collect(),
        );
        self
    }

    pub fn with_unreadable(mut self, path: &str, message: &str) -> Self {
        self.unreadable
            .insert(PathBuf::from(path), message.to_string());
        self
    }

    pub fn with_render_failure(mut self, path: &str, page_number: u32) -> Self {
        self.render_failures
            .insert((PathBuf::from(path), page_number));
        self
    }

    pub fn render_calls(&self) -> Vec<(PathBuf, u32)> {
        self.render_calls.lock().unwrap().clone()
    }
}

impl DocumentReader for FakeReader {
    fn page_texts(&self, path: &Path) -> Result<BTreeMap<u32, String>, ProcessingError> {
        if let Some(message) = self.unreadable.get(path) {
            return Err(ProcessingError::DocumentParse {
                message: message.clone(),
            });
        }
        let pages = self
            .documents
            .get(path)
            .ok_or_else(|| ProcessingError::DocumentParse {
                message: format!("No such document: {}", path.display()),
            })?;
        Ok(pages
            .iter()
            .enumerate()
            .map(|(index, text)| (index as u32 + 1, text.clone()))
            .collect())
    }

    fn render_page(
        &self,
        path: &Path,
        page_number: u32,
        _dpi: u32,
    ) -> Result<DynamicImage, ProcessingError> {
        self.render_calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), page_number));
        if self
            .render_failures
            .contains(&(path.to_path_buf(), page_number))
        {
            return Err(ProcessingError::Rasterization {
                page: page_number,
                message: "renderer produced no images".to_string(),
            });
        }
        Ok(DynamicImage::new_rgba8(2, 2))
    }

    fn metadata(&self, path: &Path) -> Result<DocumentMetadata, ProcessingError> {
        let pages = self.page_texts(path)?;
        Ok(DocumentMetadata::new(pages.len() as u32, 1024))
    }
}

/// Vision transcriber that echoes the page number, or fails on chosen pages.
#[derive(Default)]
pub struct FakeVision {
    failing_pages: HashSet<u32>,
    calls: Mutex<Vec<u32>>,
}

impl FakeVision {
    pub fn failing_on(pages: &[u32]) -> Self {
        Self {
            failing_pages: pages.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

impl VisionTranscriber for FakeVision {
    async fn transcribe(
        &self,
        _image: &DynamicImage,
        page_number: u32,
    ) -> Result<String, ProcessingError> {
        self.calls.lock().unwrap().push(page_number);
        if self.failing_pages.contains(&page_number) {
            return Err(ProcessingError::VisionExtraction {
                page: page_number,
                message: "vision model unavailable".to_string(),
            });
        }
        Ok(format!("Transcribed page {}", page_number))
    }
}

/// Page text long enough to pass the default sufficiency threshold.
pub fn readable_page(label: &str) -> String {
    format!(
        "{} discusses the main ideas of the chapter in enough detail to be used directly.",
        label
    )
}
