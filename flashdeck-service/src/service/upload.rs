//! Upload validation and on-disk staging.

use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::{LimitsConfig, StorageConfig};
use crate::error::{ProcessingError, ServiceError, ServiceResult};
use crate::ingestion::hash::document_id;
use crate::ingestion::{DocumentReader, SourceDocument};
use crate::models::DocumentMetadata;
use crate::service::FlashdeckService;

const SUPPORTED_EXTENSION: &str = "pdf";

/// A file received from a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Uploaded documents written to a temporary directory. The directory and
/// its files are removed when the batch is dropped.
pub struct StagedBatch {
    _dir: TempDir,
    pub documents: Vec<SourceDocument>,
}

/// Check extension, emptiness and size of one upload.
pub fn validate_upload(
    filename: &str,
    size: u64,
    limits: &LimitsConfig,
) -> Result<(), ProcessingError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some(SUPPORTED_EXTENSION) => {}
        Some(other) => {
            return Err(ProcessingError::UnsupportedFormat {
                format: other.to_string(),
            });
        }
        None => {
            return Err(ProcessingError::UnsupportedFormat {
                format: "unknown".to_string(),
            });
        }
    }

    if size == 0 {
        return Err(ProcessingError::EmptyFile {
            filename: filename.to_string(),
        });
    }

    if size > limits.max_document_size_bytes {
        return Err(ProcessingError::FileTooLarge {
            size,
            max: limits.max_document_size_bytes,
        });
    }

    Ok(())
}

fn staging_dir(storage: &StorageConfig) -> std::io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("flashdeck-upload-");
    match &storage.upload_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            builder.tempdir_in(dir)
        }
        None => builder.tempdir(),
    }
}

impl<R, M> FlashdeckService<R, M> {
    /// Validate a batch of uploads and write them to a fresh staging directory.
    pub fn stage_uploads(&self, files: &[UploadedFile]) -> ServiceResult<StagedBatch> {
        let limits = &self.config.limits;

        if files.is_empty() {
            return Err(ServiceError::InvalidRequest {
                message: "No files provided".to_string(),
            });
        }
        if files.len() > limits.max_documents_per_request {
            return Err(ServiceError::InvalidRequest {
                message: format!(
                    "Too many files: {} (max {})",
                    files.len(),
                    limits.max_documents_per_request
                ),
            });
        }

        for file in files {
            validate_upload(&file.filename, file.data.len() as u64, limits)?;
        }

        let dir = staging_dir(&self.config.storage).map_err(ProcessingError::Io)?;

        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            let path = dir.path().join(format!("{}.pdf", uuid::Uuid::new_v4()));
            std::fs::write(&path, &file.data).map_err(ProcessingError::Io)?;

            let id = document_id(&file.data);
            debug!(doc_id = %id, filename = %file.filename, path = %path.display(), "Staged upload");
            documents.push(SourceDocument {
                id,
                filename: file.filename.clone(),
                path,
            });
        }

        info!(
            documents = documents.len(),
            dir = %dir.path().display(),
            "Staged uploads"
        );

        Ok(StagedBatch {
            _dir: dir,
            documents,
        })
    }
}

impl<R: DocumentReader, M> FlashdeckService<R, M> {
    /// Page count and size of a single uploaded document.
    pub fn document_metadata(&self, file: &UploadedFile) -> ServiceResult<DocumentMetadata> {
        let batch = self.stage_uploads(std::slice::from_ref(file))?;
        let document = batch
            .documents
            .first()
            .ok_or_else(|| ServiceError::Internal {
                message: "Staged batch is empty".to_string(),
            })?;
        Ok(self.reader.metadata(&document.path)?)
    }
}
