//! Batch upload ingestion: validate → stage → hash → dedup → extract → store → register.
//!
//! Files are processed one after another so a duplicate inside the same batch
//! is caught by the digest lookup. Each file is isolated: any failure becomes
//! an `error` entry in the report and the batch moves on.

use bytes::Bytes;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use fampho_core::models::{FileKind, NewPhoto, NewPhotoFile, PhotoState};
use fampho_core::AppError;
use fampho_db::{PhotoFileRepositoryTrait, PhotoRepositoryTrait};
use fampho_processing::{ContentHasher, ImageProcessor, MediaValidator, MetadataExtractor};
use fampho_storage::{Storage, StorageLayout, StoragePurpose};

use crate::derivatives::DerivativeService;
use crate::workflow::WorkflowEngine;

/// Where an uploaded file's bytes come from
#[derive(Debug, Clone)]
pub enum UploadSource {
    Bytes(Bytes),
    Path(PathBuf),
}

/// One file of an upload batch
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_filename: String,
    pub content_type: String,
    pub source: UploadSource,
}

impl UploadedFile {
    pub fn from_bytes(
        original_filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            original_filename: original_filename.into(),
            content_type: content_type.into(),
            source: UploadSource::Bytes(data.into()),
        }
    }

    pub fn from_path(
        original_filename: impl Into<String>,
        content_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            original_filename: original_filename.into(),
            content_type: content_type.into(),
            source: UploadSource::Path(path.into()),
        }
    }
}

/// Per-file result of an ingestion batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Success {
        photo_id: Uuid,
        file_id: Uuid,
        thumbnail_file_id: Option<Uuid>,
    },
    Duplicate {
        existing_photo_id: Uuid,
        existing_file_id: Uuid,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub filename: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Batch summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub uploaded: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub results: Vec<FileResult>,
}

impl IngestReport {
    fn record(&mut self, filename: String, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Success { .. } => self.uploaded += 1,
            FileOutcome::Duplicate { .. } => self.duplicates += 1,
            FileOutcome::Error { .. } => self.errors += 1,
        }
        self.results.push(FileResult { filename, outcome });
    }
}

#[derive(Clone)]
pub struct IngestionPipeline {
    photos: Arc<dyn PhotoRepositoryTrait>,
    files: Arc<dyn PhotoFileRepositoryTrait>,
    storage: Arc<dyn Storage>,
    extractor: Arc<dyn MetadataExtractor>,
    validator: MediaValidator,
    workflow: WorkflowEngine,
    derivatives: DerivativeService,
    layout: StorageLayout,
}

impl IngestionPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        photos: Arc<dyn PhotoRepositoryTrait>,
        files: Arc<dyn PhotoFileRepositoryTrait>,
        storage: Arc<dyn Storage>,
        extractor: Arc<dyn MetadataExtractor>,
        validator: MediaValidator,
        workflow: WorkflowEngine,
        derivatives: DerivativeService,
    ) -> Self {
        Self {
            photos,
            files,
            storage,
            extractor,
            validator,
            workflow,
            derivatives,
            layout: StorageLayout::new(),
        }
    }

    /// Ingest a batch into `library_id`.
    #[tracing::instrument(skip(self, files), fields(library_id = %library_id, files = files.len()))]
    pub async fn ingest(
        &self,
        library_id: Uuid,
        uploader_id: Uuid,
        files: Vec<UploadedFile>,
    ) -> IngestReport {
        let start = Instant::now();
        let mut report = IngestReport::default();

        for file in files {
            let filename = file.original_filename.clone();
            let outcome = match self.ingest_one(library_id, uploader_id, file).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(filename = %filename, error = %e, "File ingestion failed");
                    FileOutcome::Error {
                        message: e.to_string(),
                    }
                }
            };
            report.record(filename, outcome);
        }

        tracing::info!(
            action = "photo.upload",
            library_id = %library_id,
            uploader_id = %uploader_id,
            uploaded = report.uploaded,
            duplicates = report.duplicates,
            errors = report.errors,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload batch processed"
        );
        report
    }

    async fn ingest_one(
        &self,
        library_id: Uuid,
        uploader_id: Uuid,
        file: UploadedFile,
    ) -> Result<FileOutcome, AppError> {
        let size = match &file.source {
            UploadSource::Bytes(data) => data.len(),
            UploadSource::Path(path) => {
                let len = tokio::fs::metadata(path).await?.len();
                usize::try_from(len).unwrap_or(usize::MAX)
            }
        };
        self.validator
            .validate_all(&file.original_filename, &file.content_type, size)?;

        let incoming =
            self.layout
                .resolve(library_id, &file.original_filename, StoragePurpose::Incoming);
        match &file.source {
            UploadSource::Bytes(data) => {
                self.storage.put(&incoming, data.clone()).await?;
            }
            UploadSource::Path(path) => {
                let reader = tokio::fs::File::open(path).await?;
                self.storage.put_stream(&incoming, Box::pin(reader)).await?;
            }
        }

        let result = self
            .ingest_staged(library_id, uploader_id, &file, &incoming)
            .await;
        if !matches!(result, Ok(FileOutcome::Success { .. })) {
            // Duplicates and failures leave nothing behind in staging.
            self.remove_blob(&incoming).await;
        }
        result
    }

    async fn ingest_staged(
        &self,
        library_id: Uuid,
        uploader_id: Uuid,
        file: &UploadedFile,
        incoming: &str,
    ) -> Result<FileOutcome, AppError> {
        let digest = ContentHasher::hash_stream(self.storage.get_stream(incoming).await?).await?;

        let existing = self.files.find_by_digest(&digest).await?;
        if let Some(first) = existing.first() {
            tracing::info!(
                filename = %file.original_filename,
                digest = %digest,
                existing_photo_id = %first.photo_id,
                "Duplicate upload skipped"
            );
            return Ok(FileOutcome::Duplicate {
                existing_photo_id: first.photo_id,
                existing_file_id: first.id,
            });
        }

        let data = self.storage.get(incoming).await?;
        let info = ImageProcessor::probe(&data)
            .map_err(|e| AppError::InvalidInput(format!("{}: {}", file.original_filename, e)))?;

        let extractor = self.extractor.clone();
        let scan = data.clone();
        let metadata = tokio::task::spawn_blocking(move || extractor.extract(&scan))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Metadata extraction task failed");
                Default::default()
            });

        let master = self
            .layout
            .resolve(library_id, &file.original_filename, StoragePurpose::Master);
        self.storage.rename(incoming, &master).await?;

        let photo = match self
            .photos
            .create(NewPhoto::new(library_id, uploader_id).with_date_taken(metadata.taken_at))
            .await
        {
            Ok(photo) => photo,
            Err(e) => {
                self.remove_blob(&master).await;
                return Err(e);
            }
        };

        let registered = async {
            let photo = self
                .workflow
                .transition(
                    photo.id,
                    PhotoState::Uploaded,
                    PhotoState::Triage,
                    uploader_id,
                    Some("Upload completed".to_string()),
                )
                .await?;
            let original = self
                .files
                .create(NewPhotoFile {
                    photo_id: photo.id,
                    kind: FileKind::Original,
                    storage_key: master.clone(),
                    filename: file.original_filename.clone(),
                    mime_type: info.mime_type().to_string(),
                    bytes: data.len() as i64,
                    width: i32::try_from(info.width).ok(),
                    height: i32::try_from(info.height).ok(),
                    orientation: i64::from(metadata.orientation.get()),
                    sha256: digest.clone(),
                    metadata_json: metadata.to_json(),
                    parent_file_id: None,
                    derivative_type: None,
                })
                .await?;
            Ok::<_, AppError>((photo, original))
        }
        .await;

        let (photo, original) = match registered {
            Ok(registered) => registered,
            Err(e) => {
                // A photo without its original must not surface in any queue.
                if let Err(cleanup) = self.photos.soft_delete(photo.id).await {
                    tracing::warn!(photo_id = %photo.id, error = %cleanup, "Failed to withdraw incomplete photo");
                }
                self.remove_blob(&master).await;
                return Err(e);
            }
        };

        let thumbnail_file_id = match self
            .derivatives
            .create_thumbnail(&photo, &original, data)
            .await
        {
            Ok(thumb) => Some(thumb.id),
            Err(e) => {
                tracing::warn!(photo_id = %photo.id, error = %e, "Thumbnail generation failed, continuing without one");
                None
            }
        };

        tracing::info!(
            photo_id = %photo.id,
            file_id = %original.id,
            digest = %digest,
            size_bytes = original.bytes,
            width = info.width,
            height = info.height,
            "Photo ingested"
        );

        Ok(FileOutcome::Success {
            photo_id: photo.id,
            file_id: original.id,
            thumbnail_file_id,
        })
    }

    async fn remove_blob(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to remove stored upload");
        }
    }
}
