//! Fampho Services Layer
//!
//! Orchestration for the archive core: the workflow state machine, batch
//! ingestion, derivative rendering and photo maintenance. Services receive
//! their repositories, storage and processors explicitly; [`Archive`] wires
//! the standard set together.

pub mod derivatives;
pub mod ingest;
pub mod photos;
pub mod workflow;

use std::sync::Arc;

use fampho_core::{DerivativeSettings, UploadLimits};
use fampho_db::{
    InMemoryPhotoFileRepository, InMemoryPhotoRepository, PhotoFileRepositoryTrait,
    PhotoRepositoryTrait,
};
use fampho_processing::{ExifMetadataExtractor, ImageDerivativeGenerator, MediaValidator};
use fampho_storage::Storage;

pub use derivatives::DerivativeService;
pub use ingest::{FileOutcome, FileResult, IngestReport, IngestionPipeline, UploadSource, UploadedFile};
pub use photos::PhotoService;
pub use workflow::{RejectedQueue, WorkflowEngine};

/// The archive's services, sharing one set of repositories and storage
#[derive(Clone)]
pub struct Archive {
    pub workflow: WorkflowEngine,
    pub ingestion: IngestionPipeline,
    pub derivatives: DerivativeService,
    pub photos: PhotoService,
}

impl Archive {
    pub fn new(
        photos: Arc<dyn PhotoRepositoryTrait>,
        files: Arc<dyn PhotoFileRepositoryTrait>,
        storage: Arc<dyn Storage>,
        upload: &UploadLimits,
        settings: DerivativeSettings,
    ) -> Self {
        let workflow = WorkflowEngine::new(photos.clone());
        let derivatives = DerivativeService::new(
            photos.clone(),
            files.clone(),
            storage.clone(),
            Arc::new(ImageDerivativeGenerator::new(settings)),
            settings,
        );
        let ingestion = IngestionPipeline::new(
            photos.clone(),
            files.clone(),
            storage,
            Arc::new(ExifMetadataExtractor::new()),
            MediaValidator::from_limits(upload),
            workflow.clone(),
            derivatives.clone(),
        );
        let photos = PhotoService::new(photos, files);

        Self {
            workflow,
            ingestion,
            derivatives,
            photos,
        }
    }

    /// Archive backed by in-process repositories.
    pub fn in_memory(
        storage: Arc<dyn Storage>,
        upload: &UploadLimits,
        settings: DerivativeSettings,
    ) -> Self {
        Self::new(
            Arc::new(InMemoryPhotoRepository::new()),
            Arc::new(InMemoryPhotoFileRepository::new()),
            storage,
            upload,
            settings,
        )
    }
}
