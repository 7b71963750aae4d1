//! Photo reads, descriptive metadata and soft deletion

use std::sync::Arc;
use uuid::Uuid;

use fampho_core::models::{MetadataUpdate, Photo, PhotoFile, PhotoFilter, PhotoState};
use fampho_core::AppError;
use fampho_db::{PhotoFileRepositoryTrait, PhotoRepositoryTrait};
use fampho_processing::ContentHasher;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

#[derive(Clone)]
pub struct PhotoService {
    photos: Arc<dyn PhotoRepositoryTrait>,
    files: Arc<dyn PhotoFileRepositoryTrait>,
}

impl PhotoService {
    pub fn new(
        photos: Arc<dyn PhotoRepositoryTrait>,
        files: Arc<dyn PhotoFileRepositoryTrait>,
    ) -> Self {
        Self { photos, files }
    }

    pub async fn get(&self, photo_id: Uuid) -> Result<Photo, AppError> {
        self.photos
            .get(photo_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo {} not found", photo_id)))
    }

    pub async fn list(
        &self,
        library_id: Uuid,
        state: Option<PhotoState>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Photo>, AppError> {
        let filter = PhotoFilter {
            state,
            is_rejected: None,
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
            offset: offset.filter(|o| *o >= 0).unwrap_or(0),
        };
        self.photos.list(library_id, &filter).await
    }

    /// All files registered for a photo, oldest first.
    pub async fn files(&self, photo_id: Uuid) -> Result<Vec<PhotoFile>, AppError> {
        self.get(photo_id).await?;
        self.files.find_by_photo(photo_id).await
    }

    /// Record descriptive metadata. Workflow state is not affected.
    #[tracing::instrument(skip(self, update), fields(photo_id = %photo_id))]
    pub async fn update_metadata(
        &self,
        photo_id: Uuid,
        actor_id: Uuid,
        update: MetadataUpdate,
    ) -> Result<Photo, AppError> {
        let details = update.into_details()?;
        let photo = self
            .photos
            .update_details(photo_id, &details)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo {} not found", photo_id)))?;

        tracing::info!(
            action = "photo.metadata_update",
            photo_id = %photo_id,
            actor_id = %actor_id,
            date_taken = details.date_taken.is_some(),
            location_text = details.location_text.is_some(),
            description = details.description.is_some(),
            "Photo metadata updated"
        );
        Ok(photo)
    }

    pub async fn soft_delete(&self, photo_id: Uuid, actor_id: Uuid) -> Result<(), AppError> {
        if !self.photos.soft_delete(photo_id).await? {
            return Err(AppError::NotFound(format!("Photo {} not found", photo_id)));
        }
        tracing::info!(action = "photo.delete", photo_id = %photo_id, actor_id = %actor_id, "Photo deleted");
        Ok(())
    }

    /// Files whose content matches `digest`, across all libraries.
    ///
    /// Soft deletion keeps a photo's files registered, so they are still reported.
    pub async fn lookup_by_digest(&self, digest: &str) -> Result<Vec<PhotoFile>, AppError> {
        let digest = digest.trim().to_ascii_lowercase();
        if !ContentHasher::is_valid_digest(&digest) {
            return Err(AppError::InvalidInput(format!(
                "Not a SHA-256 hex digest: {}",
                digest
            )));
        }
        self.files.find_by_digest(&digest).await
    }
}
