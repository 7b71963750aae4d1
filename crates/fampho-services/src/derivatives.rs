//! Derivative files: thumbnails, previews and rotations.
//!
//! Derivatives never replace their source. Each one is written under a fresh
//! storage key and registered as a new file pointing back at its parent.

use bytes::Bytes;
use std::sync::Arc;
use uuid::Uuid;

use fampho_core::models::{FileKind, NewPhotoFile, Photo, PhotoFile};
use fampho_core::{AppError, DerivativeSettings, Orientation};
use fampho_db::{PhotoFileRepositoryTrait, PhotoRepositoryTrait};
use fampho_processing::{ContentHasher, Derivative, DerivativeGenerator, RotationAngle};
use fampho_storage::{Storage, StorageLayout, StoragePurpose};

#[derive(Clone)]
pub struct DerivativeService {
    photos: Arc<dyn PhotoRepositoryTrait>,
    files: Arc<dyn PhotoFileRepositoryTrait>,
    storage: Arc<dyn Storage>,
    generator: Arc<dyn DerivativeGenerator>,
    layout: StorageLayout,
    settings: DerivativeSettings,
}

impl DerivativeService {
    pub fn new(
        photos: Arc<dyn PhotoRepositoryTrait>,
        files: Arc<dyn PhotoFileRepositoryTrait>,
        storage: Arc<dyn Storage>,
        generator: Arc<dyn DerivativeGenerator>,
        settings: DerivativeSettings,
    ) -> Self {
        Self {
            photos,
            files,
            storage,
            generator,
            layout: StorageLayout::new(),
            settings,
        }
    }

    /// Render and register a thumbnail from already-loaded source bytes.
    pub async fn create_thumbnail(
        &self,
        photo: &Photo,
        source: &PhotoFile,
        data: Bytes,
    ) -> Result<PhotoFile, AppError> {
        let derivative = self
            .generator
            .thumbnail(data, source.orientation(), self.settings.thumbnail_max_dimension)
            .await?;
        let filename = format!("thumb_{}.jpg", photo.id);
        self.register(photo, source, derivative, FileKind::Thumbnail, filename, None)
            .await
    }

    /// Render a preview of `source_file_id`, or of the photo's primary file.
    #[tracing::instrument(skip(self), fields(photo_id = %photo_id))]
    pub async fn generate_preview(
        &self,
        photo_id: Uuid,
        source_file_id: Option<Uuid>,
    ) -> Result<PhotoFile, AppError> {
        let (photo, source) = self.resolve_source(photo_id, source_file_id).await?;
        let data = self.storage.get(&source.storage_key).await?;
        let derivative = self
            .generator
            .preview(
                data,
                source.orientation(),
                self.settings.preview_max_width,
                self.settings.preview_max_height,
            )
            .await?;
        let filename = format!("preview_{}.jpg", photo.id);
        let file = self
            .register(&photo, &source, derivative, FileKind::Preview, filename, None)
            .await?;

        tracing::info!(
            action = "photo.preview",
            photo_id = %photo_id,
            file_id = %file.id,
            "Preview generated"
        );
        Ok(file)
    }

    /// Produce a rotated copy. The source file and its record are left untouched.
    #[tracing::instrument(skip(self), fields(photo_id = %photo_id, degrees = degrees))]
    pub async fn rotate(
        &self,
        photo_id: Uuid,
        degrees: i64,
        source_file_id: Option<Uuid>,
    ) -> Result<PhotoFile, AppError> {
        let angle = RotationAngle::try_from(degrees)?;
        let (photo, source) = self.resolve_source(photo_id, source_file_id).await?;
        let data = self.storage.get(&source.storage_key).await?;

        let derivative = self
            .generator
            .rotate(data, source.orientation(), angle)
            .await?;
        let filename = format!(
            "rotate_{}_{}.{}",
            angle.degrees(),
            photo.id,
            derivative.extension
        );
        let file = self
            .register(
                &photo,
                &source,
                derivative,
                FileKind::Derivative,
                filename,
                Some(angle.derivative_type()),
            )
            .await?;

        tracing::info!(
            action = "photo.rotate",
            photo_id = %photo_id,
            source_file_id = %source.id,
            file_id = %file.id,
            degrees = angle.degrees(),
            "Rotated copy created"
        );
        Ok(file)
    }

    /// The file derivatives are rendered from when none is named: the newest
    /// master, else the first original.
    pub async fn primary_file(&self, photo_id: Uuid) -> Result<Option<PhotoFile>, AppError> {
        let masters = self
            .files
            .find_by_photo_and_kind(photo_id, FileKind::Master)
            .await?;
        if let Some(master) = masters.into_iter().last() {
            return Ok(Some(master));
        }
        let originals = self
            .files
            .find_by_photo_and_kind(photo_id, FileKind::Original)
            .await?;
        Ok(originals.into_iter().next())
    }

    async fn resolve_source(
        &self,
        photo_id: Uuid,
        source_file_id: Option<Uuid>,
    ) -> Result<(Photo, PhotoFile), AppError> {
        let photo = self
            .photos
            .get(photo_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo {} not found", photo_id)))?;

        let source = match source_file_id {
            Some(file_id) => self
                .files
                .get(file_id)
                .await?
                .filter(|f| f.photo_id == photo_id)
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "File {} not found for photo {}",
                        file_id, photo_id
                    ))
                })?,
            None => self.primary_file(photo_id).await?.ok_or_else(|| {
                AppError::NotFound(format!("Photo {} has no source file", photo_id))
            })?,
        };

        Ok((photo, source))
    }

    async fn register(
        &self,
        photo: &Photo,
        source: &PhotoFile,
        derivative: Derivative,
        kind: FileKind,
        filename: String,
        derivative_type: Option<String>,
    ) -> Result<PhotoFile, AppError> {
        let key = self
            .layout
            .resolve(photo.library_id, &filename, StoragePurpose::Derivative);
        let sha256 = ContentHasher::hash_bytes(&derivative.data);
        let size = self.storage.put(&key, derivative.data).await?;

        let file = self
            .files
            .create(NewPhotoFile {
                photo_id: photo.id,
                kind,
                storage_key: key.clone(),
                filename,
                mime_type: derivative.content_type.to_string(),
                bytes: size as i64,
                width: i32::try_from(derivative.width).ok(),
                height: i32::try_from(derivative.height).ok(),
                orientation: i64::from(Orientation::NORMAL.get()),
                sha256,
                metadata_json: None,
                parent_file_id: Some(source.id),
                derivative_type,
            })
            .await;

        match file {
            Ok(file) => Ok(file),
            Err(e) => {
                // Registration failed: do not leave an unreferenced blob behind.
                if let Err(cleanup) = self.storage.delete(&key).await {
                    tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned derivative");
                }
                Err(e)
            }
        }
    }
}
