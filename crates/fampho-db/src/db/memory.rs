//! In-process repositories.
//!
//! Same contracts as the PostgreSQL implementations, held behind a tokio
//! `Mutex`. A transition checks the source state, updates the photo and
//! appends its event under one lock, which gives the same all-or-nothing
//! behaviour as the conditional update in a transaction.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use fampho_core::models::{
    FileKind, NewPhoto, NewPhotoFile, Photo, PhotoDetails, PhotoFile, PhotoFilter, PhotoState,
    StateTransition, WorkflowEvent,
};
use fampho_core::AppError;

use super::photo::PhotoRepositoryTrait;
use super::photo_file::PhotoFileRepositoryTrait;

#[derive(Default)]
struct PhotoStore {
    photos: HashMap<Uuid, Photo>,
    events: Vec<WorkflowEvent>,
    next_event_id: i64,
}

#[derive(Clone, Default)]
pub struct InMemoryPhotoRepository {
    inner: Arc<Mutex<PhotoStore>>,
}

impl InMemoryPhotoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(0);
    let limit = usize::try_from(limit).unwrap_or(0);
    items.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl PhotoRepositoryTrait for InMemoryPhotoRepository {
    async fn create(&self, photo: NewPhoto) -> Result<Photo, AppError> {
        let now = Utc::now();
        let row = Photo {
            id: Uuid::new_v4(),
            library_id: photo.library_id,
            uploaded_by: photo.uploaded_by,
            current_state: photo.initial_state,
            date_taken: photo.date_taken,
            location_text: None,
            description: None,
            is_flagged: photo.initial_state == PhotoState::Flagged,
            is_rejected: photo.initial_state == PhotoState::Rejected,
            uploaded_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.inner.lock().await.photos.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Photo>, AppError> {
        let store = self.inner.lock().await;
        Ok(store.photos.get(&id).filter(|p| !p.is_deleted()).cloned())
    }

    async fn list(&self, library_id: Uuid, filter: &PhotoFilter) -> Result<Vec<Photo>, AppError> {
        let store = self.inner.lock().await;
        let mut rows: Vec<Photo> = store
            .photos
            .values()
            .filter(|p| p.library_id == library_id && filter.matches(p))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(page(rows, filter.limit, filter.offset))
    }

    async fn count(&self, library_id: Uuid, filter: &PhotoFilter) -> Result<i64, AppError> {
        let store = self.inner.lock().await;
        let count = store
            .photos
            .values()
            .filter(|p| p.library_id == library_id && filter.matches(p))
            .count();
        Ok(count as i64)
    }

    async fn update_details(
        &self,
        id: Uuid,
        details: &PhotoDetails,
    ) -> Result<Option<Photo>, AppError> {
        let mut store = self.inner.lock().await;
        let Some(photo) = store.photos.get_mut(&id).filter(|p| !p.is_deleted()) else {
            return Ok(None);
        };
        if let Some(date_taken) = details.date_taken {
            photo.date_taken = Some(date_taken);
        }
        if let Some(location) = &details.location_text {
            photo.location_text = Some(location.clone());
        }
        if let Some(description) = &details.description {
            photo.description = Some(description.clone());
        }
        photo.updated_at = Utc::now();
        Ok(Some(photo.clone()))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut store = self.inner.lock().await;
        match store.photos.get_mut(&id).filter(|p| !p.is_deleted()) {
            Some(photo) => {
                let now = Utc::now();
                photo.deleted_at = Some(now);
                photo.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn transition_state(&self, transition: &StateTransition) -> Result<Photo, AppError> {
        let mut store = self.inner.lock().await;
        let now = Utc::now();

        let photo = store
            .photos
            .get_mut(&transition.photo_id)
            .filter(|p| !p.is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("Photo {} not found", transition.photo_id)))?;

        if photo.current_state != transition.from {
            return Err(AppError::StateConflict {
                photo_id: transition.photo_id,
                expected: transition.from,
                actual: photo.current_state,
            });
        }

        photo.current_state = transition.to;
        if let Some(rejected) = transition.set_rejected {
            photo.is_rejected = rejected;
        }
        photo.updated_at = now;
        let updated = photo.clone();

        store.next_event_id += 1;
        let event = WorkflowEvent {
            id: store.next_event_id,
            photo_id: transition.photo_id,
            from_state: transition.from,
            to_state: transition.to,
            actor_user_id: transition.actor_id,
            reason: transition.reason.clone(),
            created_at: now,
        };
        store.events.push(event);

        Ok(updated)
    }

    async fn list_events(&self, photo_id: Uuid) -> Result<Vec<WorkflowEvent>, AppError> {
        let store = self.inner.lock().await;
        Ok(store
            .events
            .iter()
            .filter(|e| e.photo_id == photo_id)
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryPhotoFileRepository {
    files: Arc<Mutex<Vec<PhotoFile>>>,
}

impl InMemoryPhotoFileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PhotoFileRepositoryTrait for InMemoryPhotoFileRepository {
    async fn create(&self, file: NewPhotoFile) -> Result<PhotoFile, AppError> {
        let mut files = self.files.lock().await;
        if files.iter().any(|f| f.storage_key == file.storage_key) {
            return Err(AppError::InvalidInput(format!(
                "Storage key already registered: {}",
                file.storage_key
            )));
        }
        let orientation = file.normalized_orientation();
        let row = PhotoFile {
            id: Uuid::new_v4(),
            photo_id: file.photo_id,
            kind: file.kind,
            storage_key: file.storage_key,
            filename: file.filename,
            mime_type: file.mime_type,
            bytes: file.bytes,
            width: file.width,
            height: file.height,
            orientation: i32::from(orientation),
            sha256: file.sha256,
            metadata_json: file.metadata_json,
            parent_file_id: file.parent_file_id,
            derivative_type: file.derivative_type,
            created_at: Utc::now(),
        };
        files.push(row.clone());
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PhotoFile>, AppError> {
        Ok(self.files.lock().await.iter().find(|f| f.id == id).cloned())
    }

    async fn find_by_digest(&self, digest: &str) -> Result<Vec<PhotoFile>, AppError> {
        Ok(self
            .files
            .lock()
            .await
            .iter()
            .filter(|f| f.sha256 == digest)
            .cloned()
            .collect())
    }

    async fn find_by_photo(&self, photo_id: Uuid) -> Result<Vec<PhotoFile>, AppError> {
        Ok(self
            .files
            .lock()
            .await
            .iter()
            .filter(|f| f.photo_id == photo_id)
            .cloned()
            .collect())
    }

    async fn find_by_photo_and_kind(
        &self,
        photo_id: Uuid,
        kind: FileKind,
    ) -> Result<Vec<PhotoFile>, AppError> {
        Ok(self
            .files
            .lock()
            .await
            .iter()
            .filter(|f| f.photo_id == photo_id && f.kind == kind)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_file(photo_id: Uuid, key: &str, digest: &str, orientation: i64) -> NewPhotoFile {
        NewPhotoFile {
            photo_id,
            kind: FileKind::Original,
            storage_key: key.to_string(),
            filename: "a.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            bytes: 10,
            width: Some(4),
            height: Some(3),
            orientation,
            sha256: digest.to_string(),
            metadata_json: None,
            parent_file_id: None,
            derivative_type: None,
        }
    }

    #[tokio::test]
    async fn transition_updates_state_and_records_event() {
        let repo = InMemoryPhotoRepository::new();
        let actor = Uuid::new_v4();
        let photo = repo
            .create(NewPhoto::new(Uuid::new_v4(), actor))
            .await
            .unwrap();
        assert_eq!(photo.current_state, PhotoState::Uploaded);

        let moved = repo
            .transition_state(&StateTransition::new(
                photo.id,
                PhotoState::Uploaded,
                PhotoState::Triage,
                actor,
            ))
            .await
            .unwrap();
        assert_eq!(moved.current_state, PhotoState::Triage);

        let events = repo.list_events(photo.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].from_state, PhotoState::Uploaded);
        assert_eq!(events[0].to_state, PhotoState::Triage);
        assert_eq!(events[0].actor_user_id, actor);
    }

    #[tokio::test]
    async fn mismatched_source_is_a_conflict_and_changes_nothing() {
        let repo = InMemoryPhotoRepository::new();
        let actor = Uuid::new_v4();
        let photo = repo
            .create(NewPhoto::new(Uuid::new_v4(), actor).in_state(PhotoState::MetadataEntry))
            .await
            .unwrap();

        let err = repo
            .transition_state(&StateTransition::new(
                photo.id,
                PhotoState::Triage,
                PhotoState::Complete,
                actor,
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::StateConflict {
                actual: PhotoState::MetadataEntry,
                ..
            }
        ));
        assert_eq!(
            repo.get(photo.id).await.unwrap().unwrap().current_state,
            PhotoState::MetadataEntry
        );
        assert!(repo.list_events(photo.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_transitions_have_one_winner() {
        let repo = InMemoryPhotoRepository::new();
        let actor = Uuid::new_v4();
        let photo = repo
            .create(NewPhoto::new(Uuid::new_v4(), actor).in_state(PhotoState::MetadataEntry))
            .await
            .unwrap();

        let attempts = (0..4).map(|_| {
            let repo = repo.clone();
            async move {
                repo.transition_state(&StateTransition::new(
                    photo.id,
                    PhotoState::MetadataEntry,
                    PhotoState::Complete,
                    actor,
                ))
                .await
            }
        });
        let results = futures::future::join_all(attempts).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.is_state_conflict()));
        assert_eq!(repo.list_events(photo.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejection_flag_follows_transitions() {
        let repo = InMemoryPhotoRepository::new();
        let actor = Uuid::new_v4();
        let photo = repo
            .create(NewPhoto::new(Uuid::new_v4(), actor).in_state(PhotoState::Triage))
            .await
            .unwrap();

        let rejected = repo
            .transition_state(&StateTransition::new(
                photo.id,
                PhotoState::Triage,
                PhotoState::Rejected,
                actor,
            ))
            .await
            .unwrap();
        assert!(rejected.is_rejected);

        let restored = repo
            .transition_state(&StateTransition::new(
                photo.id,
                PhotoState::Rejected,
                PhotoState::Triage,
                actor,
            ))
            .await
            .unwrap();
        assert!(!restored.is_rejected);
    }

    #[tokio::test]
    async fn soft_deleted_photos_disappear() {
        let repo = InMemoryPhotoRepository::new();
        let library = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let photo = repo.create(NewPhoto::new(library, actor)).await.unwrap();

        assert!(repo.soft_delete(photo.id).await.unwrap());
        assert!(!repo.soft_delete(photo.id).await.unwrap());
        assert!(repo.get(photo.id).await.unwrap().is_none());
        assert_eq!(
            repo.count(library, &PhotoFilter::default()).await.unwrap(),
            0
        );

        let err = repo
            .transition_state(&StateTransition::new(
                photo.id,
                PhotoState::Uploaded,
                PhotoState::Triage,
                actor,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_and_pages() {
        let repo = InMemoryPhotoRepository::new();
        let library = Uuid::new_v4();
        let actor = Uuid::new_v4();
        for _ in 0..3 {
            repo.create(NewPhoto::new(library, actor).in_state(PhotoState::Triage))
                .await
                .unwrap();
        }
        repo.create(NewPhoto::new(library, actor).in_state(PhotoState::Rejected))
            .await
            .unwrap();
        repo.create(NewPhoto::new(Uuid::new_v4(), actor).in_state(PhotoState::Triage))
            .await
            .unwrap();

        let triage = PhotoFilter::active_in(PhotoState::Triage, 2);
        assert_eq!(repo.list(library, &triage).await.unwrap().len(), 2);
        assert_eq!(repo.count(library, &triage).await.unwrap(), 3);
        assert_eq!(
            repo.count(library, &PhotoFilter::rejected(50, 0))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repo.list(library, &PhotoFilter::rejected(50, 1))
                .await
                .unwrap()
                .len(),
            0
        );
    }

    #[tokio::test]
    async fn update_details_leaves_missing_fields_alone() {
        let repo = InMemoryPhotoRepository::new();
        let photo = repo
            .create(NewPhoto::new(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap();

        repo.update_details(
            photo.id,
            &PhotoDetails {
                location_text: Some("Lisbon".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let updated = repo
            .update_details(
                photo.id,
                &PhotoDetails {
                    description: Some("Beach day".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.location_text.as_deref(), Some("Lisbon"));
        assert_eq!(updated.description.as_deref(), Some("Beach day"));
        assert_eq!(updated.current_state, PhotoState::Uploaded);
    }

    #[tokio::test]
    async fn file_registry_lookups_and_orientation() {
        let repo = InMemoryPhotoFileRepository::new();
        let photo_a = Uuid::new_v4();
        let photo_b = Uuid::new_v4();

        let a = repo
            .create(new_file(photo_a, "masters/a", "d1", 42))
            .await
            .unwrap();
        assert_eq!(a.orientation, 1);
        let b = repo
            .create(new_file(photo_b, "masters/b", "d1", 6))
            .await
            .unwrap();
        assert_eq!(b.orientation, 6);

        let same = repo.find_by_digest("d1").await.unwrap();
        assert_eq!(same.len(), 2);
        assert!(repo.find_by_digest("d2").await.unwrap().is_empty());
        assert_eq!(repo.find_by_photo(photo_a).await.unwrap().len(), 1);
        assert!(repo
            .find_by_photo_and_kind(photo_a, FileKind::Thumbnail)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(repo.get(a.id).await.unwrap().unwrap().storage_key, "masters/a");

        assert!(repo
            .create(new_file(photo_a, "masters/a", "d3", 1))
            .await
            .is_err());
    }
}
