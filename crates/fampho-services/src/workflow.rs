//! Photo workflow state machine
//!
//! Every change to `current_state` goes through [`WorkflowEngine::transition`].
//! The caller names the state it believes the photo is in; the repository
//! claims that state with a conditional update, so a concurrent change is
//! reported as a conflict instead of being overwritten.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use fampho_core::models::{
    Photo, PhotoFilter, PhotoState, StateTransition, TriageAction, WorkQueue, WorkQueues,
    WorkflowEvent,
};
use fampho_core::AppError;
use fampho_db::PhotoRepositoryTrait;

const QUEUE_SAMPLE_SIZE: i64 = 5;
pub const DEFAULT_REJECTED_PAGE: i64 = 50;

/// One page of the rejected queue
#[derive(Debug, Clone, Serialize)]
pub struct RejectedQueue {
    pub photos: Vec<Photo>,
    pub count: i64,
}

#[derive(Clone)]
pub struct WorkflowEngine {
    photos: Arc<dyn PhotoRepositoryTrait>,
}

impl WorkflowEngine {
    pub fn new(photos: Arc<dyn PhotoRepositoryTrait>) -> Self {
        Self { photos }
    }

    /// Move a photo from `from` to `to`, recording an audit event.
    ///
    /// A photo whose persisted state is not `from` fails with `StateConflict`,
    /// even when the requested pair is not a permitted transition.
    #[tracing::instrument(skip(self, reason), fields(photo_id = %photo_id, from = %from, to = %to))]
    pub async fn transition(
        &self,
        photo_id: Uuid,
        from: PhotoState,
        to: PhotoState,
        actor_id: Uuid,
        reason: Option<String>,
    ) -> Result<Photo, AppError> {
        if !from.can_transition_to(to) {
            let photo = self.require_photo(photo_id).await?;
            if photo.current_state != from {
                return Err(AppError::StateConflict {
                    photo_id,
                    expected: from,
                    actual: photo.current_state,
                });
            }
            return Err(AppError::InvalidTransition { from, to });
        }

        let transition = StateTransition::new(photo_id, from, to, actor_id).with_reason(reason);
        match self.photos.transition_state(&transition).await {
            Ok(photo) => {
                tracing::info!(
                    action = "photo.transition",
                    photo_id = %photo_id,
                    actor_id = %actor_id,
                    from = %from,
                    to = %to,
                    "Photo state changed"
                );
                Ok(photo)
            }
            Err(e) => {
                if e.is_state_conflict() {
                    tracing::warn!(photo_id = %photo_id, error = %e, "Transition lost to a concurrent change");
                }
                Err(e)
            }
        }
    }

    /// Apply a triage decision to a photo currently in `triage`.
    ///
    /// `duplicate` requires `duplicate_of`, naming another existing photo.
    pub async fn triage_action(
        &self,
        photo_id: Uuid,
        action: TriageAction,
        actor_id: Uuid,
        reason: Option<String>,
        duplicate_of: Option<Uuid>,
    ) -> Result<Photo, AppError> {
        if action == TriageAction::Duplicate {
            let original = duplicate_of.ok_or_else(|| {
                AppError::InvalidInput("duplicate_of required for duplicate action".to_string())
            })?;
            if original == photo_id {
                return Err(AppError::InvalidInput(
                    "A photo cannot be a duplicate of itself".to_string(),
                ));
            }
            if self.photos.get(original).await?.is_none() {
                return Err(AppError::InvalidInput(format!(
                    "duplicate_of refers to unknown photo {}",
                    original
                )));
            }
        }

        let photo = self
            .transition(
                photo_id,
                PhotoState::Triage,
                action.target_state(),
                actor_id,
                reason.clone(),
            )
            .await?;

        tracing::info!(
            action = "photo.triage",
            photo_id = %photo_id,
            actor_id = %actor_id,
            decision = %action,
            reason = ?reason,
            duplicate_of = ?duplicate_of,
            "Triage decision recorded"
        );
        Ok(photo)
    }

    /// Return a rejected photo to the triage queue.
    pub async fn undo_discard(
        &self,
        photo_id: Uuid,
        actor_id: Uuid,
        reason: Option<String>,
    ) -> Result<Photo, AppError> {
        let reason = reason.or_else(|| Some("Undo discard".to_string()));
        let photo = self
            .transition(photo_id, PhotoState::Rejected, PhotoState::Triage, actor_id, reason)
            .await?;
        tracing::info!(action = "photo.undo_discard", photo_id = %photo_id, actor_id = %actor_id, "Discard undone");
        Ok(photo)
    }

    /// Mark metadata entry finished. Only a photo in exactly `metadata_entry` qualifies.
    pub async fn complete_metadata_entry(
        &self,
        photo_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Photo, AppError> {
        let photo = self.require_photo(photo_id).await?;
        if photo.current_state != PhotoState::MetadataEntry {
            return Err(AppError::InvalidState {
                photo_id,
                state: photo.current_state,
                required: PhotoState::MetadataEntry,
            });
        }

        self.transition(
            photo_id,
            PhotoState::MetadataEntry,
            PhotoState::Complete,
            actor_id,
            Some("Metadata entry completed".to_string()),
        )
        .await
    }

    /// Audit trail of a photo, oldest first.
    pub async fn history(&self, photo_id: Uuid) -> Result<Vec<WorkflowEvent>, AppError> {
        self.require_photo(photo_id).await?;
        self.photos.list_events(photo_id).await
    }

    /// Pending work in a library: counts plus a few photos from each active queue.
    pub async fn work_queues(&self, library_id: Uuid) -> Result<WorkQueues, AppError> {
        let triage = self.queue(library_id, PhotoState::Triage).await?;
        let metadata_entry = self.queue(library_id, PhotoState::MetadataEntry).await?;
        let flagged = self.queue(library_id, PhotoState::Flagged).await?;
        let rejected_count = self
            .photos
            .count(library_id, &PhotoFilter::rejected(0, 0))
            .await?;

        Ok(WorkQueues {
            library_id,
            triage,
            metadata_entry,
            flagged,
            rejected_count,
        })
    }

    pub async fn rejected_queue(
        &self,
        library_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<RejectedQueue, AppError> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_REJECTED_PAGE);
        let offset = offset.filter(|o| *o >= 0).unwrap_or(0);
        let filter = PhotoFilter::rejected(limit, offset);

        let photos = self.photos.list(library_id, &filter).await?;
        let count = self.photos.count(library_id, &filter).await?;
        Ok(RejectedQueue { photos, count })
    }

    async fn queue(&self, library_id: Uuid, state: PhotoState) -> Result<WorkQueue, AppError> {
        let filter = PhotoFilter::active_in(state, QUEUE_SAMPLE_SIZE);
        let count = self.photos.count(library_id, &filter).await?;
        let sample = self.photos.list(library_id, &filter).await?;
        Ok(WorkQueue {
            state,
            count,
            sample,
        })
    }

    async fn require_photo(&self, photo_id: Uuid) -> Result<Photo, AppError> {
        self.photos
            .get(photo_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo {} not found", photo_id)))
    }
}
