//! Photo repository: photo rows and their workflow audit trail

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use fampho_core::models::{
    NewPhoto, Photo, PhotoDetails, PhotoFilter, PhotoState, StateTransition, WorkflowEvent,
};
use fampho_core::AppError;

/// Persistence for photos.
///
/// `transition_state` is the only method that writes `current_state`. It
/// applies the conditional update and the audit insert as one unit and
/// reports a mismatched source state as [`AppError::StateConflict`].
#[async_trait]
pub trait PhotoRepositoryTrait: Send + Sync {
    async fn create(&self, photo: NewPhoto) -> Result<Photo, AppError>;

    /// Fetch a photo that has not been soft-deleted.
    async fn get(&self, id: Uuid) -> Result<Option<Photo>, AppError>;

    /// Newest uploads first.
    async fn list(&self, library_id: Uuid, filter: &PhotoFilter) -> Result<Vec<Photo>, AppError>;

    async fn count(&self, library_id: Uuid, filter: &PhotoFilter) -> Result<i64, AppError>;

    /// Overwrite descriptive fields that are `Some`; leaves state untouched.
    async fn update_details(
        &self,
        id: Uuid,
        details: &PhotoDetails,
    ) -> Result<Option<Photo>, AppError>;

    /// Returns `false` when the photo was missing or already deleted.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn transition_state(&self, transition: &StateTransition) -> Result<Photo, AppError>;

    /// Audit events in creation order.
    async fn list_events(&self, photo_id: Uuid) -> Result<Vec<WorkflowEvent>, AppError>;
}

#[derive(Clone)]
pub struct PostgresPhotoRepository {
    pool: PgPool,
}

impl PostgresPhotoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoRepositoryTrait for PostgresPhotoRepository {
    #[tracing::instrument(skip(self, photo), fields(
        db.system = "postgresql",
        db.table = "photos",
        db.operation = "insert",
        library_id = %photo.library_id
    ))]
    async fn create(&self, photo: NewPhoto) -> Result<Photo, AppError> {
        let now = Utc::now();
        let row = sqlx::query_as::<Postgres, Photo>(
            r#"
            INSERT INTO photos (
                id, library_id, uploaded_by, current_state, date_taken,
                is_flagged, is_rejected, uploaded_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id, library_id, uploaded_by, current_state, date_taken,
                location_text, description, is_flagged, is_rejected,
                uploaded_at, updated_at, deleted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(photo.library_id)
        .bind(photo.uploaded_by)
        .bind(photo.initial_state)
        .bind(photo.date_taken)
        .bind(photo.initial_state == PhotoState::Flagged)
        .bind(photo.initial_state == PhotoState::Rejected)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "photos",
        db.operation = "select",
        db.record_id = %id
    ))]
    async fn get(&self, id: Uuid) -> Result<Option<Photo>, AppError> {
        let row = sqlx::query_as::<Postgres, Photo>(
            r#"
            SELECT id, library_id, uploaded_by, current_state, date_taken,
                location_text, description, is_flagged, is_rejected,
                uploaded_at, updated_at, deleted_at
            FROM photos
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self, filter), fields(
        db.system = "postgresql",
        db.table = "photos",
        db.operation = "select",
        library_id = %library_id
    ))]
    async fn list(&self, library_id: Uuid, filter: &PhotoFilter) -> Result<Vec<Photo>, AppError> {
        let rows = sqlx::query_as::<Postgres, Photo>(
            r#"
            SELECT id, library_id, uploaded_by, current_state, date_taken,
                location_text, description, is_flagged, is_rejected,
                uploaded_at, updated_at, deleted_at
            FROM photos
            WHERE library_id = $1
                AND deleted_at IS NULL
                AND ($2::photo_state IS NULL OR current_state = $2)
                AND ($3::boolean IS NULL OR is_rejected = $3)
            ORDER BY uploaded_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(library_id)
        .bind(filter.state)
        .bind(filter.is_rejected)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self, filter), fields(
        db.system = "postgresql",
        db.table = "photos",
        db.operation = "count",
        library_id = %library_id
    ))]
    async fn count(&self, library_id: Uuid, filter: &PhotoFilter) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM photos
            WHERE library_id = $1
                AND deleted_at IS NULL
                AND ($2::photo_state IS NULL OR current_state = $2)
                AND ($3::boolean IS NULL OR is_rejected = $3)
            "#,
        )
        .bind(library_id)
        .bind(filter.state)
        .bind(filter.is_rejected)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    #[tracing::instrument(skip(self, details), fields(
        db.system = "postgresql",
        db.table = "photos",
        db.operation = "update",
        db.record_id = %id
    ))]
    async fn update_details(
        &self,
        id: Uuid,
        details: &PhotoDetails,
    ) -> Result<Option<Photo>, AppError> {
        let row = sqlx::query_as::<Postgres, Photo>(
            r#"
            UPDATE photos
            SET
                date_taken = COALESCE($2, date_taken),
                location_text = COALESCE($3, location_text),
                description = COALESCE($4, description),
                updated_at = $5
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, library_id, uploaded_by, current_state, date_taken,
                location_text, description, is_flagged, is_rejected,
                uploaded_at, updated_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(details.date_taken)
        .bind(details.location_text.as_deref())
        .bind(details.description.as_deref())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "photos",
        db.operation = "update",
        db.record_id = %id
    ))]
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE photos
            SET deleted_at = $2, updated_at = $2
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, transition), fields(
        db.system = "postgresql",
        db.table = "photos",
        db.operation = "transition",
        photo_id = %transition.photo_id,
        from = %transition.from,
        to = %transition.to
    ))]
    async fn transition_state(&self, transition: &StateTransition) -> Result<Photo, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // The WHERE clause claims the expected source state; a concurrent winner leaves zero rows.
        let updated = sqlx::query_as::<Postgres, Photo>(
            r#"
            UPDATE photos
            SET
                current_state = $3,
                is_rejected = COALESCE($4, is_rejected),
                updated_at = $5
            WHERE id = $1 AND current_state = $2 AND deleted_at IS NULL
            RETURNING id, library_id, uploaded_by, current_state, date_taken,
                location_text, description, is_flagged, is_rejected,
                uploaded_at, updated_at, deleted_at
            "#,
        )
        .bind(transition.photo_id)
        .bind(transition.from)
        .bind(transition.to)
        .bind(transition.set_rejected)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(photo) = updated else {
            let actual: Option<PhotoState> = sqlx::query_scalar(
                r#"SELECT current_state FROM photos WHERE id = $1 AND deleted_at IS NULL"#,
            )
            .bind(transition.photo_id)
            .fetch_optional(&mut *tx)
            .await?;
            tx.rollback().await?;

            return Err(match actual {
                Some(actual) => AppError::StateConflict {
                    photo_id: transition.photo_id,
                    expected: transition.from,
                    actual,
                },
                None => AppError::NotFound(format!("Photo {} not found", transition.photo_id)),
            });
        };

        sqlx::query(
            r#"
            INSERT INTO photo_workflow_events (
                photo_id, from_state, to_state, actor_user_id, reason, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(transition.photo_id)
        .bind(transition.from)
        .bind(transition.to)
        .bind(transition.actor_id)
        .bind(transition.reason.as_deref())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(photo)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "photo_workflow_events",
        db.operation = "select",
        photo_id = %photo_id
    ))]
    async fn list_events(&self, photo_id: Uuid) -> Result<Vec<WorkflowEvent>, AppError> {
        let rows = sqlx::query_as::<Postgres, WorkflowEvent>(
            r#"
            SELECT id, photo_id, from_state, to_state, actor_user_id, reason, created_at
            FROM photo_workflow_events
            WHERE photo_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(photo_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
