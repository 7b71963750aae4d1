//! Registry of physical files, keyed by content digest for dedup lookups

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use fampho_core::models::{FileKind, NewPhotoFile, PhotoFile};
use fampho_core::AppError;

/// Persistence for photo files. Records are insert-only.
#[async_trait]
pub trait PhotoFileRepositoryTrait: Send + Sync {
    /// Insert a record. Orientation is normalized to 1..=8 before it is written.
    async fn create(&self, file: NewPhotoFile) -> Result<PhotoFile, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<PhotoFile>, AppError>;

    /// All files with this digest across every library.
    async fn find_by_digest(&self, digest: &str) -> Result<Vec<PhotoFile>, AppError>;

    /// Oldest first.
    async fn find_by_photo(&self, photo_id: Uuid) -> Result<Vec<PhotoFile>, AppError>;

    async fn find_by_photo_and_kind(
        &self,
        photo_id: Uuid,
        kind: FileKind,
    ) -> Result<Vec<PhotoFile>, AppError>;
}

#[derive(Clone)]
pub struct PostgresPhotoFileRepository {
    pool: PgPool,
}

impl PostgresPhotoFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoFileRepositoryTrait for PostgresPhotoFileRepository {
    #[tracing::instrument(skip(self, file), fields(
        db.system = "postgresql",
        db.table = "photo_files",
        db.operation = "insert",
        photo_id = %file.photo_id,
        kind = %file.kind
    ))]
    async fn create(&self, file: NewPhotoFile) -> Result<PhotoFile, AppError> {
        let orientation = file.normalized_orientation();
        let row = sqlx::query_as::<Postgres, PhotoFile>(
            r#"
            INSERT INTO photo_files (
                id, photo_id, kind, storage_key, filename, mime_type, bytes,
                width, height, orientation, sha256, metadata_json,
                parent_file_id, derivative_type, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id, photo_id, kind, storage_key, filename, mime_type, bytes,
                width, height, orientation, sha256, metadata_json,
                parent_file_id, derivative_type, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(file.photo_id)
        .bind(file.kind)
        .bind(&file.storage_key)
        .bind(&file.filename)
        .bind(&file.mime_type)
        .bind(file.bytes)
        .bind(file.width)
        .bind(file.height)
        .bind(i32::from(orientation))
        .bind(&file.sha256)
        .bind(file.metadata_json.as_ref())
        .bind(file.parent_file_id)
        .bind(file.derivative_type.as_deref())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "photo_files",
        db.operation = "select",
        db.record_id = %id
    ))]
    async fn get(&self, id: Uuid) -> Result<Option<PhotoFile>, AppError> {
        let row = sqlx::query_as::<Postgres, PhotoFile>(
            r#"
            SELECT id, photo_id, kind, storage_key, filename, mime_type, bytes,
                width, height, orientation, sha256, metadata_json,
                parent_file_id, derivative_type, created_at
            FROM photo_files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "photo_files",
        db.operation = "select",
        digest = %digest
    ))]
    async fn find_by_digest(&self, digest: &str) -> Result<Vec<PhotoFile>, AppError> {
        let rows = sqlx::query_as::<Postgres, PhotoFile>(
            r#"
            SELECT id, photo_id, kind, storage_key, filename, mime_type, bytes,
                width, height, orientation, sha256, metadata_json,
                parent_file_id, derivative_type, created_at
            FROM photo_files
            WHERE sha256 = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(digest)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "photo_files",
        db.operation = "select",
        photo_id = %photo_id
    ))]
    async fn find_by_photo(&self, photo_id: Uuid) -> Result<Vec<PhotoFile>, AppError> {
        let rows = sqlx::query_as::<Postgres, PhotoFile>(
            r#"
            SELECT id, photo_id, kind, storage_key, filename, mime_type, bytes,
                width, height, orientation, sha256, metadata_json,
                parent_file_id, derivative_type, created_at
            FROM photo_files
            WHERE photo_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(photo_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "photo_files",
        db.operation = "select",
        photo_id = %photo_id,
        kind = %kind
    ))]
    async fn find_by_photo_and_kind(
        &self,
        photo_id: Uuid,
        kind: FileKind,
    ) -> Result<Vec<PhotoFile>, AppError> {
        let rows = sqlx::query_as::<Postgres, PhotoFile>(
            r#"
            SELECT id, photo_id, kind, storage_key, filename, mime_type, bytes,
                width, height, orientation, sha256, metadata_json,
                parent_file_id, derivative_type, created_at
            FROM photo_files
            WHERE photo_id = $1 AND kind = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(photo_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
