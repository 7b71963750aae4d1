//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use fampho_core::AppError;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Storage key already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked view of a stored object
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Stored file {}", key)),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// Keys are opaque to the backend; callers obtain them from
/// [`StorageLayout`](crate::StorageLayout).
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under a new key. Returns the number of bytes written.
    async fn put(&self, storage_key: &str, data: Bytes) -> StorageResult<u64>;

    /// Write everything `reader` yields under a new key without buffering it in memory.
    async fn put_stream(
        &self,
        storage_key: &str,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64>;

    /// Read a whole object into memory
    async fn get(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Read an object as a stream of chunks
    async fn get_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Size in bytes of an existing object
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Copy an object to a new key
    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()>;

    /// Move an object to a new key. The default copies then deletes the source.
    async fn rename(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        self.copy(from_key, to_key).await?;
        self.delete(from_key).await
    }
}
