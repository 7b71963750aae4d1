use crate::{LocalStorage, Storage, StorageResult};
use fampho_core::Config;
use std::sync::Arc;

/// Create the storage backend described by configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.storage_root.clone()).await?;
    tracing::info!(
        root = %storage.base_path().display(),
        "Initialized local storage backend"
    );
    Ok(Arc::new(storage))
}
