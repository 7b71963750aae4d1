//! Fampho Storage Library
//!
//! Blob storage for photo originals and derivatives.
//!
//! # Storage key format
//!
//! Keys are produced by [`StorageLayout`] and look like
//! `{incoming|masters|derivatives}/{library_id}/{sanitized}_{millis}_{random}{.ext}`.
//! Keys must not contain `..` or a leading `/`. The store is append-only: writing
//! to a key that already exists fails instead of replacing the content.

pub mod factory;
pub mod layout;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use layout::{sanitize_filename, StorageLayout, StoragePurpose};
pub use local::LocalStorage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
