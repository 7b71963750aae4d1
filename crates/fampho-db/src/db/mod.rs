//! Database repositories for the archive core
//!
//! Each repository is a trait with a PostgreSQL implementation and an
//! in-process implementation used by tests and embedded tooling.

pub mod memory;
pub mod photo;
pub mod photo_file;

pub use memory::{InMemoryPhotoFileRepository, InMemoryPhotoRepository};
pub use photo::{PhotoRepositoryTrait, PostgresPhotoRepository};
pub use photo_file::{PhotoFileRepositoryTrait, PostgresPhotoFileRepository};
