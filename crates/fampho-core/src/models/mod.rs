//! Data models for the archive
//!
//! Photos are the logical records, photo files the physical artifacts that belong
//! to them, and workflow events the append-only audit trail of state changes.

mod orientation;
mod photo;
mod photo_file;
mod workflow;

pub use orientation::*;
pub use photo::*;
pub use photo_file::*;
pub use workflow::*;
