//! Fampho Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! every component of the family photo archive.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, DerivativeSettings, UploadLimits};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{FileKind, Orientation, PhotoState};
