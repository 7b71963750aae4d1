use fampho_core::AppError;

/// Image processing failures
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Unreadable image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Unsupported rotation: {0} degrees (expected 90, 180 or 270)")]
    UnsupportedRotation(i64),

    #[error("Processing task failed: {0}")]
    Task(String),
}

impl From<image::ImageError> for ProcessingError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(e) => ProcessingError::Encode(e.to_string()),
            other => ProcessingError::Decode(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ProcessingError {
    fn from(err: tokio::task::JoinError) -> Self {
        ProcessingError::Task(err.to_string())
    }
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::UnsupportedRotation(_) => AppError::InvalidInput(err.to_string()),
            other => AppError::GenerationFailed(other.to_string()),
        }
    }
}
