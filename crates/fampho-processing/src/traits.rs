//! Processing traits
//!
//! The pipeline talks to metadata extraction and derivative rendering through
//! these traits so either can be swapped without touching orchestration.

use async_trait::async_trait;
use bytes::Bytes;
use fampho_core::Orientation;

use crate::metadata::ExtractedMetadata;
use crate::ProcessingError;

/// Reads embedded capture metadata from image bytes.
///
/// Implementations never fail: missing or corrupt metadata yields
/// [`ExtractedMetadata::default`].
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, data: &[u8]) -> ExtractedMetadata;
}

/// A rendered derivative, ready to be stored
#[derive(Debug, Clone)]
pub struct Derivative {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
    pub extension: &'static str,
}

/// Clockwise rotation accepted by [`DerivativeGenerator::rotate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAngle {
    Deg90,
    Deg180,
    Deg270,
}

impl RotationAngle {
    pub fn degrees(&self) -> u16 {
        match self {
            RotationAngle::Deg90 => 90,
            RotationAngle::Deg180 => 180,
            RotationAngle::Deg270 => 270,
        }
    }

    /// Tag stored on the produced file, e.g. `rotate_90`
    pub fn derivative_type(&self) -> String {
        format!("rotate_{}", self.degrees())
    }
}

impl TryFrom<i64> for RotationAngle {
    type Error = ProcessingError;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        match degrees {
            90 => Ok(RotationAngle::Deg90),
            180 => Ok(RotationAngle::Deg180),
            270 => Ok(RotationAngle::Deg270),
            other => Err(ProcessingError::UnsupportedRotation(other)),
        }
    }
}

/// Renders derivatives from a source image.
///
/// `orientation` is the source's stored EXIF orientation; every output is
/// rendered upright with the orientation baked into the pixels.
#[async_trait]
pub trait DerivativeGenerator: Send + Sync {
    /// Fit inside a `max_dimension` square; never upscales.
    async fn thumbnail(
        &self,
        source: Bytes,
        orientation: Orientation,
        max_dimension: u32,
    ) -> Result<Derivative, ProcessingError>;

    /// Fit inside `max_width` x `max_height`; never upscales.
    async fn preview(
        &self,
        source: Bytes,
        orientation: Orientation,
        max_width: u32,
        max_height: u32,
    ) -> Result<Derivative, ProcessingError>;

    /// Rotate the upright image clockwise by `angle`.
    async fn rotate(
        &self,
        source: Bytes,
        orientation: Orientation,
        angle: RotationAngle,
    ) -> Result<Derivative, ProcessingError>;
}
