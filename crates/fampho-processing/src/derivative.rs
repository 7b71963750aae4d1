//! Raster derivatives: thumbnails, previews and baked-in rotations.

use async_trait::async_trait;
use bytes::Bytes;
use fampho_core::{DerivativeSettings, Orientation};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

use crate::processor::ImageProcessor;
use crate::traits::{Derivative, DerivativeGenerator, RotationAngle};
use crate::ProcessingError;

/// Derivative generator backed by the `image` crate.
///
/// Decoding and encoding are CPU-bound and run on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDerivativeGenerator {
    settings: DerivativeSettings,
}

impl ImageDerivativeGenerator {
    pub fn new(settings: DerivativeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DerivativeSettings {
        &self.settings
    }
}

/// Shrink to fit inside the box, keeping aspect ratio. Smaller images are returned untouched.
fn fit_within(img: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w <= max_width && h <= max_height {
        return img;
    }
    img.resize(max_width, max_height, FilterType::Lanczos3)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Derivative, ProcessingError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;
    Ok(Derivative {
        data: Bytes::from(buf),
        width: rgb.width(),
        height: rgb.height(),
        content_type: "image/jpeg",
        extension: "jpg",
    })
}

fn encode_png(img: &DynamicImage) -> Result<Derivative, ProcessingError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(Derivative {
        data: Bytes::from(out.into_inner()),
        width: img.width(),
        height: img.height(),
        content_type: "image/png",
        extension: "png",
    })
}

fn render_resized(
    source: &[u8],
    orientation: Orientation,
    max_width: u32,
    max_height: u32,
    quality: u8,
) -> Result<Derivative, ProcessingError> {
    if max_width == 0 || max_height == 0 {
        return Err(ProcessingError::Encode(
            "target dimensions must be non-zero".to_string(),
        ));
    }
    let (img, _) = ImageProcessor::decode(source)?;
    let upright = ImageProcessor::apply_orientation(img, orientation);
    encode_jpeg(&fit_within(upright, max_width, max_height), quality)
}

fn render_rotated(
    source: &[u8],
    orientation: Orientation,
    angle: RotationAngle,
    quality: u8,
) -> Result<Derivative, ProcessingError> {
    let (img, format) = ImageProcessor::decode(source)?;
    let upright = ImageProcessor::apply_orientation(img, orientation);
    let rotated = ImageProcessor::rotate_by_angle(upright, angle.degrees());
    match format {
        ImageFormat::Png => encode_png(&rotated),
        _ => encode_jpeg(&rotated, quality),
    }
}

#[async_trait]
impl DerivativeGenerator for ImageDerivativeGenerator {
    async fn thumbnail(
        &self,
        source: Bytes,
        orientation: Orientation,
        max_dimension: u32,
    ) -> Result<Derivative, ProcessingError> {
        let quality = self.settings.thumbnail_quality;
        let out = tokio::task::spawn_blocking(move || {
            render_resized(&source, orientation, max_dimension, max_dimension, quality)
        })
        .await??;
        tracing::debug!(
            width = out.width,
            height = out.height,
            size_bytes = out.data.len(),
            "Thumbnail rendered"
        );
        Ok(out)
    }

    async fn preview(
        &self,
        source: Bytes,
        orientation: Orientation,
        max_width: u32,
        max_height: u32,
    ) -> Result<Derivative, ProcessingError> {
        let quality = self.settings.preview_quality;
        let out = tokio::task::spawn_blocking(move || {
            render_resized(&source, orientation, max_width, max_height, quality)
        })
        .await??;
        tracing::debug!(
            width = out.width,
            height = out.height,
            size_bytes = out.data.len(),
            "Preview rendered"
        );
        Ok(out)
    }

    async fn rotate(
        &self,
        source: Bytes,
        orientation: Orientation,
        angle: RotationAngle,
    ) -> Result<Derivative, ProcessingError> {
        let quality = self.settings.preview_quality;
        let out =
            tokio::task::spawn_blocking(move || render_rotated(&source, orientation, angle, quality))
                .await??;
        tracing::debug!(
            degrees = angle.degrees(),
            width = out.width,
            height = out.height,
            "Rotation rendered"
        );
        Ok(out)
    }
}
