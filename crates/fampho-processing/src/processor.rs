//! Image decoding helpers shared by probing and derivative rendering.

use fampho_core::Orientation;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

use crate::ProcessingError;

/// Header-level facts about an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl ImageInfo {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

pub struct ImageProcessor;

impl ImageProcessor {
    /// Read format and dimensions without decoding pixel data.
    pub fn probe(data: &[u8]) -> Result<ImageInfo, ProcessingError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| ProcessingError::Decode("unrecognized image format".to_string()))?;
        let (width, height) = reader.into_dimensions()?;
        if width == 0 || height == 0 {
            return Err(ProcessingError::Decode("image has no pixels".to_string()));
        }
        Ok(ImageInfo {
            width,
            height,
            format,
        })
    }

    /// Fully decode an image.
    pub fn decode(data: &[u8]) -> Result<(DynamicImage, ImageFormat), ProcessingError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| ProcessingError::Decode("unrecognized image format".to_string()))?;
        let img = reader.decode()?;
        Ok((img, format))
    }

    /// Turn a stored image upright according to its EXIF orientation.
    pub fn apply_orientation(mut img: DynamicImage, orientation: Orientation) -> DynamicImage {
        let (rotate, flip_h, flip_v) = orientation.transforms();

        tracing::debug!(
            orientation = orientation.get(),
            rotate = ?rotate,
            flip_horizontal = flip_h,
            flip_vertical = flip_v,
            "Applying EXIF orientation"
        );

        if let Some(angle) = rotate {
            img = Self::rotate_by_angle(img, angle);
        }
        if flip_h {
            img = img.fliph();
        }
        if flip_v {
            img = img.flipv();
        }
        img
    }

    /// Rotate clockwise by 90, 180 or 270 degrees; other angles leave the image as is.
    pub fn rotate_by_angle(img: DynamicImage, angle: u16) -> DynamicImage {
        match angle {
            90 => img.rotate90(),
            180 => img.rotate180(),
            270 => img.rotate270(),
            _ => img,
        }
    }
}
