//! Fampho Processing Library
//!
//! Everything that looks inside a photo's bytes: content digests, embedded
//! capture metadata, header probing, derivative rendering and upload validation.

pub mod derivative;
pub mod error;
pub mod hash;
pub mod metadata;
pub mod processor;
pub mod traits;
pub mod validator;

pub use derivative::ImageDerivativeGenerator;
pub use error::ProcessingError;
pub use hash::ContentHasher;
pub use metadata::{ExifMetadataExtractor, ExtractedMetadata};
pub use processor::{ImageInfo, ImageProcessor};
pub use traits::{Derivative, DerivativeGenerator, MetadataExtractor, RotationAngle};
pub use validator::{MediaValidator, ValidationError};
