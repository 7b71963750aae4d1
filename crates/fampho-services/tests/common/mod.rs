#![allow(dead_code)]

use bytes::Bytes;
use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use fampho_core::{DerivativeSettings, UploadLimits};
use fampho_services::{Archive, FileOutcome, IngestReport, UploadedFile};
use fampho_storage::LocalStorage;

pub struct TestArchive {
    pub archive: Archive,
    pub storage: Arc<LocalStorage>,
    pub library: Uuid,
    pub uploader: Uuid,
    _dir: TempDir,
}

impl TestArchive {
    pub async fn new() -> Self {
        Self::with_limits(UploadLimits::default()).await
    }

    pub async fn with_limits(limits: UploadLimits) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let archive = Archive::in_memory(storage.clone(), &limits, DerivativeSettings::default());
        Self {
            archive,
            storage,
            library: Uuid::new_v4(),
            uploader: Uuid::new_v4(),
            _dir: dir,
        }
    }

    pub async fn ingest(&self, files: Vec<UploadedFile>) -> IngestReport {
        self.archive
            .ingestion
            .ingest(self.library, self.uploader, files)
            .await
    }

    /// Ingest one file and return the new photo id.
    pub async fn ingest_one(&self, file: UploadedFile) -> Uuid {
        let report = self.ingest(vec![file]).await;
        match &report.results[0].outcome {
            FileOutcome::Success { photo_id, .. } => *photo_id,
            other => panic!("expected success, got {:?}", other),
        }
    }
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// A JPEG whose content depends on `seed`, so different seeds never dedup.
pub fn jpeg(width: u32, height: u32, seed: u8) -> Bytes {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([seed, (x % 256) as u8, (y % 256) as u8])
    });
    Bytes::from(encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg))
}

pub fn png(width: u32, height: u32, seed: u8) -> Bytes {
    let img = RgbImage::from_pixel(width, height, Rgb([seed, 80, 160]));
    Bytes::from(encode(DynamicImage::ImageRgb8(img), ImageFormat::Png))
}

/// A JPEG carrying an EXIF block with the given orientation and capture time.
pub fn jpeg_with_exif(width: u32, height: u32, orientation: u16, taken: &str) -> Bytes {
    let plain = jpeg(width, height, 7);
    let fields = [
        Field {
            tag: Tag::Orientation,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![orientation]),
        },
        Field {
            tag: Tag::DateTimeOriginal,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![taken.as_bytes().to_vec()]),
        },
    ];
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&plain[2..]);
    Bytes::from(out)
}

pub fn jpeg_upload(name: &str, data: Bytes) -> UploadedFile {
    UploadedFile::from_bytes(name, "image/jpeg", data)
}
