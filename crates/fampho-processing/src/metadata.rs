//! Embedded capture metadata (EXIF).
//!
//! Only two fields are interpreted: the capture timestamp and the orientation.
//! Everything else from the primary image is kept as an opaque string map so it
//! can be stored alongside the file without committing to a schema.

use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{In, Reader, Tag, Value as ExifValue};
use fampho_core::Orientation;
use serde_json::{Map, Value};
use std::io::Cursor;

use crate::traits::MetadataExtractor;

const MAX_RAW_VALUE_LEN: usize = 256;

/// Result of metadata extraction. `Default` is the "nothing found" value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetadata {
    pub taken_at: Option<DateTime<Utc>>,
    pub orientation: Orientation,
    pub raw: Map<String, Value>,
}

impl ExtractedMetadata {
    pub fn is_empty(&self) -> bool {
        self.taken_at.is_none() && self.orientation.is_normal() && self.raw.is_empty()
    }

    /// Raw fields as a JSON object, or `None` when nothing was read.
    pub fn to_json(&self) -> Option<Value> {
        if self.raw.is_empty() {
            None
        } else {
            Some(Value::Object(self.raw.clone()))
        }
    }
}

/// EXIF reader backed by `kamadak-exif`
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifMetadataExtractor;

impl ExifMetadataExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataExtractor for ExifMetadataExtractor {
    fn extract(&self, data: &[u8]) -> ExtractedMetadata {
        let exif = match Reader::new().read_from_container(&mut Cursor::new(data)) {
            Ok(exif) => exif,
            Err(e) => {
                tracing::debug!(error = %e, "No readable EXIF data");
                return ExtractedMetadata::default();
            }
        };

        let taken_at = [Tag::DateTimeOriginal, Tag::DateTimeDigitized]
            .into_iter()
            .find_map(|tag| {
                exif.get_field(tag, In::PRIMARY)
                    .and_then(|f| parse_exif_datetime(&f.value))
            });

        let orientation = exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .map(|f| orientation_value(&f.value, &f.display_value().to_string()))
            .unwrap_or_default();

        let mut raw = Map::new();
        for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
            if field.tag == Tag::MakerNote {
                continue;
            }
            let mut value = field.display_value().with_unit(&exif).to_string();
            if value.len() > MAX_RAW_VALUE_LEN {
                let cut = (0..=MAX_RAW_VALUE_LEN)
                    .rev()
                    .find(|i| value.is_char_boundary(*i))
                    .unwrap_or(0);
                value.truncate(cut);
            }
            raw.insert(field.tag.to_string(), Value::String(value));
        }

        ExtractedMetadata {
            taken_at,
            orientation,
            raw,
        }
    }
}

fn orientation_value(value: &ExifValue, display: &str) -> Orientation {
    match int_value(value) {
        Some(code) => Orientation::from_code(code),
        None => exif_string(value)
            .map(|s| Orientation::parse_str(&s))
            .unwrap_or_else(|| Orientation::parse_str(display)),
    }
}

fn exif_string(value: &ExifValue) -> Option<String> {
    match value {
        ExifValue::Ascii(values) => values
            .first()
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .map(|s| s.trim_matches('\u{0}').trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn parse_exif_datetime(value: &ExifValue) -> Option<DateTime<Utc>> {
    let raw = exif_string(value)?;
    NaiveDateTime::parse_from_str(raw.trim(), "%Y:%m:%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn int_value(value: &ExifValue) -> Option<i64> {
    match value {
        ExifValue::Byte(values) => values.first().map(|v| *v as i64),
        ExifValue::Short(values) => values.first().map(|v| *v as i64),
        ExifValue::Long(values) => values.first().map(|v| *v as i64),
        ExifValue::SByte(values) => values.first().map(|v| *v as i64),
        ExifValue::SShort(values) => values.first().map(|v| *v as i64),
        ExifValue::SLong(values) => values.first().map(|v| *v as i64),
        _ => None,
    }
}
