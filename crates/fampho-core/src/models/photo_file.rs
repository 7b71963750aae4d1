use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use super::Orientation;

/// Role of a physical artifact (matches database enum)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "photo_file_kind", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Original,
    Master,
    Thumbnail,
    Preview,
    Derivative,
}

impl Display for FileKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileKind::Original => write!(f, "original"),
            FileKind::Master => write!(f, "master"),
            FileKind::Thumbnail => write!(f, "thumbnail"),
            FileKind::Preview => write!(f, "preview"),
            FileKind::Derivative => write!(f, "derivative"),
        }
    }
}

impl FromStr for FileKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(FileKind::Original),
            "master" => Ok(FileKind::Master),
            "thumbnail" => Ok(FileKind::Thumbnail),
            "preview" => Ok(FileKind::Preview),
            "derivative" => Ok(FileKind::Derivative),
            _ => Err(anyhow::anyhow!("Invalid file kind: {}", s)),
        }
    }
}

/// One physical artifact belonging to a photo (database row).
///
/// Rows are immutable once written; rotations and re-renders produce new rows
/// pointing back at their source through `parent_file_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PhotoFile {
    pub id: Uuid,
    pub photo_id: Uuid,
    pub kind: FileKind,
    pub storage_key: String,
    pub filename: String,
    pub mime_type: String,
    pub bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub orientation: i32,
    pub sha256: String,
    pub metadata_json: Option<serde_json::Value>,
    pub parent_file_id: Option<Uuid>,
    pub derivative_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PhotoFile {
    pub fn orientation(&self) -> Orientation {
        Orientation::from(self.orientation)
    }
}

/// Input for registering a physical artifact.
///
/// `orientation` is the raw code as reported by the caller; the registry
/// normalizes it before anything is persisted.
#[derive(Debug, Clone)]
pub struct NewPhotoFile {
    pub photo_id: Uuid,
    pub kind: FileKind,
    pub storage_key: String,
    pub filename: String,
    pub mime_type: String,
    pub bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub orientation: i64,
    pub sha256: String,
    pub metadata_json: Option<serde_json::Value>,
    pub parent_file_id: Option<Uuid>,
    pub derivative_type: Option<String>,
}

impl NewPhotoFile {
    pub fn normalized_orientation(&self) -> Orientation {
        Orientation::from_code(self.orientation)
    }
}
