use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Workflow state of a photo (matches database enum)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "photo_state", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PhotoState {
    Uploaded,
    Triage,
    MetadataEntry,
    Complete,
    Rejected,
    Flagged,
}

impl PhotoState {
    pub const ALL: [PhotoState; 6] = [
        PhotoState::Uploaded,
        PhotoState::Triage,
        PhotoState::MetadataEntry,
        PhotoState::Complete,
        PhotoState::Rejected,
        PhotoState::Flagged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoState::Uploaded => "uploaded",
            PhotoState::Triage => "triage",
            PhotoState::MetadataEntry => "metadata_entry",
            PhotoState::Complete => "complete",
            PhotoState::Rejected => "rejected",
            PhotoState::Flagged => "flagged",
        }
    }

    /// Whether the workflow permits moving from `self` to `to`.
    ///
    /// `flagged` has no programmatic transitions in or out.
    pub fn can_transition_to(&self, to: PhotoState) -> bool {
        matches!(
            (self, to),
            (PhotoState::Uploaded, PhotoState::Triage)
                | (PhotoState::Triage, PhotoState::MetadataEntry)
                | (PhotoState::Triage, PhotoState::Rejected)
                | (PhotoState::Rejected, PhotoState::Triage)
                | (PhotoState::MetadataEntry, PhotoState::Complete)
        )
    }
}

impl Display for PhotoState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhotoState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(PhotoState::Uploaded),
            "triage" => Ok(PhotoState::Triage),
            "metadata_entry" => Ok(PhotoState::MetadataEntry),
            "complete" => Ok(PhotoState::Complete),
            "rejected" => Ok(PhotoState::Rejected),
            "flagged" => Ok(PhotoState::Flagged),
            _ => Err(anyhow::anyhow!("Invalid photo state: {}", s)),
        }
    }
}

/// One logical photograph (database row)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Photo {
    pub id: Uuid,
    pub library_id: Uuid,
    pub uploaded_by: Uuid,
    pub current_state: PhotoState,
    pub date_taken: Option<DateTime<Utc>>,
    pub location_text: Option<String>,
    pub description: Option<String>,
    pub is_flagged: bool,
    pub is_rejected: bool,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Photo {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for creating a photo.
///
/// `initial_state` is the only way to place a photo somewhere other than
/// `uploaded` without going through the workflow engine; it exists for
/// fixtures and imports.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub library_id: Uuid,
    pub uploaded_by: Uuid,
    pub date_taken: Option<DateTime<Utc>>,
    pub initial_state: PhotoState,
}

impl NewPhoto {
    pub fn new(library_id: Uuid, uploaded_by: Uuid) -> Self {
        Self {
            library_id,
            uploaded_by,
            date_taken: None,
            initial_state: PhotoState::Uploaded,
        }
    }

    pub fn with_date_taken(mut self, date_taken: Option<DateTime<Utc>>) -> Self {
        self.date_taken = date_taken;
        self
    }

    pub fn in_state(mut self, state: PhotoState) -> Self {
        self.initial_state = state;
        self
    }
}

/// Filter for photo listings
#[derive(Debug, Clone, Default)]
pub struct PhotoFilter {
    pub state: Option<PhotoState>,
    pub is_rejected: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

impl PhotoFilter {
    pub fn state(state: PhotoState) -> Self {
        Self {
            state: Some(state),
            limit: 50,
            ..Default::default()
        }
    }

    pub fn active_in(state: PhotoState, limit: i64) -> Self {
        Self {
            state: Some(state),
            is_rejected: Some(false),
            limit,
            offset: 0,
        }
    }

    pub fn rejected(limit: i64, offset: i64) -> Self {
        Self {
            state: None,
            is_rejected: Some(true),
            limit,
            offset,
        }
    }

    /// Whether a photo passes this filter (limit/offset aside).
    pub fn matches(&self, photo: &Photo) -> bool {
        !photo.is_deleted()
            && self.state.is_none_or(|s| photo.current_state == s)
            && self.is_rejected.is_none_or(|r| photo.is_rejected == r)
    }
}

/// Descriptive metadata entered by a person during the metadata_entry stage.
///
/// Each field is optional; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MetadataUpdate {
    pub date_taken: Option<String>,
    #[validate(length(max = 500))]
    pub location_text: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

/// Validated form of [`MetadataUpdate`] ready for persistence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoDetails {
    pub date_taken: Option<DateTime<Utc>>,
    pub location_text: Option<String>,
    pub description: Option<String>,
}

impl MetadataUpdate {
    /// Validate lengths and parse `date_taken`.
    pub fn into_details(self) -> Result<PhotoDetails, crate::AppError> {
        self.validate()?;
        let date_taken = match self.date_taken.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_date_taken(raw).ok_or_else(|| {
                crate::AppError::InvalidInput(format!("Invalid date_taken: {}", raw))
            })?),
        };
        Ok(PhotoDetails {
            date_taken,
            location_text: self.location_text,
            description: self.description,
        })
    }
}

/// Parse a user-entered capture date: RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS`, or a bare date.
pub fn parse_date_taken(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
