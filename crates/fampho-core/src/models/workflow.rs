//! Workflow models: audit events, transitions and work queues

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use super::{Photo, PhotoState};

/// Immutable audit record of one state transition (database row)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct WorkflowEvent {
    pub id: i64,
    pub photo_id: Uuid,
    pub from_state: PhotoState,
    pub to_state: PhotoState,
    pub actor_user_id: Uuid,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A requested state change, applied atomically with its audit event.
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub photo_id: Uuid,
    pub from: PhotoState,
    pub to: PhotoState,
    pub actor_id: Uuid,
    pub reason: Option<String>,
    /// New value for `is_rejected`, written in the same update as the state.
    pub set_rejected: Option<bool>,
}

impl StateTransition {
    pub fn new(photo_id: Uuid, from: PhotoState, to: PhotoState, actor_id: Uuid) -> Self {
        let set_rejected = match (from, to) {
            (_, PhotoState::Rejected) => Some(true),
            (PhotoState::Rejected, _) => Some(false),
            _ => None,
        };
        Self {
            photo_id,
            from,
            to,
            actor_id,
            reason: None,
            set_rejected,
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }
}

/// Decision taken while triaging a photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageAction {
    Keep,
    Discard,
    Duplicate,
}

impl TriageAction {
    pub fn target_state(&self) -> PhotoState {
        match self {
            TriageAction::Keep => PhotoState::MetadataEntry,
            TriageAction::Discard | TriageAction::Duplicate => PhotoState::Rejected,
        }
    }
}

impl Display for TriageAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TriageAction::Keep => write!(f, "keep"),
            TriageAction::Discard => write!(f, "discard"),
            TriageAction::Duplicate => write!(f, "duplicate"),
        }
    }
}

impl FromStr for TriageAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(TriageAction::Keep),
            "discard" => Ok(TriageAction::Discard),
            "duplicate" => Ok(TriageAction::Duplicate),
            _ => Err(anyhow::anyhow!(
                "Invalid triage action: {} (expected keep, discard or duplicate)",
                s
            )),
        }
    }
}

/// One queue of pending work: how many photos wait in it plus a few to show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkQueue {
    pub state: PhotoState,
    pub count: i64,
    pub sample: Vec<Photo>,
}

/// Pending work across a library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkQueues {
    pub library_id: Uuid,
    pub triage: WorkQueue,
    pub metadata_entry: WorkQueue,
    pub flagged: WorkQueue,
    pub rejected_count: i64,
}
