//! Acquisition jobs and their legal status transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::bitrate::BitrateClass;
use crate::track::TrackId;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a job in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Re-resolving candidate metadata for the selected track
    #[default]
    Resolving,
    /// Downloading and transcoding the audio
    Fetching,
    /// Embedding tags and cover art
    Tagging,
    /// Sending the finished file to the user
    Delivering,
    /// Artifact delivered
    Done,
    /// Pipeline failed at some stage
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Resolving => "resolving",
            JobStatus::Fetching => "fetching",
            JobStatus::Tagging => "tagging",
            JobStatus::Delivering => "delivering",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// Whether `self -> next` is a legal edge. The pipeline is strictly
    /// ordered; `Failed` is reachable from any non-terminal status.
    pub fn can_transition(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Resolving, Fetching)
            | (Fetching, Tagging)
            | (Tagging, Delivering)
            | (Delivering, Done) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One user-initiated acquisition, from selection to delivery or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Selected track
    pub track: TrackId,

    /// Selected output bitrate
    pub bitrate: BitrateClass,

    /// Current pipeline status
    #[serde(default)]
    pub status: JobStatus,

    /// Filesystem artifacts owned by this job until it reaches a terminal
    /// status, at which point they are released exactly once.
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job in the `Resolving` status.
    pub fn new(track: TrackId, bitrate: BitrateClass) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            track,
            bitrate,
            status: JobStatus::Resolving,
            artifacts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
