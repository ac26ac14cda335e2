//! Error types for media operations.

use thiserror::Error;

use tunedrop_models::LinkError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media resolution, acquisition, or tagging.
///
/// `Fetch` and `Encoding` are distinguished so the user sees a meaningful
/// cause, but the lifecycle controller treats both the same way (job fails,
/// artifacts released). `Tag` is never fatal to a job.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("invalid link: {0}")]
    InvalidLink(#[from] LinkError),

    #[error("resolution failed: {message}")]
    Resolution { message: String },

    #[error("download failed: {message}")]
    Fetch { message: String },

    #[error("audio transcode failed: {message}")]
    Encoding { message: String },

    #[error("tag write failed: {message}")]
    Tag { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a resolution failure error.
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution {
            message: message.into(),
        }
    }

    /// Create a fetch failure error.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Create a transcode failure error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create a tagging failure error.
    pub fn tag(message: impl Into<String>) -> Self {
        Self::Tag {
            message: message.into(),
        }
    }
}
