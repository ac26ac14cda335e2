//! Track identifiers and resolved media candidates.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Artist reported when the source does not name an uploader.
pub const DEFAULT_ARTIST: &str = "YouTube";

/// Opaque source-system identifier for a track (an 11-character YouTube
/// video id). Validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid track id: {0:?}")]
pub struct TrackIdError(pub String);

impl TrackId {
    /// Parse a raw id string. Ids are exactly 11 characters drawn from
    /// `[A-Za-z0-9_-]`.
    pub fn parse(s: &str) -> Result<Self, TrackIdError> {
        let valid = s.len() == 11
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(TrackIdError(s.to_string()))
        }
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this track.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved media item returned by search or direct-link resolution.
///
/// Immutable once produced by the resolver; discarded after the user
/// selects (or the result set goes stale).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Source-system identifier
    pub id: TrackId,

    /// Display title
    pub title: String,

    /// Duration in whole seconds, when the source reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,

    /// Fetchable thumbnail reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Channel/uploader name, used as the artist for tagging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
}

impl Candidate {
    /// Artist name for tags and delivery metadata.
    pub fn artist(&self) -> &str {
        self.uploader.as_deref().unwrap_or(DEFAULT_ARTIST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_parse() {
        assert_eq!(
            TrackId::parse("dQw4w9WgXcQ").unwrap().as_str(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            TrackId::parse("abc_123-DEF").unwrap().as_str(),
            "abc_123-DEF"
        );

        // Wrong length
        assert!(TrackId::parse("short").is_err());
        assert!(TrackId::parse("waaaaaaaaaaytoolong").is_err());

        // Invalid characters
        assert!(TrackId::parse("abc!123?def").is_err());
        assert!(TrackId::parse("").is_err());
    }

    #[test]
    fn test_watch_url() {
        let track = TrackId::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(
            track.watch_url(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_candidate_artist_fallback() {
        let track = TrackId::parse("dQw4w9WgXcQ").unwrap();
        let with_uploader = Candidate {
            id: track.clone(),
            title: "Never Gonna Give You Up".to_string(),
            duration_secs: Some(212),
            thumbnail_url: None,
            uploader: Some("Rick Astley".to_string()),
        };
        assert_eq!(with_uploader.artist(), "Rick Astley");

        let without = Candidate {
            id: track,
            title: "Never Gonna Give You Up".to_string(),
            duration_secs: None,
            thumbnail_url: None,
            uploader: None,
        };
        assert_eq!(without.artist(), DEFAULT_ARTIST);
    }
}
