//! YouTube link parsing.
//!
//! Accepted forms: `watch?v=ID`, `youtu.be/ID`, `/embed/ID`, `/v/ID`,
//! `/shorts/ID`, and a bare 11-character id.

use thiserror::Error;

use crate::track::TrackId;

/// Errors that can occur while extracting a track id from user input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("not a YouTube link")]
    NotYoutube,
    #[error("no track id found in link")]
    IdNotFound,
    #[error("track id in link has invalid format")]
    InvalidId,
}

/// Whether the text mentions a YouTube domain at all. Used to decide if a
/// plain message should be treated as a link attempt.
pub fn is_media_link(text: &str) -> bool {
    let text = text.to_ascii_lowercase();
    text.contains("youtube.com") || text.contains("youtu.be")
}

/// Extract a validated track id from a link or a bare id.
pub fn extract_track_id(input: &str) -> Result<TrackId, LinkError> {
    let input = input.trim();

    if !is_media_link(input) {
        // A bare id is accepted as a direct reference
        return TrackId::parse(input).map_err(|_| LinkError::NotYoutube);
    }

    const MARKERS: &[&str] = &["?v=", "&v=", "youtu.be/", "/embed/", "/v/", "/shorts/"];

    for marker in MARKERS {
        if let Some(pos) = input.find(marker) {
            let rest = &input[pos + marker.len()..];
            let end = rest.find(['&', '#', '?', '/']).unwrap_or(rest.len());
            let id = rest[..end].trim();
            if id.is_empty() {
                return Err(LinkError::IdNotFound);
            }
            return TrackId::parse(id).map_err(|_| LinkError::InvalidId);
        }
    }

    Err(LinkError::IdNotFound)
}
