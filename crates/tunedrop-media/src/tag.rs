//! Metadata embedding into fetched audio files.
//!
//! Tagging is enrichment, not correctness: a decoded but untagged file is
//! still a valid deliverable, so callers log tag failures and continue.

use std::path::Path;
use tracing::{debug, warn};

use audiotags::{AudioTag, Id3v2Tag, MimeType, Picture, Tag};

use crate::error::{MediaError, MediaResult};

/// External tag-writing capability. Mutates the audio file in place.
pub trait Tagger: Send + Sync {
    fn apply_tags(
        &self,
        audio: &Path,
        title: &str,
        artist: &str,
        cover: Option<&Path>,
    ) -> MediaResult<()>;
}

/// ID3v2 tagger backed by the `audiotags` crate.
#[derive(Debug, Default)]
pub struct Id3Tagger;

impl Id3Tagger {
    pub fn new() -> Self {
        Self
    }
}

/// Sniff a cover image by magic bytes. Unreadable or unrecognized files
/// yield `None`; the caller skips cover embedding and keeps going.
fn read_cover(path: &Path) -> Option<(Vec<u8>, MimeType)> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            warn!(cover = %path.display(), error = %e, "cover image unreadable, skipping");
            return None;
        }
    };
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some((data, MimeType::Jpeg))
    } else if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some((data, MimeType::Png))
    } else {
        warn!(cover = %path.display(), "cover image is not JPEG or PNG, skipping");
        None
    }
}

impl Tagger for Id3Tagger {
    fn apply_tags(
        &self,
        audio: &Path,
        title: &str,
        artist: &str,
        cover: Option<&Path>,
    ) -> MediaResult<()> {
        // A file without a readable tag container gets a fresh ID3v2 tag.
        let mut tag: Box<dyn AudioTag + Send + Sync> = match Tag::new().read_from_path(audio) {
            Ok(tag) => tag,
            Err(e) => {
                debug!(audio = %audio.display(), error = %e, "no existing tag, initializing");
                Box::new(Id3v2Tag::new())
            }
        };

        tag.set_title(title);
        tag.set_artist(artist);

        if let Some(cover_path) = cover {
            if let Some((data, mime)) = read_cover(cover_path) {
                tag.set_album_cover(Picture::new(&data, mime));
            }
        }

        let path = audio
            .to_str()
            .ok_or_else(|| MediaError::tag("audio path is not valid UTF-8"))?;
        tag.write_to_path(path)
            .map_err(|e| MediaError::tag(e.to_string()))
    }
}
