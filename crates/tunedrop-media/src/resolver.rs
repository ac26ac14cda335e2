//! Resolver capability seam.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use tunedrop_models::{BitrateClass, Candidate, TrackId};

use crate::error::MediaResult;

/// Artifacts produced by a fetch: explicit paths, never recovered by
/// scanning a directory. Both live inside the job's scratch directory and
/// are owned by the job until it terminates.
#[derive(Debug, Clone)]
pub struct FetchedAudio {
    /// Encoded MP3 file
    pub audio: PathBuf,
    /// Cover image extracted alongside, when the source had one
    pub thumbnail: Option<PathBuf>,
}

/// External media-resolution and transcode capability.
///
/// `fetch` is long-running and must only be called from a dedicated
/// per-job task, never from the event-intake path.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Search the source for candidates. An empty result set is a
    /// successful outcome, distinct from a resolution failure.
    async fn search(&self, query: &str, limit: usize) -> MediaResult<Vec<Candidate>>;

    /// Resolve a direct link (or bare id) to a single candidate.
    async fn resolve_direct(&self, link: &str) -> MediaResult<Candidate>;

    /// Fetch metadata for a known track id. Selection tokens carry only
    /// the id, so title and uploader are re-obtained here.
    async fn probe(&self, track: &TrackId) -> MediaResult<Candidate>;

    /// Download and transcode the track into `work_dir` at the given
    /// bitrate, returning explicit artifact paths.
    async fn fetch(
        &self,
        track: &TrackId,
        bitrate: BitrateClass,
        work_dir: &Path,
    ) -> MediaResult<FetchedAudio>;
}
