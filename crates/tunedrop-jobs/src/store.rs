//! In-memory active-job registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use tunedrop_models::{BitrateClass, Job, JobStatus, TrackId};

/// Rejection returned when a track already has a job in flight. Shown to
/// the user as "already in progress"; never logged as an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BeginError {
    #[error("a download for this track is already in progress")]
    AlreadyActive,
}

/// Registry of active jobs, keyed by track id.
///
/// The map holds only non-terminal jobs, so membership doubles as the
/// at-most-one-active-job-per-track check. The mutex is held for map
/// operations only, never across an await point; artifact release happens
/// after the entry has been removed.
///
/// Illegal transitions and unknown jobs panic: they are programming
/// errors, not user-facing conditions.
#[derive(Debug, Default)]
pub struct JobStore {
    active: Mutex<HashMap<TrackId, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a job for a track, rejecting duplicates while one is in
    /// flight. Returns a snapshot of the stored job.
    pub fn begin(&self, track: TrackId, bitrate: BitrateClass) -> Result<Job, BeginError> {
        let mut active = self.lock();
        if active.contains_key(&track) {
            return Err(BeginError::AlreadyActive);
        }
        let job = Job::new(track.clone(), bitrate);
        active.insert(track, job.clone());
        debug!(job_id = %job.id, track = %job.track, "job registered");
        Ok(job)
    }

    /// Advance a job along a legal non-terminal edge. Terminal statuses go
    /// through [`JobStore::complete`].
    pub fn transition(&self, job: &Job, next: JobStatus) {
        assert!(
            !next.is_terminal(),
            "terminal transition to {next} must go through complete()"
        );
        let mut active = self.lock();
        let entry = match active.get_mut(&job.track) {
            Some(entry) if entry.id == job.id => entry,
            _ => panic!("transition on unknown or stale job {}", job.id),
        };
        assert!(
            entry.status.can_transition(next),
            "illegal job transition {} -> {next}",
            entry.status
        );
        debug!(job_id = %entry.id, from = %entry.status, to = %next, "job transition");
        entry.status = next;
        entry.updated_at = chrono::Utc::now();
    }

    /// Record filesystem paths owned by a job, so they are reclaimed even
    /// if the pipeline fails partway.
    pub fn attach_artifacts(&self, job: &Job, paths: impl IntoIterator<Item = PathBuf>) {
        let mut active = self.lock();
        let entry = match active.get_mut(&job.track) {
            Some(entry) if entry.id == job.id => entry,
            _ => panic!("attach_artifacts on unknown or stale job {}", job.id),
        };
        entry.artifacts.extend(paths);
    }

    /// Finish a job with a terminal status, releasing every artifact it
    /// owns exactly once. Idempotent: a repeated call for the same job, or
    /// a call for a job superseded by a newer one on the same track, is a
    /// no-op.
    pub async fn complete(&self, job: &Job, terminal: JobStatus) {
        assert!(
            terminal.is_terminal(),
            "complete() requires a terminal status, got {terminal}"
        );

        // Remove the entry and take its artifacts in one critical section;
        // release happens outside the lock.
        let artifacts = {
            let mut active = self.lock();
            match active.get(&job.track) {
                Some(entry) if entry.id == job.id => {
                    assert!(
                        entry.status.can_transition(terminal),
                        "illegal terminal transition {} -> {terminal}",
                        entry.status
                    );
                    let entry = active.remove(&job.track).expect("entry just observed");
                    entry.artifacts
                }
                _ => return,
            }
        };

        info!(job_id = %job.id, track = %job.track, status = %terminal, "job complete");
        for path in &artifacts {
            release_path(path).await;
        }
    }

    /// Number of jobs still in flight. Used to drain on shutdown.
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TrackId, Job>> {
        self.active.lock().expect("job store mutex poisoned")
    }
}

/// Release one artifact path. Missing paths are tolerated (the pipeline
/// may have failed before producing them); other errors are logged.
async fn release_path(path: &Path) {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to stat artifact");
            return;
        }
    };

    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match result {
        Ok(()) => debug!(path = %path.display(), "artifact released"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to release artifact"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn track() -> TrackId {
        TrackId::parse("dQw4w9WgXcQ").unwrap()
    }

    fn other_track() -> TrackId {
        TrackId::parse("zzzzzzzzzzz").unwrap()
    }

    #[test]
    fn test_begin_rejects_duplicate() {
        let store = JobStore::new();
        let first = store.begin(track(), BitrateClass::Kbps256).unwrap();
        assert_eq!(first.status, JobStatus::Resolving);

        assert_eq!(
            store.begin(track(), BitrateClass::Kbps256),
            Err(BeginError::AlreadyActive)
        );
        // Same track at another bitrate is still the same in-flight target
        assert_eq!(
            store.begin(track(), BitrateClass::Kbps128),
            Err(BeginError::AlreadyActive)
        );
        // A different track is independent
        assert!(store.begin(other_track(), BitrateClass::Kbps320).is_ok());
        assert_eq!(store.active_count(), 2);
    }

    #[tokio::test]
    async fn test_begin_race_admits_exactly_one() {
        let store = Arc::new(JobStore::new());

        let attempts = (0..16).map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.begin(track(), BitrateClass::Kbps256) })
        });
        let results = futures::future::join_all(attempts).await;

        let admitted = results
            .into_iter()
            .filter(|r| r.as_ref().unwrap().is_ok())
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(store.active_count(), 1);
    }

    #[tokio::test]
    async fn test_track_reusable_after_terminal() {
        let store = JobStore::new();
        let job = store.begin(track(), BitrateClass::Kbps256).unwrap();
        store.complete(&job, JobStatus::Failed).await;

        assert!(store.begin(track(), BitrateClass::Kbps256).is_ok());
    }

    #[test]
    fn test_transition_walks_the_pipeline() {
        let store = JobStore::new();
        let job = store.begin(track(), BitrateClass::Kbps256).unwrap();

        store.transition(&job, JobStatus::Fetching);
        store.transition(&job, JobStatus::Tagging);
        store.transition(&job, JobStatus::Delivering);
        assert_eq!(store.active_count(), 1);
    }

    #[test]
    #[should_panic(expected = "illegal job transition")]
    fn test_transition_panics_on_illegal_edge() {
        let store = JobStore::new();
        let job = store.begin(track(), BitrateClass::Kbps256).unwrap();
        store.transition(&job, JobStatus::Delivering);
    }

    #[test]
    #[should_panic(expected = "unknown or stale job")]
    fn test_transition_panics_on_unknown_job() {
        let store = JobStore::new();
        let job = Job::new(track(), BitrateClass::Kbps256);
        store.transition(&job, JobStatus::Fetching);
    }

    #[tokio::test]
    async fn test_complete_releases_artifacts() {
        let store = JobStore::new();
        let dir = tempdir().unwrap();
        let work_dir = dir.path().join("job");
        std::fs::create_dir(&work_dir).unwrap();
        let audio = work_dir.join("track.mp3");
        std::fs::write(&audio, b"mp3").unwrap();

        let job = store.begin(track(), BitrateClass::Kbps256).unwrap();
        store.attach_artifacts(&job, [work_dir.clone()]);
        store.transition(&job, JobStatus::Fetching);

        store.complete(&job, JobStatus::Failed).await;

        assert!(!work_dir.exists());
        assert!(!audio.exists());
        assert_eq!(store.active_count(), 0);
    }

    #[tokio::test]
    async fn test_complete_tolerates_missing_artifacts() {
        let store = JobStore::new();
        let job = store.begin(track(), BitrateClass::Kbps256).unwrap();
        store.attach_artifacts(&job, [PathBuf::from("/nonexistent/job-dir")]);

        // Must not error or panic
        store.complete(&job, JobStatus::Failed).await;
        assert_eq!(store.active_count(), 0);
    }

    #[tokio::test]
    async fn test_complete_is_idempotent() {
        let store = JobStore::new();
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("track.mp3");
        std::fs::write(&artifact, b"mp3").unwrap();

        let job = store.begin(track(), BitrateClass::Kbps256).unwrap();
        store.attach_artifacts(&job, [artifact.clone()]);
        store.complete(&job, JobStatus::Failed).await;
        assert!(!artifact.exists());

        // Second call is a no-op, even with a successor job active
        let successor = store.begin(track(), BitrateClass::Kbps320).unwrap();
        store.complete(&job, JobStatus::Failed).await;
        assert_eq!(store.active_count(), 1);

        store.complete(&successor, JobStatus::Failed).await;
        assert_eq!(store.active_count(), 0);
    }

    #[tokio::test]
    #[should_panic(expected = "illegal terminal transition")]
    async fn test_complete_rejects_done_before_delivering() {
        let store = JobStore::new();
        let job = store.begin(track(), BitrateClass::Kbps256).unwrap();
        store.complete(&job, JobStatus::Done).await;
    }
}
