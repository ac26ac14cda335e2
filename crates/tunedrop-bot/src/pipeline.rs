//! Per-job download pipeline.
//!
//! One `Pipeline::run` call per accepted job, spawned as its own task.
//! Stage order within a job is strict: probe, fetch, tag, deliver,
//! cleanup. Whatever happens, the job leaves through `JobStore::complete`
//! exactly once, so its artifacts are always reclaimed.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use tunedrop_jobs::JobStore;
use tunedrop_media::{MediaError, Resolver, Tagger};
use tunedrop_models::{Job, JobStatus};
use tunedrop_telegram::{AudioMessage, ChatId, Gateway, MessageId, TransportError};

use crate::messages;

/// Fatal pipeline failures. Tag errors never appear here; they are logged
/// at the tagging stage and the job continues.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("delivery failed: {0}")]
    Delivery(#[source] TransportError),
}

impl PipelineError {
    /// Short human-readable cause shown to the user. Raw upstream error
    /// text stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::Media(MediaError::InvalidLink(_)) => messages::NOT_A_LINK,
            PipelineError::Media(MediaError::Resolution { .. }) => messages::FAIL_RESOLUTION,
            PipelineError::Media(MediaError::Encoding { .. }) => messages::FAIL_ENCODING,
            PipelineError::Media(_) => messages::FAIL_DOWNLOAD,
            PipelineError::Delivery(_) => messages::FAIL_DELIVERY,
        }
    }
}

/// The message a job reports progress through: the one whose button
/// started it. Photo messages take caption edits, text messages take text
/// edits.
#[derive(Debug, Clone, Copy)]
pub struct ProgressMessage {
    pub chat: ChatId,
    pub message: MessageId,
    pub is_photo: bool,
}

/// Collaborators for one job's fetch-tag-deliver-cleanup sequence.
pub struct Pipeline {
    gateway: Arc<dyn Gateway>,
    resolver: Arc<dyn Resolver>,
    tagger: Arc<dyn Tagger>,
    store: Arc<JobStore>,
    downloads_dir: PathBuf,
}

impl Pipeline {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        resolver: Arc<dyn Resolver>,
        tagger: Arc<dyn Tagger>,
        store: Arc<JobStore>,
        downloads_dir: PathBuf,
    ) -> Self {
        Self {
            gateway,
            resolver,
            tagger,
            store,
            downloads_dir,
        }
    }

    /// Drive the job to a terminal status. Never returns an error: both
    /// exits complete the job (releasing artifacts) and tell the user.
    pub async fn run(&self, job: Job, progress: ProgressMessage) {
        match self.execute(&job, progress).await {
            Ok(()) => {
                self.store.complete(&job, JobStatus::Done).await;
                // The audio message replaces the progress indicator
                if let Err(e) = self
                    .gateway
                    .delete_message(progress.chat, progress.message)
                    .await
                {
                    warn!(job_id = %job.id, error = %e, "failed to delete progress message");
                }
                info!(job_id = %job.id, track = %job.track, "job delivered");
            }
            Err(e) => {
                error!(job_id = %job.id, track = %job.track, error = %e, "job failed");
                self.edit_progress(progress, e.user_message()).await;
                self.store.complete(&job, JobStatus::Failed).await;
            }
        }
    }

    async fn execute(&self, job: &Job, progress: ProgressMessage) -> Result<(), PipelineError> {
        self.edit_progress(progress, &messages::starting(job.bitrate))
            .await;

        // Resolving: the selection token carried only the track id, so
        // title and uploader are re-obtained here for tags and captions.
        let candidate = self.resolver.probe(&job.track).await?;

        // Fetching
        self.store.transition(job, JobStatus::Fetching);
        self.edit_progress(progress, messages::DOWNLOADING).await;

        let work_dir = self.downloads_dir.join(job.id.as_str());
        tokio::fs::create_dir_all(&work_dir)
            .await
            .map_err(MediaError::from)?;
        // Attached before the fetch so partial output is reclaimed on failure
        self.store.attach_artifacts(job, [work_dir.clone()]);

        let fetched = self
            .resolver
            .fetch(&job.track, job.bitrate, &work_dir)
            .await?;

        // Tagging: best-effort enrichment, never fatal
        self.store.transition(job, JobStatus::Tagging);
        let tagger = Arc::clone(&self.tagger);
        let audio = fetched.audio.clone();
        let title = candidate.title.clone();
        let artist = candidate.artist().to_string();
        let cover = fetched.thumbnail.clone();
        let tagged = tokio::task::spawn_blocking(move || {
            tagger.apply_tags(&audio, &title, &artist, cover.as_deref())
        })
        .await;
        match tagged {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(job_id = %job.id, error = %e, "tagging failed, delivering untagged"),
            Err(e) => warn!(job_id = %job.id, error = %e, "tagging task panicked, delivering untagged"),
        }

        // Delivering: a transport failure here fails the job
        self.store.transition(job, JobStatus::Delivering);
        self.edit_progress(progress, messages::SENDING).await;

        let audio = AudioMessage {
            path: fetched.audio,
            title: candidate.title.clone(),
            performer: candidate.artist().to_string(),
            caption: messages::audio_caption(&candidate.title, job.bitrate, &job.track),
        };
        self.gateway
            .send_audio(progress.chat, audio)
            .await
            .map_err(PipelineError::Delivery)?;

        Ok(())
    }

    /// Update the progress message; failures are logged, not fatal.
    async fn edit_progress(&self, progress: ProgressMessage, text: &str) {
        let result = if progress.is_photo {
            self.gateway
                .edit_caption(progress.chat, progress.message, text, None)
                .await
        } else {
            self.gateway
                .edit_text(progress.chat, progress.message, text, None)
                .await
        };
        if let Err(e) = result {
            warn!(chat = %progress.chat, error = %e, "failed to update progress message");
        }
    }
}
