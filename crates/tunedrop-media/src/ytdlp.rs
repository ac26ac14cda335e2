//! Media resolution and download using the yt-dlp CLI.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info, warn};

use tunedrop_models::{extract_track_id, BitrateClass, Candidate, TrackId};

use crate::error::{MediaError, MediaResult};
use crate::resolver::{FetchedAudio, Resolver};

/// Resolver backed by the `yt-dlp` binary (with ffmpeg for the audio
/// extraction post-processing step).
#[derive(Debug, Default)]
pub struct YtDlpResolver;

impl YtDlpResolver {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, args: &[&str]) -> MediaResult<Output> {
        which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

        let output = Command::new("yt-dlp")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(output)
    }
}

/// yt-dlp `-J` output for a single track, or one entry of a search dump.
#[derive(Debug, Deserialize)]
struct TrackDump {
    id: String,
    title: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    thumbnail: Option<String>,
}

/// yt-dlp `-J --flat-playlist` output for a `ytsearchN:` query.
#[derive(Debug, Deserialize)]
struct SearchDump {
    #[serde(default)]
    entries: Vec<TrackDump>,
}

fn candidate_from(dump: TrackDump) -> Option<Candidate> {
    let id = match TrackId::parse(&dump.id) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "skipping search entry with unusable id");
            return None;
        }
    };
    Some(Candidate {
        id,
        title: dump.title.unwrap_or_else(|| "Unknown title".to_string()),
        duration_secs: dump.duration.map(|d| d.round() as u32),
        thumbnail_url: dump.thumbnail,
        uploader: dump.uploader,
    })
}

/// Last stderr line, for error messages.
fn last_stderr_line(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .last()
        .unwrap_or("Unknown error")
        .to_string()
}

/// Classify a failed fetch: errors from the ffmpeg post-processing stage
/// are transcode failures, everything else is a download failure.
fn classify_fetch_failure(stderr: &str) -> MediaError {
    let message = stderr.lines().last().unwrap_or("Unknown error").to_string();
    if stderr.contains("Postprocessing") || stderr.contains("ffmpeg") {
        MediaError::encoding(message)
    } else {
        MediaError::fetch(message)
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    async fn search(&self, query: &str, limit: usize) -> MediaResult<Vec<Candidate>> {
        let target = format!("ytsearch{limit}:{query}");
        debug!(query, limit, "searching");

        let output = self
            .run(&["-J", "--flat-playlist", "--no-warnings", &target])
            .await?;

        if !output.status.success() {
            return Err(MediaError::resolution(last_stderr_line(&output)));
        }

        let dump: SearchDump = serde_json::from_slice(&output.stdout)
            .map_err(|e| MediaError::resolution(format!("unparseable search output: {e}")))?;

        let candidates: Vec<Candidate> =
            dump.entries.into_iter().filter_map(candidate_from).collect();
        info!(query, results = candidates.len(), "search complete");
        Ok(candidates)
    }

    async fn resolve_direct(&self, link: &str) -> MediaResult<Candidate> {
        let track = extract_track_id(link)?;
        self.probe(&track).await
    }

    async fn probe(&self, track: &TrackId) -> MediaResult<Candidate> {
        let url = track.watch_url();
        let output = self.run(&["-J", "--no-playlist", "--no-warnings", &url]).await?;

        if !output.status.success() {
            return Err(MediaError::resolution(last_stderr_line(&output)));
        }

        let dump: TrackDump = serde_json::from_slice(&output.stdout)
            .map_err(|e| MediaError::resolution(format!("unparseable track metadata: {e}")))?;

        candidate_from(dump)
            .ok_or_else(|| MediaError::resolution("track metadata missing a usable id"))
    }

    async fn fetch(
        &self,
        track: &TrackId,
        bitrate: BitrateClass,
        work_dir: &Path,
    ) -> MediaResult<FetchedAudio> {
        let url = track.watch_url();
        let quality = format!("{}K", bitrate.kbps());
        let template = work_dir
            .join(format!("{}.%(ext)s", track.as_str()))
            .to_string_lossy()
            .into_owned();

        info!(track = %track, kbps = bitrate.kbps(), "fetching audio");

        let output = self
            .run(&[
                "-f",
                "bestaudio/best",
                "-x",
                "--audio-format",
                "mp3",
                "--audio-quality",
                &quality,
                "--write-thumbnail",
                "--convert-thumbnails",
                "jpg",
                "--no-playlist",
                "--no-warnings",
                "-o",
                &template,
                &url,
            ])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(track = %track, "yt-dlp stderr: {}", stderr);
            return Err(classify_fetch_failure(&stderr));
        }

        let audio = work_dir.join(format!("{}.mp3", track.as_str()));
        if !audio.exists() {
            return Err(MediaError::fetch(
                "yt-dlp exited successfully but produced no audio file",
            ));
        }

        let thumb = work_dir.join(format!("{}.jpg", track.as_str()));
        let thumbnail = thumb.exists().then_some(thumb);

        let size = audio.metadata()?.len();
        info!(
            track = %track,
            audio = %audio.display(),
            size_kb = size / 1024,
            has_thumbnail = thumbnail.is_some(),
            "fetch complete"
        );

        Ok(FetchedAudio { audio, thumbnail })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_dump_parse() {
        let json = r#"{
            "id": "ytsearch3:test",
            "entries": [
                {"id": "dQw4w9WgXcQ", "title": "A Song", "duration": 212.0, "uploader": "Someone"},
                {"id": "zzzzzzzzzzz", "title": null, "duration": null},
                {"id": "bad id", "title": "Broken"}
            ]
        }"#;
        let dump: SearchDump = serde_json::from_str(json).unwrap();
        let candidates: Vec<Candidate> =
            dump.entries.into_iter().filter_map(candidate_from).collect();

        // The entry with an unusable id is dropped, not an error
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "A Song");
        assert_eq!(candidates[0].duration_secs, Some(212));
        assert_eq!(candidates[1].title, "Unknown title");
        assert_eq!(candidates[1].duration_secs, None);
    }

    #[test]
    fn test_search_dump_tolerates_missing_entries() {
        let dump: SearchDump = serde_json::from_str(r#"{"id": "ytsearch3:test"}"#).unwrap();
        assert!(dump.entries.is_empty());
    }

    #[test]
    fn test_track_dump_parse() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "duration": 212.4,
            "uploader": "Rick Astley",
            "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxres.jpg"
        }"#;
        let dump: TrackDump = serde_json::from_str(json).unwrap();
        let candidate = candidate_from(dump).unwrap();
        assert_eq!(candidate.id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(candidate.duration_secs, Some(212));
        assert_eq!(candidate.artist(), "Rick Astley");
        assert!(candidate.thumbnail_url.is_some());
    }

    #[test]
    fn test_classify_fetch_failure() {
        let encode = classify_fetch_failure(
            "ERROR: Postprocessing: audio conversion failed with code 1",
        );
        assert!(matches!(encode, MediaError::Encoding { .. }));

        let fetch = classify_fetch_failure("ERROR: unable to download video data: HTTP 403");
        assert!(matches!(fetch, MediaError::Fetch { .. }));
    }
}
