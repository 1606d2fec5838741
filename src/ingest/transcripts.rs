//! Transcript download through yt-dlp subtitle tracks.
//!
//! Tracks are tried in order: uploaded subtitles in a preferred language,
//! auto-generated captions in a preferred language, then uploaded
//! subtitles in any language.

use super::{watch_url, TranscriptProvider, TranscriptSegment};
use crate::error::{ClipdexError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Which subtitle track to request from yt-dlp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubtitleTrack {
    Manual,
    Automatic,
    AnyLanguage,
}

impl SubtitleTrack {
    const FALLBACK_ORDER: [SubtitleTrack; 3] = [
        SubtitleTrack::Manual,
        SubtitleTrack::Automatic,
        SubtitleTrack::AnyLanguage,
    ];

    fn file_stem(&self) -> &'static str {
        match self {
            SubtitleTrack::Manual => "manual",
            SubtitleTrack::Automatic => "auto",
            SubtitleTrack::AnyLanguage => "any",
        }
    }

    fn args(&self, languages: &[String]) -> Vec<String> {
        let (flag, langs) = match self {
            SubtitleTrack::Manual => ("--write-subs", languages.join(",")),
            SubtitleTrack::Automatic => ("--write-auto-subs", languages.join(",")),
            SubtitleTrack::AnyLanguage => ("--write-subs", "all,-live_chat".to_string()),
        };

        vec![flag.to_string(), "--sub-langs".to_string(), langs]
    }
}

/// Transcript provider backed by yt-dlp.
pub struct YtDlpTranscripts {
    languages: Vec<String>,
}

impl YtDlpTranscripts {
    /// Create a provider preferring `languages`, most preferred first.
    pub fn new(languages: Vec<String>) -> Self {
        Self { languages }
    }

    /// Download one subtitle track into `dir`, returning the file if any.
    async fn download_track(
        &self,
        video_id: &str,
        track: SubtitleTrack,
        dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let template = dir.join(format!("{}.%(ext)s", track.file_stem()));

        let result = Command::new("yt-dlp")
            .arg("--skip-download")
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("--sub-format")
            .arg("json3")
            .args(track.args(&self.languages))
            .arg("--output")
            .arg(template.to_str().unwrap_or_default())
            .arg(watch_url(video_id))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClipdexError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(ClipdexError::TranscriptFetch(format!("yt-dlp execution failed: {e}")));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClipdexError::TranscriptFetch(format!("yt-dlp failed: {}", stderr.trim())));
        }

        find_subtitle_file(dir, track, &self.languages)
    }
}

#[async_trait]
impl TranscriptProvider for YtDlpTranscripts {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        let temp_dir = tempfile::tempdir()?;

        for track in SubtitleTrack::FALLBACK_ORDER {
            let Some(path) = self.download_track(video_id, track, temp_dir.path()).await? else {
                debug!("No {:?} subtitle track", track);
                continue;
            };

            let content = std::fs::read_to_string(&path)?;
            let segments = parse_json3(&content)?;
            if !segments.is_empty() {
                info!("Fetched {} transcript segments from {:?} track", segments.len(), track);
                return Ok(segments);
            }
        }

        Err(ClipdexError::TranscriptNotFound(format!(
            "No usable transcript found for video {}",
            video_id
        )))
    }
}

/// Locate the subtitle file yt-dlp wrote for `track`.
///
/// Preferred languages win in order; otherwise the first file by name.
fn find_subtitle_file(dir: &Path, track: SubtitleTrack, languages: &[String]) -> Result<Option<PathBuf>> {
    let stem = track.file_stem();

    for lang in languages {
        let candidate = dir.join(format!("{}.{}.json3", stem, lang));
        if candidate.exists() {
            return Ok(Some(candidate));
        }
    }

    let prefix = format!("{}.", stem);
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".json3"))
        })
        .collect();
    found.sort();

    Ok(found.into_iter().next())
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    t_start_ms: Option<f64>,
    d_duration_ms: Option<f64>,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a YouTube `json3` subtitle document into segments.
///
/// Events without a start or without visible text are dropped.
pub fn parse_json3(content: &str) -> Result<Vec<TranscriptSegment>> {
    let doc: Json3 = serde_json::from_str(content)?;

    let segments = doc
        .events
        .into_iter()
        .filter_map(|event| {
            let start_ms = event.t_start_ms?;
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ").trim().to_string();
            if text.is_empty() {
                return None;
            }

            Some(TranscriptSegment {
                text,
                start: start_ms / 1000.0,
                duration: event.d_duration_ms.unwrap_or(0.0) / 1000.0,
            })
        })
        .collect();

    Ok(segments)
}
