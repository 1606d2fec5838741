//! Transcript ingestion from YouTube playlists.
//!
//! Lists the videos of each playlist, fetches their transcripts and flattens
//! everything into [`TranscriptFragment`]s for the chunking stage. Failures
//! never abort the run; they are written to the CSV error log instead.

mod error_log;
mod transcripts;
mod youtube;

pub use error_log::{ErrorLog, IngestErrorKind};
pub use transcripts::{parse_json3, YtDlpTranscripts};
pub use youtube::YoutubeDataClient;

use crate::chunking::TranscriptFragment;
use crate::error::{ClipdexError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::{info, instrument, warn};

const UNKNOWN_PLAYLIST: &str = "Unknown Playlist";
const UNKNOWN_VIDEO: &str = "Unknown Video";

/// One timed line of a fetched transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Source of playlist contents and titles.
#[async_trait]
pub trait PlaylistCatalog: Send + Sync {
    /// Title of a playlist.
    async fn playlist_title(&self, playlist_id: &str) -> Result<String>;

    /// All video ids in a playlist, in playlist order.
    async fn playlist_video_ids(&self, playlist_id: &str) -> Result<Vec<String>>;

    /// Title of a video.
    async fn video_title(&self, video_id: &str) -> Result<String>;
}

/// Source of per-video transcripts.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Fetch the transcript segments of a video.
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>>;
}

/// Extract the playlist id (`list=` parameter) from a playlist URL.
pub fn playlist_id_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url.trim()).ok()?;

    parsed
        .query_pairs()
        .find(|(key, _)| key == "list")
        .map(|(_, value)| value.into_owned())
        .filter(|id| {
            !id.is_empty()
                && id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}

/// Extract an 11-character video id from a watch, short or embed URL.
pub fn video_id_from_url(url: &str) -> Option<String> {
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
    let regex = VIDEO_ID.get_or_init(|| {
        Regex::new(r"(?:v=|/)([a-zA-Z0-9_-]{11})(?:[&?#/]|$)").expect("Invalid regex")
    });

    regex
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Summary of an ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Every fragment collected, in playlist and video order.
    pub fragments: Vec<TranscriptFragment>,
    /// Playlists whose videos were listed successfully.
    pub playlists_processed: usize,
    /// Videos fetched (with or without a transcript).
    pub videos_processed: usize,
    /// Videos skipped because an earlier playlist already had them.
    pub videos_skipped: usize,
    /// Videos recorded without a transcript.
    pub videos_without_transcript: usize,
    /// Rows written to the error log.
    pub errors_logged: usize,
}

/// Playlist the videos being ingested came from.
#[derive(Debug, Clone, Default)]
struct PlaylistContext {
    id: Option<String>,
    title: Option<String>,
}

/// Result of ingesting one video.
struct VideoOutcome {
    video_id: String,
    fragments: Vec<TranscriptFragment>,
    has_transcript: bool,
    failures: Vec<(IngestErrorKind, String)>,
}

/// Drives the catalog and transcript provider over a list of playlist URLs.
pub struct Ingestor {
    catalog: Arc<dyn PlaylistCatalog>,
    transcripts: Arc<dyn TranscriptProvider>,
    error_log: ErrorLog,
    max_concurrent: usize,
}

impl Ingestor {
    pub fn new(
        catalog: Arc<dyn PlaylistCatalog>,
        transcripts: Arc<dyn TranscriptProvider>,
        error_log: ErrorLog,
    ) -> Self {
        Self {
            catalog,
            transcripts,
            error_log,
            max_concurrent: 4,
        }
    }

    /// Limit the number of transcripts fetched at once.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    /// Ingest every playlist in `playlist_urls`.
    ///
    /// A URL without a `list=` parameter but with a video id is ingested as
    /// a single video with no playlist.
    #[instrument(skip_all, fields(playlists = playlist_urls.len()))]
    pub async fn run(&self, playlist_urls: &[String]) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut seen: HashSet<String> = HashSet::new();

        for url in playlist_urls {
            let (context, video_ids) = match playlist_id_from_url(url) {
                Some(playlist_id) => match self.list_playlist(&playlist_id, &mut report).await {
                    Some(listing) => listing,
                    None => continue,
                },
                None => match video_id_from_url(url) {
                    Some(video_id) => (PlaylistContext::default(), vec![video_id]),
                    None => {
                        self.log_failure(
                            &mut report,
                            "N/A",
                            IngestErrorKind::PlaylistIdExtraction,
                            &format!("Could not extract playlist ID from URL: {}", url),
                        );
                        continue;
                    }
                },
            };

            let total = video_ids.len();
            let fresh: Vec<String> = video_ids
                .into_iter()
                .filter(|id| seen.insert(id.clone()))
                .collect();
            let skipped = total - fresh.len();
            if skipped > 0 {
                info!("Skipping {} videos already processed in another playlist", skipped);
            }
            report.videos_skipped += skipped;

            let outcomes: Vec<VideoOutcome> = stream::iter(fresh)
                .map(|video_id| self.ingest_video(video_id, &context))
                .buffered(self.max_concurrent)
                .collect()
                .await;

            for outcome in outcomes {
                for (kind, message) in &outcome.failures {
                    self.log_failure(&mut report, &outcome.video_id, *kind, message);
                }
                if !outcome.has_transcript {
                    report.videos_without_transcript += 1;
                }
                report.videos_processed += 1;
                report.fragments.extend(outcome.fragments);
            }
        }

        info!(
            "Collected {} entries from {} videos",
            report.fragments.len(),
            report.videos_processed
        );
        Ok(report)
    }

    /// Resolve a playlist's title and video ids, logging failures.
    async fn list_playlist(
        &self,
        playlist_id: &str,
        report: &mut IngestReport,
    ) -> Option<(PlaylistContext, Vec<String>)> {
        let title = match self.catalog.playlist_title(playlist_id).await {
            Ok(title) => title,
            Err(e) => {
                self.log_failure(
                    report,
                    playlist_id,
                    IngestErrorKind::PlaylistApi,
                    &format!("Error getting playlist title for ID {}: {}", playlist_id, e),
                );
                UNKNOWN_PLAYLIST.to_string()
            }
        };

        info!("Processing playlist '{}' ({})", title, playlist_id);

        let video_ids = match self.catalog.playlist_video_ids(playlist_id).await {
            Ok(ids) => ids,
            Err(e) => {
                self.log_failure(
                    report,
                    playlist_id,
                    IngestErrorKind::PlaylistVideoIds,
                    &format!("Error fetching video IDs for playlist {}: {}", playlist_id, e),
                );
                return None;
            }
        };

        report.playlists_processed += 1;

        if video_ids.is_empty() {
            warn!("No videos found in playlist '{}'", title);
            return None;
        }

        info!("Found {} videos in playlist '{}'", video_ids.len(), title);

        Some((
            PlaylistContext {
                id: Some(playlist_id.to_string()),
                title: Some(title),
            },
            video_ids,
        ))
    }

    async fn ingest_video(&self, video_id: String, context: &PlaylistContext) -> VideoOutcome {
        let mut failures = Vec::new();
        let video_url = watch_url(&video_id);

        let video_title = match self.catalog.video_title(&video_id).await {
            Ok(title) => title,
            Err(e) => {
                failures.push((
                    IngestErrorKind::VideoApi,
                    format!("Error getting video title for ID {}: {}", video_id, e),
                ));
                UNKNOWN_VIDEO.to_string()
            }
        };

        let segments = match self.transcripts.fetch(&video_id).await {
            Ok(segments) if !segments.is_empty() => segments,
            Ok(_) => {
                failures.push((
                    IngestErrorKind::TranscriptNotFound,
                    "No usable transcript found for video ID.".to_string(),
                ));
                Vec::new()
            }
            Err(ClipdexError::TranscriptNotFound(message)) => {
                failures.push((IngestErrorKind::TranscriptNotFound, message));
                Vec::new()
            }
            Err(e) => {
                failures.push((
                    IngestErrorKind::TranscriptFetch,
                    format!("Error fetching transcript: {}", e),
                ));
                Vec::new()
            }
        };

        let has_transcript = !segments.is_empty();
        let annotate = |mut fragment: TranscriptFragment| {
            fragment.video_title = Some(video_title.clone());
            fragment.playlist_id = context.id.clone();
            fragment.playlist_title = context.title.clone();
            fragment
        };

        let fragments = if has_transcript {
            segments
                .into_iter()
                .map(|s| {
                    annotate(TranscriptFragment::timed(
                        video_id.as_str(),
                        video_url.as_str(),
                        s.start,
                        s.duration,
                        s.text,
                    ))
                })
                .collect()
        } else {
            vec![annotate(TranscriptFragment::placeholder(
                video_id.as_str(),
                video_url.as_str(),
            ))]
        };

        VideoOutcome {
            video_id,
            fragments,
            has_transcript,
            failures,
        }
    }

    /// Record a failure in the error log and the tracing output.
    pub fn log_failure(
        &self,
        report: &mut IngestReport,
        subject_id: &str,
        kind: IngestErrorKind,
        message: &str,
    ) {
        warn!("{} ({}): {}", subject_id, kind, message);

        match self.error_log.record(subject_id, kind, message) {
            Ok(()) => report.errors_logged += 1,
            Err(e) => warn!("Failed to write error log {:?}: {}", self.error_log.path(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCatalog {
        playlists: HashMap<String, (String, Vec<String>)>,
        titles: HashMap<String, String>,
    }

    #[async_trait]
    impl PlaylistCatalog for FakeCatalog {
        async fn playlist_title(&self, playlist_id: &str) -> Result<String> {
            self.playlists
                .get(playlist_id)
                .map(|(title, _)| title.clone())
                .ok_or_else(|| ClipdexError::PlaylistSource("no such playlist".to_string()))
        }

        async fn playlist_video_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
            self.playlists
                .get(playlist_id)
                .map(|(_, ids)| ids.clone())
                .ok_or_else(|| ClipdexError::PlaylistSource("listing failed".to_string()))
        }

        async fn video_title(&self, video_id: &str) -> Result<String> {
            self.titles
                .get(video_id)
                .cloned()
                .ok_or_else(|| ClipdexError::PlaylistSource("no such video".to_string()))
        }
    }

    #[derive(Default)]
    struct FakeTranscripts {
        transcripts: HashMap<String, Vec<TranscriptSegment>>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TranscriptProvider for FakeTranscripts {
        async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
            self.calls.lock().unwrap().push(video_id.to_string());
            match video_id {
                "brokenvideo" => Err(ClipdexError::TranscriptFetch("boom".to_string())),
                _ => self.transcripts.get(video_id).cloned().ok_or_else(|| {
                    ClipdexError::TranscriptNotFound("No transcript found.".to_string())
                }),
            }
        }
    }

    fn segment(start: f64, duration: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            text: text.to_string(),
            start,
            duration,
        }
    }

    fn ingestor(
        catalog: FakeCatalog,
        transcripts: Arc<FakeTranscripts>,
        dir: &std::path::Path,
    ) -> Ingestor {
        Ingestor::new(
            Arc::new(catalog),
            transcripts,
            ErrorLog::new(dir.join("error_log.csv")),
        )
        .with_max_concurrent(2)
    }

    #[test]
    fn test_playlist_id_from_url() {
        assert_eq!(
            playlist_id_from_url("https://www.youtube.com/playlist?list=PL3MmuxUbc_hIoBpuc900htYF4uhEAbaT-"),
            Some("PL3MmuxUbc_hIoBpuc900htYF4uhEAbaT-".to_string())
        );
        assert_eq!(
            playlist_id_from_url("http://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLabc"),
            Some("PLabc".to_string())
        );
        assert_eq!(playlist_id_from_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), None);
        assert_eq!(playlist_id_from_url("not a url"), None);
    }

    #[test]
    fn test_video_id_from_url() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=-zpVha7bw5A"),
            Some("-zpVha7bw5A".to_string())
        );
        assert_eq!(
            video_id_from_url("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(video_id_from_url("https://www.youtube.com/watch?v=short"), None);
    }

    #[tokio::test]
    async fn test_ingest_playlists_dedupes_and_logs() {
        let dir = tempfile::tempdir().unwrap();

        let mut catalog = FakeCatalog::default();
        catalog.playlists.insert(
            "PL1".to_string(),
            ("Course 2025".to_string(), vec!["aaaaaaaaaaa".to_string(), "bbbbbbbbbbb".to_string()]),
        );
        catalog.playlists.insert(
            "PL2".to_string(),
            ("Course 2024".to_string(), vec!["bbbbbbbbbbb".to_string(), "brokenvideo".to_string()]),
        );
        catalog.titles.insert("aaaaaaaaaaa".to_string(), "Intro".to_string());
        catalog.titles.insert("bbbbbbbbbbb".to_string(), "Setup".to_string());

        let mut transcripts = FakeTranscripts::default();
        transcripts.transcripts.insert(
            "aaaaaaaaaaa".to_string(),
            vec![segment(0.0, 2.5, "hello"), segment(2.5, 3.0, "world")],
        );
        let transcripts = Arc::new(transcripts);

        let urls = vec![
            "https://www.youtube.com/playlist?list=PL1".to_string(),
            "https://www.youtube.com/playlist?list=PL2".to_string(),
            "https://example.com/nothing-here".to_string(),
        ];

        let report = ingestor(catalog, transcripts.clone(), dir.path())
            .run(&urls)
            .await
            .unwrap();

        assert_eq!(report.playlists_processed, 2);
        assert_eq!(report.videos_processed, 3);
        assert_eq!(report.videos_skipped, 1);
        assert_eq!(report.videos_without_transcript, 2);

        // Duplicate video fetched once.
        let calls = transcripts.calls.lock().unwrap().clone();
        assert_eq!(calls.iter().filter(|c| *c == "bbbbbbbbbbb").count(), 1);

        // Two segments for the first video, one placeholder each for the others.
        assert_eq!(report.fragments.len(), 4);
        let first = &report.fragments[0];
        assert_eq!(first.video_title.as_deref(), Some("Intro"));
        assert_eq!(first.playlist_title.as_deref(), Some("Course 2025"));
        assert_eq!(first.video_url, "https://www.youtube.com/watch?v=aaaaaaaaaaa");
        assert_eq!(report.fragments[1].end, Some(5.5));

        let broken = report
            .fragments
            .iter()
            .find(|f| f.video_id == "brokenvideo")
            .unwrap();
        assert!(broken.start.is_none());
        assert!(broken.text.is_none());
        assert_eq!(broken.video_title.as_deref(), Some(UNKNOWN_VIDEO));
        assert_eq!(broken.playlist_id.as_deref(), Some("PL2"));

        // video_api + transcript_fetch for brokenvideo, transcript_not_found
        // for bbbbbbbbbbb, id extraction for the bad URL.
        assert_eq!(report.errors_logged, 4);
        let log = std::fs::read_to_string(dir.path().join("error_log.csv")).unwrap();
        assert!(log.contains("brokenvideo,video_api,"));
        assert!(log.contains("brokenvideo,transcript_fetch,"));
        assert!(log.contains("bbbbbbbbbbb,transcript_not_found,"));
        assert!(log.contains("N/A,playlist_id_extraction,"));
    }

    #[tokio::test]
    async fn test_failed_listing_skips_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let transcripts = Arc::new(FakeTranscripts::default());

        let report = ingestor(FakeCatalog::default(), transcripts, dir.path())
            .run(&["https://www.youtube.com/playlist?list=PLmissing".to_string()])
            .await
            .unwrap();

        assert_eq!(report.playlists_processed, 0);
        assert!(report.fragments.is_empty());
        let log = std::fs::read_to_string(dir.path().join("error_log.csv")).unwrap();
        assert!(log.contains("PLmissing,playlist_api,"));
        assert!(log.contains("PLmissing,playlist_video_ids,"));
    }

    #[tokio::test]
    async fn test_bare_video_url_ingested_without_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = FakeCatalog::default();
        catalog.titles.insert("-zpVha7bw5A".to_string(), "Office hours".to_string());
        let mut transcripts = FakeTranscripts::default();
        transcripts
            .transcripts
            .insert("-zpVha7bw5A".to_string(), vec![segment(1.0, 1.0, "hi")]);

        let report = ingestor(catalog, Arc::new(transcripts), dir.path())
            .run(&["https://www.youtube.com/watch?v=-zpVha7bw5A".to_string()])
            .await
            .unwrap();

        assert_eq!(report.fragments.len(), 1);
        assert!(report.fragments[0].playlist_id.is_none());
        assert_eq!(report.errors_logged, 0);
    }
}
