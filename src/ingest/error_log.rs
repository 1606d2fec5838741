//! CSV log of ingestion failures.

use crate::error::Result;
use std::borrow::Cow;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADER: &str = "video_id,error_type,error_message,timestamp";

/// Category of an ingestion failure, written to the `error_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestErrorKind {
    /// The playlist URL had no usable playlist or video id.
    PlaylistIdExtraction,
    /// The playlist title lookup failed.
    PlaylistApi,
    /// Listing the videos of a playlist failed.
    PlaylistVideoIds,
    /// The video title lookup failed.
    VideoApi,
    /// No usable transcript exists for the video.
    TranscriptNotFound,
    /// The transcript download itself failed.
    TranscriptFetch,
    /// Writing the fragments file failed.
    JsonSave,
}

impl IngestErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestErrorKind::PlaylistIdExtraction => "playlist_id_extraction",
            IngestErrorKind::PlaylistApi => "playlist_api",
            IngestErrorKind::PlaylistVideoIds => "playlist_video_ids",
            IngestErrorKind::VideoApi => "video_api",
            IngestErrorKind::TranscriptNotFound => "transcript_not_found",
            IngestErrorKind::TranscriptFetch => "transcript_fetch",
            IngestErrorKind::JsonSave => "json_save",
        }
    }
}

impl std::fmt::Display for IngestErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only CSV error log.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first if the file is new.
    pub fn record(&self, subject_id: &str, kind: IngestErrorKind, message: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if is_new {
            writeln!(file, "{}", HEADER)?;
        }

        let timestamp = chrono::Local::now()
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();

        writeln!(
            file,
            "{},{},{},{}",
            csv_field(subject_id),
            kind,
            csv_field(message),
            timestamp
        )?;

        Ok(())
    }
}

/// Quote a CSV field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
