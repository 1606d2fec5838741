//! Time-windowed chunking of transcript fragments.
//!
//! Turns the flat list of timestamped fragments produced by the fetch stage
//! into per-video chunks of roughly `window` seconds, ready for embedding.

mod io;
mod window;

pub use io::{chunk_file, load_chunks, load_fragments, save_chunks, save_fragments};
pub use window::{group_transcript_by_time, WindowChunker, DEFAULT_WINDOW_SECONDS};

use serde::{Deserialize, Serialize};

/// A single timestamped piece of a video transcript.
///
/// Everything except `video_id` may be missing on input. Videos without a
/// transcript are recorded as one fragment with no text and no times.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    /// Video this fragment belongs to.
    pub video_id: String,
    /// Video title, when the catalog knew it.
    #[serde(default)]
    pub video_title: Option<String>,
    /// Watch URL of the video.
    #[serde(default)]
    pub video_url: String,
    /// Playlist the video was listed in.
    #[serde(default)]
    pub playlist_id: Option<String>,
    /// Title of that playlist.
    #[serde(default)]
    pub playlist_title: Option<String>,
    /// Spoken text.
    #[serde(default)]
    pub text: Option<String>,
    /// Start time in seconds.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub start: Option<f64>,
    /// Duration in seconds.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
    /// End time in seconds (`start + duration`).
    #[serde(default, deserialize_with = "lenient_f64")]
    pub end: Option<f64>,
}

impl TranscriptFragment {
    /// Create a timed fragment; `end` is derived from `start + duration`.
    pub fn timed(
        video_id: impl Into<String>,
        video_url: impl Into<String>,
        start: f64,
        duration: f64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            video_url: video_url.into(),
            text: Some(text.into()),
            start: Some(start),
            duration: Some(duration),
            end: Some(start + duration),
            ..Default::default()
        }
    }

    /// Create the entry recorded for a video that has no usable transcript.
    pub fn placeholder(video_id: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            video_url: video_url.into(),
            ..Default::default()
        }
    }

    /// End time, falling back to `start + duration` when `end` is absent.
    pub fn end_time(&self) -> Option<f64> {
        self.end.or_else(|| Some(self.start? + self.duration?))
    }

    /// The `(start, end)` pair if this fragment can be placed on the timeline.
    ///
    /// Both bounds must be finite and `end >= start`.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        let start = self.start?;
        let end = self.end_time()?;

        if start.is_finite() && end.is_finite() && end >= start {
            Some((start, end))
        } else {
            None
        }
    }

    /// Text content, empty when the fragment carries none.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Read a time field, treating anything that is not a JSON number as absent.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(serde_json::Value::as_f64))
}

/// A time-bounded run of fragments from one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Video this chunk belongs to.
    pub video_id: String,
    /// Watch URL of the video.
    pub video_url: String,
    /// Start of the first fragment in seconds.
    pub start_time: f64,
    /// End of the last absorbed fragment in seconds.
    pub end_time: f64,
    /// Fragment texts joined by single spaces.
    pub text: String,
}

impl Chunk {
    /// Duration of this chunk in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}
