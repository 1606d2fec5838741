//! Fixed-window chunking.
//!
//! Groups fragments into chunks anchored at the start of their first
//! fragment. A fragment joins the open chunk while it starts less than
//! `window` seconds after the chunk start; the first fragment starting at
//! or past that point seals the chunk and opens the next one.

use super::{Chunk, TranscriptFragment};
use crate::error::{ClipdexError, Result};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECONDS: f64 = 30.0;

/// Time-window chunker.
#[derive(Debug, Clone, Copy)]
pub struct WindowChunker {
    window: f64,
}

impl WindowChunker {
    /// Create a chunker with the given window length in seconds.
    pub fn new(window_seconds: f64) -> Result<Self> {
        if !window_seconds.is_finite() || window_seconds <= 0.0 {
            return Err(ClipdexError::InvalidInput(format!(
                "Window length must be a positive number of seconds, got {}",
                window_seconds
            )));
        }

        Ok(Self {
            window: window_seconds,
        })
    }

    /// Window length in seconds.
    pub fn window_seconds(&self) -> f64 {
        self.window
    }

    /// Chunk fragments from any number of videos.
    ///
    /// Videos come out in order of first appearance in `fragments`, and
    /// each video's chunks are in temporal order.
    #[instrument(skip_all, fields(fragments = fragments.len(), window = self.window))]
    pub fn chunk(&self, fragments: &[TranscriptFragment]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (video_id, entries) in partition_by_video(fragments) {
            let video_chunks = self.chunk_video(video_id, entries.iter().copied());
            debug!(
                "Created {} chunks for video_id {} from {} transcript entries",
                video_chunks.len(),
                video_id,
                entries.len()
            );
            chunks.extend(video_chunks);
        }

        debug!("Created {} chunks in total", chunks.len());
        chunks
    }

    /// Chunk the fragments of a single video.
    ///
    /// Fragments without a usable time span are dropped before grouping.
    pub fn chunk_video<'a, I>(&self, video_id: &str, fragments: I) -> Vec<Chunk>
    where
        I: IntoIterator<Item = &'a TranscriptFragment>,
    {
        let mut timed: Vec<(f64, f64, &TranscriptFragment)> = fragments
            .into_iter()
            .filter_map(|f| f.time_span().map(|(start, end)| (start, end, f)))
            .collect();

        // Stable, so equal starts keep their input order.
        timed.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut chunks = Vec::new();
        let mut open: Option<OpenChunk<'_>> = None;

        for (start, end, fragment) in timed {
            if let Some(current) = open.as_mut() {
                if start - current.start_time < self.window {
                    current.absorb(fragment, end);
                    continue;
                }
            }

            if let Some(sealed) = open.take() {
                chunks.push(sealed.seal(video_id));
            }
            open = Some(OpenChunk::open(fragment, start, end));
        }

        if let Some(sealed) = open {
            chunks.push(sealed.seal(video_id));
        }

        chunks
    }
}

impl Default for WindowChunker {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW_SECONDS,
        }
    }
}

/// Chunk `fragments` with a `window` in seconds.
pub fn group_transcript_by_time(
    fragments: &[TranscriptFragment],
    window: f64,
) -> Result<Vec<Chunk>> {
    Ok(WindowChunker::new(window)?.chunk(fragments))
}

/// The chunk currently accepting fragments.
struct OpenChunk<'a> {
    video_url: &'a str,
    start_time: f64,
    current_end: f64,
    texts: Vec<&'a str>,
}

impl<'a> OpenChunk<'a> {
    fn open(fragment: &'a TranscriptFragment, start: f64, end: f64) -> Self {
        Self {
            video_url: &fragment.video_url,
            start_time: start,
            current_end: end,
            texts: vec![fragment.text()],
        }
    }

    fn absorb(&mut self, fragment: &'a TranscriptFragment, end: f64) {
        self.texts.push(fragment.text());
        self.current_end = end;
    }

    fn seal(self, video_id: &str) -> Chunk {
        Chunk {
            video_id: video_id.to_string(),
            video_url: self.video_url.to_string(),
            start_time: self.start_time,
            end_time: self.current_end,
            text: self.texts.join(" "),
        }
    }
}

/// Group fragments by video id, keeping first-appearance order of videos.
fn partition_by_video(fragments: &[TranscriptFragment]) -> Vec<(&str, Vec<&TranscriptFragment>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&TranscriptFragment>)> = Vec::new();

    for fragment in fragments {
        let slot = *index.entry(fragment.video_id.as_str()).or_insert_with(|| {
            groups.push((fragment.video_id.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(fragment);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(video_id: &str, start: f64, duration: f64, text: &str) -> TranscriptFragment {
        TranscriptFragment::timed(
            video_id,
            format!("https://www.youtube.com/watch?v={}", video_id),
            start,
            duration,
            text,
        )
    }

    fn untimed(video_id: &str, text: &str) -> TranscriptFragment {
        TranscriptFragment {
            video_id: video_id.to_string(),
            video_url: format!("https://www.youtube.com/watch?v={}", video_id),
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn chunks_for<'a>(chunks: &'a [Chunk], video_id: &str) -> Vec<&'a Chunk> {
        chunks.iter().filter(|c| c.video_id == video_id).collect()
    }

    #[test]
    fn test_window_boundary_starts_new_chunk() {
        let chunker = WindowChunker::default();
        let fragments: Vec<_> = [0.0, 10.0, 20.0, 30.0, 40.0]
            .iter()
            .map(|&s| fragment("A", s, 5.0, &format!("t{}", s as u32)))
            .collect();

        let chunks = chunker.chunk(&fragments);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start_time, 0.0);
        assert_eq!(chunks[0].end_time, 25.0);
        assert_eq!(chunks[0].text, "t0 t10 t20");
        assert_eq!(chunks[1].start_time, 30.0);
        assert_eq!(chunks[1].end_time, 45.0);
        assert_eq!(chunks[1].text, "t30 t40");
    }

    #[test]
    fn test_window_anchored_at_chunk_start() {
        // Each gap is small, but 29.9 is the last start inside the window.
        let chunker = WindowChunker::new(30.0).unwrap();
        let fragments = vec![
            fragment("A", 0.0, 12.0, "a"),
            fragment("A", 12.0, 12.0, "b"),
            fragment("A", 24.0, 5.9, "c"),
            fragment("A", 29.9, 0.1, "d"),
            fragment("A", 30.0, 0.1, "e"),
        ];

        let chunks = chunker.chunk(&fragments);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "a b c d");
        assert!((chunks[0].end_time - 30.0).abs() < 1e-9);
        assert_eq!(chunks[1].text, "e");
    }

    #[test]
    fn test_chunk_may_outlast_window_through_long_fragment() {
        let chunker = WindowChunker::default();
        let fragments = vec![fragment("A", 0.0, 5.0, "short"), fragment("A", 20.0, 40.0, "long")];

        let chunks = chunker.chunk(&fragments);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].end_time, 60.0);
    }

    #[test]
    fn test_null_start_does_not_touch_open_chunk() {
        let chunker = WindowChunker::default();
        let fragments = vec![
            fragment("A", 0.0, 5.0, "one"),
            untimed("A", "ghost"),
            fragment("A", 10.0, 5.0, "two"),
        ];

        let chunks = chunker.chunk(&fragments);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "one two");
        assert_eq!(chunks[0].start_time, 0.0);
        assert_eq!(chunks[0].end_time, 15.0);
        assert!(chunks.iter().all(|c| !c.text.contains("ghost")));
    }

    #[test]
    fn test_missing_end_without_duration_is_skipped() {
        let chunker = WindowChunker::default();
        let fragments = vec![
            TranscriptFragment {
                video_id: "A".to_string(),
                text: Some("no end".to_string()),
                start: Some(3.0),
                ..Default::default()
            },
            fragment("A", 5.0, 1.0, "kept"),
        ];

        let chunks = chunker.chunk(&fragments);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "kept");
        assert_eq!(chunks[0].start_time, 5.0);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let chunker = WindowChunker::default();
        assert!(chunker.chunk(&[]).is_empty());
    }

    #[test]
    fn test_video_without_valid_fragments_yields_no_chunks() {
        let chunker = WindowChunker::default();
        let fragments = vec![
            TranscriptFragment::placeholder("A", "https://www.youtube.com/watch?v=A"),
            fragment("B", 0.0, 2.0, "hello"),
        ];

        let chunks = chunker.chunk(&fragments);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].video_id, "B");
    }

    #[test]
    fn test_single_fragment_single_chunk() {
        let chunker = WindowChunker::default();

        let zero = chunker.chunk(&[fragment("A", 7.0, 0.0, "blip")]);
        assert_eq!(zero.len(), 1);
        assert_eq!(zero[0].start_time, zero[0].end_time);

        let some = chunker.chunk(&[fragment("A", 7.0, 3.0, "word")]);
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].start_time, 7.0);
        assert_eq!(some[0].end_time, 10.0);
    }

    #[test]
    fn test_unordered_input_is_sorted_within_video() {
        let chunker = WindowChunker::default();
        let ordered = vec![
            fragment("A", 0.0, 4.0, "a"),
            fragment("A", 5.0, 4.0, "b"),
            fragment("A", 31.0, 4.0, "c"),
            fragment("A", 40.0, 4.0, "d"),
            fragment("A", 75.0, 4.0, "e"),
        ];
        let mut shuffled = ordered.clone();
        shuffled.reverse();
        shuffled.swap(1, 3);

        let expected = chunker.chunk(&ordered);
        assert_eq!(chunker.chunk(&shuffled), expected);

        assert_eq!(expected.len(), 3);
        assert_eq!(expected[0].text, "a b");
        assert_eq!(expected[1].text, "c d");
        assert_eq!(expected[2].text, "e");
    }

    #[test]
    fn test_interleaved_videos_match_separate_runs() {
        let chunker = WindowChunker::default();
        let a = vec![
            fragment("A", 0.0, 5.0, "a0"),
            fragment("A", 15.0, 5.0, "a15"),
            fragment("A", 35.0, 5.0, "a35"),
        ];
        let b = vec![
            fragment("B", 2.0, 5.0, "b2"),
            fragment("B", 40.0, 5.0, "b40"),
            fragment("B", 50.0, 5.0, "b50"),
        ];
        let interleaved: Vec<_> = a
            .iter()
            .zip(b.iter())
            .flat_map(|(x, y)| [y.clone(), x.clone()])
            .collect();

        let together = chunker.chunk(&interleaved);
        let alone_a = chunker.chunk(&a);
        let alone_b = chunker.chunk(&b);

        let together_a: Vec<Chunk> = chunks_for(&together, "A").into_iter().cloned().collect();
        let together_b: Vec<Chunk> = chunks_for(&together, "B").into_iter().cloned().collect();
        assert_eq!(together_a, alone_a);
        assert_eq!(together_b, alone_b);

        // B appeared first in the interleaved input.
        assert_eq!(together[0].video_id, "B");
    }

    #[test]
    fn test_chunk_invariants_hold() {
        let chunker = WindowChunker::new(12.5).unwrap();
        let mut fragments = Vec::new();
        for (i, video) in ["A", "B", "C"].iter().enumerate() {
            for step in 0..20 {
                let start = (step * 7 + i) as f64 * 1.3;
                fragments.push(fragment(video, start, (step % 4) as f64, &format!("{}{}", video, step)));
            }
            fragments.push(untimed(video, "skip me"));
        }
        let valid = fragments.iter().filter(|f| f.time_span().is_some()).count();

        let chunks = chunker.chunk(&fragments);

        assert!(!chunks.is_empty());
        assert!(chunks.len() <= valid);
        for chunk in &chunks {
            assert!(chunk.end_time >= chunk.start_time);
            assert!(!chunk.text.is_empty());
        }
        let words: usize = chunks.iter().map(|c| c.text.split(' ').count()).sum();
        assert_eq!(words, valid);
    }

    #[test]
    fn test_video_url_taken_from_opening_fragment() {
        let chunker = WindowChunker::default();
        let mut first = fragment("A", 0.0, 1.0, "x");
        first.video_url = "https://youtu.be/A".to_string();

        let chunks = chunker.chunk(&[first, fragment("A", 1.0, 1.0, "y")]);

        assert_eq!(chunks[0].video_url, "https://youtu.be/A");
    }

    #[test]
    fn test_invalid_window_rejected() {
        assert!(WindowChunker::new(0.0).is_err());
        assert!(WindowChunker::new(-5.0).is_err());
        assert!(WindowChunker::new(f64::NAN).is_err());
        assert!(WindowChunker::new(f64::INFINITY).is_err());
        assert!(group_transcript_by_time(&[], 0.0).is_err());
        assert_eq!(WindowChunker::new(45.0).unwrap().window_seconds(), 45.0);
    }
}
