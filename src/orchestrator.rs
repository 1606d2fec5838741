//! Pipeline orchestrator for clipdex.
//!
//! Coordinates the stages from transcript ingestion to indexing.

use crate::chunking::{chunk_file, load_chunks, save_fragments, Chunk};
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{ClipdexError, Result};
use crate::ingest::{
    ErrorLog, IngestErrorKind, IngestReport, Ingestor, YoutubeDataClient, YtDlpTranscripts,
};
use crate::vector_store::{open_store, Document, VectorStore};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// The main orchestrator for the clipdex pipeline.
pub struct Orchestrator {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl Orchestrator {
    /// Create a new orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        )?);

        let vector_store = open_store(&settings)?;

        Ok(Self {
            settings,
            embedder,
            vector_store,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            settings,
            embedder,
            vector_store,
        }
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build an ingestor backed by the YouTube Data API and yt-dlp.
    pub fn ingestor(&self) -> Result<Ingestor> {
        let api_key = self.settings.youtube.resolved_api_key().ok_or_else(|| {
            ClipdexError::Config(
                "YouTube API key not set. Set YOUTUBE_API_KEY or youtube.api_key".to_string(),
            )
        })?;

        let catalog = Arc::new(YoutubeDataClient::new(api_key)?);
        let transcripts = Arc::new(YtDlpTranscripts::new(
            self.settings.youtube.languages.clone(),
        ));

        Ok(Ingestor::new(
            catalog,
            transcripts,
            ErrorLog::new(self.settings.error_log_path()),
        )
        .with_max_concurrent(self.settings.youtube.max_concurrent))
    }

    /// Fetch transcripts for `playlists` and save the fragments to `output`.
    pub async fn fetch(&self, playlists: &[String], output: &Path) -> Result<IngestReport> {
        let ingestor = self.ingestor()?;
        self.fetch_with(&ingestor, playlists, output).await
    }

    /// Run `ingestor` over `playlists` and save the fragments to `output`.
    ///
    /// A failed save is recorded in the error log and returned.
    #[instrument(skip(self, ingestor, playlists), fields(playlists = playlists.len()))]
    pub async fn fetch_with(
        &self,
        ingestor: &Ingestor,
        playlists: &[String],
        output: &Path,
    ) -> Result<IngestReport> {
        if playlists.is_empty() {
            return Err(ClipdexError::InvalidInput(
                "No playlists configured. Pass --playlist or set youtube.playlists".to_string(),
            ));
        }

        let mut report = ingestor.run(playlists).await?;

        if let Err(e) = save_fragments(output, &report.fragments) {
            ingestor.log_failure(
                &mut report,
                "N/A",
                IngestErrorKind::JsonSave,
                &format!("Failed to save fragments: {}", e),
            );
            return Err(e);
        }

        info!(
            "Fetched {} fragments from {} videos",
            report.fragments.len(),
            report.videos_processed
        );
        Ok(report)
    }

    /// Chunk the fragments at `input` and save the chunks to `output`.
    pub fn chunk(&self, input: &Path, output: &Path, window_seconds: f64) -> Result<Vec<Chunk>> {
        chunk_file(input, output, window_seconds)
    }

    /// Index the chunks stored at `input`.
    pub async fn index_file(&self, input: &Path) -> Result<usize> {
        let chunks = load_chunks(input)?;
        self.index_chunks(chunks).await
    }

    /// Generate embeddings and index chunks, replacing each video's
    /// previous documents.
    ///
    /// Stored documents are only touched once a video's embeddings exist.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    pub async fn index_chunks(&self, chunks: Vec<Chunk>) -> Result<usize> {
        let mut indexed = 0;

        for (video_id, video_chunks) in group_by_video(chunks) {
            let texts: Vec<String> = video_chunks.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            if embeddings.len() != video_chunks.len() {
                return Err(ClipdexError::Embedding(format!(
                    "Expected {} embeddings for video {}, got {}",
                    video_chunks.len(),
                    video_id,
                    embeddings.len()
                )));
            }

            let documents: Vec<Document> = video_chunks
                .into_iter()
                .zip(embeddings)
                .enumerate()
                .map(|(order, (chunk, embedding))| {
                    Document::from_chunk(chunk, embedding, order as i32)
                })
                .collect();

            indexed += self
                .vector_store
                .replace_video(&video_id, &documents)
                .await?;
            info!("Indexed {} chunks for video {}", documents.len(), video_id);
        }

        Ok(indexed)
    }

    /// Fetch, chunk and index in one pass using the configured paths.
    pub async fn run(&self, playlists: &[String], window_seconds: f64) -> Result<RunResult> {
        let ingestor = self.ingestor()?;
        self.run_with(&ingestor, playlists, window_seconds).await
    }

    /// Fetch with `ingestor`, then chunk and index.
    pub async fn run_with(
        &self,
        ingestor: &Ingestor,
        playlists: &[String],
        window_seconds: f64,
    ) -> Result<RunResult> {
        let fragments_path = self.settings.fragments_path();
        let chunks_path = self.settings.chunks_path();

        let ingest = self.fetch_with(ingestor, playlists, &fragments_path).await?;
        let chunks = self.chunk(&fragments_path, &chunks_path, window_seconds)?;
        let chunks_created = chunks.len();
        let chunks_indexed = self.index_chunks(chunks).await?;

        Ok(RunResult {
            videos_processed: ingest.videos_processed,
            videos_without_transcript: ingest.videos_without_transcript,
            errors_logged: ingest.errors_logged,
            fragments: ingest.fragments.len(),
            chunks_created,
            chunks_indexed,
        })
    }
}

/// Group chunks by video, keeping first-appearance order of videos.
fn group_by_video(chunks: Vec<Chunk>) -> Vec<(String, Vec<Chunk>)> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Chunk>)> = Vec::new();

    for chunk in chunks {
        match positions.get(&chunk.video_id).copied() {
            Some(idx) => groups[idx].1.push(chunk),
            None => {
                positions.insert(chunk.video_id.clone(), groups.len());
                groups.push((chunk.video_id.clone(), vec![chunk]));
            }
        }
    }

    groups
}

/// Result of a full pipeline run.
#[derive(Debug)]
pub struct RunResult {
    /// Videos fetched.
    pub videos_processed: usize,
    /// Videos without a transcript.
    pub videos_without_transcript: usize,
    /// Rows written to the error log.
    pub errors_logged: usize,
    /// Fragments saved.
    pub fragments: usize,
    /// Chunks produced by the chunker.
    pub chunks_created: usize,
    /// Chunks embedded and stored.
    pub chunks_indexed: usize,
}
