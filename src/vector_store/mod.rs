//! Vector store abstraction for clipdex.
//!
//! Provides a trait-based interface for the backends that hold embedded
//! chunks together with their retrieval metadata.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::Chunk;
use crate::config::Settings;
use crate::error::{ClipdexError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// An embedded chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// Video ID this document belongs to.
    pub video_id: String,
    /// Watch URL of the video.
    pub video_url: String,
    /// Start time in the video (seconds).
    pub start_time: f64,
    /// End time in the video (seconds).
    pub end_time: f64,
    /// Embedded text.
    pub text: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Position of this chunk within its video.
    pub chunk_order: i32,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Create a document from a chunk and its embedding.
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>, chunk_order: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_id: chunk.video_id,
            video_url: chunk.video_url,
            start_time: chunk.start_time,
            end_time: chunk.end_time,
            text: chunk.text,
            embedding,
            chunk_order,
            indexed_at: Utc::now(),
        }
    }

    /// Format the start timestamp for display.
    pub fn format_timestamp(&self) -> String {
        let total_seconds = self.start_time as u32;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{:02}:{:02}", minutes, secs)
        }
    }
}

/// Summary information about an indexed video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedVideo {
    /// Video ID.
    pub video_id: String,
    /// Watch URL of the video.
    pub video_url: String,
    /// Number of indexed chunks.
    pub chunk_count: u32,
    /// Latest chunk end time in seconds.
    pub last_end_time: f64,
    /// When the video was indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a document with its embedding.
    async fn upsert(&self, doc: &Document) -> Result<()>;

    /// Bulk upsert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Delete documents by video ID.
    async fn delete_by_video_id(&self, video_id: &str) -> Result<usize>;

    /// Replace every document of `video_id` with `docs` in one step.
    async fn replace_video(&self, video_id: &str, docs: &[Document]) -> Result<usize>;

    /// List all indexed videos.
    async fn list_videos(&self) -> Result<Vec<IndexedVideo>>;

    /// Get a specific video's information.
    async fn get_video(&self, video_id: &str) -> Result<Option<IndexedVideo>>;

    /// Check if a video is indexed.
    async fn is_video_indexed(&self, video_id: &str) -> Result<bool>;

    /// Get all documents for a video, in chunk order.
    async fn get_by_video_id(&self, video_id: &str) -> Result<Vec<Document>>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

/// Open the vector store selected in the settings.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider.to_lowercase().as_str() {
        "sqlite" => Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?)),
        "memory" => Ok(Arc::new(MemoryVectorStore::new())),
        other => Err(ClipdexError::Config(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(start: f64) -> Chunk {
        Chunk {
            video_id: "test".to_string(),
            video_url: "https://www.youtube.com/watch?v=test".to_string(),
            start_time: start,
            end_time: start + 5.0,
            text: "content".to_string(),
        }
    }

    #[test]
    fn test_document_from_chunk() {
        let doc = Document::from_chunk(chunk(125.0), vec![0.5, 0.5], 3);

        assert_eq!(doc.video_id, "test");
        assert_eq!(doc.end_time, 130.0);
        assert_eq!(doc.chunk_order, 3);
        assert_eq!(doc.format_timestamp(), "02:05");
    }

    #[test]
    fn test_document_timestamp_with_hours() {
        let doc = Document::from_chunk(chunk(3725.0), vec![], 0);
        assert_eq!(doc.format_timestamp(), "01:02:05");
    }

    #[test]
    fn test_open_store_rejects_unknown_provider() {
        let mut settings = Settings::default();
        settings.vector_store.provider = "pinecone".to_string();
        assert!(matches!(open_store(&settings), Err(ClipdexError::Config(_))));

        settings.vector_store.provider = "memory".to_string();
        assert!(open_store(&settings).is_ok());
    }
}
