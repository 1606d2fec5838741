//! In-memory vector store implementation.
//!
//! Useful for testing and dry runs.

use super::{Document, IndexedVideo, VectorStore};
use crate::error::{ClipdexError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Document>>> {
        self.documents
            .read()
            .map_err(|e| ClipdexError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Document>>> {
        self.documents
            .write()
            .map_err(|e| ClipdexError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, doc: &Document) -> Result<()> {
        self.write()?.insert(doc.id.to_string(), doc.clone());
        Ok(())
    }

    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.write()?;
        for doc in docs {
            store.insert(doc.id.to_string(), doc.clone());
        }
        Ok(docs.len())
    }

    async fn delete_by_video_id(&self, video_id: &str) -> Result<usize> {
        let mut docs = self.write()?;
        let initial_len = docs.len();
        docs.retain(|_, doc| doc.video_id != video_id);
        Ok(initial_len - docs.len())
    }

    async fn replace_video(&self, video_id: &str, docs: &[Document]) -> Result<usize> {
        let mut store = self.write()?;
        store.retain(|_, doc| doc.video_id != video_id);
        for doc in docs {
            store.insert(doc.id.to_string(), doc.clone());
        }
        Ok(docs.len())
    }

    async fn list_videos(&self) -> Result<Vec<IndexedVideo>> {
        let docs = self.read()?;

        let mut video_map: HashMap<String, IndexedVideo> = HashMap::new();

        for doc in docs.values() {
            let entry = video_map
                .entry(doc.video_id.clone())
                .or_insert_with(|| IndexedVideo {
                    video_id: doc.video_id.clone(),
                    video_url: doc.video_url.clone(),
                    chunk_count: 0,
                    last_end_time: 0.0,
                    indexed_at: doc.indexed_at,
                });

            entry.chunk_count += 1;
            if doc.end_time > entry.last_end_time {
                entry.last_end_time = doc.end_time;
            }
            if doc.indexed_at > entry.indexed_at {
                entry.indexed_at = doc.indexed_at;
            }
        }

        let mut videos: Vec<IndexedVideo> = video_map.into_values().collect();
        videos.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));

        Ok(videos)
    }

    async fn get_video(&self, video_id: &str) -> Result<Option<IndexedVideo>> {
        let videos = self.list_videos().await?;
        Ok(videos.into_iter().find(|v| v.video_id == video_id))
    }

    async fn is_video_indexed(&self, video_id: &str) -> Result<bool> {
        Ok(self.read()?.values().any(|d| d.video_id == video_id))
    }

    async fn get_by_video_id(&self, video_id: &str) -> Result<Vec<Document>> {
        let docs = self.read()?;
        let mut result: Vec<Document> = docs
            .values()
            .filter(|d| d.video_id == video_id)
            .cloned()
            .collect();
        result.sort_by_key(|d| d.chunk_order);
        Ok(result)
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
