//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian f32 blobs next to the chunk
//! metadata.

use super::{Document, IndexedVideo, VectorStore};
use crate::error::{ClipdexError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        video_id TEXT NOT NULL,
        video_url TEXT NOT NULL,
        start_time REAL NOT NULL,
        end_time REAL NOT NULL,
        text TEXT NOT NULL,
        embedding BLOB NOT NULL,
        chunk_order INTEGER NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_video_id ON documents(video_id);
    CREATE INDEX IF NOT EXISTS idx_documents_indexed_at ON documents(indexed_at);
"#;

const INSERT_DOCUMENT: &str = r#"
    INSERT OR REPLACE INTO documents
    (id, video_id, video_url, start_time, end_time, text, embedding, chunk_order, indexed_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;

const VIDEO_SUMMARY: &str = r#"
    SELECT video_id, MIN(video_url), COUNT(*) AS chunk_count,
           MAX(end_time) AS last_end_time, MAX(indexed_at) AS indexed_at
    FROM documents
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Create a new SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ClipdexError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
        let id_str: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(6)?;
        let indexed_at_str: String = row.get(8)?;

        Ok(Document {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            video_id: row.get(1)?,
            video_url: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
            text: row.get(5)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            chunk_order: row.get(7)?,
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        })
    }

    fn video_from_row(row: &Row<'_>) -> rusqlite::Result<IndexedVideo> {
        let indexed_at_str: String = row.get(4)?;

        Ok(IndexedVideo {
            video_id: row.get(0)?,
            video_url: row.get(1)?,
            chunk_count: row.get(2)?,
            last_end_time: row.get(3)?,
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        })
    }

    fn insert(conn: &Connection, doc: &Document) -> Result<()> {
        conn.execute(
            INSERT_DOCUMENT,
            params![
                doc.id.to_string(),
                doc.video_id,
                doc.video_url,
                doc.start_time,
                doc.end_time,
                doc.text,
                Self::embedding_to_bytes(&doc.embedding),
                doc.chunk_order,
                doc.indexed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, doc))]
    async fn upsert(&self, doc: &Document) -> Result<()> {
        let conn = self.lock()?;
        Self::insert(&conn, doc)?;

        debug!("Upserted document {}", doc.id);
        Ok(())
    }

    #[instrument(skip(self, docs))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            Self::insert(&tx, doc)?;
        }

        tx.commit()?;
        info!("Batch upserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self))]
    async fn delete_by_video_id(&self, video_id: &str) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn.execute(
            "DELETE FROM documents WHERE video_id = ?1",
            params![video_id],
        )?;

        info!("Deleted {} documents for video {}", deleted, video_id);
        Ok(deleted)
    }

    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn replace_video(&self, video_id: &str, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let deleted = tx.execute(
            "DELETE FROM documents WHERE video_id = ?1",
            params![video_id],
        )?;
        for doc in docs {
            Self::insert(&tx, doc)?;
        }

        tx.commit()?;
        info!(
            "Replaced {} documents with {} for video {}",
            deleted,
            docs.len(),
            video_id
        );
        Ok(docs.len())
    }

    #[instrument(skip(self))]
    async fn list_videos(&self) -> Result<Vec<IndexedVideo>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "{} GROUP BY video_id ORDER BY indexed_at DESC",
            VIDEO_SUMMARY
        ))?;

        let videos = stmt
            .query_map([], Self::video_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(videos)
    }

    #[instrument(skip(self))]
    async fn get_video(&self, video_id: &str) -> Result<Option<IndexedVideo>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE video_id = ?1 GROUP BY video_id",
            VIDEO_SUMMARY
        ))?;

        match stmt.query_row(params![video_id], Self::video_from_row) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn is_video_indexed(&self, video_id: &str) -> Result<bool> {
        let video = self.get_video(video_id).await?;
        Ok(video.is_some())
    }

    #[instrument(skip(self))]
    async fn get_by_video_id(&self, video_id: &str) -> Result<Vec<Document>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, video_id, video_url, start_time, end_time, text,
                   embedding, chunk_order, indexed_at
            FROM documents
            WHERE video_id = ?1
            ORDER BY chunk_order
            "#,
        )?;

        let result = stmt
            .query_map(params![video_id], Self::document_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("Found {} documents for video {}", result.len(), video_id);
        Ok(result)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    fn doc(start: f64, order: i32, embedding: Vec<f32>) -> Document {
        Document::from_chunk(
            Chunk {
                video_id: "video1".to_string(),
                video_url: "https://www.youtube.com/watch?v=video1".to_string(),
                start_time: start,
                end_time: start + 29.5,
                text: "This is test content".to_string(),
            },
            embedding,
            order,
        )
    }

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        store.upsert(&doc(0.0, 0, vec![1.0, -0.5, 0.25])).await.unwrap();
        store
            .upsert_batch(&[doc(30.0, 1, vec![0.0, 1.0, 0.0])])
            .await
            .unwrap();

        let videos = store.list_videos().await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].video_id, "video1");
        assert_eq!(videos[0].chunk_count, 2);
        assert_eq!(videos[0].last_end_time, 59.5);

        let docs = store.get_by_video_id("video1").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].embedding, vec![1.0, -0.5, 0.25]);
        assert_eq!(docs[0].video_url, "https://www.youtube.com/watch?v=video1");
        assert_eq!(docs[1].start_time, 30.0);

        assert!(store.is_video_indexed("video1").await.unwrap());
        assert!(store.get_video("other").await.unwrap().is_none());

        let deleted = store.delete_by_video_id("video1").await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.document_count().await.unwrap(), 0);
        assert!(store.list_videos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_video_swaps_documents() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .upsert_batch(&[doc(0.0, 0, vec![1.0]), doc(30.0, 1, vec![2.0])])
            .await
            .unwrap();

        let replaced = store
            .replace_video("video1", &[doc(0.0, 0, vec![3.0])])
            .await
            .unwrap();

        assert_eq!(replaced, 1);
        let docs = store.get_by_video_id("video1").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].embedding, vec![3.0]);
    }

    #[tokio::test]
    async fn test_undecodable_row_is_an_error() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store.upsert(&doc(0.0, 0, vec![1.0])).await.unwrap();
        store
            .lock()
            .unwrap()
            .execute("UPDATE documents SET start_time = 'not a number'", [])
            .unwrap();

        assert!(store.get_by_video_id("video1").await.is_err());
    }

    #[tokio::test]
    async fn test_on_disk_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("vectors.db");

        {
            let store = SqliteVectorStore::new(&path).unwrap();
            store.upsert(&doc(0.0, 0, vec![0.5])).await.unwrap();
        }

        let reopened = SqliteVectorStore::new(&path).unwrap();
        assert_eq!(reopened.document_count().await.unwrap(), 1);
    }
}
