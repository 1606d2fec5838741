//! clipdex - Time-windowed transcript chunking and indexing
//!
//! Turns the transcripts of YouTube playlists into fixed-window chunks with
//! timestamps, ready for embedding and retrieval.
//!
//! # Overview
//!
//! clipdex allows you to:
//! - Fetch transcripts for every video in a set of playlists
//! - Group transcript fragments into chunks spanning a fixed time window
//! - Embed the chunks and store them with their video metadata
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `ingest` - Playlist listing, transcript fetching and the error log
//! - `chunking` - Fragment model and the time-window chunker
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust
//! use clipdex::chunking::{group_transcript_by_time, TranscriptFragment};
//!
//! let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
//! let fragments: Vec<TranscriptFragment> = [0.0, 10.0, 20.0, 30.0, 40.0]
//!     .iter()
//!     .map(|&start| TranscriptFragment::timed("dQw4w9WgXcQ", url, start, 5.0, "line"))
//!     .collect();
//!
//! let chunks = group_transcript_by_time(&fragments, 30.0)?;
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].start_time, 30.0);
//! # Ok::<(), clipdex::ClipdexError>(())
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod openai;
pub mod orchestrator;
pub mod vector_store;

pub use error::{ClipdexError, Result};
