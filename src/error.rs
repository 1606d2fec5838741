//! Error types for clipdex.

use thiserror::Error;

/// Library-level error type for clipdex operations.
#[derive(Error, Debug)]
pub enum ClipdexError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Playlist source error: {0}")]
    PlaylistSource(String),

    #[error("No transcript found: {0}")]
    TranscriptNotFound(String),

    #[error("Transcript fetch failed: {0}")]
    TranscriptFetch(String),

    #[error("Failed to write output {path}: {reason}")]
    Output { path: String, reason: String },

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ClipdexError {
    /// Build an output error for a failed write to `path`.
    pub fn output(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        ClipdexError::Output {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for clipdex operations.
pub type Result<T> = std::result::Result<T, ClipdexError>;
