//! Configuration module for clipdex.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, PathSettings, Settings,
    VectorStoreSettings, YoutubeSettings,
};
