//! CLI module for clipdex.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// clipdex - Time-windowed transcript chunking and indexing
///
/// Fetches YouTube playlist transcripts, groups them into fixed time windows
/// and indexes the chunks in a local vector store.
#[derive(Parser, Debug)]
#[command(name = "clipdex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch playlist transcripts into a fragments file
    Fetch {
        /// Playlist URL (repeatable, overrides youtube.playlists)
        #[arg(short, long)]
        playlist: Vec<String>,

        /// Fragments file to write
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Group transcript fragments into time-windowed chunks
    Chunk {
        /// Fragments file to read
        #[arg(short, long)]
        input: Option<String>,

        /// Chunks file to write
        #[arg(short, long)]
        output: Option<String>,

        /// Window length in seconds
        #[arg(short, long)]
        window: Option<f64>,
    },

    /// Embed chunks and store them in the vector store
    Index {
        /// Chunks file to read
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Fetch, chunk and index in one go
    Run {
        /// Playlist URL (repeatable, overrides youtube.playlists)
        #[arg(short, long)]
        playlist: Vec<String>,

        /// Window length in seconds
        #[arg(short, long)]
        window: Option<f64>,
    },

    /// List indexed videos
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
