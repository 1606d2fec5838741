//! Reading and writing the JSON arrays exchanged between pipeline stages.

use super::{Chunk, TranscriptFragment, WindowChunker};
use crate::error::{ClipdexError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};

/// Load transcript fragments from a JSON array.
#[instrument]
pub fn load_fragments(path: &Path) -> Result<Vec<TranscriptFragment>> {
    let fragments: Vec<TranscriptFragment> = read_json(path)?;
    info!("Loaded {} transcript fragments", fragments.len());
    Ok(fragments)
}

/// Load chunks from a JSON array.
#[instrument]
pub fn load_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let chunks: Vec<Chunk> = read_json(path)?;
    info!("Loaded {} chunks", chunks.len());
    Ok(chunks)
}

/// Write chunks as a pretty-printed JSON array.
///
/// Any failure is reported as [`ClipdexError::Output`].
#[instrument(skip(chunks), fields(count = chunks.len()))]
pub fn save_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    write_json(path, chunks)?;
    info!("Saved {} chunks to {:?}", chunks.len(), path);
    Ok(())
}

/// Write transcript fragments as a pretty-printed JSON array.
#[instrument(skip(fragments), fields(count = fragments.len()))]
pub fn save_fragments(path: &Path, fragments: &[TranscriptFragment]) -> Result<()> {
    write_json(path, fragments)?;
    info!("Saved {} transcript fragments to {:?}", fragments.len(), path);
    Ok(())
}

/// Chunk the fragments stored at `input` and write the chunks to `output`.
///
/// The window is validated before any file is read.
#[instrument]
pub fn chunk_file(input: &Path, output: &Path, window_seconds: f64) -> Result<Vec<Chunk>> {
    let chunker = WindowChunker::new(window_seconds)?;

    let fragments = load_fragments(input)?;
    let chunks = chunker.chunk(&fragments);
    save_chunks(output, &chunks)?;

    info!(
        "Grouped {} fragments into {} chunks",
        fragments.len(),
        chunks.len()
    );
    Ok(chunks)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ClipdexError::output(path, e))?;
    }

    let content = serde_json::to_string_pretty(value).map_err(|e| ClipdexError::output(path, e))?;
    std::fs::write(path, content).map_err(|e| ClipdexError::output(path, e))
}
