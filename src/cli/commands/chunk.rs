//! Chunk command implementation.

use super::path_or;
use crate::chunking::chunk_file;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the chunk command.
pub fn run_chunk(
    input: Option<&str>,
    output: Option<&str>,
    window: Option<f64>,
    settings: &Settings,
) -> Result<()> {
    let input = path_or(input, settings.fragments_path());
    let output = path_or(output, settings.chunks_path());
    let window = window.unwrap_or(settings.chunking.window_seconds);

    match chunk_file(&input, &output, window) {
        Ok(chunks) => {
            Output::success(&format!("Created {} chunks of {}s", chunks.len(), window));
            Output::kv("Output", &output.display().to_string());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Chunking failed: {}", e));
            Err(e.into())
        }
    }
}
