//! Run command implementation: fetch, chunk and index back to back.

use super::playlists_or;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the full pipeline.
pub async fn run_pipeline(playlists: &[String], window: Option<f64>, settings: Settings) -> Result<()> {
    for operation in [Operation::Fetch, Operation::Index] {
        if let Err(e) = preflight::check(operation, &settings) {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    }

    let playlists = playlists_or(playlists, &settings);
    let window = window.unwrap_or(settings.chunking.window_seconds);
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching, chunking and indexing...");
    let result = orchestrator.run(&playlists, window).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            Output::success(&format!(
                "Indexed {} chunks from {} videos",
                result.chunks_indexed, result.videos_processed
            ));
            Output::kv("Fragments", &result.fragments.to_string());
            Output::kv("Chunks", &result.chunks_created.to_string());
            Output::kv(
                "Without transcript",
                &result.videos_without_transcript.to_string(),
            );
            if result.errors_logged > 0 {
                Output::warning(&format!(
                    "{} errors logged to {}",
                    result.errors_logged,
                    orchestrator.settings().error_log_path().display()
                ));
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Pipeline failed: {}", e));
            Err(e.into())
        }
    }
}
