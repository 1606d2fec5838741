//! Fetch command implementation.

use super::{path_or, playlists_or};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the fetch command.
pub async fn run_fetch(playlists: &[String], output: Option<&str>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Fetch, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let playlists = playlists_or(playlists, &settings);
    let output = path_or(output, settings.fragments_path());
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Fetching {} playlist(s)...", playlists.len()));
    let result = orchestrator.fetch(&playlists, &output).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            Output::success(&format!(
                "Saved {} fragments to {}",
                report.fragments.len(),
                output.display()
            ));
            Output::kv("Playlists", &report.playlists_processed.to_string());
            Output::kv("Videos", &report.videos_processed.to_string());
            Output::kv(
                "Without transcript",
                &report.videos_without_transcript.to_string(),
            );
            Output::kv("Duplicates skipped", &report.videos_skipped.to_string());
            if report.errors_logged > 0 {
                Output::warning(&format!(
                    "{} errors logged to {}",
                    report.errors_logged,
                    orchestrator.settings().error_log_path().display()
                ));
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Fetch failed: {}", e));
            Err(e.into())
        }
    }
}
