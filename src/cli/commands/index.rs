//! Index command implementation.

use super::path_or;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(input: Option<&str>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Index, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let input = path_or(input, settings.chunks_path());
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Generating embeddings and indexing...");
    let result = orchestrator.index_file(&input).await;
    spinner.finish_and_clear();

    match result {
        Ok(count) => {
            let total = orchestrator.vector_store().document_count().await?;
            Output::success(&format!("Indexed {} chunks", count));
            Output::kv("Documents in store", &total.to_string());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            Err(e.into())
        }
    }
}
