//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{ClipdexError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching needs yt-dlp and a YouTube API key.
    Fetch,
    /// Chunking works on local files only.
    Chunk,
    /// Indexing needs an OpenAI API key.
    Index,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Fetch => {
            check_youtube_key(settings)?;
            check_tool("yt-dlp")?;
        }
        Operation::Chunk => {}
        Operation::Index => {
            check_openai_key()?;
        }
    }
    Ok(())
}

fn check_youtube_key(settings: &Settings) -> Result<()> {
    match settings.youtube.resolved_api_key() {
        Some(_) => Ok(()),
        None => Err(ClipdexError::Config(
            "YouTube API key not set. Set YOUTUBE_API_KEY or youtube.api_key in the config file"
                .to_string(),
        )),
    }
}

/// Check if OpenAI API key is configured.
fn check_openai_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(ClipdexError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(ClipdexError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(ClipdexError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ClipdexError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(ClipdexError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_chunk_no_requirements() {
        assert!(check(Operation::Chunk, &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_tool() {
        let result = check_tool("clipdex-no-such-tool");
        assert!(matches!(result, Err(ClipdexError::ToolNotFound(_))));
    }
}
