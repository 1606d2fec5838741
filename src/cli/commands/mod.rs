//! CLI command implementations.

mod chunk;
mod config;
mod fetch;
mod index;
mod list;
mod run;

pub use chunk::run_chunk;
pub use config::run_config;
pub use fetch::run_fetch;
pub use index::run_index;
pub use list::run_list;
pub use run::run_pipeline;

use crate::config::Settings;
use std::path::PathBuf;

/// Use the path given on the command line, or fall back to the configured one.
fn path_or(flag: Option<&str>, configured: PathBuf) -> PathBuf {
    flag.map(Settings::expand_path).unwrap_or(configured)
}

/// Playlists given on the command line replace the configured list.
fn playlists_or(flags: &[String], settings: &Settings) -> Vec<String> {
    if flags.is_empty() {
        settings.youtube.playlists.clone()
    } else {
        flags.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let mut settings = Settings::default();
        settings.youtube.playlists = vec!["configured".to_string()];

        assert_eq!(playlists_or(&[], &settings), vec!["configured".to_string()]);
        assert_eq!(
            playlists_or(&["flag".to_string()], &settings),
            vec!["flag".to_string()]
        );

        let configured = PathBuf::from("/data/chunks.json");
        assert_eq!(path_or(None, configured.clone()), configured);
        assert_eq!(
            path_or(Some("/tmp/out.json"), configured),
            PathBuf::from("/tmp/out.json")
        );
    }
}
