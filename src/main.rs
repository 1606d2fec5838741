//! clipdex CLI entry point.

use anyhow::Result;
use clap::Parser;
use clipdex::cli::{commands, Cli, Commands};
use clipdex::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("clipdex={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Fetch { playlist, output } => {
            commands::run_fetch(playlist, output.as_deref(), settings).await?;
        }

        Commands::Chunk {
            input,
            output,
            window,
        } => {
            commands::run_chunk(input.as_deref(), output.as_deref(), *window, &settings)?;
        }

        Commands::Index { input } => {
            commands::run_index(input.as_deref(), settings).await?;
        }

        Commands::Run { playlist, window } => {
            commands::run_pipeline(playlist, *window, settings).await?;
        }

        Commands::List => {
            commands::run_list(&settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), &settings)?;
        }
    }

    Ok(())
}
