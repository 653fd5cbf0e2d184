//! yt-trimmer CLI
//!
//! Front-end for the YouTube clip creator: lists formats, requests trimmed
//! downloads, merges clip sequences and runs the HTTP relay.
//!
//! # Usage
//!
//! ```bash
//! trimmer serve --bind 127.0.0.1:3000
//! trimmer formats --url "https://youtu.be/dQw4w9WgXcQ"
//! trimmer clip --url "https://youtu.be/dQw4w9WgXcQ" --start 00:00:10 --end 00:00:40 --resolution 720p
//! trimmer merge --clip "https://youtu.be/dQw4w9WgXcQ,00:00:10,00:00:40" --clip "https://youtu.be/9bZkp7q19f0,00:01:00,00:01:20"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use yt_trimmer::cli::{commands, Cli};
use yt_trimmer::config_initialization::initialize_configuration_hierarchy;
use yt_trimmer::utils::{init_logging, LoggingConfig};

/// Main entry point for the trimmer CLI
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded =
        initialize_configuration_hierarchy(&cli).context("Failed to load configuration")?;
    init_logging(&LoggingConfig::new(
        loaded.config.log_level.clone(),
        loaded.config.log_format,
    ))
    .context("Failed to initialize logging")?;

    match &loaded.source {
        Some(path) => info!(path = %path.display(), "Loaded configuration file"),
        None => debug!("No configuration file found, using defaults"),
    }
    debug!(
        env_overrides = loaded.env_overrides,
        cli_overrides = loaded.cli_overrides,
        "Configuration resolved"
    );

    commands::execute(cli.command, &loaded.config).await
}
