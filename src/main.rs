// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, build the logger, hand over to `run`.
// - Per-row failures only show up in the log; the exit code stays 0.

use anyhow::Context;
use asset_upload::{cli::Cli, logging, upload};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = cli.log_config(std::env::var("RUST_LOG").ok());
    let subscriber = logging::subscriber(&log_config)
        .with_context(|| format!("Failed to open log file {}", log_config.path.display()))?;

    let config = cli.upload_config();
    tracing::subscriber::with_default(subscriber, || upload::run(&config))
        .with_context(|| format!("Failed to upload {}", config.file.display()))?;
    Ok(())
}
