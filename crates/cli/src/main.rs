use std::process::ExitCode;

use anyhow::{anyhow, Result};
use archon_core::config::{AppConfig, LogFormat};
use tracing::Level;

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let initialized = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    initialized.map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn main() -> Result<ExitCode> {
    // Commands report configuration problems themselves; logging falls back to defaults.
    let (config, load_error) = archon_cli::startup_config();
    init_logging(&config)?;
    if let Some(error) = &load_error {
        tracing::warn!(
            event_name = "system.config.fallback",
            correlation_id = "bootstrap",
            error = %error,
            "configuration invalid, logging with defaults"
        );
    }

    tracing::debug!(
        event_name = "system.cli.started",
        correlation_id = "bootstrap",
        "archon cli started"
    );
    Ok(archon_cli::run())
}
