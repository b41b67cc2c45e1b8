// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use jobalytics::cli::{handle_command, CompanionCli};
use jobalytics::ConfigManager;
use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CompanionCli::parse();

    // Logging comes up before the real config load, so peek at log_file here
    let log_file = ConfigManager::load(cli.config.as_deref())
        .ok()
        .and_then(|config| config.environment.log_file);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(Mutex::new(file))
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jobalytics=info")),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    handle_command(cli).await
}
