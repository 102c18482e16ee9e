//! Switchyard - Multi-Agent Query Supervisor
//!
//! CLI entry point for the Switchyard server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use server::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod cli;
mod server;

const DEFAULT_LOG_FILTER: &str = "switchyard=info,switchyard_core=info,switchyard_channels=info,tower_http=info";

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();
    let config = server::load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    cli::run(cli, config).await
}
