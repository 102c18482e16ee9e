//! CLI module for Switchyard
//!
//! - `serve`: run the HTTP server (default)
//! - `validate`: load and validate configuration, print the registry
//! - `route`: dry-run the agent selector against the configured registry

use crate::server::config::AppConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod route;
pub mod validate;

/// Switchyard query supervisor
#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(about = "Routes queries to backend agents and returns one answer")]
#[command(version)]
pub struct Cli {
    /// Extra configuration file layered over the defaults
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve,
    /// Validate configuration and print the agent registry
    Validate,
    /// Show which agents a query would be routed to, without calling them
    Route {
        /// Query text
        text: String,
        /// `context.domain` value
        #[arg(long)]
        domain: Option<String>,
        /// Preferred agent id or capability tag
        #[arg(long)]
        prefer: Option<String>,
        /// Extra `context.capabilities` entries
        #[arg(long = "capability", value_name = "TAG")]
        capabilities: Vec<String>,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        None | Some(Commands::Serve) => crate::server::run(config).await,
        Some(Commands::Validate) => validate::run(&config),
        Some(Commands::Route {
            text,
            domain,
            prefer,
            capabilities,
        }) => route::run(&config, route::RouteArgs {
            text,
            domain,
            prefer,
            capabilities,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["switchyard"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_route_args() {
        let cli = Cli::try_parse_from([
            "switchyard",
            "route",
            "top deals?",
            "--domain",
            "market_segment",
            "--capability",
            "sql",
            "--config",
            "prod.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));
        match cli.command {
            Some(Commands::Route {
                text,
                domain,
                prefer,
                capabilities,
            }) => {
                assert_eq!(text, "top deals?");
                assert_eq!(domain.as_deref(), Some("market_segment"));
                assert!(prefer.is_none());
                assert_eq!(capabilities, vec!["sql".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
