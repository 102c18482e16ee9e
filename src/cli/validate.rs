//! `switchyard validate`

use crate::server::config::AppConfig;
use crate::server::validate_config;
use anyhow::{Context, Result};

pub fn run(config: &AppConfig) -> Result<()> {
    validate_config(config).context("Invalid configuration")?;
    let agents = config.agent_descriptors()?;

    println!("Configuration OK");
    println!(
        "Server: {}:{} (session backend: {:?})",
        config.server.host, config.server.port, config.session.backend
    );
    println!("Agents ({}):", agents.len());
    for agent in &agents {
        println!(
            "  {:<12} {:<10} {} timeout={}s tags=[{}]",
            agent.id,
            agent.kind.as_str(),
            agent.endpoint,
            agent.timeout.as_secs(),
            agent
                .capability_tags
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if !config.routing.domain_tags.is_empty() {
        println!("Domain rules:");
        for (domain, tags) in &config.routing.domain_tags {
            println!(
                "  {domain} -> {}",
                tags.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }
    }
    Ok(())
}
