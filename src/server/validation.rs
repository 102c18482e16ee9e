//! Configuration validation
//!
//! Hard errors for configurations that cannot work, warnings for ones that
//! are risky in production.

use super::config::{AppConfig, SessionBackend};
use anyhow::{bail, Result};
use std::collections::HashSet;
use tracing::warn;

/// Reject configurations the server cannot run with
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut seen = HashSet::new();
    for agent in &config.agents {
        if agent.id.trim().is_empty() {
            bail!("agent ids must not be empty");
        }
        if !seen.insert(agent.id.as_str()) {
            bail!("duplicate agent id '{}'", agent.id);
        }
        check_url(&agent.id, "endpoint", &agent.endpoint)?;
        if let Some(url) = agent.health_url.as_deref().filter(|u| !u.is_empty()) {
            check_url(&agent.id, "health_url", url)?;
        }
        if agent.timeout_secs == 0 {
            bail!("agent '{}': timeout_secs must be positive", agent.id);
        }
    }

    if config.session.max_turns == 0 {
        bail!("session.max_turns must be positive");
    }
    if config.invoker.backoff_multiplier < 1.0 {
        bail!("invoker.backoff_multiplier must be at least 1.0");
    }
    if config.circuit_breaker.failure_threshold == 0 {
        bail!("circuit_breaker.failure_threshold must be positive");
    }
    if config.slack.enabled && config.slack.signing_secret.is_empty() {
        bail!("slack.enabled requires slack.signing_secret");
    }

    if config.agents.is_empty() {
        warn!("No agents configured; every query will fail with no_agent_available");
    }

    Ok(())
}

fn check_url(agent: &str, field: &str, value: &str) -> Result<()> {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => bail!("agent '{agent}': {field} has unsupported scheme '{}'", url.scheme()),
        Err(e) => bail!("agent '{agent}': {field} '{value}' is not a valid URL: {e}"),
    }
}

/// Warn about settings that are risky in production
pub fn validate_production_config(config: &AppConfig) {
    let is_production = std::env::var("SWITCHYARD_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false);

    if !is_production {
        return;
    }

    if config.server.host == "0.0.0.0" {
        warn!(
            "SECURITY WARNING: Server is binding to all interfaces (0.0.0.0) in production. \
             Consider binding to 127.0.0.1 and using a reverse proxy."
        );
    }

    if config.session.backend == SessionBackend::Memory {
        warn!(
            "Sessions use the in-memory store in production; \
             conversation history is lost on restart and not shared between replicas."
        );
    }

    if config.session.backend == SessionBackend::Redis
        && config.session.redis_url.starts_with("redis://")
        && !config.session.redis_url.contains('@')
    {
        warn!(
            "SECURITY WARNING: Redis connection appears to have no authentication in production. \
             Consider enabling Redis AUTH."
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::loader::load_from_str;

    #[test]
    fn test_defaults_are_valid() {
        let config = load_from_str("").unwrap();
        tokio_test::assert_ok!(validate_config(&config));
    }

    #[test]
    fn test_rejects_broken_agents() {
        let mut config = load_from_str("").unwrap();
        config.agents[1].id = "general".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate agent id"));

        let mut config = load_from_str("").unwrap();
        config.agents[0].endpoint = "not a url".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = load_from_str("").unwrap();
        config.agents[0].endpoint = "ftp://agents.local/run".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = load_from_str("").unwrap();
        config.agents[0].timeout_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = load_from_str("").unwrap();
        config.agents[0].id = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_slack_requires_secret() {
        let mut config = load_from_str("").unwrap();
        config.slack.enabled = true;
        assert!(validate_config(&config).is_err());

        config.slack.signing_secret = "secret".to_string();
        tokio_test::assert_ok!(validate_config(&config));
    }

    #[test]
    fn test_rejects_zero_limits() {
        let mut config = load_from_str("").unwrap();
        config.session.max_turns = 0;
        assert!(validate_config(&config).is_err());

        let mut config = load_from_str("").unwrap();
        config.circuit_breaker.failure_threshold = 0;
        assert!(validate_config(&config).is_err());
    }
}
