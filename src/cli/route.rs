//! Offline routing dry-run

use crate::server::config::AppConfig;
use crate::server::init_registry;
use anyhow::Result;
use serde_json::Value;
use switchyard_core::routing::hint_tags;
use switchyard_core::{select, AgentId, Query};

pub struct RouteArgs {
    pub text: String,
    pub domain: Option<String>,
    pub prefer: Option<String>,
    pub capabilities: Vec<String>,
}

impl RouteArgs {
    fn to_query(&self) -> Query {
        let mut query = Query::new(self.text.as_str());
        if let Some(domain) = &self.domain {
            query = query.with_context("domain", domain.as_str());
        }
        if !self.capabilities.is_empty() {
            let tags: Vec<Value> = self.capabilities.iter().map(|c| Value::from(c.as_str())).collect();
            query = query.with_context("capabilities", tags);
        }
        if let Some(prefer) = &self.prefer {
            query = query.with_preference(prefer.as_str());
        }
        query
    }
}

/// Candidate order for `args` against the configured registry
pub fn candidates(config: &AppConfig, args: &RouteArgs) -> Result<Vec<AgentId>> {
    let registry = init_registry(config)?;
    Ok(select(&args.to_query(), &registry.snapshot(), &config.routing))
}

pub fn run(config: &AppConfig, args: RouteArgs) -> Result<()> {
    let query = args.to_query();
    let hints = hint_tags(&query, &config.routing);
    let order = candidates(config, &args)?;

    println!("Query: {}", query.text);
    if !hints.is_empty() {
        println!(
            "Hint tags: {}",
            hints.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    if order.is_empty() {
        println!("No agent available (no_agent_available)");
        return Ok(());
    }

    println!("Candidates:");
    for (rank, id) in order.iter().enumerate() {
        let tags = config
            .agents
            .iter()
            .find(|a| a.id == id.as_str())
            .map(|a| a.tags.join(", "))
            .unwrap_or_default();
        println!("  {}. {id} [{tags}]", rank + 1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::load_from_str;

    fn args(domain: Option<&str>, prefer: Option<&str>) -> RouteArgs {
        RouteArgs {
            text: "What are the top 3 deals this quarter?".to_string(),
            domain: domain.map(str::to_string),
            prefer: prefer.map(str::to_string),
            capabilities: Vec::new(),
        }
    }

    fn ids(order: Vec<AgentId>) -> Vec<String> {
        order.into_iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_domain_routes_to_analytics_first() {
        let config = load_from_str("").unwrap();
        let order = candidates(&config, &args(Some("market_segment"), None)).unwrap();
        assert_eq!(ids(order), vec!["analytics", "general"]);
    }

    #[test]
    fn test_preference_wins() {
        let config = load_from_str("").unwrap();
        let order = candidates(&config, &args(Some("market_segment"), Some("general"))).unwrap();
        assert_eq!(ids(order), vec!["general", "analytics"]);
    }

    #[test]
    fn test_capability_hint() {
        let config = load_from_str("").unwrap();
        let mut route = args(None, None);
        route.capabilities = vec!["reasoning".to_string()];
        let order = candidates(&config, &route).unwrap();
        assert_eq!(ids(order)[0], "general");
    }
}
