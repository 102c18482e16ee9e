use super::*;
use crate::query::Query;
use crate::registry::{AgentDescriptor, AgentHealth, AgentKind, RegistrySnapshot};
use serde_json::json;
use std::time::Duration;

fn analytics(health: AgentHealth) -> AgentDescriptor {
    AgentDescriptor::new("analytics", AgentKind::Analytics, "http://analytics/query")
        .with_tags(["analytics", "sql"])
        .with_health(health)
}

fn general(health: AgentHealth) -> AgentDescriptor {
    AgentDescriptor::new("general", AgentKind::Reasoning, "http://general/invocations")
        .with_tags(["general"])
        .with_health(health)
}

fn rules() -> RoutingRules {
    RoutingRules::default().with_domain("market_segment", ["analytics"])
}

fn ids(candidates: &[crate::registry::AgentId]) -> Vec<&str> {
    candidates.iter().map(|id| id.as_str()).collect()
}

fn deals_query() -> Query {
    Query::new("What are the top 3 deals this quarter?")
        .with_session("s-1")
        .with_context("domain", "market_segment")
}

#[test]
fn test_domain_match_ranks_analytics_first() {
    let snapshot: RegistrySnapshot = [
        general(AgentHealth::Healthy),
        analytics(AgentHealth::Healthy),
    ]
    .into_iter()
    .collect();

    let candidates = select(&deals_query(), &snapshot, &rules());
    assert_eq!(ids(&candidates), vec!["analytics", "general"]);
}

#[test]
fn test_unreachable_agent_is_excluded() {
    let snapshot: RegistrySnapshot = [
        general(AgentHealth::Healthy),
        analytics(AgentHealth::Unreachable),
    ]
    .into_iter()
    .collect();

    let candidates = select(&deals_query(), &snapshot, &rules());
    assert_eq!(ids(&candidates), vec!["general"]);
}

#[test]
fn test_all_unreachable_returns_everyone() {
    let snapshot: RegistrySnapshot = [
        general(AgentHealth::Unreachable),
        analytics(AgentHealth::Unreachable),
    ]
    .into_iter()
    .collect();

    let candidates = select(&deals_query(), &snapshot, &rules());
    assert_eq!(ids(&candidates), vec!["analytics", "general"]);
}

#[test]
fn test_empty_registry_yields_no_candidates() {
    let snapshot = RegistrySnapshot::default();
    assert!(select(&deals_query(), &snapshot, &rules()).is_empty());
}

#[test]
fn test_preferred_agent_goes_first() {
    let snapshot: RegistrySnapshot = [
        general(AgentHealth::Healthy),
        analytics(AgentHealth::Healthy),
    ]
    .into_iter()
    .collect();

    let query = deals_query().with_preference("general");
    let candidates = select(&query, &snapshot, &rules());
    assert_eq!(ids(&candidates), vec!["general", "analytics"]);
}

#[test]
fn test_unreachable_preference_is_ignored() {
    let snapshot: RegistrySnapshot = [
        general(AgentHealth::Healthy),
        analytics(AgentHealth::Unreachable),
    ]
    .into_iter()
    .collect();

    let query = Query::new("hi").with_preference("analytics");
    let candidates = select(&query, &snapshot, &rules());
    assert_eq!(ids(&candidates), vec!["general"]);
}

#[test]
fn test_preference_as_capability_tag() {
    let snapshot: RegistrySnapshot = [
        general(AgentHealth::Healthy),
        analytics(AgentHealth::Healthy),
    ]
    .into_iter()
    .collect();

    let query = Query::new("run a query").with_preference("sql");
    let candidates = select(&query, &snapshot, &RoutingRules::default());
    assert_eq!(ids(&candidates), vec!["analytics", "general"]);
}

#[test]
fn test_healthy_ranks_before_degraded() {
    let snapshot: RegistrySnapshot = [
        analytics(AgentHealth::Degraded),
        general(AgentHealth::Healthy),
    ]
    .into_iter()
    .collect();

    // No hints: overlap ties at zero, so health decides
    let candidates = select(&Query::new("hello"), &snapshot, &rules());
    assert_eq!(ids(&candidates), vec!["general", "analytics"]);
}

#[test]
fn test_overlap_outranks_health() {
    let snapshot: RegistrySnapshot = [
        analytics(AgentHealth::Degraded),
        general(AgentHealth::Healthy),
    ]
    .into_iter()
    .collect();

    let candidates = select(&deals_query(), &snapshot, &rules());
    assert_eq!(ids(&candidates), vec!["analytics", "general"]);
}

#[test]
fn test_latency_budget_prefers_fitting_agents() {
    let fast = AgentDescriptor::new("zeta-fast", AgentKind::Reasoning, "http://fast")
        .with_timeout(Duration::from_secs(2));
    let slow = AgentDescriptor::new("alpha-slow", AgentKind::Reasoning, "http://slow")
        .with_timeout(Duration::from_secs(30));
    let snapshot: RegistrySnapshot = [fast, slow].into_iter().collect();

    let query = Query::new("hi").with_latency_budget(Duration::from_millis(2500));
    assert_eq!(
        ids(&select(&query, &snapshot, &rules())),
        vec!["zeta-fast", "alpha-slow"]
    );

    // An explicit preference disables the budget key
    let query = query.with_preference("unknown-tag");
    assert_eq!(
        ids(&select(&query, &snapshot, &rules())),
        vec!["alpha-slow", "zeta-fast"]
    );
}

#[test]
fn test_hint_tags_from_context() {
    let query = Query::new("hi")
        .with_context("domain", json!(["market_segment", "finance"]))
        .with_context("capabilities", json!(["sql", 3]));

    let hints = hint_tags(&query, &rules());
    let hints: Vec<&str> = hints.iter().map(String::as_str).collect();
    assert_eq!(hints, vec!["analytics", "finance", "market_segment", "sql"]);
}

#[test]
fn test_select_is_deterministic() {
    let snapshot: RegistrySnapshot = [
        general(AgentHealth::Healthy),
        analytics(AgentHealth::Degraded),
        AgentDescriptor::new("vision", AgentKind::Reasoning, "http://vision")
            .with_tags(["images"]),
    ]
    .into_iter()
    .collect();

    let query = deals_query();
    let first = select(&query, &snapshot, &rules());
    for _ in 0..10 {
        assert_eq!(select(&query, &snapshot, &rules()), first);
    }
}
