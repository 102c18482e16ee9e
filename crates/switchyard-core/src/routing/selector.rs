use crate::query::Query;
use crate::registry::{AgentDescriptor, AgentHealth, AgentId, RegistrySnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Static routing knowledge layered over the registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingRules {
    /// Extra capability tags implied by a `context.domain` value,
    /// e.g. `market_segment -> [analytics]`
    #[serde(default)]
    pub domain_tags: BTreeMap<String, BTreeSet<String>>,
}

impl RoutingRules {
    /// Map a domain to additional tags
    #[must_use]
    pub fn with_domain<I, S>(mut self, domain: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domain_tags
            .entry(domain.into())
            .or_default()
            .extend(tags.into_iter().map(Into::into));
        self
    }
}

fn strings(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Capability tags the query hints at through its context
///
/// Each `context.domain` value, the tags `rules` map it to, and each
/// `context.capabilities` entry.
#[must_use]
pub fn hint_tags(query: &Query, rules: &RoutingRules) -> BTreeSet<String> {
    let mut hints = BTreeSet::new();

    for domain in strings(query.context.get("domain")) {
        hints.insert(domain.to_string());
        if let Some(tags) = rules.domain_tags.get(domain) {
            hints.extend(tags.iter().cloned());
        }
    }
    for capability in strings(query.context.get("capabilities")) {
        hints.insert(capability.to_string());
    }

    hints
}

/// Ordered candidate list for `query`
///
/// Pure and deterministic: no I/O, no registry mutation, no randomness.
/// An explicitly preferred, reachable agent comes first. The rest are ranked
/// by tag overlap, then health, then (with no preference and a latency
/// budget) whether their timeout fits the budget, then id. Unreachable agents
/// are dropped unless every agent is unreachable.
#[must_use]
pub fn select(query: &Query, snapshot: &RegistrySnapshot, rules: &RoutingRules) -> Vec<AgentId> {
    let mut hints = hint_tags(query, rules);

    let preference = query.agent_preference.as_deref();
    let preferred = preference.and_then(|p| snapshot.get(p));
    if let (Some(tag), None) = (preference, preferred) {
        hints.insert(tag.to_string());
    }
    let preferred = preferred.filter(|a| a.health != AgentHealth::Unreachable);

    let all_unreachable = snapshot
        .iter()
        .all(|a| a.health == AgentHealth::Unreachable);

    let budget = match preference {
        None => query.latency_budget,
        Some(_) => None,
    };

    let mut ranked: Vec<&Arc<AgentDescriptor>> = snapshot
        .iter()
        .filter(|a| all_unreachable || a.health != AgentHealth::Unreachable)
        .filter(|a| preferred.is_none_or(|p| p.id != a.id))
        .collect();

    ranked.sort_by_key(|a| {
        let misses_budget = budget.is_some_and(|b| a.timeout > b);
        (
            Reverse(a.tag_overlap(&hints)),
            a.health.rank(),
            misses_budget,
            a.id.clone(),
        )
    });

    preferred
        .into_iter()
        .chain(ranked)
        .map(|a| a.id.clone())
        .collect()
}
