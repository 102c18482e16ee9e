use super::{assess, AgentDescriptor, AgentHealth, AgentId, ProbeResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Concurrent agent registry
///
/// Each entry is an `Arc<AgentDescriptor>` replaced as a whole, so readers
/// never see a half-updated descriptor.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: DashMap<AgentId, Arc<AgentDescriptor>>,
}

impl AgentRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from descriptors (later duplicates win)
    #[must_use]
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = AgentDescriptor>) -> Self {
        let registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor);
        }
        registry
    }

    /// Add or overwrite an agent, returning the previous descriptor
    pub fn register(&self, descriptor: AgentDescriptor) -> Option<Arc<AgentDescriptor>> {
        info!(
            agent = %descriptor.id,
            kind = %descriptor.kind,
            endpoint = %descriptor.endpoint,
            "Registered agent"
        );
        self.agents.insert(descriptor.id.clone(), Arc::new(descriptor))
    }

    /// Look up an agent
    #[must_use]
    pub fn get(&self, id: &AgentId) -> Option<Arc<AgentDescriptor>> {
        self.agents.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Replace an existing agent's descriptor; returns `false` for unknown ids
    pub fn replace(&self, descriptor: AgentDescriptor) -> bool {
        match self.agents.get_mut(&descriptor.id) {
            Some(mut entry) => {
                *entry = Arc::new(descriptor);
                true
            }
            None => false,
        }
    }

    /// Set an agent's health, returning the previous value if it changed
    pub fn set_health(&self, id: &AgentId, health: AgentHealth) -> Option<AgentHealth> {
        self.update(id, |current| {
            if current.health == health {
                return None;
            }
            Some(AgentDescriptor {
                health,
                ..current.clone()
            })
        })
    }

    /// Record a completed health probe
    ///
    /// The probe is assessed against the entry as it is now, not as it was
    /// when the probe started, so a concurrent `set_health` is not lost.
    /// Returns `(previous, next)` when the health changed.
    pub fn mark_checked(
        &self,
        id: &AgentId,
        probe: &ProbeResult,
        at: DateTime<Utc>,
    ) -> Option<(AgentHealth, AgentHealth)> {
        let mut assessed = None;
        let previous = self.update(id, |current| {
            let health = assess(current.health, probe);
            assessed = Some(health);
            Some(AgentDescriptor {
                health,
                last_checked_at: Some(at),
                ..current.clone()
            })
        })?;
        let next = assessed?;
        (previous != next).then_some((previous, next))
    }

    // Applies `f` under the entry lock; returns the previous health when a
    // new descriptor was installed.
    fn update<F>(&self, id: &AgentId, f: F) -> Option<AgentHealth>
    where
        F: FnOnce(&AgentDescriptor) -> Option<AgentDescriptor>,
    {
        let mut entry = self.agents.get_mut(id)?;
        let previous = entry.health;
        let next = f(entry.value().as_ref())?;
        if next.health != previous {
            debug!(agent = %id, from = %previous, to = %next.health, "Agent health changed");
        }
        *entry = Arc::new(next);
        Some(previous)
    }

    /// Immutable view of every agent, sorted by id
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut agents: Vec<Arc<AgentDescriptor>> = self
            .agents
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        RegistrySnapshot { agents }
    }

    /// Number of registered agents
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Point-in-time copy of the registry, sorted by agent id
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    agents: Vec<Arc<AgentDescriptor>>,
}

impl RegistrySnapshot {
    /// Iterate descriptors in id order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<AgentDescriptor>> {
        self.agents.iter()
    }

    /// Find an agent by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<AgentDescriptor>> {
        self.agents
            .binary_search_by(|a| a.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.agents[i])
    }

    /// Number of agents
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the snapshot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl FromIterator<AgentDescriptor> for RegistrySnapshot {
    fn from_iter<T: IntoIterator<Item = AgentDescriptor>>(iter: T) -> Self {
        let mut agents: Vec<Arc<AgentDescriptor>> = iter.into_iter().map(Arc::new).collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        agents.dedup_by(|a, b| a.id == b.id);
        Self { agents }
    }
}
