//! Registry snapshot endpoint

use crate::server::AppState;
use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use switchyard_core::{AgentDescriptor, AgentHealth, AgentKind};

/// One registry entry as exposed over HTTP
#[derive(Debug, Serialize)]
pub struct AgentView {
    pub id: String,
    pub kind: AgentKind,
    pub endpoint: String,
    pub tags: BTreeSet<String>,
    pub health: AgentHealth,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub timeout_ms: u64,
}

impl From<&AgentDescriptor> for AgentView {
    fn from(agent: &AgentDescriptor) -> Self {
        Self {
            id: agent.id.to_string(),
            kind: agent.kind,
            endpoint: agent.endpoint.clone(),
            tags: agent.capability_tags.clone(),
            health: agent.health,
            last_checked_at: agent.last_checked_at,
            timeout_ms: u64::try_from(agent.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

async fn list_agents(Extension(state): Extension<AppState>) -> Json<Vec<AgentView>> {
    let snapshot = state.supervisor.registry().snapshot();
    Json(snapshot.iter().map(|a| AgentView::from(a.as_ref())).collect())
}

/// Agent routes
pub fn agents_routes() -> Router {
    Router::new().route("/api/v1/agents", get(list_agents))
}
