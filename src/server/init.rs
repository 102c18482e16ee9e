//! Server initialization and main run loop

use super::background_tasks::{start_health_checker, start_session_cleanup};
use super::config::{AppConfig, SessionBackend};
use super::state::AppState;
use super::validation::{validate_config, validate_production_config};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use switchyard_channels::SlackAdapter;
use switchyard_core::{
    wait_for_shutdown_signal, AgentRegistry, HttpTransport, Invoker, MemoryStore, RedisStore,
    SessionStore, ShutdownController, Supervisor,
};
use tracing::{info, warn};

const AGENT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry built from the `[[agents]]` section
pub fn init_registry(config: &AppConfig) -> Result<Arc<AgentRegistry>> {
    let descriptors = config.agent_descriptors()?;
    Ok(Arc::new(AgentRegistry::from_descriptors(descriptors)))
}

/// Session store selected by `[session].backend`
pub fn init_session_store(config: &AppConfig) -> Arc<dyn SessionStore> {
    let ttl = Duration::from_secs(config.session.ttl_secs);

    match config.session.backend {
        SessionBackend::Memory => Arc::new(MemoryStore::new(ttl)),
        SessionBackend::Redis => match RedisStore::with_options(
            &config.session.redis_url,
            &config.session.key_prefix,
            config.session.ttl_secs,
        ) {
            Ok(store) => {
                info!("Redis session store initialized");
                Arc::new(store)
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, using in-memory session store");
                Arc::new(MemoryStore::new(ttl))
            }
        },
    }
}

/// Wire registry, invoker, store and supervisor together
pub fn build_supervisor(
    config: &AppConfig,
    registry: Arc<AgentRegistry>,
    store: Arc<dyn SessionStore>,
) -> Result<Supervisor> {
    let transport =
        HttpTransport::new(AGENT_CONNECT_TIMEOUT).context("Failed to build agent transport")?;
    let invoker = Invoker::new(Arc::new(transport), registry.clone(), config.invoker_config());
    Ok(Supervisor::new(
        registry,
        invoker,
        store,
        config.supervisor_config(),
    ))
}

/// Run the server
pub async fn run(config: AppConfig) -> Result<()> {
    info!("Starting Switchyard v{}", env!("CARGO_PKG_VERSION"));

    validate_config(&config).context("Invalid configuration")?;
    validate_production_config(&config);

    let registry = init_registry(&config)?;
    info!(agents = registry.len(), "Agent registry initialized");

    let store = init_session_store(&config);
    info!(backend = store.backend_name(), "Session store initialized");

    let supervisor = Arc::new(build_supervisor(&config, registry.clone(), store.clone())?);

    let slack = config
        .slack
        .adapter_config()?
        .map(|c| Arc::new(SlackAdapter::new(c)));
    if slack.is_some() {
        info!("Slack webhook enabled at /api/v1/webhooks/slack");
    }

    let shutdown_controller = ShutdownController::new();

    start_health_checker(&config, &registry, &shutdown_controller);
    start_session_cleanup(&store, &shutdown_controller);

    let state = AppState::new(supervisor, shutdown_controller.clone())
        .with_slack(slack)
        .with_fault_threshold(config.server.fault_threshold);
    let app = crate::api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("HTTP server error")?;

    // Background loops stop here; chat replies still in flight get the drain timeout
    shutdown_controller.shutdown().await;
    info!("Switchyard stopped");
    Ok(())
}
