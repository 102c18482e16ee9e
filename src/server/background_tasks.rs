//! Background task startup functions
//!
//! Health probing and session cleanup, both stopped by the shutdown token.

use super::config::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use switchyard_core::{AgentRegistry, HealthChecker, SessionStore, ShutdownController};
use tracing::{debug, info, warn};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Start the agent health checker
pub fn start_health_checker(
    config: &AppConfig,
    registry: &Arc<AgentRegistry>,
    shutdown_controller: &ShutdownController,
) {
    if !config.health_check.enabled {
        info!("Health checker disabled by configuration");
        return;
    }

    match HealthChecker::new(registry.clone(), config.health_check.checker_config()) {
        Ok(checker) => {
            tokio::spawn(checker.run(shutdown_controller.token()));
        }
        Err(e) => warn!(error = %e, "Failed to start health checker"),
    }
}

/// Start the periodic session cleanup task
pub fn start_session_cleanup(store: &Arc<dyn SessionStore>, shutdown_controller: &ShutdownController) {
    let store = store.clone();
    let shutdown = shutdown_controller.token();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match store.cleanup_expired().await {
                        Ok(0) => debug!("No expired sessions"),
                        Ok(removed) => info!(removed, backend = store.backend_name(), "Expired sessions removed"),
                        Err(e) => warn!(error = %e, "Session cleanup failed"),
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Session cleanup task shutting down");
                    break;
                }
            }
        }
    });
}
