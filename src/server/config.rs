//! Server configuration types
//!
//! Mirrors `config/default.toml` section by section and converts each section
//! into the core crate's settings.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use switchyard_channels::SlackConfig;
use switchyard_core::{
    AgentDescriptor, AgentKind, CircuitBreakerConfig, HealthCheckConfig, InvokerConfig,
    RetryConfig, RoutingRules, SupervisorConfig, DEFAULT_MAX_TURNS,
};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub invoker: InvokerSettings,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,
    #[serde(default)]
    pub routing: RoutingRules,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub health_check: HealthCheckSettings,
    #[serde(default)]
    pub slack: SlackSettings,
}

impl AppConfig {
    /// Agent descriptors for the registry
    pub fn agent_descriptors(&self) -> Result<Vec<AgentDescriptor>> {
        self.agents.iter().map(AgentConfig::to_descriptor).collect()
    }

    /// Invoker retry and breaker policy
    pub fn invoker_config(&self) -> InvokerConfig {
        InvokerConfig {
            retry: self.invoker.retry_config(),
            breaker: self.circuit_breaker.breaker_config(),
        }
    }

    /// Supervisor settings
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            max_turns: self.session.max_turns,
            routing: self.routing.clone(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Supervisor faults tolerated before `/ping` reports unhealthy (0 = never)
    #[serde(default = "default_fault_threshold")]
    pub fault_threshold: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_fault_threshold() -> u64 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            fault_threshold: default_fault_threshold(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// One `[[agents]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: String,
    pub kind: AgentKind,
    pub endpoint: String,
    #[serde(default)]
    pub health_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_agent_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_agent_timeout_secs() -> u64 {
    30
}

impl AgentConfig {
    /// Build the registry descriptor
    pub fn to_descriptor(&self) -> Result<AgentDescriptor> {
        if self.timeout_secs == 0 {
            bail!("agent '{}': timeout_secs must be positive", self.id);
        }

        let mut descriptor = AgentDescriptor::new(self.id.as_str(), self.kind, self.endpoint.as_str())
            .with_tags(self.tags.iter().map(String::as_str))
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(url) = self.health_url.as_deref().filter(|u| !u.is_empty()) {
            descriptor = descriptor.with_health_url(url);
        }
        Ok(descriptor)
    }
}

/// `[invoker]` retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokerSettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_true")]
    pub jitter: bool,
}

fn default_max_retries() -> u32 {
    1
}
fn default_initial_backoff_ms() -> u64 {
    250
}
fn default_max_backoff_ms() -> u64 {
    5000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_true() -> bool {
    true
}

impl Default for InvokerSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl InvokerSettings {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .with_max_retries(self.max_retries)
            .with_initial_delay(Duration::from_millis(self.initial_backoff_ms))
            .with_max_delay(Duration::from_millis(self.max_backoff_ms))
            .with_backoff_multiplier(self.backoff_multiplier)
            .with_jitter(self.jitter)
    }
}

/// `[circuit_breaker]` policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_reset_timeout_secs")]
    pub reset_timeout_secs: u64,
    #[serde(default = "default_failure_window_secs")]
    pub failure_window_secs: u64,
}

fn default_failure_threshold() -> u32 {
    3
}
fn default_reset_timeout_secs() -> u64 {
    30
}
fn default_failure_window_secs() -> u64 {
    60
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_secs: default_reset_timeout_secs(),
            failure_window_secs: default_failure_window_secs(),
        }
    }
}

impl CircuitBreakerSettings {
    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new()
            .with_failure_threshold(self.failure_threshold)
            .with_reset_timeout(Duration::from_secs(self.reset_timeout_secs))
            .with_failure_window(Duration::from_secs(self.failure_window_secs))
    }
}

/// Session backend selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Redis,
}

/// `[session]` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
fn default_key_prefix() -> String {
    "switchyard:session:".to_string()
}
fn default_ttl_secs() -> u64 {
    86_400
}
fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            ttl_secs: default_ttl_secs(),
            max_turns: default_max_turns(),
        }
    }
}

/// `[health_check]` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_interval_secs() -> u64 {
    15
}
fn default_probe_timeout_secs() -> u64 {
    5
}

impl Default for HealthCheckSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl HealthCheckSettings {
    pub fn checker_config(&self) -> HealthCheckConfig {
        HealthCheckConfig {
            interval: Duration::from_secs(self.interval_secs.max(1)),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }
}

/// `[slack]` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub signing_secret: String,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_ack_budget_ms")]
    pub ack_budget_ms: u64,
    #[serde(default)]
    pub allowed_workspaces: Vec<String>,
}

fn default_ack_budget_ms() -> u64 {
    2500
}

impl Default for SlackSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            signing_secret: String::new(),
            bot_token: String::new(),
            ack_budget_ms: default_ack_budget_ms(),
            allowed_workspaces: Vec::new(),
        }
    }
}

impl SlackSettings {
    /// Adapter configuration, `None` when disabled
    pub fn adapter_config(&self) -> Result<Option<SlackConfig>> {
        if !self.enabled {
            return Ok(None);
        }
        if self.signing_secret.is_empty() {
            return Err(anyhow::anyhow!("slack.signing_secret is required"))
                .context("Slack adapter enabled without a signing secret");
        }
        Ok(Some(
            SlackConfig::new(&self.signing_secret, &self.bot_token)
                .with_allowed_workspaces(self.allowed_workspaces.clone())
                .with_ack_budget(Duration::from_millis(self.ack_budget_ms)),
        ))
    }
}
