use super::*;
use crate::server::AppState;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::Json;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use switchyard_channels::{SlackAdapter, SlackConfig};
use switchyard_core::utils::MetricsRegistry;
use switchyard_core::{
    AgentDescriptor, AgentKind, AgentRegistry, AgentTransport, CoreMetrics, Invoker,
    InvokerConfig, MemoryStore, RetryConfig, RoutingRules, ShutdownController, Supervisor,
    SupervisorConfig, TransportError,
};
use tower::ServiceExt;

const SECRET: &str = "test-signing-secret";

/// Canned replies per agent id; the agent named `panic` panics
#[derive(Default)]
struct CannedTransport {
    replies: HashMap<&'static str, Result<Value, TransportError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl CannedTransport {
    fn reply(mut self, agent: &'static str, reply: Result<Value, TransportError>) -> Self {
        self.replies.insert(agent, reply);
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl AgentTransport for CannedTransport {
    async fn send(&self, agent: &AgentDescriptor, _body: &Value) -> Result<Value, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if agent.id.as_str() == "panic" {
            panic!("agent transport blew up");
        }
        self.replies
            .get(agent.id.as_str())
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Transport("no reply".into())))
    }
}

fn default_agents() -> Vec<AgentDescriptor> {
    vec![
        AgentDescriptor::new("general", AgentKind::Reasoning, "http://general/invocations")
            .with_tags(["general"]),
        AgentDescriptor::new("analytics", AgentKind::Analytics, "http://analytics/query")
            .with_tags(["analytics"]),
    ]
}

fn state_with(agents: Vec<AgentDescriptor>, transport: Arc<CannedTransport>) -> AppState {
    let registry = Arc::new(AgentRegistry::from_descriptors(agents));
    let invoker = Invoker::new(
        transport,
        registry.clone(),
        InvokerConfig {
            retry: RetryConfig::new().with_max_retries(0),
            ..InvokerConfig::default()
        },
    );
    let metrics = MetricsRegistry::new();
    let supervisor = Supervisor::new(
        registry,
        invoker,
        Arc::new(MemoryStore::default()),
        SupervisorConfig {
            routing: RoutingRules::default().with_domain("market_segment", ["analytics"]),
            ..SupervisorConfig::default()
        },
    )
    .with_metrics(CoreMetrics::new(&metrics));

    AppState::new(Arc::new(supervisor), ShutdownController::new()).with_metrics(metrics)
}

fn happy_transport() -> Arc<CannedTransport> {
    Arc::new(
        CannedTransport::default()
            .reply("analytics", Ok(json!({"answer": "Deal A, B, C", "thread_id": "t-1"})))
            .reply("general", Ok(json!({"result": "general answer"}))),
    )
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn test_invocations_returns_envelope() {
    let app = router(state_with(default_agents(), happy_transport()));
    let body = json!({
        "query": "What are the top 3 deals this quarter?",
        "session_id": "s-1",
        "context": {"domain": "market_segment"},
        "metadata": {"request_id": "r-1"}
    });

    let (status, envelope) = post_json(app, "/invocations", &body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["answer"], "Deal A, B, C");
    assert_eq!(envelope["agent_used"], "analytics");
    assert_eq!(envelope["session_id"], "s-1");
    assert_eq!(envelope["attempts"].as_array().unwrap().len(), 1);
    assert_eq!(envelope["attempts"][0]["outcome"], "success");
    assert_eq!(envelope["metadata"]["request_id"], "r-1");
}

#[tokio::test]
async fn test_query_alias_route() {
    let app = router(state_with(default_agents(), happy_transport()));
    let (status, envelope) =
        post_json(app, "/api/v1/query", r#"{"prompt": "hello there"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert!(envelope["session_id"].as_str().is_some_and(|s| !s.is_empty()));
}

#[tokio::test]
async fn test_invalid_requests() {
    let transport = happy_transport();
    let state = state_with(default_agents(), transport.clone());

    let (status, body) = post_json(router(state.clone()), "/invocations", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid_request", "reason": "malformed_json"}));

    let (status, body) = post_json(router(state.clone()), "/invocations", r#"{"query": "   "}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "empty_text");

    let (status, _) = post_json(router(state), "/invocations", "[1, 2]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_agent_available() {
    let app = router(state_with(Vec::new(), happy_transport()));
    let (status, body) = post_json(app, "/invocations", r#"{"query": "hi"}"#).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "no_agent_available", "attempts": []}));
}

#[tokio::test]
async fn test_all_agents_failed() {
    let transport = Arc::new(
        CannedTransport::default()
            .reply(
                "general",
                Err(TransportError::Status {
                    status: 503,
                    body: "busy".into(),
                }),
            )
            .reply("analytics", Err(TransportError::Timeout)),
    );
    let app = router(state_with(default_agents(), transport));
    let (status, body) =
        post_json(app, "/invocations", r#"{"query": "hi", "session_id": "s-9"}"#).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "all_agents_failed");
    assert_eq!(body["session_id"], "s-9");
    let attempts = body["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 2);
    assert!(attempts.iter().any(|a| a["outcome"] == "timeout"));
    assert!(attempts.iter().any(|a| a["error_kind"] == "server"));
}

#[tokio::test]
async fn test_supervisor_panic_is_a_fault() {
    let agents = vec![AgentDescriptor::new("panic", AgentKind::Reasoning, "http://panic")];
    let state = state_with(agents, happy_transport()).with_fault_threshold(1);

    let (status, _) = get(router(state.clone()), "/ping").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(router(state.clone()), "/invocations", r#"{"query": "hi"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "internal"}));
    assert_eq!(state.supervisor.metrics().fault_count(), 1);

    let (status, body) = get(router(state.clone()), "/ping").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.is_empty());

    let (_, metrics) = get(router(state), "/metrics").await;
    let metrics = String::from_utf8(metrics).unwrap();
    assert!(metrics.contains("switchyard_supervisor_faults_total 1"));
}

#[tokio::test]
async fn test_ping_without_threshold_stays_up() {
    let agents = vec![AgentDescriptor::new("panic", AgentKind::Reasoning, "http://panic")];
    let state = state_with(agents, happy_transport());
    post_json(router(state.clone()), "/invocations", r#"{"query": "hi"}"#).await;

    let (status, _) = get(router(state), "/ping").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let state = state_with(default_agents(), happy_transport());

    let (status, body) = get(router(state.clone()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    post_json(
        router(state.clone()),
        "/invocations",
        r#"{"query": "deals?", "context": {"domain": "market_segment"}}"#,
    )
    .await;

    let response = router(state)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let text = String::from_utf8(
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec(),
    )
    .unwrap();
    assert!(text.contains(r#"switchyard_agent_calls_total{agent="analytics"} 1"#));
    assert!(text.contains(r#"switchyard_agent_outcomes_total{agent="analytics",outcome="success"} 1"#));
    assert!(text.contains(r#"switchyard_agent_latency_ms{agent="analytics",quantile="0.95"}"#));
}

#[tokio::test]
async fn test_agents_listing() {
    let app = router(state_with(default_agents(), happy_transport()));
    let (status, body) = get(app, "/api/v1/agents").await;
    assert_eq!(status, StatusCode::OK);

    let agents: Value = serde_json::from_slice(&body).unwrap();
    let agents = agents.as_array().unwrap();
    assert_eq!(agents.len(), 2);
    assert_eq!(agents[0]["id"], "analytics");
    assert_eq!(agents[0]["kind"], "analytics");
    assert_eq!(agents[0]["health"], "healthy");
    assert_eq!(agents[1]["tags"], json!(["general"]));
}

// --- Slack webhook ---

type Posted = Arc<Mutex<Vec<Value>>>;

async fn mock_slack_api() -> (String, Posted) {
    let posted: Posted = Arc::default();
    let sink = posted.clone();
    let app = Router::new().route(
        "/api/chat.postMessage",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(body);
                Json(json!({"ok": true, "ts": "9.9"}))
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), posted)
}

fn slack_state(api_base: &str, transport: Arc<CannedTransport>) -> AppState {
    slack_state_with_budget(api_base, transport, Duration::from_millis(500))
}

fn slack_state_with_budget(
    api_base: &str,
    transport: Arc<CannedTransport>,
    ack_budget: Duration,
) -> AppState {
    let adapter = SlackAdapter::new(
        SlackConfig::new(SECRET, "xoxb-test")
            .with_api_base(api_base)
            .with_ack_budget(ack_budget),
    );
    state_with(default_agents(), transport).with_slack(Some(Arc::new(adapter)))
}

async fn wait_for_posts(posted: &Posted, count: usize) {
    let mut waited = Duration::ZERO;
    while posted.lock().unwrap().len() < count && waited < Duration::from_secs(3) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
}

fn signed_request(body: &str, extra_header: Option<(&str, &str)>) -> Request<Body> {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        .to_string();
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(format!("v0:{ts}:{body}").as_bytes());
    let signature = format!("v0={}", hex::encode(mac.finalize().into_bytes()));

    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/slack")
        .header("content-type", "application/json")
        .header("x-slack-request-timestamp", ts)
        .header("x-slack-signature", signature);
    if let Some((name, value)) = extra_header {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn mention_body(text: &str) -> String {
    json!({
        "type": "event_callback",
        "team_id": "T1",
        "event": {
            "type": "app_mention",
            "user": "U1",
            "text": text,
            "channel": "C1",
            "ts": "1700000000.000100"
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_slack_disabled_is_not_found() {
    let app = router(state_with(default_agents(), happy_transport()));
    let (status, _) = send(app, signed_request(&mention_body("hi"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_slack_rejects_bad_signature() {
    let app = router(slack_state("http://127.0.0.1:1/api", happy_transport()));
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/slack")
        .header("x-slack-request-timestamp", "1")
        .header("x-slack-signature", "v0=00")
        .body(Body::from(mention_body("hi")))
        .unwrap();

    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_slack_url_verification() {
    let app = router(slack_state("http://127.0.0.1:1/api", happy_transport()));
    let body = json!({"type": "url_verification", "challenge": "xyz"}).to_string();

    let (status, bytes) = send(app, signed_request(&body, None)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["challenge"], "xyz");
}

#[tokio::test]
async fn test_slack_mention_is_answered_in_thread() {
    let (api_base, posted) = mock_slack_api().await;
    let transport = happy_transport();
    let app = router(slack_state(&api_base, transport.clone()));

    let (status, _) = send(
        app,
        signed_request(&mention_body("<@UBOT> what is new?"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    wait_for_posts(&posted, 1).await;
    let posted = posted.lock().unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0]["channel"], "C1");
    assert_eq!(posted[0]["thread_ts"], "1700000000.000100");
    assert_eq!(posted[0]["text"], "Deal A, B, C");
    assert!(transport.calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_slack_retry_delivery_is_dropped() {
    let transport = happy_transport();
    let app = router(slack_state("http://127.0.0.1:1/api", transport.clone()));

    let (status, _) = send(
        app,
        signed_request(&mention_body("<@UBOT> again"), Some(("x-slack-retry-num", "1"))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_slack_acknowledges_slow_answer_within_budget() {
    let (api_base, posted) = mock_slack_api().await;
    let transport = Arc::new(
        CannedTransport::default()
            .reply("analytics", Ok(json!({"answer": "Deal A, B, C"})))
            .reply("general", Ok(json!({"result": "slow answer"})))
            .with_delay(Duration::from_millis(800)),
    );
    let app = router(slack_state_with_budget(
        &api_base,
        transport,
        Duration::from_millis(100),
    ));

    let started = std::time::Instant::now();
    let (status, _) = send(
        app,
        signed_request(&mention_body("<@UBOT> what is new?"), None),
    )
    .await;
    let acked_after = started.elapsed();

    assert_eq!(status, StatusCode::OK);
    assert!(acked_after >= Duration::from_millis(100));
    assert!(acked_after < Duration::from_millis(600), "ack took {acked_after:?}");
    assert!(posted.lock().unwrap().is_empty());

    wait_for_posts(&posted, 1).await;
    let posted = posted.lock().unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0]["thread_ts"], "1700000000.000100");
    assert!(started.elapsed() >= Duration::from_millis(800));
}

#[tokio::test]
async fn test_slack_posts_failure_notice_when_all_agents_fail() {
    let (api_base, posted) = mock_slack_api().await;
    // No canned replies: every agent fails with a transport error
    let transport = Arc::new(CannedTransport::default());
    let app = router(slack_state(&api_base, transport.clone()));

    let (status, _) = send(
        app,
        signed_request(&mention_body("<@UBOT> anyone there?"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    wait_for_posts(&posted, 1).await;
    let posted = posted.lock().unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0]["channel"], "C1");
    assert_eq!(posted[0]["thread_ts"], "1700000000.000100");
    assert_eq!(
        posted[0]["text"],
        "Sorry, I couldn't get an answer. 2 agent attempt(s) failed."
    );
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}
