use super::*;
use crate::error::Error;
use serde_json::json;
use sha2::{Digest, Sha256};

fn reason(err: Error) -> String {
    match err {
        Error::InvalidRequest { reason } => reason,
        other => panic!("expected InvalidRequest, got {other:?}"),
    }
}

fn slack_message(text: &str, thread: &str) -> ChatMessage {
    ChatMessage {
        platform: ChatPlatform::Slack,
        workspace: "T0001".to_string(),
        conversation: "C0001".to_string(),
        thread: thread.to_string(),
        user: Some("U0001".to_string()),
        text: text.to_string(),
        extra: Map::new(),
        latency_budget: Some(Duration::from_millis(2500)),
    }
}

#[test]
fn test_query_wins_over_prompt() {
    let q = normalize(Inbound::Api(json!({"query": "A", "prompt": "B"}))).unwrap();
    assert_eq!(q.text, "A");
    assert_eq!(q.source, QuerySource::Api);
}

#[test]
fn test_prompt_is_accepted_alias() {
    let q = normalize(Inbound::Api(json!({"prompt": "What is revenue?"}))).unwrap();
    assert_eq!(q.text, "What is revenue?");
}

#[test]
fn test_blank_query_falls_through_to_prompt() {
    let q = normalize(Inbound::Api(json!({"query": "   ", "prompt": "B"}))).unwrap();
    assert_eq!(q.text, "B");
}

#[test]
fn test_whitespace_text_is_rejected() {
    let err = normalize(Inbound::Api(json!({"query": "   "}))).unwrap_err();
    assert_eq!(reason(err), "empty_text");

    let err = normalize(Inbound::Api(json!({"session_id": "s-1"}))).unwrap_err();
    assert_eq!(reason(err), "empty_text");
}

#[test]
fn test_non_object_body_is_rejected() {
    let err = normalize(Inbound::Api(json!(["query"]))).unwrap_err();
    assert_eq!(reason(err), "not_an_object");
}

#[test]
fn test_wrongly_typed_field_is_rejected() {
    let err = normalize(Inbound::Api(json!({"query": "hi", "context": "finance"}))).unwrap_err();
    assert_eq!(reason(err), "invalid_field:context");

    let err = normalize(Inbound::Api(json!({"query": 42}))).unwrap_err();
    assert_eq!(reason(err), "invalid_field:query");
}

#[test]
fn test_optional_fields_are_carried() {
    let q = normalize(Inbound::Api(json!({
        "query": "Top segments?",
        "session_id": "s-42",
        "context": {"domain": "market_segment"},
        "agent_preference": "analytics",
        "metadata": {"request_id": "r-1"}
    })))
    .unwrap();

    assert_eq!(q.session_id.as_deref(), Some("s-42"));
    assert_eq!(q.agent_preference.as_deref(), Some("analytics"));
    assert_eq!(q.context["domain"], "market_segment");
    assert_eq!(q.metadata["request_id"], "r-1");
    assert!(q.latency_budget.is_none());
}

#[test]
fn test_blank_optional_strings_are_absent() {
    let q = normalize(Inbound::Api(json!({
        "query": "hi",
        "session_id": " ",
        "agent_preference": "",
        "context": null
    })))
    .unwrap();

    assert!(q.session_id.is_none());
    assert!(q.agent_preference.is_none());
    assert!(q.context.is_empty());
}

#[test]
fn test_unknown_fields_fold_into_metadata() {
    let q = normalize(Inbound::Api(json!({
        "query": "hi",
        "trace": "abc",
        "tenant": "acme",
        "metadata": {"tenant": "explicit"}
    })))
    .unwrap();

    assert_eq!(q.metadata["trace"], "abc");
    assert_eq!(q.metadata["tenant"], "explicit");
    assert!(!q.metadata.contains_key("query"));
}

#[test]
fn test_chat_message_normalizes() {
    let q = normalize(Inbound::Chat(slack_message("  how did Q3 go?  ", "1700000000.000100"))).unwrap();

    assert_eq!(q.text, "how did Q3 go?");
    assert_eq!(q.source, QuerySource::Chat(ChatPlatform::Slack));
    assert_eq!(q.metadata["platform"], "slack");
    assert_eq!(q.metadata["channel"], "C0001");
    assert_eq!(q.metadata["thread"], "1700000000.000100");
    assert_eq!(q.metadata["user"], "U0001");
    assert_eq!(q.latency_budget, Some(Duration::from_millis(2500)));

    let session_id = q.session_id.unwrap();
    assert!(session_id.starts_with("slack-"));
    assert_eq!(session_id.len(), "slack-".len() + 32);
}

#[test]
fn test_chat_session_is_stable_per_thread() {
    let a = normalize(Inbound::Chat(slack_message("first", "1.0"))).unwrap();
    let b = normalize(Inbound::Chat(slack_message("second", "1.0"))).unwrap();
    let c = normalize(Inbound::Chat(slack_message("other thread", "2.0"))).unwrap();

    assert_eq!(a.session_id, b.session_id);
    assert_ne!(a.session_id, c.session_id);
}

#[test]
fn test_empty_chat_text_is_rejected() {
    let err = normalize(Inbound::Chat(slack_message(" ", "1.0"))).unwrap_err();
    assert_eq!(reason(err), "empty_text");
}

#[test]
fn test_derive_session_id_matches_digest() {
    let expected = {
        let digest = hex::encode(Sha256::digest(b"slack|T1|C1|42.0"));
        format!("slack-{}", &digest[..32])
    };
    assert_eq!(derive_session_id(ChatPlatform::Slack, "T1", "C1", "42.0"), expected);
}

#[test]
fn test_query_builder() {
    let q = Query::new("hello")
        .with_session("s-1")
        .with_context("domain", "finance")
        .with_preference("general")
        .with_metadata("k", "v")
        .with_latency_budget(Duration::from_secs(2));

    assert_eq!(q.session_id.as_deref(), Some("s-1"));
    assert_eq!(q.context["domain"], "finance");
    assert_eq!(q.agent_preference.as_deref(), Some("general"));
    assert_eq!(q.metadata["k"], "v");
    assert_eq!(q.source.as_str(), "api");
}
