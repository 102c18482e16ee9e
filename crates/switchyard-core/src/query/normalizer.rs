use super::{ChatPlatform, Query, QuerySource};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Raw inbound payload, one variant per trigger source
#[derive(Debug, Clone)]
pub enum Inbound {
    /// Generic JSON body from the HTTP API
    Api(Value),
    /// Message already parsed by a chat adapter
    Chat(ChatMessage),
}

/// Platform-neutral chat message produced by a channel adapter
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Originating platform
    pub platform: ChatPlatform,
    /// Workspace / team id
    pub workspace: String,
    /// Channel or conversation id
    pub conversation: String,
    /// Thread the reply belongs to (root message timestamp on Slack)
    pub thread: String,
    /// Sender id
    pub user: Option<String>,
    /// Message text with mentions stripped
    pub text: String,
    /// Extra adapter-specific fields, folded into metadata
    pub extra: Map<String, Value>,
    /// How long the platform lets us take before acknowledging
    pub latency_budget: Option<Duration>,
}

/// Reduce any inbound payload to a [`Query`], or fail with `InvalidRequest`
pub fn normalize(inbound: Inbound) -> Result<Query> {
    match inbound {
        Inbound::Api(body) => normalize_api(body),
        Inbound::Chat(message) => normalize_chat(message),
    }
}

/// Stable session id for a chat thread
///
/// `"<platform>-"` followed by the first 32 hex chars of
/// `sha256(platform|workspace|conversation|thread)`.
#[must_use]
pub fn derive_session_id(
    platform: ChatPlatform,
    workspace: &str,
    conversation: &str,
    thread: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(platform.as_str().as_bytes());
    for part in [workspace, conversation, thread] {
        hasher.update(b"|");
        hasher.update(part.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    format!("{}-{}", platform.as_str(), &digest[..32])
}

fn normalize_api(body: Value) -> Result<Query> {
    let Value::Object(mut fields) = body else {
        return Err(Error::invalid("not_an_object"));
    };

    let query_text = take_string(&mut fields, "query")?;
    let prompt_text = take_string(&mut fields, "prompt")?;
    let text = [query_text, prompt_text]
        .into_iter()
        .flatten()
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
        .ok_or_else(|| Error::invalid("empty_text"))?;

    let session_id = take_string(&mut fields, "session_id")?.and_then(non_blank);
    let agent_preference = take_string(&mut fields, "agent_preference")?.and_then(non_blank);
    let context = take_object(&mut fields, "context")?.unwrap_or_default();
    let mut metadata = take_object(&mut fields, "metadata")?.unwrap_or_default();

    // Known fields were taken above; explicit metadata keys take precedence
    for (key, value) in fields {
        metadata.entry(key).or_insert(value);
    }

    Ok(Query {
        text,
        session_id,
        context,
        agent_preference,
        metadata,
        source: QuerySource::Api,
        latency_budget: None,
    })
}

fn normalize_chat(message: ChatMessage) -> Result<Query> {
    let text = message.text.trim().to_string();
    if text.is_empty() {
        return Err(Error::invalid("empty_text"));
    }

    let session_id = derive_session_id(
        message.platform,
        &message.workspace,
        &message.conversation,
        &message.thread,
    );

    let mut metadata = message.extra;
    metadata.insert("platform".into(), message.platform.as_str().into());
    metadata.insert("workspace".into(), message.workspace.into());
    metadata.insert("channel".into(), message.conversation.into());
    metadata.insert("thread".into(), message.thread.into());
    if let Some(user) = message.user {
        metadata.insert("user".into(), user.into());
    }

    Ok(Query {
        text,
        session_id: Some(session_id),
        context: Map::new(),
        agent_preference: None,
        metadata,
        source: QuerySource::Chat(message.platform),
        latency_budget: message.latency_budget,
    })
}

fn take_string(fields: &mut Map<String, Value>, name: &str) -> Result<Option<String>> {
    match fields.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(Error::invalid(format!("invalid_field:{name}"))),
    }
}

fn take_object(fields: &mut Map<String, Value>, name: &str) -> Result<Option<Map<String, Value>>> {
    match fields.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(Error::invalid(format!("invalid_field:{name}"))),
    }
}

pub(crate) fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
