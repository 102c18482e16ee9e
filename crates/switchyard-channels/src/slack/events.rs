use super::SlackAdapter;
use crate::error::Result;
use serde::Deserialize;
use serde_json::{Map, Value};
use switchyard_core::{ChatMessage, ChatPlatform};
use tracing::debug;

/// What a webhook body asks of us
#[derive(Debug, Clone, PartialEq)]
pub enum SlackPayload {
    /// Endpoint handshake; echo the challenge back
    UrlVerification {
        /// Value to echo
        challenge: String,
    },
    /// A message that should be answered
    Message(ChatMessage),
    /// Acknowledge and drop
    Ignored(&'static str),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Envelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        team_id: String,
        event: Event,
        #[serde(default)]
        event_id: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    channel_type: Option<String>,
    ts: String,
    #[serde(default)]
    thread_ts: Option<String>,
}

/// Remove `<@U123>` user mentions and collapse whitespace
#[must_use]
pub fn strip_mentions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("<@") {
        out.push_str(&rest[..start]);
        match rest[start..].find('>') {
            Some(end) => rest = &rest[start + end + 1..],
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl SlackAdapter {
    /// Parse an Events API webhook body
    ///
    /// `app_mention` events are answered anywhere; plain `message` events
    /// only in direct messages, since channel mentions also arrive as
    /// `app_mention`. Bot messages and edited/deleted subtypes are ignored.
    pub fn parse_event(&self, body: &str) -> Result<SlackPayload> {
        let envelope: Envelope = serde_json::from_str(body)?;

        let (team_id, event, event_id) = match envelope {
            Envelope::UrlVerification { challenge } => {
                return Ok(SlackPayload::UrlVerification { challenge })
            }
            Envelope::EventCallback {
                team_id,
                event,
                event_id,
            } => (team_id, event, event_id),
            Envelope::Other => return Ok(SlackPayload::Ignored("unsupported_envelope")),
        };

        if !self.is_workspace_allowed(&team_id) {
            debug!(team_id = %team_id, "Workspace not allowed, ignoring");
            return Ok(SlackPayload::Ignored("workspace_not_allowed"));
        }
        if event.bot_id.is_some() {
            return Ok(SlackPayload::Ignored("bot_message"));
        }
        if event.subtype.is_some() {
            return Ok(SlackPayload::Ignored("message_subtype"));
        }

        match event.kind.as_str() {
            "app_mention" => {}
            "message" if event.channel_type.as_deref() == Some("im") => {}
            _ => return Ok(SlackPayload::Ignored("unsupported_event")),
        }

        let Some(channel) = event.channel else {
            return Ok(SlackPayload::Ignored("missing_channel"));
        };
        let text = strip_mentions(event.text.as_deref().unwrap_or_default());
        if text.is_empty() {
            return Ok(SlackPayload::Ignored("empty_text"));
        }

        let mut extra = Map::new();
        extra.insert("event_type".into(), Value::String(event.kind));
        extra.insert("message_ts".into(), Value::String(event.ts.clone()));
        if let Some(id) = event_id {
            extra.insert("event_id".into(), Value::String(id));
        }

        Ok(SlackPayload::Message(ChatMessage {
            platform: ChatPlatform::Slack,
            workspace: team_id,
            conversation: channel,
            thread: event.thread_ts.unwrap_or(event.ts),
            user: event.user,
            text,
            extra,
            latency_budget: Some(self.config.ack_budget),
        }))
    }
}
