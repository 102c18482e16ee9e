use super::{constant_time_eq, SlackAdapter, MAX_TIMESTAMP_AGE_SECS};
use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Signature header
pub const SIGNATURE_HEADER: &str = "x-slack-signature";
/// Timestamp header
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
/// Present when Slack redelivers an event it thinks we missed
pub const RETRY_HEADER: &str = "x-slack-retry-num";

type HmacSha256 = Hmac<Sha256>;

/// `v0=` + hex HMAC-SHA256 of `v0:<timestamp>:<body>`
pub(crate) fn sign(secret: &str, timestamp: &str, body: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| Error::Slack("Invalid signing secret".to_string()))?;
    mac.update(format!("v0:{timestamp}:{body}").as_bytes());
    Ok(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

impl SlackAdapter {
    /// Verify a Slack request signature (HMAC-SHA256) against the current time
    pub fn verify_signature(&self, timestamp: &str, body: &str, signature: &str) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| Error::Slack("System time error".to_string()))?
            .as_secs();
        self.verify_signature_at(timestamp, body, signature, now)
    }

    pub(crate) fn verify_signature_at(
        &self,
        timestamp: &str,
        body: &str,
        signature: &str,
        now: u64,
    ) -> Result<()> {
        let ts: u64 = timestamp
            .parse()
            .map_err(|_| Error::Slack("Invalid timestamp".to_string()))?;

        if now.abs_diff(ts) > MAX_TIMESTAMP_AGE_SECS {
            warn!(
                timestamp = %ts,
                now = %now,
                "Slack request timestamp outside the replay window"
            );
            return Err(Error::Slack(
                "Request timestamp is too old or in the future".to_string(),
            ));
        }

        let expected = sign(&self.config.signing_secret, timestamp, body)?;
        if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
            warn!("Slack signature verification failed");
            return Err(Error::Slack("Invalid request signature".to_string()));
        }

        debug!("Slack signature verified");
        Ok(())
    }

    /// Verify a webhook request from its headers (names matched case-insensitively)
    pub fn verify_webhook_request(&self, headers: &[(String, String)], body: &str) -> Result<()> {
        let header = |name: &str| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        };

        let timestamp = header(TIMESTAMP_HEADER)
            .ok_or_else(|| Error::Slack("Missing X-Slack-Request-Timestamp header".to_string()))?;
        let signature = header(SIGNATURE_HEADER)
            .ok_or_else(|| Error::Slack("Missing X-Slack-Signature header".to_string()))?;

        self.verify_signature(timestamp, body, signature)
    }

    /// Post `text` into `channel`, threaded under `thread_ts`; returns the new message ts
    pub async fn post_message(&self, channel: &str, thread_ts: &str, text: &str) -> Result<String> {
        let url = format!("{}/chat.postMessage", self.config.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.bot_token)
            .json(&json!({
                "channel": channel,
                "thread_ts": thread_ts,
                "text": text,
            }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() || !body["ok"].as_bool().unwrap_or(false) {
            let reason = body["error"].as_str().unwrap_or("unknown_error");
            warn!(channel, status = status.as_u16(), reason, "chat.postMessage failed");
            return Err(Error::Slack(format!("chat.postMessage: {reason}")));
        }

        Ok(body["ts"].as_str().unwrap_or_default().to_string())
    }
}
