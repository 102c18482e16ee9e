//! Per-kind request bodies and reply parsing

use super::AgentAnswer;
use crate::query::Query;
use crate::registry::AgentKind;
use serde_json::{json, Map, Value};

/// Build the request body an agent of `kind` expects
#[must_use]
pub fn build_request(
    kind: AgentKind,
    query: &Query,
    session_id: &str,
    continuation: Option<&Value>,
) -> Value {
    let context = Value::Object(query.context.clone());
    match kind {
        AgentKind::Reasoning => {
            let mut body = json!({
                "prompt": query.text,
                "session_id": session_id,
                "context": context,
            });
            if let Some(state) = continuation {
                body["state"] = state.clone();
            }
            body
        }
        AgentKind::Analytics => {
            let mut body = json!({
                "query": query.text,
                "session_id": session_id,
                "context": context,
            });
            if let Some(thread_id) = continuation {
                body["thread_id"] = thread_id.clone();
            }
            body
        }
    }
}

fn take_first(fields: &mut Map<String, Value>, names: &[&str]) -> Option<Value> {
    names
        .iter()
        .find_map(|name| fields.remove(*name).filter(|v| !v.is_null()))
}

/// Extract answer, continuation and usage from an agent reply
///
/// # Errors
///
/// Returns a description when the reply carries no answer field
pub fn parse_reply(kind: AgentKind, body: Value) -> Result<AgentAnswer, String> {
    let mut fields = match body {
        Value::Object(fields) => fields,
        Value::String(text) => {
            return Ok(AgentAnswer {
                answer: Value::String(text),
                continuation: None,
                usage: None,
            })
        }
        other => return Err(format!("expected an object, got {}", type_name(&other))),
    };

    let (answer_fields, continuation_field): (&[&str], &str) = match kind {
        AgentKind::Reasoning => (&["result", "response", "output"], "state"),
        AgentKind::Analytics => (&["answer", "result"], "thread_id"),
    };

    let answer = take_first(&mut fields, answer_fields)
        .ok_or_else(|| format!("reply has none of {}", answer_fields.join(", ")))?;
    let continuation = fields.remove(continuation_field).filter(|v| !v.is_null());
    let usage = fields.remove("usage").filter(|v| !v.is_null());

    Ok(AgentAnswer {
        answer,
        continuation,
        usage,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
