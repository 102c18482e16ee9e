//! Scripted agent transport for unit tests

use crate::invoker::{AgentTransport, TransportError};
use crate::registry::AgentDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Reply(Value),
    Fail(TransportError),
    Slow(Duration, Value),
}

#[derive(Debug, Default)]
struct Script {
    queue: VecDeque<Step>,
    last: Option<Step>,
}

/// Replays a per-agent list of steps; the last step repeats once the list runs out
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, Script>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, agent: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(agent.to_string())
            .or_default()
            .queue
            .extend(steps);
        self
    }

    pub(crate) fn calls(&self, agent: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == agent)
            .count()
    }

    pub(crate) fn requests(&self, agent: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == agent)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn next_step(&self, agent: &str) -> Step {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(agent.to_string()).or_default();
        match script.queue.pop_front() {
            Some(step) => {
                script.last = Some(step.clone());
                step
            }
            None => script
                .last
                .clone()
                .unwrap_or_else(|| Step::Fail(TransportError::Transport("no script".into()))),
        }
    }
}

#[async_trait]
impl AgentTransport for ScriptedTransport {
    async fn send(&self, agent: &AgentDescriptor, body: &Value) -> Result<Value, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((agent.id.to_string(), body.clone()));

        match self.next_step(agent.id.as_str()) {
            Step::Reply(value) => Ok(value),
            Step::Fail(error) => Err(error),
            Step::Slow(delay, value) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
        }
    }
}
