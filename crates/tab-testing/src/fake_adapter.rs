use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tab_adapters::{AdapterError, AdapterResponse, AgentAdapter, SubmitRequest};
use tab_types::adapter::{LoadStrategy, TransportKind};
use tab_types::AgentAdapterDescriptor;
use tokio_util::sync::CancellationToken;

/// A scripted step a `FakeAdapter` plays back on successive `submit` calls.
#[derive(Clone)]
pub enum ScriptedTurn {
    Reply { content: String, tools_hint: Vec<String>, latency: Duration },
    Fail(FakeFailure),
}

#[derive(Clone)]
pub enum FakeFailure {
    Transient(String),
    Permanent(String),
}

/// Drives the orchestrator's retry/failover/circuit-breaker paths without
/// spawning a real process: each call to `submit` consumes the next entry
/// in a pre-recorded script, looping back to the start if the script is
/// shorter than the number of calls made.
pub struct FakeAdapter {
    descriptor: AgentAdapterDescriptor,
    script: Vec<ScriptedTurn>,
    cursor: Mutex<usize>,
}

impl FakeAdapter {
    pub fn new(agent_id: impl Into<String>, script: Vec<ScriptedTurn>) -> Self {
        let agent_id = agent_id.into();
        let descriptor = AgentAdapterDescriptor {
            agent_id: agent_id.clone(),
            kind: "fake".into(),
            transport: TransportKind::LineJsonStdout,
            load_strategy: LoadStrategy::Builtin,
            command: "true".into(),
            args: Vec::new(),
            working_dir: ".".into(),
            env: HashMap::new(),
            turn_timeout: Duration::from_secs(5),
            supports_resume: false,
        };
        Self { descriptor, script, cursor: Mutex::new(0) }
    }

    /// Convenience fixture: always replies with `content`, never fails.
    pub fn always_replies(agent_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(agent_id, vec![ScriptedTurn::Reply { content: content.into(), tools_hint: Vec::new(), latency: Duration::ZERO }])
    }

    fn next_step(&self) -> ScriptedTurn {
        let mut cursor = self.cursor.lock().expect("fake adapter lock poisoned");
        let step = self.script[*cursor % self.script.len()].clone();
        *cursor += 1;
        step
    }

    pub fn call_count(&self) -> usize {
        *self.cursor.lock().expect("fake adapter lock poisoned")
    }
}

#[async_trait]
impl AgentAdapter for FakeAdapter {
    fn descriptor(&self) -> &AgentAdapterDescriptor {
        &self.descriptor
    }

    async fn health_check(&self) -> tab_adapters::Result<()> {
        Ok(())
    }

    async fn submit(&self, _request: SubmitRequest, cancel: CancellationToken) -> tab_adapters::Result<AdapterResponse> {
        if self.script.is_empty() {
            return Err(AdapterError::Permanent { agent_id: self.descriptor.agent_id.clone(), reason: "empty script".into() });
        }
        let step = self.next_step();
        match step {
            ScriptedTurn::Reply { content, tools_hint, latency } => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(AdapterError::Cancelled { agent_id: self.descriptor.agent_id.clone() }),
                    _ = tokio::time::sleep(latency) => Ok(AdapterResponse {
                        content,
                        tools_hint,
                        cost_units: Some(0.01),
                        duration_ms: latency.as_millis() as u64,
                        resume_token: None,
                    }),
                }
            }
            ScriptedTurn::Fail(FakeFailure::Transient(reason)) => {
                Err(AdapterError::Transient { agent_id: self.descriptor.agent_id.clone(), reason })
            }
            ScriptedTurn::Fail(FakeFailure::Permanent(reason)) => {
                Err(AdapterError::Permanent { agent_id: self.descriptor.agent_id.clone(), reason })
            }
        }
    }

    async fn shutdown(&self) -> tab_adapters::Result<()> {
        Ok(())
    }
}
