use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};

/// Wire transport an adapter speaks to reach its underlying agent process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum TransportKind {
    /// Child process writes one JSON object per line to stdout, of type
    /// `system` / `assistant` / `user` / `result`.
    LineJsonStdout,
    /// Child process appends JSONL events to a dated journal file under
    /// `$JOURNAL_ROOT/sessions/YYYY/MM/DD/rollout-<id>.jsonl`; the
    /// orchestrator discovers and tails the newest such file.
    RolloutJournal { journal_root: String },
}

/// How the registry obtains a concrete adapter implementation for a
/// descriptor. `kind` elsewhere on the descriptor is free-form metadata used
/// for display and logging only; it is never consulted for dispatch, which
/// always goes through `LoadStrategy`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum LoadStrategy {
    /// One of the adapters compiled into `tab-adapters` itself.
    Builtin,
    /// A dynamically discovered executable implementing the adapter
    /// sidecar protocol, named by entry point.
    PluginEntryPoint { entry_point: String },
    /// A Rust type registered at process start under a fully qualified
    /// module path, for embedders linking TAB as a library.
    ModuleClass { module_path: String },
}

/// Static description of how to reach one agent. Distinct from the runtime
/// `AgentAdapter` trait object: a descriptor is serializable configuration,
/// a trait object is the thing actually driving a subprocess.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentAdapterDescriptor {
    pub agent_id: String,
    /// Free-form label such as `"claude-code"` or `"codex"`, purely
    /// descriptive.
    pub kind: String,
    #[serde(flatten)]
    pub transport: TransportKind,
    #[serde(flatten)]
    pub load_strategy: LoadStrategy,
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: String,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(with = "crate::util::duration_secs")]
    pub turn_timeout: Duration,
    /// True if this adapter supports resuming an existing session via a
    /// resume flag, used by `LINE_JSON_STDOUT` continuity and by the
    /// orchestrator's failover logic to decide whether a fresh process can
    /// pick up where a crashed one left off.
    pub supports_resume: bool,
}

impl AgentAdapterDescriptor {
    pub fn validate(&self) -> Result<()> {
        if self.agent_id.trim().is_empty() {
            return Err(Error::InvalidAdapterDescriptor("agent_id must not be empty".into()));
        }
        if self.command.trim().is_empty() {
            return Err(Error::InvalidAdapterDescriptor(format!(
                "adapter {} has an empty command",
                self.agent_id
            )));
        }
        if self.turn_timeout.is_zero() {
            return Err(Error::InvalidAdapterDescriptor(format!(
                "adapter {} has a zero turn_timeout",
                self.agent_id
            )));
        }
        Ok(())
    }
}
