//! Plain, serde-deserializable config value objects. TAB's core crates never
//! read a config file themselves; `tab-cli` (or an embedder) loads one of
//! these from TOML and hands the result straight to `tab-orchestrator`.

use serde::{Deserialize, Serialize};

use crate::adapter::AgentAdapterDescriptor;
use crate::policy::Policy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(flatten)]
    pub policy: Policy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptorConfig {
    #[serde(flatten)]
    pub descriptor: AgentAdapterDescriptor,
}

/// Top-level config shape for a `tab` run: the participants to spawn and the
/// policy binding them, plus a few orchestrator-wide knobs that don't belong
/// on `Policy` because they govern the loop rather than any one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Short description of what the conversation is about (1-1000 chars).
    pub topic: String,
    pub agents: Vec<AgentDescriptorConfig>,
    pub policy: PolicyConfig,
    /// Initial opening message delivered to the first speaker.
    pub opening_message: String,
    /// Agent id that speaks first. Defaults to the natural participant order
    /// when unset.
    #[serde(default)]
    pub initial_speaker: Option<String>,
    #[serde(default = "default_circuit_breaker_threshold")]
    pub circuit_breaker_threshold: u32,
    #[serde(default = "default_circuit_breaker_cooldown_secs")]
    pub circuit_breaker_cooldown_secs: u64,
}

fn default_circuit_breaker_threshold() -> u32 {
    3
}

fn default_circuit_breaker_cooldown_secs() -> u64 {
    30
}
