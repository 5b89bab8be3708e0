use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Read/write/execute access grant for a path glob, evaluated by the Policy
/// Enforcer against tool calls an adapter reports via `tools_hint` and any
/// structured file arguments it can recover.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileAccessRule {
    pub glob: String,
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl FileAccessRule {
    pub fn read_only(glob: impl Into<String>) -> Self {
        Self { glob: glob.into(), read: true, write: false, execute: false }
    }

    pub fn read_write(glob: impl Into<String>) -> Self {
        Self { glob: glob.into(), read: true, write: true, execute: false }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SandboxMode {
    /// No filesystem or network restriction beyond the file access rules.
    Unrestricted,
    /// Writes confined to the session working directory.
    WorkspaceWrite,
    /// No writes permitted at all; read-only inspection.
    ReadOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SandboxConfig {
    pub mode: SandboxMode,
    pub network_access: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self { mode: SandboxMode::WorkspaceWrite, network_access: false }
    }
}

/// Hard caps the Budget & Convergence Controller enforces independent of the
/// convergence heuristics. Exceeding any one of these forces termination
/// regardless of how the conversation is otherwise going.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceLimits {
    pub max_turns: u32,
    #[serde(with = "crate::util::duration_secs")]
    pub max_wall_clock: Duration,
    /// Opaque cumulative cost budget, same unit as `TurnMessage::cost_units`.
    pub max_cost_units: f64,
    pub max_consecutive_failures: u32,
    /// Largest attachment, in bytes, the Policy Enforcer's post-validation
    /// will accept on a single turn.
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,
}

fn default_max_attachment_bytes() -> u64 {
    10 * 1024 * 1024
}

impl ResourceLimits {
    pub fn validate(&self) -> Result<()> {
        if self.max_turns == 0 {
            return Err(Error::InvalidResourceLimit("max_turns"));
        }
        if self.max_wall_clock.is_zero() {
            return Err(Error::InvalidResourceLimit("max_wall_clock"));
        }
        if self.max_cost_units <= 0.0 {
            return Err(Error::InvalidResourceLimit("max_cost_units"));
        }
        if self.max_consecutive_failures == 0 {
            return Err(Error::InvalidResourceLimit("max_consecutive_failures"));
        }
        Ok(())
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_turns: 40,
            max_wall_clock: Duration::from_secs(60 * 30),
            max_cost_units: 10.0,
            max_consecutive_failures: 3,
            max_attachment_bytes: default_max_attachment_bytes(),
        }
    }
}

/// A named, reusable set of constraints bound to a session at creation time.
/// Policies are immutable for the lifetime of a session: TAB never mutates
/// one mid-conversation, it only ever creates a new session with a new
/// policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    pub policy_id: String,
    pub file_access: Vec<FileAccessRule>,
    pub sandbox: SandboxConfig,
    pub resource_limits: ResourceLimits,
    /// Tool names that always require human approval before the adapter
    /// call proceeds, regardless of file access rules.
    #[serde(default)]
    pub approval_required_tools: Vec<String>,
    /// How long the enforcer will wait for a `REQUIRE_APPROVAL` verdict to
    /// be resolved before treating it as a denial.
    #[serde(with = "crate::util::duration_secs")]
    pub approval_timeout: Duration,
}

impl Policy {
    pub fn validate(&self) -> Result<()> {
        self.resource_limits.validate()
    }

    pub fn permissive(policy_id: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            file_access: vec![FileAccessRule::read_write("**/*")],
            sandbox: SandboxConfig::default(),
            resource_limits: ResourceLimits::default(),
            approval_required_tools: Vec::new(),
            approval_timeout: Duration::from_secs(120),
        }
    }
}
