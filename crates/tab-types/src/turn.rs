use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::policy::{Policy, SandboxMode};

/// Identifies which participant produced or receives a turn. Distinct from
/// `AgentAdapterDescriptor::agent_id`: a speaker is a role within a session,
/// while a descriptor is a reusable definition of how to reach an agent.
pub type Speaker = String;

/// Classifies a turn the way a chat transcript would, independent of which
/// agent produced it. TAB only ever appends `Assistant` turns itself; the
/// other variants exist for seeded/injected content a caller supplies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A file or blob an agent attached to a turn. TAB never opens or interprets
/// the bytes; `digest`, when present, lets callers verify content out of
/// band without shipping it through the audit journal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    #[serde(default)]
    pub digest: Option<String>,
}

/// Snapshot of the allow/deny posture in effect when a turn was produced.
/// Policies are immutable for the lifetime of a session, so in principle a
/// turn's `policy_constraints` never drifts from its session's `policy` --
/// but the snapshot lets an auditor read a turn in isolation, without also
/// having the session record to hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyConstraintsSnapshot {
    pub policy_id: String,
    pub sandbox_mode: SandboxMode,
    pub approval_required_tools: Vec<String>,
}

impl PolicyConstraintsSnapshot {
    pub fn from_policy(policy: &Policy) -> Self {
        Self {
            policy_id: policy.policy_id.clone(),
            sandbox_mode: policy.sandbox.mode,
            approval_required_tools: policy.approval_required_tools.clone(),
        }
    }
}

/// One message exchanged in a conversation. TAB treats a turn as opaque text
/// plus a small amount of structured metadata the policy and convergence
/// layers need; it never interprets the content itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnMessage {
    pub turn_id: Uuid,
    pub session_id: Uuid,
    /// Monotonic position within the session, starting at 0.
    pub sequence: u64,
    pub from_agent: Speaker,
    pub to_agent: Speaker,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub timestamp: DateTime<Utc>,
    /// Tool names the adapter observed being invoked while producing this
    /// turn, surfaced for Policy Enforcer post-validation. Best-effort; an
    /// adapter that cannot see tool calls leaves this empty.
    #[serde(default)]
    pub tools_hint: Vec<String>,
    /// Opaque cost units reported by the adapter for this turn, if any. TAB
    /// never interprets the unit; it is passed straight to budget checks as
    /// a scalar.
    #[serde(default)]
    pub cost_units: Option<f64>,
    /// Wall-clock duration the adapter spent producing this turn.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Set when the adapter tagged the content as belonging to a nested
    /// sub-agent invocation rather than the top-level conversation stream.
    #[serde(default)]
    pub sub_stream: Option<String>,
    pub policy_constraints: PolicyConstraintsSnapshot,
}

impl TurnMessage {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: Uuid,
        sequence: u64,
        from_agent: impl Into<Speaker>,
        to_agent: impl Into<Speaker>,
        role: Role,
        content: impl Into<String>,
        policy_constraints: PolicyConstraintsSnapshot,
    ) -> Result<Self> {
        let from_agent = from_agent.into();
        let to_agent = to_agent.into();
        let content = content.into();
        if content.trim().is_empty() {
            return Err(Error::EmptyContent);
        }
        if from_agent == to_agent {
            return Err(Error::SameFromAndToAgent(from_agent));
        }
        Ok(Self {
            turn_id: Uuid::new_v4(),
            session_id,
            sequence,
            from_agent,
            to_agent,
            role,
            content,
            attachments: Vec::new(),
            timestamp: Utc::now(),
            tools_hint: Vec::new(),
            cost_units: None,
            duration_ms: None,
            sub_stream: None,
            policy_constraints,
        })
    }

    pub fn with_tools_hint(mut self, tools: Vec<String>) -> Self {
        self.tools_hint = tools;
        self
    }

    pub fn with_cost_units(mut self, cost: f64) -> Self {
        self.cost_units = Some(cost);
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    fn constraints() -> PolicyConstraintsSnapshot {
        PolicyConstraintsSnapshot::from_policy(&Policy::permissive("p"))
    }

    #[test]
    fn rejects_empty_content() {
        let err = TurnMessage::new(Uuid::new_v4(), 0, "a", "b", Role::Assistant, "   ", constraints()).unwrap_err();
        assert!(matches!(err, Error::EmptyContent));
    }

    #[test]
    fn rejects_same_from_and_to_agent() {
        let err = TurnMessage::new(Uuid::new_v4(), 0, "a", "a", Role::Assistant, "hi", constraints()).unwrap_err();
        assert!(matches!(err, Error::SameFromAndToAgent(ref s) if s == "a"));
    }

    #[test]
    fn builds_a_valid_turn() {
        let turn = TurnMessage::new(Uuid::new_v4(), 0, "a", "b", Role::Assistant, "hello", constraints()).unwrap();
        assert_eq!(turn.from_agent, "a");
        assert_eq!(turn.to_agent, "b");
        assert!(turn.attachments.is_empty());
    }
}
