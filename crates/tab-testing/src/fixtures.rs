use std::time::Duration;

use tab_types::policy::{FileAccessRule, ResourceLimits, SandboxConfig, SandboxMode};
use tab_types::{Policy, Session};

/// A permissive policy with tight resource limits, handy for tests that
/// want convergence/budget behavior to trigger within a handful of turns
/// rather than the production defaults.
pub fn tight_policy(policy_id: impl Into<String>) -> Policy {
    Policy {
        policy_id: policy_id.into(),
        file_access: vec![FileAccessRule::read_write("**/*")],
        sandbox: SandboxConfig { mode: SandboxMode::Unrestricted, network_access: false },
        resource_limits: ResourceLimits {
            max_turns: 6,
            max_wall_clock: Duration::from_secs(30),
            max_cost_units: 1.0,
            max_consecutive_failures: 2,
            max_attachment_bytes: 10 * 1024 * 1024,
        },
        approval_required_tools: Vec::new(),
        approval_timeout: Duration::from_secs(5),
    }
}

pub fn two_party_session(policy: Policy) -> Session {
    Session::new("fixture conversation", vec!["agent-a".into(), "agent-b".into()], policy, None)
        .expect("fixture session must be valid")
}
