//! Policy Enforcer: evaluates every turn twice. `validate_turn_request` runs
//! before an adapter is invoked and can only see the session state; it has
//! no knowledge of what tools the turn will actually touch.
//! `validate_turn_result` runs after the adapter responds, once tool usage
//! is known, and is where tool/file access restrictions actually bite.

mod approval;
mod glob;
mod verdict;

pub use approval::{ApprovalResolver, AutoApprove, AutoDeny};
pub use verdict::Verdict;

use tab_types::session::SessionStatus;
use tab_types::{Attachment, Policy, Session};

/// Heuristic tool classification used to decide whether a reported tool
/// name constitutes a write/execute operation under a restrictive sandbox.
/// Adapters only report tool *names*, not structured arguments, so this is
/// necessarily name-based rather than path-based.
fn is_mutating_tool(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["write", "edit", "delete", "remove", "bash", "exec", "apply_patch", "shell"]
        .iter()
        .any(|kw| lower.contains(kw))
}

pub struct PolicyEnforcer;

impl PolicyEnforcer {
    /// Pre-admission gate, run before the adapter is invoked for this turn.
    /// Tool usage is not yet known, so this only checks session-level
    /// eligibility: a session that is not `Active` admits no further turns.
    pub fn validate_turn_request(session: &Session) -> Verdict {
        if session.status != SessionStatus::Active {
            return Verdict::Block {
                reason: format!("session is {:?}, not accepting further turns", session.status),
            };
        }
        Verdict::Allow
    }

    /// Post-validation gate, run once the adapter has reported which tools
    /// it invoked. `Block` takes precedence over `RequireApproval`: a
    /// sandbox-forbidden operation is never merely deferred to a human.
    pub fn validate_turn_result(policy: &Policy, tools_hint: &[String], attachments: &[Attachment]) -> Verdict {
        use tab_types::policy::SandboxMode;

        if policy.sandbox.mode == SandboxMode::ReadOnly {
            if let Some(tool) = tools_hint.iter().find(|t| is_mutating_tool(t)) {
                return Verdict::Block {
                    reason: format!("tool '{tool}' mutates state but sandbox mode is read_only"),
                };
            }
        }

        if let Some(verdict) = Self::validate_attachments(policy, attachments) {
            return verdict;
        }

        if let Some(tool) = tools_hint.iter().find(|t| policy.approval_required_tools.contains(t)) {
            return Verdict::RequireApproval {
                reason: format!("tool '{tool}' is in approval_required_tools"),
            };
        }

        Verdict::Allow
    }

    /// Checks every attachment against the resource-limit size cap and the
    /// policy's file access globs (an attachment whose name matches no rule
    /// at all has no path it is allowed to land at).
    fn validate_attachments(policy: &Policy, attachments: &[Attachment]) -> Option<Verdict> {
        let max_bytes = policy.resource_limits.max_attachment_bytes;
        for attachment in attachments {
            if attachment.size > max_bytes {
                return Some(Verdict::Block {
                    reason: format!("attachment '{}' is {} bytes, exceeds max_attachment_bytes {max_bytes}", attachment.name, attachment.size),
                });
            }
            let path_allowed = policy.file_access.iter().any(|rule| glob::glob_match(&rule.glob, &attachment.name));
            if !path_allowed {
                return Some(Verdict::Block {
                    reason: format!("attachment '{}' matches no file_access rule", attachment.name),
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tab_types::policy::{FileAccessRule, ResourceLimits, SandboxConfig, SandboxMode};

    fn policy_with(mode: SandboxMode, approval_tools: Vec<String>) -> Policy {
        Policy {
            policy_id: "p".into(),
            file_access: vec![FileAccessRule::read_write("**/*")],
            sandbox: SandboxConfig { mode, network_access: false },
            resource_limits: ResourceLimits::default(),
            approval_required_tools: approval_tools,
            approval_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn allows_non_mutating_tools_in_read_only_sandbox() {
        let policy = policy_with(SandboxMode::ReadOnly, vec![]);
        let verdict = PolicyEnforcer::validate_turn_result(&policy, &["read_file".into()], &[]);
        assert_eq!(verdict, Verdict::Allow);
    }

    #[test]
    fn blocks_mutating_tool_in_read_only_sandbox() {
        let policy = policy_with(SandboxMode::ReadOnly, vec![]);
        let verdict = PolicyEnforcer::validate_turn_result(&policy, &["write_file".into()], &[]);
        assert!(matches!(verdict, Verdict::Block { .. }));
    }

    #[test]
    fn requires_approval_for_listed_tool() {
        let policy = policy_with(SandboxMode::Unrestricted, vec!["deploy".into()]);
        let verdict = PolicyEnforcer::validate_turn_result(&policy, &["deploy".into()], &[]);
        assert!(matches!(verdict, Verdict::RequireApproval { .. }));
    }

    #[test]
    fn block_takes_precedence_over_require_approval() {
        let policy = policy_with(SandboxMode::ReadOnly, vec!["write_file".into()]);
        let verdict = PolicyEnforcer::validate_turn_result(&policy, &["write_file".into()], &[]);
        assert!(matches!(verdict, Verdict::Block { .. }));
    }

    #[test]
    fn blocks_oversized_attachment() {
        let policy = policy_with(SandboxMode::Unrestricted, vec![]);
        let attachment = tab_types::Attachment { name: "diff.patch".into(), content_type: "text/plain".into(), size: policy.resource_limits.max_attachment_bytes + 1, digest: None };
        let verdict = PolicyEnforcer::validate_turn_result(&policy, &[], &[attachment]);
        assert!(matches!(verdict, Verdict::Block { .. }));
    }

    #[test]
    fn blocks_attachment_outside_file_access_rules() {
        let mut policy = policy_with(SandboxMode::Unrestricted, vec![]);
        policy.file_access = vec![FileAccessRule::read_write("src/**")];
        let attachment = tab_types::Attachment { name: "/etc/passwd".into(), content_type: "text/plain".into(), size: 10, digest: None };
        let verdict = PolicyEnforcer::validate_turn_result(&policy, &[], &[attachment]);
        assert!(matches!(verdict, Verdict::Block { .. }));
    }
}
