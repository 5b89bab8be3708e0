use std::time::Duration;

use async_trait::async_trait;

/// Resolves a `RequireApproval` verdict into a yes/no decision, bounded by
/// `timeout`. An implementation that never resolves in time is treated as a
/// denial by the orchestrator, never as an indefinite pause.
#[async_trait]
pub trait ApprovalResolver: Send + Sync {
    async fn resolve(&self, reason: &str, timeout: Duration) -> bool;
}

/// Approves everything immediately. Useful for policies that list
/// `approval_required_tools` purely for audit visibility rather than to
/// actually gate on a human.
pub struct AutoApprove;

#[async_trait]
impl ApprovalResolver for AutoApprove {
    async fn resolve(&self, _reason: &str, _timeout: Duration) -> bool {
        true
    }
}

/// Denies everything immediately, the safe default when no human-in-the-loop
/// channel is wired up.
pub struct AutoDeny;

#[async_trait]
impl ApprovalResolver for AutoDeny {
    async fn resolve(&self, _reason: &str, _timeout: Duration) -> bool {
        false
    }
}
