use thiserror::Error;

/// Typed error-kind taxonomy the orchestrator surfaces to callers. Every
/// variant here corresponds to a terminal or retryable condition the turn
/// loop can land in; nothing escapes as a bare string.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("session validation error: {0}")]
    ValidationError(#[from] tab_types::Error),

    #[error("turn denied by policy: {0}")]
    PolicyDenied(String),

    #[error("adapter '{agent_id}' failed transiently after exhausting retries and failover: {reason}")]
    AdapterTransient { agent_id: String, reason: String },

    #[error("adapter '{agent_id}' failed permanently: {reason}")]
    AdapterPermanent { agent_id: String, reason: String },

    #[error("conversation cancelled")]
    Cancelled,

    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    #[error("adapter '{agent_id}' exceeded its deadline")]
    DeadlineExceeded { agent_id: String },

    #[error("audit journal write failed: {0}")]
    JournalWriteFailure(#[from] tab_audit::AuditError),

    #[error("no adapter registered for speaker '{0}'")]
    UnknownAdapter(String),

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
