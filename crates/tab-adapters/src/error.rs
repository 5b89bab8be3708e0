use thiserror::Error;

/// Maps 1:1 onto the orchestrator's retry taxonomy: `Transient` errors are
/// retried (with backoff, then failover), `Permanent` and `Cancelled` are
/// not.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("transient adapter failure for {agent_id}: {reason}")]
    Transient { agent_id: String, reason: String },

    #[error("permanent adapter failure for {agent_id}: {reason}")]
    Permanent { agent_id: String, reason: String },

    #[error("adapter call for {agent_id} was cancelled")]
    Cancelled { agent_id: String },

    #[error("adapter {agent_id} exceeded its turn deadline of {timeout_ms}ms")]
    DeadlineExceeded { agent_id: String, timeout_ms: u64 },

    #[error("invalid adapter descriptor: {0}")]
    InvalidDescriptor(#[from] tab_types::Error),

    #[error("io error talking to adapter {agent_id}: {source}")]
    Io {
        agent_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed output from adapter {agent_id}: {reason}")]
    MalformedOutput { agent_id: String, reason: String },
}

/// Coarse outcome classification, independent of the specific error,
/// used by the orchestrator to decide retry/failover/circuit-breaker
/// behavior without matching on `AdapterError` variants directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterOutcome {
    Success,
    Transient,
    Permanent,
    Cancelled,
}

impl From<&AdapterError> for AdapterOutcome {
    fn from(err: &AdapterError) -> Self {
        match err {
            AdapterError::Transient { .. } | AdapterError::DeadlineExceeded { .. } | AdapterError::Io { .. } => {
                AdapterOutcome::Transient
            }
            AdapterError::Permanent { .. }
            | AdapterError::InvalidDescriptor(_)
            | AdapterError::MalformedOutput { .. } => AdapterOutcome::Permanent,
            AdapterError::Cancelled { .. } => AdapterOutcome::Cancelled,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
