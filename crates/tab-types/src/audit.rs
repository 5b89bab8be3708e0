use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of event the Audit Journal records. Every state transition the
/// orchestrator makes has a corresponding `EventKind`; nothing about a
/// conversation is auditable unless it is one of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionCreated,
    TurnRequested,
    PolicyPreVerdict,
    AdapterInvoked,
    AdapterOutcome,
    PolicyPostVerdict,
    TurnAppended,
    ConvergenceEvaluated,
    RetryScheduled,
    FailoverTriggered,
    CircuitBreakerOpened,
    CircuitBreakerClosed,
    SessionTerminated,
}

/// One entry in the hash-chained, append-only audit journal. `hash` commits
/// to `prev_hash` plus the canonical encoding of every other field, so any
/// modification to a past record (including reordering) breaks the chain
/// from that point forward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub record_id: Uuid,
    pub session_id: Uuid,
    /// Position in the journal, 0-based, monotonic per session.
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    /// Arbitrary structured detail for this event kind, e.g. a `Verdict` or
    /// an `AdapterOutcome` serialized to JSON.
    pub payload: serde_json::Value,
    /// Correlation id tying journal records across a multi-agent session to
    /// the same workspace/project, derived from a hash of the working
    /// directory.
    pub trace_correlation: Option<String>,
    /// Hash of the previous record in this session's chain; `None` only for
    /// index 0.
    pub prev_hash: Option<String>,
    /// sha256 hex digest over the canonical encoding of this record
    /// (everything above, with `hash` itself excluded).
    pub hash: String,
}
