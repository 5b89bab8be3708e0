use async_trait::async_trait;
use tab_types::AgentAdapterDescriptor;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// One turn's worth of input handed to an adapter: the accumulated
/// conversation so far, rendered as plain text the child process's CLI
/// expects on stdin or as a `-p`/exec-mode argument, plus the session handle
/// needed for resume-capable adapters.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub session_id: uuid::Uuid,
    pub prompt: String,
    /// Opaque resume token the adapter previously returned, if this is not
    /// the first turn for this agent in this session.
    pub resume_token: Option<String>,
}

/// What came back from a successful adapter call: the rendered turn text
/// plus whatever structured hints the adapter could recover from its own
/// wire format.
#[derive(Debug, Clone)]
pub struct AdapterResponse {
    pub content: String,
    pub tools_hint: Vec<String>,
    pub cost_units: Option<f64>,
    pub duration_ms: u64,
    /// Opaque token to pass as `resume_token` on the next `submit` for this
    /// agent/session pair, if `descriptor().supports_resume`.
    pub resume_token: Option<String>,
}

/// Contract every concrete agent adapter implements, whether it speaks
/// `LINE_JSON_STDOUT`, tails a `ROLLOUT_JOURNAL`, or (for tests) is a fully
/// scripted fake. The orchestrator only ever holds `Box<dyn AgentAdapter>`.
#[async_trait]
pub trait AgentAdapter: Send + Sync {
    fn descriptor(&self) -> &AgentAdapterDescriptor;

    /// Cheap liveness probe, used before admitting an adapter into a
    /// session and again after a circuit breaker cool-down before retrying.
    async fn health_check(&self) -> Result<()>;

    /// Drives one turn to completion or to a classified failure. Must
    /// respect `cancel`: a cooperative cancellation should surface as
    /// `AdapterError::Cancelled`, not a timeout or panic.
    async fn submit(&self, request: SubmitRequest, cancel: CancellationToken) -> Result<AdapterResponse>;

    /// Releases any resources (child process, file handles) held by this
    /// adapter instance. Idempotent.
    async fn shutdown(&self) -> Result<()>;
}
