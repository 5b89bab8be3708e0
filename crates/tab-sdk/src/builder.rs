use std::collections::HashMap;
use std::sync::Arc;

use tab_adapters::AgentAdapter;
use tab_audit::{AuditJournal, InMemoryJournal};
use tab_observability::{NoopSink, Sink};
use tab_orchestrator::{ConversationOrchestrator, FailoverMap, OrchestratorConfig};
use tab_policy::{ApprovalResolver, AutoDeny};
use tab_types::{AgentAdapterDescriptor, AuditRecord, Policy, Session, SessionStatus, TerminationReason};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// The facade's egress shape: everything a caller needs to report on a
/// finished conversation without reaching back into `Session` or the
/// orchestrator's internal state.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub turn_count: usize,
    pub total_cost: f64,
    pub duration_seconds: i64,
    pub termination_reason: Option<TerminationReason>,
    pub summary: String,
}

impl ConversationSummary {
    fn from_session(session: &Session, termination_reason: Option<TerminationReason>) -> Self {
        let stats = session.summary_stats();
        let summary = session
            .turns
            .last()
            .map(|t| tab_types::util::truncate(&t.content, 200))
            .unwrap_or_else(|| "no turns completed".to_string());
        Self {
            session_id: session.session_id,
            status: session.status,
            turn_count: stats.total_turns,
            total_cost: stats.total_cost,
            duration_seconds: stats.duration_seconds,
            termination_reason,
            summary,
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no policy configured; call with_policy before build")]
    MissingPolicy,

    #[error("at least two agents must be registered, got {0}")]
    InsufficientAgents(usize),

    #[error(transparent)]
    InvalidDescriptor(#[from] tab_adapters::AdapterError),

    #[error(transparent)]
    Session(#[from] tab_types::Error),

    #[error(transparent)]
    Orchestrator(#[from] tab_orchestrator::OrchestratorError),
}

pub struct BridgeBuilder {
    descriptors: Vec<AgentAdapterDescriptor>,
    policy: Option<Policy>,
    approval: Arc<dyn ApprovalResolver>,
    config: OrchestratorConfig,
    failover: FailoverMap,
    sink: Arc<dyn Sink>,
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self {
            descriptors: Vec::new(),
            policy: None,
            approval: Arc::new(AutoDeny),
            config: OrchestratorConfig::default(),
            failover: HashMap::new(),
            sink: Arc::new(NoopSink),
        }
    }
}

impl BridgeBuilder {
    pub fn with_agent(mut self, descriptor: AgentAdapterDescriptor) -> Result<Self, BridgeError> {
        descriptor.validate()?;
        self.descriptors.push(descriptor);
        Ok(self)
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_approval_resolver(mut self, approval: Arc<dyn ApprovalResolver>) -> Self {
        self.approval = approval;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_failover(mut self, agent_id: impl Into<String>, alternates: Vec<String>) -> Self {
        self.failover.insert(agent_id.into(), alternates);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> Result<Bridge, BridgeError> {
        if self.descriptors.len() < 2 {
            return Err(BridgeError::InsufficientAgents(self.descriptors.len()));
        }
        let policy = self.policy.ok_or(BridgeError::MissingPolicy)?;

        let mut adapters: HashMap<String, Arc<dyn AgentAdapter>> = HashMap::new();
        for descriptor in self.descriptors {
            let agent_id = descriptor.agent_id.clone();
            let adapter: Arc<dyn AgentAdapter> = Arc::from(tab_adapters::build_adapter(descriptor)?);
            adapters.insert(agent_id, adapter);
        }

        Ok(Bridge {
            adapters,
            policy,
            approval: self.approval,
            config: self.config,
            failover: self.failover,
            sink: self.sink,
        })
    }
}

/// A fully configured bridge, ready to run one or more conversations. Each
/// call to `run_conversation` creates a fresh `Session` and a fresh
/// in-memory audit journal; adapters and policy are reused across calls.
pub struct Bridge {
    adapters: HashMap<String, Arc<dyn AgentAdapter>>,
    policy: Policy,
    approval: Arc<dyn ApprovalResolver>,
    config: OrchestratorConfig,
    failover: FailoverMap,
    sink: Arc<dyn Sink>,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::default()
    }

    /// Runs a bounded conversation on `topic` among `participants` (each must
    /// be a registered agent id) starting from `opening_message`, to
    /// completion. `initial_speaker`, if given, must be one of `participants`
    /// and overrides the default round-robin start. Returns the finished
    /// session, its full audit trail, and the egress summary.
    pub async fn run_conversation(
        &self,
        topic: impl Into<String>,
        participants: Vec<String>,
        initial_speaker: Option<&str>,
        opening_message: String,
    ) -> Result<(Session, Vec<AuditRecord>, ConversationSummary), BridgeError> {
        let mut session = Session::new(topic, participants, self.policy.clone(), initial_speaker)?;
        let journal: Box<dyn AuditJournal> = Box::new(InMemoryJournal::new());

        let mut orchestrator = ConversationOrchestrator::new(
            self.adapters.clone(),
            self.failover.clone(),
            journal,
            self.sink.clone(),
            self.approval.clone(),
            self.config.clone(),
        );

        let cancel = CancellationToken::new();
        let state = orchestrator.run(&mut session, opening_message, cancel).await?;
        let records = orchestrator.journal().records().to_vec();
        let summary = ConversationSummary::from_session(&session, state.termination_reason);
        Ok((session, records, summary))
    }
}
