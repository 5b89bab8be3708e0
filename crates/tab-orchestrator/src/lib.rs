//! Conversation Orchestrator: owns the per-turn state machine
//! (`PolicyPre -> AdapterCall -> PolicyPost -> Append -> Converge`, looping
//! until convergence or a hard stop), strict round-robin speaker
//! alternation, retry-with-backoff, failover to an alternate compatible
//! adapter, and per-adapter circuit breaking.

mod breaker;
pub mod config;
pub mod error;

pub use breaker::CircuitBreaker;
pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, Result};

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tab_adapters::{AdapterError, AdapterOutcome, AgentAdapter, SubmitRequest};
use tab_audit::AuditJournal;
use tab_convergence::{ConvergenceController, Recommendation};
use tab_observability::{Fields, Level, Sink};
use tab_policy::{ApprovalResolver, PolicyEnforcer, Verdict};
use tab_types::orchestration::Phase;
use tab_types::session::SessionStatus;
use tab_types::{EventKind, OrchestrationState, PolicyConstraintsSnapshot, Role, Session, TerminationReason, TurnMessage};
use tokio_util::sync::CancellationToken;

/// Speakers a given speaker may fail over to: other agents in the session
/// whose adapter supports the same transport contract. Resolved by the
/// caller (typically from the registry) and passed in per run, since the
/// orchestrator itself has no opinion on which agents are "compatible"
/// beyond what the caller tells it.
pub type FailoverMap = HashMap<String, Vec<String>>;

pub struct ConversationOrchestrator {
    adapters: HashMap<String, Arc<dyn AgentAdapter>>,
    failover: FailoverMap,
    journal: Box<dyn AuditJournal>,
    sink: Arc<dyn Sink>,
    approval: Arc<dyn ApprovalResolver>,
    config: OrchestratorConfig,
    breaker: CircuitBreaker,
    resume_tokens: HashMap<String, String>,
}

impl ConversationOrchestrator {
    pub fn new(
        adapters: HashMap<String, Arc<dyn AgentAdapter>>,
        failover: FailoverMap,
        journal: Box<dyn AuditJournal>,
        sink: Arc<dyn Sink>,
        approval: Arc<dyn ApprovalResolver>,
        config: OrchestratorConfig,
    ) -> Self {
        let breaker = CircuitBreaker::new(config.circuit_breaker_threshold, config.circuit_breaker_cooldown);
        Self { adapters, failover, journal, sink, approval, config, breaker, resume_tokens: HashMap::new() }
    }

    pub fn journal(&self) -> &dyn AuditJournal {
        self.journal.as_ref()
    }

    /// Drives `session` from its current state to convergence, a policy
    /// denial, resource exhaustion, or cancellation. `opening_message` seeds
    /// the first turn's prompt; every later turn's prompt is the previous
    /// turn's content.
    pub async fn run(
        &mut self,
        session: &mut Session,
        opening_message: String,
        cancel: CancellationToken,
    ) -> Result<OrchestrationState> {
        let trace_correlation: Option<String> = None;
        let mut state = OrchestrationState::default();
        let mut pending_prompt = opening_message;

        self.journal
            .append(session.session_id, EventKind::SessionCreated, json!({"participants": session.participants}), trace_correlation.clone())
            .await?;

        loop {
            if cancel.is_cancelled() {
                session.status = SessionStatus::Failed;
                state.termination_reason = Some(TerminationReason::Cancelled);
                state.phase = Phase::Terminal;
                break;
            }

            state.phase = Phase::PolicyPre;
            let pre_verdict = PolicyEnforcer::validate_turn_request(session);
            self.journal
                .append(session.session_id, EventKind::PolicyPreVerdict, verdict_payload(&pre_verdict), trace_correlation.clone())
                .await?;
            if let Verdict::Block { reason } = pre_verdict {
                session.status = SessionStatus::Failed;
                state.termination_reason = Some(TerminationReason::PolicyDenied);
                state.phase = Phase::Terminal;
                self.sink.log(Level::Warn, "session blocked pre-admission", log_fields(&reason));
                return Err(OrchestratorError::PolicyDenied(reason));
            }

            state.phase = Phase::AdapterCall;
            let speaker = session.next_speaker().clone();
            let response = match self.call_with_resilience(&speaker, pending_prompt.clone(), session, &cancel, &mut state).await {
                Ok(r) => r,
                Err(e) => {
                    session.status = SessionStatus::Failed;
                    state.termination_reason = Some(TerminationReason::AdapterFailure);
                    state.phase = Phase::Terminal;
                    return Err(e);
                }
            };

            state.phase = Phase::PolicyPost;
            let post_verdict = PolicyEnforcer::validate_turn_result(&session.policy, &response.tools_hint, &[]);
            self.journal
                .append(session.session_id, EventKind::PolicyPostVerdict, verdict_payload(&post_verdict), trace_correlation.clone())
                .await?;
            match post_verdict {
                Verdict::Allow => {}
                Verdict::RequireApproval { reason } => {
                    let approved = self.approval.resolve(&reason, session.policy.approval_timeout).await;
                    if !approved {
                        session.status = SessionStatus::Failed;
                        state.termination_reason = Some(TerminationReason::PolicyDenied);
                        state.phase = Phase::Terminal;
                        return Err(OrchestratorError::PolicyDenied(reason));
                    }
                }
                Verdict::Block { reason } => {
                    session.status = SessionStatus::Failed;
                    state.termination_reason = Some(TerminationReason::PolicyDenied);
                    state.phase = Phase::Terminal;
                    return Err(OrchestratorError::PolicyDenied(reason));
                }
            }

            state.phase = Phase::Append;
            let to_agent = session.addressee_of(&speaker);
            let constraints = PolicyConstraintsSnapshot::from_policy(&session.policy);
            let mut turn = TurnMessage::new(
                session.session_id,
                session.next_sequence(),
                speaker.clone(),
                to_agent,
                Role::Assistant,
                response.content.clone(),
                constraints,
            )?
            .with_tools_hint(response.tools_hint.clone());
            turn.duration_ms = Some(response.duration_ms);
            if let Some(cost) = response.cost_units {
                turn = turn.with_cost_units(cost);
            }
            session.append_turn(turn.clone())?;
            if let Some(resume_token) = response.resume_token {
                self.resume_tokens.insert(speaker.clone(), resume_token);
            }
            self.journal
                .append(session.session_id, EventKind::TurnAppended, json!({"speaker": speaker, "sequence": turn.sequence}), trace_correlation.clone())
                .await?;
            pending_prompt = response.content;

            state.phase = Phase::Converge;
            let decision = ConvergenceController::evaluate(session);
            self.journal
                .append(
                    session.session_id,
                    EventKind::ConvergenceEvaluated,
                    json!({"confidence": decision.confidence, "reasons": decision.reasons}),
                    trace_correlation.clone(),
                )
                .await?;
            if !decision.should_continue {
                session.status = match decision.recommendation {
                    Recommendation::ForceStop if session.turns.is_empty() => SessionStatus::Timeout,
                    _ => SessionStatus::Completed,
                };
                state.termination_reason = decision.termination_reason;
                state.phase = Phase::Terminal;
                break;
            }
        }

        self.journal
            .append(session.session_id, EventKind::SessionTerminated, json!({"status": format!("{:?}", session.status)}), trace_correlation)
            .await?;
        Ok(state)
    }

    /// Calls `speaker`'s adapter, retrying transient failures with backoff
    /// up to `max_retries_per_adapter`, then failing over to an alternate
    /// compatible adapter if the circuit breaker has opened or retries are
    /// exhausted. Returns a permanent error only once every option is gone.
    async fn call_with_resilience(
        &mut self,
        speaker: &str,
        prompt: String,
        session: &Session,
        cancel: &CancellationToken,
        state: &mut OrchestrationState,
    ) -> Result<tab_adapters::AdapterResponse> {
        let mut candidates = vec![speaker.to_string()];
        if let Some(alts) = self.failover.get(speaker) {
            candidates.extend(alts.iter().cloned());
        }

        let mut last_error: Option<OrchestratorError> = None;

        for agent_id in candidates {
            if self.breaker.is_open(&agent_id) {
                self.journal
                    .append(session.session_id, EventKind::CircuitBreakerOpened, json!({"agent_id": agent_id}), None)
                    .await?;
                continue;
            }

            let Some(adapter) = self.adapters.get(&agent_id).cloned() else {
                last_error = Some(OrchestratorError::UnknownAdapter(agent_id));
                continue;
            };

            for attempt in 0..=self.config.max_retries_per_adapter {
                if cancel.is_cancelled() {
                    return Err(OrchestratorError::Cancelled);
                }
                self.journal
                    .append(session.session_id, EventKind::AdapterInvoked, json!({"agent_id": agent_id, "attempt": attempt}), None)
                    .await?;

                let request = SubmitRequest {
                    session_id: session.session_id,
                    prompt: prompt.clone(),
                    resume_token: self.resume_tokens.get(&agent_id).cloned(),
                };

                match adapter.submit(request, cancel.clone()).await {
                    Ok(response) => {
                        self.journal
                            .append(session.session_id, EventKind::AdapterOutcome, json!({"agent_id": agent_id, "outcome": "success"}), None)
                            .await?;
                        self.breaker.record_success(&agent_id);
                        state.record_success();
                        return Ok(response);
                    }
                    Err(err) => {
                        let outcome = AdapterOutcome::from(&err);
                        self.journal
                            .append(
                                session.session_id,
                                EventKind::AdapterOutcome,
                                json!({"agent_id": agent_id, "outcome": format!("{:?}", outcome), "error": err.to_string()}),
                                None,
                            )
                            .await?;
                        match outcome {
                            AdapterOutcome::Cancelled => return Err(OrchestratorError::Cancelled),
                            AdapterOutcome::Permanent => {
                                last_error = Some(OrchestratorError::AdapterPermanent { agent_id: agent_id.clone(), reason: err.to_string() });
                                break;
                            }
                            AdapterOutcome::Transient => {
                                state.record_failure(self.config.circuit_breaker_threshold);
                                let opened = self.breaker.record_failure(&agent_id);
                                if opened {
                                    self.journal
                                        .append(session.session_id, EventKind::CircuitBreakerOpened, json!({"agent_id": agent_id}), None)
                                        .await?;
                                }
                                last_error = Some(OrchestratorError::AdapterTransient { agent_id: agent_id.clone(), reason: err.to_string() });
                                if matches!(err, AdapterError::DeadlineExceeded { .. }) {
                                    last_error = Some(OrchestratorError::DeadlineExceeded { agent_id: agent_id.clone() });
                                }
                                if attempt < self.config.max_retries_per_adapter && !opened {
                                    self.journal
                                        .append(session.session_id, EventKind::RetryScheduled, json!({"agent_id": agent_id, "attempt": attempt + 1}), None)
                                        .await?;
                                    tokio::time::sleep(config::backoff_delay(&self.config, attempt)).await;
                                    continue;
                                }
                                break;
                            }
                            AdapterOutcome::Success => unreachable!("submit() returned Err with a Success outcome"),
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or(OrchestratorError::UnknownAdapter(speaker.to_string())))
    }
}

fn verdict_payload(verdict: &Verdict) -> serde_json::Value {
    match verdict {
        Verdict::Allow => json!({"verdict": "allow"}),
        Verdict::Block { reason } => json!({"verdict": "block", "reason": reason}),
        Verdict::RequireApproval { reason } => json!({"verdict": "require_approval", "reason": reason}),
    }
}

fn log_fields(reason: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("reason".to_string(), json!(reason));
    fields
}
