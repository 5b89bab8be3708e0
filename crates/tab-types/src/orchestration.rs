use serde::{Deserialize, Serialize};

use crate::termination::TerminationReason;

/// Phase of the per-turn state machine the Conversation Orchestrator drives.
/// A turn always advances linearly through these phases (never skips,
/// never goes backward) before either returning to `PolicyPre` for the next
/// turn or moving to `Terminal`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    PolicyPre,
    AdapterCall,
    PolicyPost,
    Append,
    Converge,
    Terminal,
}

impl Phase {
    /// The phase that follows this one on the successful path. `Terminal`
    /// has no successor and `Converge` loops back to `PolicyPre`.
    pub fn next(self) -> Phase {
        match self {
            Phase::Init => Phase::PolicyPre,
            Phase::PolicyPre => Phase::AdapterCall,
            Phase::AdapterCall => Phase::PolicyPost,
            Phase::PolicyPost => Phase::Append,
            Phase::Append => Phase::Converge,
            Phase::Converge => Phase::PolicyPre,
            Phase::Terminal => Phase::Terminal,
        }
    }
}

/// Live, in-memory state of a conversation in progress. Distinct from
/// `Session`, which is the durable record of what happened; this tracks
/// control-flow bookkeeping the orchestrator needs while driving the loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrchestrationState {
    pub phase: Phase,
    pub current_speaker_index: usize,
    pub consecutive_failures: u32,
    pub circuit_open: bool,
    /// Number of turns attempted against the currently selected adapter
    /// since the last successful turn, used to decide when to fail over to
    /// an alternate compatible adapter.
    pub retries_on_current_adapter: u32,
    /// Set once the loop reaches `Terminal`, distinguishing *why* the
    /// session stopped from its coarse `SessionStatus`.
    pub termination_reason: Option<TerminationReason>,
}

impl Default for OrchestrationState {
    fn default() -> Self {
        Self {
            phase: Phase::Init,
            current_speaker_index: 0,
            consecutive_failures: 0,
            circuit_open: false,
            retries_on_current_adapter: 0,
            termination_reason: None,
        }
    }
}

impl OrchestrationState {
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.retries_on_current_adapter = 0;
        self.circuit_open = false;
    }

    pub fn record_failure(&mut self, breaker_threshold: u32) {
        self.consecutive_failures += 1;
        self.retries_on_current_adapter += 1;
        if self.consecutive_failures >= breaker_threshold {
            self.circuit_open = true;
        }
    }
}
