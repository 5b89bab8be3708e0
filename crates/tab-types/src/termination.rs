use serde::{Deserialize, Serialize};

/// Why a session stopped accepting further turns, distinct from
/// `SessionStatus` (the coarse terminal state): two sessions can both end
/// `Completed` for entirely different reasons, and callers building an
/// egress summary need to tell those apart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminationReason {
    /// An agent's turn matched a configured completion phrase.
    ExplicitCompletion,
    /// The convergence controller's repetitive-content signal dominated.
    ConvergedRepetition,
    /// The convergence controller's quality-degradation signal dominated.
    ConvergedDegradation,
    /// Soft resource-exhaustion signal dominated the convergence decision.
    ResourceExhaustion,
    /// A hard cost or turn-count ceiling was crossed.
    BudgetExceeded,
    /// A hard wall-clock deadline was crossed.
    DeadlineExceeded,
    /// The policy enforcer denied the turn outright.
    PolicyDenied,
    /// An adapter failed permanently, or transiently past its retry budget.
    AdapterFailure,
    /// The run was cancelled by its caller.
    Cancelled,
}
