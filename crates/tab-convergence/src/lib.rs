//! Budget & Convergence Controller: combines four independent boolean
//! signals into a single confidence score and a continue/stop
//! recommendation, run once per turn after it has been appended to the
//! session.

mod signals;

use tab_types::{ConvergenceSignals, Session, TerminationReason};

/// Relative weight of each signal in the composite score. Explicit
/// completion dominates: an agent stating the task is done is a stronger
/// signal than any heuristic. Quality degradation is weighted lightest,
/// it is the noisiest of the four.
const WEIGHT_EXPLICIT: f64 = 0.5;
const WEIGHT_EXHAUSTION: f64 = 0.3;
const WEIGHT_REPETITIVE: f64 = 0.15;
const WEIGHT_DEGRADATION: f64 = 0.05;

/// Confidence at or above which the controller recommends stopping.
const STOP_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Continue,
    Converge,
    /// A hard resource limit has been crossed; the orchestrator must stop
    /// regardless of confidence in the other signals.
    ForceStop,
}

#[derive(Debug, Clone)]
pub struct ConvergenceDecision {
    pub should_continue: bool,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub recommendation: Recommendation,
    pub signals: ConvergenceSignals,
    /// Set whenever `recommendation` is not `Continue`; `None` means the
    /// conversation is still live.
    pub termination_reason: Option<TerminationReason>,
}

pub struct ConvergenceController;

impl ConvergenceController {
    pub fn evaluate(session: &Session) -> ConvergenceDecision {
        let limits = &session.policy.resource_limits;
        let hard_turns_exceeded = session.turns.len() as u64 >= limits.max_turns as u64;
        let hard_time_exceeded = session.elapsed().num_seconds() as u64 >= limits.max_wall_clock.as_secs();
        let hard_cost_exceeded = session.cumulative_cost() >= limits.max_cost_units;

        if hard_turns_exceeded || hard_time_exceeded || hard_cost_exceeded {
            let termination_reason =
                if hard_time_exceeded { TerminationReason::DeadlineExceeded } else { TerminationReason::BudgetExceeded };
            return ConvergenceDecision {
                should_continue: false,
                confidence: 1.0,
                reasons: vec!["hard resource limit exceeded".to_string()],
                recommendation: Recommendation::ForceStop,
                signals: ConvergenceSignals::default(),
                termination_reason: Some(termination_reason),
            };
        }

        let (explicit_score, explicit_reason) = signals::explicit_completion(session);
        let (exhaustion_score, exhaustion_reason) = signals::resource_exhaustion(session);
        let (repetitive_score, repetitive_reason) = signals::repetitive_content(session);
        let (degradation_score, degradation_reason) = signals::quality_degradation(session);

        let signals = ConvergenceSignals {
            explicit_completion: explicit_score,
            resource_exhaustion: exhaustion_score,
            repetitive_content: repetitive_score,
            quality_degradation: degradation_score,
        };

        let confidence = explicit_score * WEIGHT_EXPLICIT
            + exhaustion_score * WEIGHT_EXHAUSTION
            + repetitive_score * WEIGHT_REPETITIVE
            + degradation_score * WEIGHT_DEGRADATION;

        let reasons: Vec<String> =
            [explicit_reason, exhaustion_reason, repetitive_reason, degradation_reason].into_iter().flatten().collect();

        let should_continue = confidence < STOP_THRESHOLD;
        let recommendation = if should_continue { Recommendation::Continue } else { Recommendation::Converge };

        // Dominant active signal, in fixed priority order, names the reason
        // reported to the session when converging.
        let termination_reason = if should_continue {
            None
        } else if explicit_score >= 1.0 {
            Some(TerminationReason::ExplicitCompletion)
        } else if exhaustion_score >= 1.0 {
            Some(TerminationReason::ResourceExhaustion)
        } else if repetitive_score >= 1.0 {
            Some(TerminationReason::ConvergedRepetition)
        } else {
            Some(TerminationReason::ConvergedDegradation)
        };

        ConvergenceDecision { should_continue, confidence, reasons, recommendation, signals, termination_reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tab_types::{Policy, PolicyConstraintsSnapshot, Role, TurnMessage};

    fn turn(session: &Session, sequence: u64, from: &str, to: &str, content: &str) -> TurnMessage {
        let constraints = PolicyConstraintsSnapshot::from_policy(&session.policy);
        TurnMessage::new(session.session_id, sequence, from, to, Role::Assistant, content, constraints).unwrap()
    }

    #[test]
    fn empty_session_continues() {
        let s = Session::new("topic", vec!["a".into(), "b".into()], Policy::permissive("p"), None).unwrap();
        let decision = ConvergenceController::evaluate(&s);
        assert!(decision.should_continue);
        assert_eq!(decision.recommendation, Recommendation::Continue);
        assert!(decision.termination_reason.is_none());
    }

    #[test]
    fn explicit_completion_pushes_toward_converge() {
        // Repeats the exact completion phrase back, so both the explicit and
        // repetitive signals fire and the composite confidence clears
        // STOP_THRESHOLD; explicit still wins the reported reason by priority.
        let mut s = Session::new("topic", vec!["a".into(), "b".into()], Policy::permissive("p"), None).unwrap();
        let t0 = turn(&s, 0, "a", "b", "LGTM, nothing further to add");
        s.append_turn(t0).unwrap();
        let t1 = turn(&s, 1, "b", "a", "LGTM, nothing further to add");
        s.append_turn(t1).unwrap();
        let decision = ConvergenceController::evaluate(&s);
        assert!(decision.confidence >= WEIGHT_EXPLICIT);
        assert!(!decision.should_continue);
        assert_eq!(decision.termination_reason, Some(TerminationReason::ExplicitCompletion));
    }

    #[test]
    fn exceeding_max_turns_forces_stop() {
        let mut policy = Policy::permissive("p");
        policy.resource_limits.max_turns = 2;
        let mut s = Session::new("topic", vec!["a".into(), "b".into()], policy, None).unwrap();
        let t0 = turn(&s, 0, "a", "b", "turn one");
        s.append_turn(t0).unwrap();
        let t1 = turn(&s, 1, "b", "a", "turn two");
        s.append_turn(t1).unwrap();
        let decision = ConvergenceController::evaluate(&s);
        assert_eq!(decision.recommendation, Recommendation::ForceStop);
        assert!(!decision.should_continue);
        assert_eq!(decision.termination_reason, Some(TerminationReason::BudgetExceeded));
    }

    #[test]
    fn exceeding_wall_clock_reports_deadline_exceeded() {
        let mut policy = Policy::permissive("p");
        policy.resource_limits.max_wall_clock = std::time::Duration::from_secs(0);
        let s = Session::new("topic", vec!["a".into(), "b".into()], policy, None).unwrap();
        let decision = ConvergenceController::evaluate(&s);
        assert_eq!(decision.termination_reason, Some(TerminationReason::DeadlineExceeded));
    }
}
