use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::convergence::ConvergenceSignals;
use crate::error::{Error, Result};
use crate::policy::Policy;
use crate::turn::{Attachment, Role, Speaker, TurnMessage};

/// Maximum length, in characters, a session's `topic` may have.
pub const MAX_TOPIC_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Completed,
    Failed,
    Timeout,
}

/// A bounded, bidirectional dialogue between two or more agent adapters.
/// `Session` owns the append-only turn history; all mutation goes through
/// `append_turn`, which enforces strict sequencing and speaker membership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub session_id: Uuid,
    pub topic: String,
    pub participants: Vec<Speaker>,
    pub policy: Policy,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub turns: Vec<TurnMessage>,
}

impl Session {
    pub fn new(
        topic: impl Into<String>,
        participants: Vec<Speaker>,
        policy: Policy,
        initial_speaker: Option<&str>,
    ) -> Result<Self> {
        if participants.len() < 2 {
            return Err(Error::InsufficientParticipants(participants.len()));
        }
        let topic = topic.into();
        if topic.is_empty() || topic.chars().count() > MAX_TOPIC_CHARS {
            return Err(Error::InvalidTopic { max: MAX_TOPIC_CHARS, actual: topic.chars().count() });
        }
        policy.validate()?;

        let participants = match initial_speaker {
            None => participants,
            Some(first) => {
                let idx = participants
                    .iter()
                    .position(|p| p == first)
                    .ok_or_else(|| Error::UnknownSpeaker { session_id: "(new session)".into(), speaker: first.to_string() })?;
                let mut rotated = participants[idx..].to_vec();
                rotated.extend_from_slice(&participants[..idx]);
                rotated
            }
        };

        Ok(Self {
            session_id: Uuid::new_v4(),
            topic,
            participants,
            policy,
            status: SessionStatus::Active,
            created_at: Utc::now(),
            turns: Vec::new(),
        })
    }

    pub fn next_sequence(&self) -> u64 {
        self.turns.len() as u64
    }

    /// Appends a turn, validating speaker membership and strict ordering.
    /// This is the only mutation path into `turns`; the orchestrator never
    /// pushes directly.
    pub fn append_turn(&mut self, turn: TurnMessage) -> Result<()> {
        if !self.participants.contains(&turn.from_agent) {
            return Err(Error::UnknownSpeaker {
                session_id: self.session_id.to_string(),
                speaker: turn.from_agent.clone(),
            });
        }
        let expected = self.next_sequence();
        if turn.sequence != expected {
            return Err(Error::SequenceOutOfOrder { expected, actual: turn.sequence });
        }
        self.turns.push(turn);
        Ok(())
    }

    /// Next speaker under strict round-robin alternation over `participants`.
    pub fn next_speaker(&self) -> &Speaker {
        let idx = self.turns.len() % self.participants.len();
        &self.participants[idx]
    }

    /// The participant `from_agent`'s turn is addressed to: the next speaker
    /// in round-robin order after `from_agent`.
    pub fn addressee_of(&self, from_agent: &str) -> Speaker {
        let idx = self.participants.iter().position(|p| p == from_agent).unwrap_or(0);
        let next = (idx + 1) % self.participants.len();
        self.participants[next].clone()
    }

    pub fn cumulative_cost(&self) -> f64 {
        self.turns.iter().filter_map(|t| t.cost_units).sum()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    /// Newest-first, optionally filtered to one agent's turns, in the
    /// normalized shape a prompt-construction or UI layer consumes. Pure
    /// read-only projection; never mutates `turns`.
    pub fn recent(&self, limit: usize, agent_filter: Option<&str>) -> Vec<RecentTurn> {
        self.turns
            .iter()
            .rev()
            .filter(|t| agent_filter.map_or(true, |a| t.from_agent == a))
            .take(limit)
            .map(RecentTurn::from)
            .collect()
    }

    pub fn summary_stats(&self) -> SummaryStats {
        let total_turns = self.turns.len();
        let total_cost = self.cumulative_cost();
        let avg_content_length = if total_turns == 0 {
            0.0
        } else {
            self.turns.iter().map(|t| t.content.chars().count() as f64).sum::<f64>() / total_turns as f64
        };
        let mut per_agent_turn_counts: HashMap<String, usize> = HashMap::new();
        for t in &self.turns {
            *per_agent_turn_counts.entry(t.from_agent.clone()).or_insert(0) += 1;
        }
        SummaryStats {
            total_turns,
            total_cost,
            avg_content_length,
            per_agent_turn_counts,
            duration_seconds: self.elapsed().num_seconds(),
        }
    }

    pub fn status_report(&self) -> StatusReport {
        let limits = &self.policy.resource_limits;
        let turn_progress = TurnProgress { current: self.turns.len() as u32, max: limits.max_turns };
        let budget_progress = BudgetProgress { used: self.cumulative_cost(), total: limits.max_cost_units };

        let mut indicators = Vec::new();
        if turn_progress.max > 0 && turn_progress.current as f64 / turn_progress.max as f64 >= 0.8 {
            indicators.push("approaching turn limit".to_string());
        }
        if budget_progress.total > 0.0 && budget_progress.used / budget_progress.total >= 0.8 {
            indicators.push("approaching cost budget".to_string());
        }

        let next_actions = match self.status {
            SessionStatus::Active => vec!["continue conversation".to_string()],
            SessionStatus::Completed => vec!["export audit trail".to_string()],
            SessionStatus::Failed => vec!["inspect adapter failure".to_string()],
            SessionStatus::Timeout => vec!["review deadline configuration".to_string()],
        };

        StatusReport { status: self.status, turn_progress, budget_progress, indicators, next_actions }
    }

    /// Pure threshold check over a convergence analysis result and the
    /// session's own resource state, independent of the convergence
    /// controller's weighted composite confidence. Returns true iff any of:
    /// explicit completion confidence ≥ 0.8; resource exhaustion (≥95% of
    /// turn or cost budget consumed) with confidence ≥ 0.6; or repetitive
    /// content with confidence ≥ 0.7.
    pub fn should_auto_complete(&self, signals: &ConvergenceSignals) -> bool {
        let limits = &self.policy.resource_limits;
        let turn_fraction = if limits.max_turns > 0 { self.turns.len() as f64 / limits.max_turns as f64 } else { 0.0 };
        let cost_fraction = if limits.max_cost_units > 0.0 { self.cumulative_cost() / limits.max_cost_units } else { 0.0 };
        let resource_nearly_exhausted = turn_fraction >= 0.95 || cost_fraction >= 0.95;

        signals.explicit_completion >= 0.8
            || (resource_nearly_exhausted && signals.resource_exhaustion >= 0.6)
            || signals.repetitive_content >= 0.7
    }
}

/// Normalized chat-shape view of a single turn, as returned by
/// `Session::recent`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentTurn {
    pub role: Role,
    pub content: String,
    pub from_agent: Speaker,
    pub timestamp: DateTime<Utc>,
    pub attachments: Option<Vec<Attachment>>,
}

impl From<&TurnMessage> for RecentTurn {
    fn from(t: &TurnMessage) -> Self {
        Self {
            role: t.role,
            content: t.content.clone(),
            from_agent: t.from_agent.clone(),
            timestamp: t.timestamp,
            attachments: if t.attachments.is_empty() { None } else { Some(t.attachments.clone()) },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryStats {
    pub total_turns: usize,
    pub total_cost: f64,
    pub avg_content_length: f64,
    pub per_agent_turn_counts: HashMap<String, usize>,
    pub duration_seconds: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TurnProgress {
    pub current: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BudgetProgress {
    pub used: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusReport {
    pub status: SessionStatus,
    pub turn_progress: TurnProgress,
    pub budget_progress: BudgetProgress,
    pub indicators: Vec<String>,
    pub next_actions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::PolicyConstraintsSnapshot;

    fn policy() -> Policy {
        Policy::permissive("p1")
    }

    fn turn(session: &Session, seq: u64, from: &str, to: &str, content: &str) -> TurnMessage {
        TurnMessage::new(session.session_id, seq, from, to, Role::Assistant, content, PolicyConstraintsSnapshot::from_policy(&session.policy))
            .unwrap()
    }

    #[test]
    fn rejects_single_participant() {
        let err = Session::new("topic", vec!["a".into()], policy(), None).unwrap_err();
        assert!(matches!(err, Error::InsufficientParticipants(1)));
    }

    #[test]
    fn rejects_empty_topic() {
        let err = Session::new("", vec!["a".into(), "b".into()], policy(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidTopic { .. }));
    }

    #[test]
    fn rejects_overlong_topic() {
        let topic = "x".repeat(MAX_TOPIC_CHARS + 1);
        let err = Session::new(topic, vec!["a".into(), "b".into()], policy(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidTopic { .. }));
    }

    #[test]
    fn appends_in_order_and_rotates_speaker() {
        let mut s = Session::new("topic", vec!["claude".into(), "codex".into()], policy(), None).unwrap();
        assert_eq!(s.next_speaker(), "claude");
        let t0 = turn(&s, 0, "claude", "codex", "hello");
        s.append_turn(t0).unwrap();
        assert_eq!(s.next_speaker(), "codex");
        let t1 = turn(&s, 1, "codex", "claude", "hi back");
        s.append_turn(t1).unwrap();
        assert_eq!(s.next_speaker(), "claude");
    }

    #[test]
    fn initial_speaker_overrides_default_rotation() {
        let s = Session::new("topic", vec!["claude".into(), "codex".into()], policy(), Some("codex")).unwrap();
        assert_eq!(s.next_speaker(), "codex");
    }

    #[test]
    fn rejects_unknown_speaker() {
        let mut s = Session::new("topic", vec!["claude".into(), "codex".into()], policy(), None).unwrap();
        let bad = turn(&s, 0, "gemini", "claude", "hello");
        assert!(matches!(s.append_turn(bad), Err(Error::UnknownSpeaker { .. })));
    }

    #[test]
    fn rejects_out_of_order_sequence() {
        let s = Session::new("topic", vec!["claude".into(), "codex".into()], policy(), None).unwrap();
        let bad = turn(&s, 5, "claude", "codex", "hello");
        let mut s = s;
        assert!(matches!(s.append_turn(bad), Err(Error::SequenceOutOfOrder { expected: 0, actual: 5 })));
    }

    #[test]
    fn recent_returns_newest_first_and_respects_filter() {
        let mut s = Session::new("topic", vec!["a".into(), "b".into()], policy(), None).unwrap();
        s.append_turn(turn(&s, 0, "a", "b", "first")).unwrap();
        s.append_turn(turn(&s, 1, "b", "a", "second")).unwrap();
        s.append_turn(turn(&s, 2, "a", "b", "third")).unwrap();

        let all = s.recent(2, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content, "third");
        assert_eq!(all[1].content, "second");

        let filtered = s.recent(10, Some("a"));
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|t| t.from_agent == "a"));
    }

    #[test]
    fn summary_stats_tracks_per_agent_counts_and_cost() {
        let mut s = Session::new("topic", vec!["a".into(), "b".into()], policy(), None).unwrap();
        s.append_turn(turn(&s, 0, "a", "b", "first").with_cost_units(0.1)).unwrap();
        s.append_turn(turn(&s, 1, "b", "a", "second").with_cost_units(0.2)).unwrap();

        let stats = s.summary_stats();
        assert_eq!(stats.total_turns, 2);
        assert!((stats.total_cost - 0.3).abs() < 1e-9);
        assert_eq!(stats.per_agent_turn_counts.get("a"), Some(&1));
        assert_eq!(stats.per_agent_turn_counts.get("b"), Some(&1));
    }

    #[test]
    fn should_auto_complete_on_high_explicit_confidence() {
        let s = Session::new("topic", vec!["a".into(), "b".into()], policy(), None).unwrap();
        let signals = ConvergenceSignals { explicit_completion: 0.9, ..Default::default() };
        assert!(s.should_auto_complete(&signals));
    }

    #[test]
    fn should_auto_complete_requires_confidence_floor_for_repetition() {
        let s = Session::new("topic", vec!["a".into(), "b".into()], policy(), None).unwrap();
        let low = ConvergenceSignals { repetitive_content: 0.5, ..Default::default() };
        assert!(!s.should_auto_complete(&low));
        let high = ConvergenceSignals { repetitive_content: 0.75, ..Default::default() };
        assert!(s.should_auto_complete(&high));
    }
}
