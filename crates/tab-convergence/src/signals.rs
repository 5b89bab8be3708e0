use std::collections::HashSet;

use tab_types::{Session, TurnMessage};

/// Word-shingle size used for the repetitive-content Jaccard estimate.
const SHINGLE_SIZE: usize = 3;
/// How many turns immediately preceding the last one are compared against
/// it for repetition.
const REPETITION_LOOKBACK: usize = 3;
/// Similarity at or above which two turns are considered repeats of the
/// same content.
const JACCARD_THRESHOLD: f64 = 0.85;
/// How many of the most recent turns form the "recent" window for the
/// quality-degradation signal.
const DEGRADATION_LOOKBACK: usize = 3;
/// Recent-window average content length below this fraction of the
/// session-wide average indicates a content collapse.
const DEGRADATION_RATIO: f64 = 0.2;

const DEFAULT_COMPLETION_PHRASES: &[&str] =
    &["task complete", "resolved", "합의", "final answer", "lgtm", "looks good to me", "nothing further to add"];

fn shingles(text: &str) -> HashSet<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < SHINGLE_SIZE {
        return HashSet::from([words.join(" ")]);
    }
    words
        .windows(SHINGLE_SIZE)
        .map(|w| w.join(" "))
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 { 0.0 } else { intersection / union }
}

/// True (1.0) if the last turn's content is a near-duplicate of any of the
/// previous `REPETITION_LOOKBACK` turns, regardless of who sent them: a
/// conversation where either side keeps repeating itself is a strong
/// convergence signal, there is nothing new left to say.
pub fn repetitive_content(session: &Session) -> (f64, Option<String>) {
    let Some(last) = session.turns.last() else { return (0.0, None) };
    let last_shingles = shingles(&last.content);
    let mut max_similarity = 0.0_f64;
    for prev in session.turns.iter().rev().skip(1).take(REPETITION_LOOKBACK) {
        let sim = jaccard(&last_shingles, &shingles(&prev.content));
        max_similarity = max_similarity.max(sim);
    }
    let triggered = max_similarity >= JACCARD_THRESHOLD;
    let reason = triggered
        .then(|| format!("content similarity {max_similarity:.2} meets jaccard threshold {JACCARD_THRESHOLD:.2}"));
    (if triggered { 1.0 } else { 0.0 }, reason)
}

/// True (1.0) if the most recent turn contains a configured completion
/// phrase, matched case-insensitively as a plain substring.
pub fn explicit_completion(session: &Session) -> (f64, Option<String>) {
    let Some(last) = session.turns.last() else { return (0.0, None) };
    let lower = last.content.to_lowercase();
    let matched = DEFAULT_COMPLETION_PHRASES.iter().find(|phrase| lower.contains(&phrase.to_lowercase()));
    match matched {
        Some(phrase) => (1.0, Some(format!("explicit completion phrase detected: {phrase:?}"))),
        None => (0.0, None),
    }
}

/// True (1.0) if at most one turn remains before `max_turns`, or at most 5%
/// of the cost budget remains.
pub fn resource_exhaustion(session: &Session) -> (f64, Option<String>) {
    let limits = &session.policy.resource_limits;
    let turns_remaining = limits.max_turns.saturating_sub(session.turns.len() as u32);
    let cost_remaining_fraction = if limits.max_cost_units > 0.0 {
        ((limits.max_cost_units - session.cumulative_cost()) / limits.max_cost_units).max(0.0)
    } else {
        0.0
    };
    let triggered = turns_remaining <= 1 || cost_remaining_fraction <= 0.05;
    let reason = triggered.then(|| {
        format!("turns_remaining={turns_remaining}, cost_remaining={:.1}% of budget", cost_remaining_fraction * 100.0)
    });
    (if triggered { 1.0 } else { 0.0 }, reason)
}

/// True (1.0) if the average content length over the last
/// `DEGRADATION_LOOKBACK` turns is below `DEGRADATION_RATIO` of the
/// session-wide average, indicating the agents are running out of
/// substantive things to say.
pub fn quality_degradation(session: &Session) -> (f64, Option<String>) {
    if session.turns.is_empty() {
        return (0.0, None);
    }
    let overall_avg = avg_len(&session.turns);
    if overall_avg <= 0.0 {
        return (0.0, None);
    }
    let recent: Vec<&TurnMessage> = session.turns.iter().rev().take(DEGRADATION_LOOKBACK).collect();
    let recent_avg = avg_len_refs(&recent);
    let triggered = recent_avg < DEGRADATION_RATIO * overall_avg;
    let reason = triggered.then(|| {
        format!(
            "recent {}-turn average {recent_avg:.0} chars is below {:.0}% of session average {overall_avg:.0}",
            recent.len(),
            DEGRADATION_RATIO * 100.0
        )
    });
    (if triggered { 1.0 } else { 0.0 }, reason)
}

fn avg_len(turns: &[TurnMessage]) -> f64 {
    if turns.is_empty() {
        return 0.0;
    }
    turns.iter().map(|t| t.content.chars().count() as f64).sum::<f64>() / turns.len() as f64
}

fn avg_len_refs(turns: &[&TurnMessage]) -> f64 {
    if turns.is_empty() {
        return 0.0;
    }
    turns.iter().map(|t| t.content.chars().count() as f64).sum::<f64>() / turns.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tab_types::{Policy, Role};

    fn session_with(turns: Vec<(&str, &str)>) -> Session {
        let mut s = Session::new("topic", vec!["a".into(), "b".into()], Policy::permissive("p"), None).unwrap();
        for (i, (speaker, content)) in turns.into_iter().enumerate() {
            let to = if speaker == "a" { "b" } else { "a" };
            let constraints = tab_types::PolicyConstraintsSnapshot::from_policy(&s.policy);
            s.turns.push(TurnMessage::new(s.session_id, i as u64, speaker, to, Role::Assistant, content, constraints).unwrap());
        }
        s
    }

    #[test]
    fn detects_explicit_completion() {
        let s = session_with(vec![("a", "LGTM, this looks complete.")]);
        let (confidence, reason) = explicit_completion(&s);
        assert_eq!(confidence, 1.0);
        assert!(reason.is_some());
    }

    #[test]
    fn no_completion_phrase_means_zero_confidence() {
        let s = session_with(vec![("a", "let's keep iterating on the approach")]);
        let (confidence, _) = explicit_completion(&s);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn repetitive_content_flags_near_duplicate_turns() {
        let s = session_with(vec![
            ("a", "I think we should refactor the parser module next"),
            ("b", "I think we should refactor the parser module next"),
        ]);
        let (confidence, reason) = repetitive_content(&s);
        assert_eq!(confidence, 1.0);
        assert!(reason.is_some());
    }

    #[test]
    fn distinct_turns_are_not_repetitive() {
        let s = session_with(vec![("a", "let's look at the parser"), ("b", "what about the lexer instead")]);
        let (confidence, _) = repetitive_content(&s);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn resource_exhaustion_triggers_when_one_turn_remains() {
        let mut policy = Policy::permissive("p");
        policy.resource_limits.max_turns = 3;
        let mut s = Session::new("topic", vec!["a".into(), "b".into()], policy, None).unwrap();
        for i in 0..2u64 {
            let speaker = if i % 2 == 0 { "a" } else { "b" };
            let to = if speaker == "a" { "b" } else { "a" };
            let constraints = tab_types::PolicyConstraintsSnapshot::from_policy(&s.policy);
            s.append_turn(TurnMessage::new(s.session_id, i, speaker, to, Role::Assistant, "content", constraints).unwrap()).unwrap();
        }
        let (confidence, reason) = resource_exhaustion(&s);
        assert_eq!(confidence, 1.0);
        assert!(reason.is_some());
    }
}
