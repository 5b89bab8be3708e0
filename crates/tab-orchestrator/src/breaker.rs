use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-adapter circuit breaker: opens after `threshold` consecutive
/// failures and refuses further calls until `cooldown` has elapsed, at
/// which point it half-opens (the next call is allowed through; success
/// closes it, failure re-opens it and restarts the cooldown).
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    state: HashMap<String, BreakerState>,
}

struct BreakerState {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self { threshold, cooldown, state: HashMap::new() }
    }

    /// True if calls to `agent_id` should currently be refused.
    pub fn is_open(&self, agent_id: &str) -> bool {
        match self.state.get(agent_id) {
            Some(BreakerState { opened_at: Some(opened_at), .. }) => opened_at.elapsed() < self.cooldown,
            _ => false,
        }
    }

    pub fn record_success(&mut self, agent_id: &str) {
        self.state.remove(agent_id);
    }

    /// Records a failure, returning `true` if this failure just opened the
    /// breaker.
    pub fn record_failure(&mut self, agent_id: &str) -> bool {
        let entry = self.state.entry(agent_id.to_string()).or_insert(BreakerState { consecutive_failures: 0, opened_at: None });
        entry.consecutive_failures += 1;
        if entry.consecutive_failures >= self.threshold && entry.opened_at.is_none() {
            entry.opened_at = Some(Instant::now());
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let mut breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        assert!(!breaker.is_open("a"));
        assert!(!breaker.record_failure("a"));
        assert!(breaker.record_failure("a"));
        assert!(breaker.is_open("a"));
    }

    #[test]
    fn success_resets_state() {
        let mut breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        breaker.record_failure("a");
        breaker.record_success("a");
        assert!(!breaker.is_open("a"));
        assert!(!breaker.record_failure("a"));
    }
}
