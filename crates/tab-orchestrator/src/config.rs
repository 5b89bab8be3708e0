use std::time::Duration;

/// Orchestrator-wide knobs that govern the loop itself rather than any one
/// turn's content. Distinct from `Policy`, which binds to a session.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_cooldown: Duration,
    pub max_retries_per_adapter: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            circuit_breaker_threshold: 3,
            circuit_breaker_cooldown: Duration::from_secs(30),
            max_retries_per_adapter: 2,
            backoff_base: Duration::from_millis(500),
            backoff_max: Duration::from_secs(10),
        }
    }
}

/// Exponential backoff with a hard cap, `base * 2^attempt` clamped to `max`.
pub fn backoff_delay(config: &OrchestratorConfig, attempt: u32) -> Duration {
    let scaled = config.backoff_base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    scaled.min(config.backoff_max)
}
