use serde::{Deserialize, Serialize};

/// Per-signal confidence scores produced by the Budget & Convergence
/// Controller (`tab-convergence`). Lives here rather than in that crate so
/// `Session::should_auto_complete` (a C1 operation) can apply its own
/// thresholds without `tab-types` depending on `tab-convergence`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceSignals {
    pub explicit_completion: f64,
    pub resource_exhaustion: f64,
    pub repetitive_content: f64,
    pub quality_degradation: f64,
}
