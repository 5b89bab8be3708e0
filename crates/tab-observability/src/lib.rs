//! Observability Sink: the interface the orchestrator and adapters emit
//! spans, events, metrics, and logs through. Deliberately dependency-free —
//! no tracing, no metrics crate, nothing that ties a core library crate to a
//! particular exporter. `tab-cli` provides the one concrete implementation
//! this workspace ships, built on `tracing`.

use std::collections::HashMap;

/// Severity for a structured log line, independent of any particular
/// logging crate's own level type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

pub type Fields = HashMap<String, serde_json::Value>;

/// Opaque handle to a started span. Sinks are free to make this whatever
/// they need internally (an index, a real tracing span id); callers only
/// ever pass it back to `end_span`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(pub u64);

/// Everything the orchestrator and adapters need to report about what's
/// happening, without depending on how (or whether) it gets exported.
pub trait Sink: Send + Sync {
    fn start_span(&self, name: &str, fields: Fields) -> SpanId;
    fn end_span(&self, span: SpanId);
    fn add_event(&self, span: SpanId, name: &str, fields: Fields);
    fn record_metric(&self, name: &str, value: f64, fields: Fields);
    fn log(&self, level: Level, message: &str, fields: Fields);
}

/// Discards everything. The default sink when nothing else is configured,
/// and a convenient baseline in tests that don't care about observability
/// output.
#[derive(Default)]
pub struct NoopSink;

impl Sink for NoopSink {
    fn start_span(&self, _name: &str, _fields: Fields) -> SpanId {
        SpanId(0)
    }

    fn end_span(&self, _span: SpanId) {}

    fn add_event(&self, _span: SpanId, _name: &str, _fields: Fields) {}

    fn record_metric(&self, _name: &str, _value: f64, _fields: Fields) {}

    fn log(&self, _level: Level, _message: &str, _fields: Fields) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_accepts_all_calls_without_panicking() {
        let sink = NoopSink;
        let span = sink.start_span("turn", Fields::new());
        sink.add_event(span, "submitted", Fields::new());
        sink.record_metric("turns_total", 1.0, Fields::new());
        sink.log(Level::Info, "hello", Fields::new());
        sink.end_span(span);
    }
}
