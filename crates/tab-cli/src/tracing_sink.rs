use std::sync::atomic::{AtomicU64, Ordering};

use tab_observability::{Fields, Level, Sink, SpanId};

/// The one concrete `Sink` implementation this workspace ships, built on
/// `tracing`. Spans are represented as start/end event pairs carrying a
/// generated correlation id rather than real `tracing::Span` objects, since
/// `Sink` hands out span identity dynamically and `tracing`'s span
/// machinery wants its name known at the callsite.
pub struct TracingSink {
    next_id: AtomicU64,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self { next_id: AtomicU64::new(1) }
    }
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the global `tracing` subscriber, reading filter directives
    /// from `RUST_LOG` (defaulting to `info`). Only `tab-cli` ever touches
    /// this; core crates never configure logging themselves.
    pub fn install_global_subscriber() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
            .with_target(false)
            .init();
    }
}

fn fields_to_json(fields: &Fields) -> serde_json::Value {
    serde_json::Value::Object(fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

impl Sink for TracingSink {
    fn start_span(&self, name: &str, fields: Fields) -> SpanId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::info!(span_id = id, name, fields = %fields_to_json(&fields), "span_start");
        SpanId(id)
    }

    fn end_span(&self, span: SpanId) {
        tracing::info!(span_id = span.0, "span_end");
    }

    fn add_event(&self, span: SpanId, name: &str, fields: Fields) {
        tracing::info!(span_id = span.0, name, fields = %fields_to_json(&fields), "event");
    }

    fn record_metric(&self, name: &str, value: f64, fields: Fields) {
        tracing::info!(metric = name, value, fields = %fields_to_json(&fields), "metric");
    }

    fn log(&self, level: Level, message: &str, fields: Fields) {
        let fields_json = fields_to_json(&fields);
        match level {
            Level::Trace => tracing::trace!(fields = %fields_json, "{message}"),
            Level::Debug => tracing::debug!(fields = %fields_json, "{message}"),
            Level::Info => tracing::info!(fields = %fields_json, "{message}"),
            Level::Warn => tracing::warn!(fields = %fields_json, "{message}"),
            Level::Error => tracing::error!(fields = %fields_json, "{message}"),
        }
    }
}
