//! Agent Adapter Contract: drives headless coding-agent CLIs as child
//! processes over one of two transports (`LINE_JSON_STDOUT`,
//! `ROLLOUT_JOURNAL`) behind a single trait the orchestrator depends on.

pub mod contract;
pub mod error;
mod line_json_stdout;
mod rollout_journal;

pub use contract::{AdapterResponse, AgentAdapter, SubmitRequest};
pub use error::{AdapterError, AdapterOutcome, Result};
pub use line_json_stdout::LineJsonStdoutAdapter;
pub use rollout_journal::RolloutJournalAdapter;

use std::path::PathBuf;

use tab_types::{AgentAdapterDescriptor, TransportKind};

/// Builds the concrete adapter a descriptor's `transport` calls for. This is
/// the only place `TransportKind` is matched on to produce a trait object;
/// everything downstream holds `Box<dyn AgentAdapter>`.
pub fn build_adapter(descriptor: AgentAdapterDescriptor) -> Result<Box<dyn AgentAdapter>> {
    descriptor.validate()?;
    match descriptor.transport.clone() {
        TransportKind::LineJsonStdout => Ok(Box::new(LineJsonStdoutAdapter::new(descriptor))),
        TransportKind::RolloutJournal { journal_root } => {
            Ok(Box::new(RolloutJournalAdapter::new(descriptor, PathBuf::from(journal_root))))
        }
    }
}
