use thiserror::Error;

/// Validation failures raised while constructing or mutating core data model
/// types. Every other crate's `Error` enum wraps this one rather than
/// duplicating the invariant checks.
#[derive(Debug, Error)]
pub enum Error {
    #[error("session must have at least two participants, got {0}")]
    InsufficientParticipants(usize),

    #[error("turn speaker {speaker} is not a registered participant of session {session_id}")]
    UnknownSpeaker { session_id: String, speaker: String },

    #[error("turn sequence out of order: expected {expected}, got {actual}")]
    SequenceOutOfOrder { expected: u64, actual: u64 },

    #[error("resource limit {0} must be greater than zero")]
    InvalidResourceLimit(&'static str),

    #[error("audit record {index} has a broken hash chain: expected prev_hash {expected}, got {actual}")]
    BrokenHashChain {
        index: u64,
        expected: String,
        actual: String,
    },

    #[error("policy {0} has no file access rules but require_explicit_file_rules is set")]
    EmptyFileAccessRules(String),

    #[error("malformed adapter descriptor: {0}")]
    InvalidAdapterDescriptor(String),

    #[error("turn content must not be empty")]
    EmptyContent,

    #[error("turn from_agent and to_agent must differ, both were '{0}'")]
    SameFromAndToAgent(String),

    #[error("session topic must be between 1 and {max} characters, got {actual}")]
    InvalidTopic { max: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
