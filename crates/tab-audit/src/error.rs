use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("journal write failed: {0}")]
    WriteFailed(String),

    #[error("journal io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal record at index {index} failed to deserialize: {reason}")]
    Corrupt { index: u64, reason: String },

    #[error(transparent)]
    Invariant(#[from] tab_types::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;
