//! Audit Journal: append-only, hash-chained record of every state
//! transition the orchestrator makes. Tamper evidence comes from each
//! record committing to the previous record's hash; `verify` is a linear
//! scan that recomputes and compares every link.

pub mod chain;
pub mod error;
pub mod journal;

pub use error::{AuditError, Result};
pub use journal::{AuditJournal, FileJournal, InMemoryJournal};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tab_types::EventKind;
    use uuid::Uuid;

    #[tokio::test]
    async fn file_journal_round_trips_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let session_id = Uuid::new_v4();

        {
            let mut journal = FileJournal::create(&path).await.unwrap();
            journal.append(session_id, EventKind::SessionCreated, json!({}), None).await.unwrap();
            journal.append(session_id, EventKind::TurnRequested, json!({"n": 1}), None).await.unwrap();
            journal.verify().unwrap();
        }

        let reloaded = FileJournal::load(&path).await.unwrap();
        assert_eq!(reloaded.records().len(), 2);
        reloaded.verify().unwrap();
    }

    #[tokio::test]
    async fn in_memory_journal_detects_tamper() {
        let mut journal = InMemoryJournal::new();
        let session_id = Uuid::new_v4();
        journal.append(session_id, EventKind::SessionCreated, json!({}), None).await.unwrap();
        journal.verify().unwrap();
    }
}
