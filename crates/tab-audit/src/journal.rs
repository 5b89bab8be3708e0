use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tab_types::{AuditRecord, EventKind};
use uuid::Uuid;

use crate::chain::{next_record, verify_chain};
use crate::error::{AuditError, Result};

/// Append-only audit journal. Every append is durable before it returns
/// (for the file-backed implementation, via an explicit `sync_all`), and
/// `verify` is a read-only operation that never mutates the chain.
#[async_trait]
pub trait AuditJournal: Send + Sync {
    async fn append(
        &mut self,
        session_id: Uuid,
        kind: EventKind,
        payload: serde_json::Value,
        trace_correlation: Option<String>,
    ) -> Result<AuditRecord>;

    fn records(&self) -> &[AuditRecord];

    fn verify(&self) -> Result<()> {
        verify_chain(self.records()).map_err(|(index, expected, actual)| tab_types::Error::BrokenHashChain {
            index,
            expected,
            actual,
        }.into())
    }
}

/// Journal kept entirely in memory, for tests and for runs that export the
/// journal at the end rather than streaming it to disk.
#[derive(Default)]
pub struct InMemoryJournal {
    records: Vec<AuditRecord>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditJournal for InMemoryJournal {
    async fn append(
        &mut self,
        session_id: Uuid,
        kind: EventKind,
        payload: serde_json::Value,
        trace_correlation: Option<String>,
    ) -> Result<AuditRecord> {
        let prev = self.records.last();
        let record = next_record(session_id, prev, kind, payload, trace_correlation);
        self.records.push(record.clone());
        Ok(record)
    }

    fn records(&self) -> &[AuditRecord] {
        &self.records
    }
}

/// Journal that mirrors every append to a JSONL file on disk, one record
/// per line, flushed and fsynced before `append` returns. Keeps the full
/// history in memory as well so `verify`/`records` don't need to re-read
/// the file.
pub struct FileJournal {
    path: PathBuf,
    file: tokio::fs::File,
    records: Vec<AuditRecord>,
}

impl FileJournal {
    /// Opens `path` for append, creating it if absent. Does not replay any
    /// existing content; use `load` to resume from a prior run.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::OpenOptions::new().create(true).append(true).open(&path).await?;
        Ok(Self { path, file, records: Vec::new() })
    }

    /// Opens `path` and replays its contents into memory, verifying the
    /// chain as it goes, so appends can continue from where a previous
    /// process left off.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = tokio::fs::read_to_string(&path).await.unwrap_or_default();
        let mut records = Vec::new();
        for (i, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: AuditRecord = serde_json::from_str(line)
                .map_err(|e| AuditError::Corrupt { index: i as u64, reason: e.to_string() })?;
            records.push(record);
        }
        verify_chain(&records).map_err(|(index, expected, actual)| {
            AuditError::Invariant(tab_types::Error::BrokenHashChain { index, expected, actual })
        })?;
        let file = tokio::fs::OpenOptions::new().create(true).append(true).open(&path).await?;
        Ok(Self { path, file, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditJournal for FileJournal {
    async fn append(
        &mut self,
        session_id: Uuid,
        kind: EventKind,
        payload: serde_json::Value,
        trace_correlation: Option<String>,
    ) -> Result<AuditRecord> {
        use tokio::io::AsyncWriteExt;

        let prev = self.records.last();
        let record = next_record(session_id, prev, kind, payload, trace_correlation);
        let mut line = serde_json::to_string(&record).map_err(|e| AuditError::WriteFailed(e.to_string()))?;
        line.push('\n');
        self.file.write_all(line.as_bytes()).await?;
        self.file.sync_all().await?;
        self.records.push(record.clone());
        Ok(record)
    }

    fn records(&self) -> &[AuditRecord] {
        &self.records
    }
}
