use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Instant, SystemTime};

use async_trait::async_trait;
use tab_types::AgentAdapterDescriptor;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::process::Command;
use tokio::time::{interval, timeout, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::contract::{AdapterResponse, AgentAdapter, SubmitRequest};
use crate::error::{AdapterError, Result};

use super::discovery::find_newest_journal;
use super::schema::{EventMsgPayload, JournalRecord, ResponseItemPayload};

/// How often the tail loop re-checks the journal file for newly appended
/// lines once it has been discovered.
const TAIL_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How long to wait, after spawning the child, for its journal file to show
/// up on disk before giving up and treating the turn as a transient failure.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Drives an exec-mode coding-agent CLI that appends structured events to a
/// dated rollout journal file rather than writing directly to stdout. One
/// instance is bound to one descriptor; `journal_root` comes from the
/// descriptor's `TransportKind::RolloutJournal`.
pub struct RolloutJournalAdapter {
    descriptor: AgentAdapterDescriptor,
    journal_root: PathBuf,
}

impl RolloutJournalAdapter {
    pub fn new(descriptor: AgentAdapterDescriptor, journal_root: PathBuf) -> Self {
        Self { descriptor, journal_root }
    }

    fn build_command(&self, prompt: &str, resume_token: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.descriptor.command);
        cmd.args(&self.descriptor.args);
        if let (true, Some(token)) = (self.descriptor.supports_resume, resume_token) {
            cmd.arg("resume").arg(token);
        }
        cmd.arg(prompt);
        cmd.current_dir(&self.descriptor.working_dir);
        for (k, v) in &self.descriptor.env {
            cmd.env(k, v);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl AgentAdapter for RolloutJournalAdapter {
    fn descriptor(&self) -> &AgentAdapterDescriptor {
        &self.descriptor
    }

    async fn health_check(&self) -> Result<()> {
        if !self.journal_root.exists() {
            return Err(AdapterError::Transient {
                agent_id: self.descriptor.agent_id.clone(),
                reason: format!("journal root {} does not exist yet", self.journal_root.display()),
            });
        }
        Ok(())
    }

    async fn submit(&self, request: SubmitRequest, cancel: CancellationToken) -> Result<AdapterResponse> {
        let agent_id = self.descriptor.agent_id.clone();
        let started = Instant::now();
        let spawn_time = SystemTime::now();

        let mut child = self
            .build_command(&request.prompt, request.resume_token.as_deref())
            .spawn()
            .map_err(|source| AdapterError::Io { agent_id: agent_id.clone(), source })?;

        let journal_path = wait_for_journal(&self.journal_root, spawn_time, DISCOVERY_TIMEOUT).await;

        let drive = async {
            let mut content_buf = String::new();
            let mut tools_hint = Vec::new();
            let mut session_id = None;

            if let Some(path) = &journal_path {
                let mut offset: u64 = 0;
                let mut ticker = interval(TAIL_POLL_INTERVAL);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    offset = tail_once(path, offset, &mut content_buf, &mut tools_hint, &mut session_id)
                        .await
                        .map_err(|source| AdapterError::Io { agent_id: agent_id.clone(), source })?;

                    match child.try_wait() {
                        Ok(Some(_status)) => {
                            let _ = tail_once(path, offset, &mut content_buf, &mut tools_hint, &mut session_id).await;
                            break;
                        }
                        Ok(None) => {}
                        Err(source) => return Err(AdapterError::Io { agent_id: agent_id.clone(), source }),
                    }
                    ticker.tick().await;
                }
            } else {
                child.wait().await.map_err(|source| AdapterError::Io { agent_id: agent_id.clone(), source })?;
            }
            Ok((content_buf, tools_hint, session_id))
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(AdapterError::Cancelled { agent_id });
            }
            result = timeout(self.descriptor.turn_timeout, drive) => result,
        };

        let (content, tools_hint, session_id) = match outcome {
            Err(_elapsed) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(AdapterError::DeadlineExceeded {
                    agent_id,
                    timeout_ms: self.descriptor.turn_timeout.as_millis() as u64,
                });
            }
            Ok(Err(e)) => return Err(e),
            Ok(Ok(v)) => v,
        };

        let status = child
            .wait()
            .await
            .map_err(|source| AdapterError::Io { agent_id: agent_id.clone(), source })?;
        if !status.success() && content.is_empty() {
            return Err(AdapterError::Transient {
                agent_id,
                reason: format!("child exited with {status} and no journal content"),
            });
        }

        Ok(AdapterResponse {
            content,
            tools_hint,
            cost_units: None,
            duration_ms: started.elapsed().as_millis() as u64,
            resume_token: if self.descriptor.supports_resume { session_id } else { None },
        })
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

async fn wait_for_journal(journal_root: &std::path::Path, not_before: SystemTime, deadline: Duration) -> Option<PathBuf> {
    let mut ticker = interval(Duration::from_millis(100));
    let start = Instant::now();
    loop {
        if let Some(path) = find_newest_journal(journal_root, not_before) {
            return Some(path);
        }
        if start.elapsed() >= deadline {
            return None;
        }
        ticker.tick().await;
    }
}

/// Reads any bytes appended to `path` since `offset`, parses complete lines,
/// and folds their content into the accumulators. Returns the new offset.
async fn tail_once(
    path: &std::path::Path,
    offset: u64,
    content_buf: &mut String,
    tools_hint: &mut Vec<String>,
    session_id: &mut Option<String>,
) -> std::io::Result<u64> {
    let mut file = File::open(path).await?;
    file.seek(std::io::SeekFrom::Start(offset)).await?;
    let mut reader = BufReader::new(file).lines();
    let mut new_offset = offset;
    while let Some(line) = reader.next_line().await? {
        new_offset += line.len() as u64 + 1;
        if line.trim().is_empty() {
            continue;
        }
        let Ok(record) = serde_json::from_str::<JournalRecord>(&line) else { continue };
        match record {
            JournalRecord::SessionMeta(meta) => {
                *session_id = Some(meta.payload.id);
            }
            JournalRecord::EventMsg(ev) => match ev.payload {
                EventMsgPayload::AgentMessage(m) => {
                    if !content_buf.is_empty() {
                        content_buf.push('\n');
                    }
                    content_buf.push_str(&m.message);
                }
                EventMsgPayload::AgentReasoning(_) | EventMsgPayload::TokenCount(_) | EventMsgPayload::Unknown => {}
            },
            JournalRecord::ResponseItem(item) => {
                if let ResponseItemPayload::FunctionCall(call) = item.payload {
                    tools_hint.push(call.name);
                }
            }
            JournalRecord::TurnContext(_) | JournalRecord::Unknown => {}
        }
    }
    Ok(new_offset)
}
