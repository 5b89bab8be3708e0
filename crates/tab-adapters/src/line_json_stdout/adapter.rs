use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tab_types::AgentAdapterDescriptor;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::contract::{AdapterResponse, AgentAdapter, SubmitRequest};
use crate::error::{AdapterError, Result};

use super::schema::{ContentBlock, LineRecord};

/// Guards against a misbehaving child process streaming an unbounded line
/// and exhausting memory before a `Result` record ever arrives.
const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Drives a headless coding-agent CLI that speaks `claude -p
/// --output-format stream-json`-style line-delimited JSON on stdout. One
/// instance is bound to one `AgentAdapterDescriptor`; each `submit` spawns a
/// fresh child process and feeds it the accumulated prompt on stdin.
pub struct LineJsonStdoutAdapter {
    descriptor: AgentAdapterDescriptor,
    max_line_bytes: usize,
}

impl LineJsonStdoutAdapter {
    pub fn new(descriptor: AgentAdapterDescriptor) -> Self {
        Self { descriptor, max_line_bytes: DEFAULT_MAX_LINE_BYTES }
    }

    /// Overrides the default 1 MiB line cap, for adapters known to emit
    /// unusually large single lines.
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    fn build_command(&self, resume_token: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.descriptor.command);
        cmd.args(&self.descriptor.args);
        if let (true, Some(token)) = (self.descriptor.supports_resume, resume_token) {
            cmd.arg("--resume").arg(token);
        }
        cmd.current_dir(&self.descriptor.working_dir);
        for (k, v) in &self.descriptor.env {
            cmd.env(k, v);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl AgentAdapter for LineJsonStdoutAdapter {
    fn descriptor(&self) -> &AgentAdapterDescriptor {
        &self.descriptor
    }

    async fn health_check(&self) -> Result<()> {
        let path = std::path::Path::new(&self.descriptor.command);
        if path.is_absolute() && !path.exists() {
            return Err(AdapterError::Permanent {
                agent_id: self.descriptor.agent_id.clone(),
                reason: format!("command path {} does not exist", path.display()),
            });
        }
        Ok(())
    }

    async fn submit(&self, request: SubmitRequest, cancel: CancellationToken) -> Result<AdapterResponse> {
        let agent_id = self.descriptor.agent_id.clone();
        let started = Instant::now();

        let mut child = self
            .build_command(request.resume_token.as_deref())
            .spawn()
            .map_err(|source| AdapterError::Io { agent_id: agent_id.clone(), source })?;

        let mut stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");
        let mut reader = BufReader::new(stdout).lines();

        stdin
            .write_all(request.prompt.as_bytes())
            .await
            .map_err(|source| AdapterError::Io { agent_id: agent_id.clone(), source })?;
        stdin
            .shutdown()
            .await
            .map_err(|source| AdapterError::Io { agent_id: agent_id.clone(), source })?;
        drop(stdin);

        let mut content_buf = String::new();
        let mut tools_hint = Vec::new();
        let mut session_id = None;
        let mut final_result: Option<(String, Option<f64>, u64)> = None;

        let read_loop = async {
            loop {
                let line = match reader.next_line().await {
                    Ok(Some(l)) => l,
                    Ok(None) => break,
                    Err(source) => return Err(AdapterError::Io { agent_id: agent_id.clone(), source }),
                };
                if line.len() > self.max_line_bytes {
                    tracing::warn!(agent_id = %agent_id, line_bytes = line.len(), max = self.max_line_bytes, "dropping oversized line");
                    continue;
                }
                if line.trim().is_empty() {
                    continue;
                }
                let record: LineRecord = match serde_json::from_str(&line) {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::warn!(agent_id = %agent_id, error = %e, "dropping non-JSON line");
                        continue;
                    }
                };
                match record {
                    LineRecord::System(sys) => {
                        session_id = Some(sys.session_id);
                    }
                    LineRecord::Assistant(asst) => {
                        session_id = Some(asst.session_id);
                        for block in asst.message.content {
                            match block {
                                ContentBlock::Text { text } => {
                                    if !content_buf.is_empty() {
                                        content_buf.push('\n');
                                    }
                                    content_buf.push_str(&text);
                                }
                                ContentBlock::ToolUse { name, .. } => tools_hint.push(name),
                                ContentBlock::Thinking { .. }
                                | ContentBlock::ToolResult { .. }
                                | ContentBlock::Unknown => {}
                            }
                        }
                    }
                    LineRecord::Result(res) => {
                        session_id = Some(res.session_id);
                        if res.is_error {
                            return Err(AdapterError::Transient {
                                agent_id: agent_id.clone(),
                                reason: res.result.unwrap_or_else(|| "adapter reported is_error".into()),
                            });
                        }
                        let text = res.result.unwrap_or_else(|| content_buf.clone());
                        final_result = Some((text, res.cost_usd, res.duration_ms.unwrap_or(0)));
                        break;
                    }
                    LineRecord::User(_) | LineRecord::Unknown => {}
                }
            }
            Ok(())
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(AdapterError::Cancelled { agent_id });
            }
            result = timeout(self.descriptor.turn_timeout, read_loop) => result,
        };

        match outcome {
            Err(_elapsed) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(AdapterError::DeadlineExceeded {
                    agent_id,
                    timeout_ms: self.descriptor.turn_timeout.as_millis() as u64,
                });
            }
            Ok(Err(e)) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(e);
            }
            Ok(Ok(())) => {}
        }

        let status = child
            .wait()
            .await
            .map_err(|source| AdapterError::Io { agent_id: agent_id.clone(), source })?;

        let (content, cost_units, reported_duration_ms) = match final_result {
            Some(r) => r,
            None if status.success() => (content_buf, None, 0),
            None => {
                return Err(AdapterError::Transient {
                    agent_id,
                    reason: format!("child exited with {status} before a result record"),
                });
            }
        };

        Ok(AdapterResponse {
            content,
            tools_hint,
            cost_units,
            duration_ms: if reported_duration_ms > 0 {
                reported_duration_ms
            } else {
                started.elapsed().as_millis() as u64
            },
            resume_token: if self.descriptor.supports_resume { session_id } else { None },
        })
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use tab_types::{LoadStrategy, TransportKind};

    use super::*;

    fn descriptor(script: &str) -> AgentAdapterDescriptor {
        AgentAdapterDescriptor {
            agent_id: "test-agent".into(),
            kind: "fake".into(),
            transport: TransportKind::LineJsonStdout,
            load_strategy: LoadStrategy::Builtin,
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
            working_dir: ".".into(),
            env: HashMap::new(),
            turn_timeout: Duration::from_secs(5),
            supports_resume: false,
        }
    }

    #[tokio::test]
    async fn tolerates_non_json_and_oversized_lines() {
        let script = r#"
            cat >/dev/null
            echo 'not json at all'
            printf '%*s\n' 2000000 '' | tr ' ' 'x'
            echo '{"type":"result","session_id":"s1","is_error":false,"result":"done"}'
        "#;
        let adapter = LineJsonStdoutAdapter::new(descriptor(script));
        let response = adapter
            .submit(
                SubmitRequest { session_id: uuid::Uuid::new_v4(), prompt: "hi".into(), resume_token: None },
                CancellationToken::new(),
            )
            .await
            .expect("malformed and oversized lines must be dropped, not fail the turn");
        assert_eq!(response.content, "done");
    }
}

