use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of `claude -p --output-format stream-json`-style output: a
/// self-contained JSON object tagged by `type`. Unlike the historical
/// on-disk session log format (`~/.claude/projects/*.jsonl`, keyed by
/// `uuid`/`parentUuid`), this is the live streaming wire format a headless
/// coding-agent CLI writes to stdout turn by turn.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub(crate) enum LineRecord {
    System(SystemRecord),
    Assistant(AssistantRecord),
    User(UserRecord),
    Result(ResultRecord),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub(crate) struct SystemRecord {
    #[serde(default)]
    pub subtype: Option<String>,
    pub session_id: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub(crate) struct AssistantRecord {
    pub session_id: String,
    pub message: AssistantMessage,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub(crate) struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub(crate) struct UserRecord {
    pub session_id: String,
    #[serde(default)]
    pub message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub(crate) struct ResultRecord {
    pub session_id: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub cost_usd: Option<f64>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub is_error: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub(crate) enum ContentBlock {
    Text { text: String },
    Thinking { thinking: String },
    ToolUse { id: String, name: String, #[serde(default)] input: Value },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Unknown,
}
