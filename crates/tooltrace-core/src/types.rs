use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A plain conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub session_id: Option<String>,
    pub uuid: Option<String>,
    pub parent_uuid: Option<String>,
    pub timestamp: Option<String>,
    /// "user", "assistant", or whatever the log declared.
    pub role: Option<String>,
    pub text: String,
}

/// The agent decided to call a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseEvent {
    pub session_id: Option<String>,
    pub uuid: Option<String>,
    pub parent_uuid: Option<String>,
    pub timestamp: Option<String>,
    pub role: String,
    /// Never empty.
    pub tool_name: String,
    pub tool_use_id: Option<String>,
    pub tool_input: Map<String, Value>,
}

/// A tool finished and produced output or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultEvent {
    pub session_id: Option<String>,
    pub uuid: Option<String>,
    pub parent_uuid: Option<String>,
    pub timestamp: Option<String>,
    pub role: String,
    pub tool_use_id: Option<String>,
    pub is_error: bool,
    pub content_text: String,
}

/// The only event shapes the correlator understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedEvent {
    Message(MessageEvent),
    ToolUse(ToolUseEvent),
    ToolResult(ToolResultEvent),
}

impl NormalizedEvent {
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Message(e) => e.session_id.as_deref(),
            Self::ToolUse(e) => e.session_id.as_deref(),
            Self::ToolResult(e) => e.session_id.as_deref(),
        }
    }

    pub fn is_tool_use(&self) -> bool {
        matches!(self, Self::ToolUse(_))
    }

    pub fn is_tool_result(&self) -> bool {
        matches!(self, Self::ToolResult(_))
    }
}

impl From<MessageEvent> for NormalizedEvent {
    fn from(event: MessageEvent) -> Self {
        Self::Message(event)
    }
}

impl From<ToolUseEvent> for NormalizedEvent {
    fn from(event: ToolUseEvent) -> Self {
        Self::ToolUse(event)
    }
}

impl From<ToolResultEvent> for NormalizedEvent {
    fn from(event: ToolResultEvent) -> Self {
        Self::ToolResult(event)
    }
}
