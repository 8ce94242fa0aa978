use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{MessageEvent, ToolResultEvent, ToolUseEvent};

/// Snapshot of one context message captured into a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub t: Option<String>,
    pub role: Option<String>,
    pub text: String,
    pub uuid: Option<String>,
    pub parent_uuid: Option<String>,
}

impl From<&MessageEvent> for ContextMessage {
    fn from(m: &MessageEvent) -> Self {
        Self {
            t: m.timestamp.clone(),
            role: m.role.clone(),
            text: m.text.clone(),
            uuid: m.uuid.clone(),
            parent_uuid: m.parent_uuid.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseEntry {
    pub t: Option<String>,
    pub tool_name: String,
    pub tool_use_id: Option<String>,
    pub tool_input: Map<String, Value>,
    pub uuid: Option<String>,
    pub parent_uuid: Option<String>,
}

impl From<&ToolUseEvent> for ToolUseEntry {
    fn from(e: &ToolUseEvent) -> Self {
        Self {
            t: e.timestamp.clone(),
            tool_name: e.tool_name.clone(),
            tool_use_id: e.tool_use_id.clone(),
            tool_input: e.tool_input.clone(),
            uuid: e.uuid.clone(),
            parent_uuid: e.parent_uuid.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultEntry {
    pub t: Option<String>,
    pub tool_use_id: Option<String>,
    pub is_error: bool,
    pub content_text: String,
    pub uuid: Option<String>,
    pub parent_uuid: Option<String>,
}

impl From<&ToolResultEvent> for ToolResultEntry {
    fn from(e: &ToolResultEvent) -> Self {
        Self {
            t: e.timestamp.clone(),
            tool_use_id: e.tool_use_id.clone(),
            is_error: e.is_error,
            content_text: e.content_text.clone(),
            uuid: e.uuid.clone(),
            parent_uuid: e.parent_uuid.clone(),
        }
    }
}

/// One step recorded in a row's trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEntry {
    ToolUse(ToolUseEntry),
    Message(ContextMessage),
    ToolResult(ToolResultEntry),
}

impl TraceEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolUse(_) => "tool_use",
            Self::Message(_) => "message",
            Self::ToolResult(_) => "tool_result",
        }
    }
}

/// A resolved tool invocation: the terminal artifact of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub session_id: String,
    pub t: Option<String>,
    pub messages: Vec<ContextMessage>,
    pub tool_name: String,
    pub tool_input: Map<String, Value>,
    /// Always a [`TraceEntry::ToolResult`].
    pub tool_result: TraceEntry,
    pub trace: Vec<TraceEntry>,
    pub reward: f64,
}

impl DatasetRow {
    pub fn result(&self) -> Option<&ToolResultEntry> {
        match &self.tool_result {
            TraceEntry::ToolResult(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn trace_kinds(&self) -> Vec<&'static str> {
        self.trace.iter().map(TraceEntry::kind).collect()
    }
}
