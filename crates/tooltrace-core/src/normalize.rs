//! Maps raw session-log records onto [`NormalizedEvent`]s.
//!
//! The upstream log format is unversioned, so nothing here fails: a record
//! that doesn't look like anything we know yields fewer events, possibly none.

use serde_json::{Map, Value};

use crate::fields::{
    flatten_text, get_array, get_object, get_owned_str, get_str, is_true, is_truthy, typed_items,
};
use crate::types::{MessageEvent, NormalizedEvent, ToolResultEvent, ToolUseEvent};

/// Record types that are bookkeeping, not conversation.
pub const SKIPPED_RECORD_TYPES: &[&str] = &["file-history-snapshot", "queue-operation", "summary"];

/// Identity fields shared by every event extracted from one record.
#[derive(Debug, Clone, Default)]
struct RecordMeta {
    session_id: Option<String>,
    uuid: Option<String>,
    parent_uuid: Option<String>,
    timestamp: Option<String>,
}

impl RecordMeta {
    fn from_record(record: &Map<String, Value>) -> Self {
        Self {
            session_id: get_owned_str(record, "sessionId"),
            uuid: get_owned_str(record, "uuid"),
            parent_uuid: get_owned_str(record, "parentUuid"),
            timestamp: get_owned_str(record, "timestamp"),
        }
    }
}

/// True for meta/synthetic records and internal record types.
pub fn is_skipped_record(record: &Map<String, Value>) -> bool {
    if is_true(record, "isMeta") {
        return true;
    }
    get_str(record, "type").is_some_and(|t| SKIPPED_RECORD_TYPES.contains(&t))
}

/// Normalize one record into zero or more events.
///
/// Output order within a record is stable: tool uses, then tool results,
/// then the plain message.
pub fn normalize(record: &Map<String, Value>) -> Vec<NormalizedEvent> {
    if is_skipped_record(record) {
        return Vec::new();
    }

    let Some(message) = get_object(record, "message") else {
        return Vec::new();
    };

    let meta = RecordMeta::from_record(record);
    let role = get_str(message, "role");
    let mut events = Vec::new();

    if let Some(items) = get_array(message, "content") {
        if role == Some("assistant") {
            events.extend(
                typed_items(items, "tool_use")
                    .filter_map(|item| tool_use_event(&meta, item))
                    .map(NormalizedEvent::ToolUse),
            );
        }

        events.extend(
            typed_items(items, "tool_result")
                .map(|item| tool_result_event(&meta, role, item))
                .map(NormalizedEvent::ToolResult),
        );
    }

    if matches!(role, Some("user") | Some("assistant")) {
        if let Some(event) = message_event(&meta, role, message) {
            events.push(NormalizedEvent::Message(event));
        }
    }

    events
}

fn tool_use_event(meta: &RecordMeta, item: &Map<String, Value>) -> Option<ToolUseEvent> {
    let tool_name = get_str(item, "name").filter(|name| !name.is_empty())?;

    Some(ToolUseEvent {
        session_id: meta.session_id.clone(),
        uuid: meta.uuid.clone(),
        parent_uuid: meta.parent_uuid.clone(),
        timestamp: meta.timestamp.clone(),
        role: "assistant".to_string(),
        tool_name: tool_name.to_string(),
        tool_use_id: get_owned_str(item, "id"),
        tool_input: get_object(item, "input").cloned().unwrap_or_default(),
    })
}

fn tool_result_event(
    meta: &RecordMeta,
    role: Option<&str>,
    item: &Map<String, Value>,
) -> ToolResultEvent {
    ToolResultEvent {
        session_id: meta.session_id.clone(),
        uuid: meta.uuid.clone(),
        parent_uuid: meta.parent_uuid.clone(),
        timestamp: meta.timestamp.clone(),
        role: role.unwrap_or("user").to_string(),
        tool_use_id: get_owned_str(item, "tool_use_id"),
        is_error: is_truthy(item.get("is_error")),
        content_text: flatten_text(item.get("content")).trim().to_string(),
    }
}

fn message_event(
    meta: &RecordMeta,
    role: Option<&str>,
    message: &Map<String, Value>,
) -> Option<MessageEvent> {
    let content = message.get("content");
    let mut text = flatten_text(content);
    if content.is_some_and(Value::is_array) {
        text = text.trim().to_string();
    }
    if text.trim().is_empty() {
        return None;
    }

    Some(MessageEvent {
        session_id: meta.session_id.clone(),
        uuid: meta.uuid.clone(),
        parent_uuid: meta.parent_uuid.clone(),
        timestamp: meta.timestamp.clone(),
        role: role.map(str::to_string),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize_json(value: Value) -> Vec<NormalizedEvent> {
        normalize(value.as_object().unwrap())
    }

    #[test]
    fn test_user_string_message() {
        let events = normalize_json(json!({
            "type": "user",
            "sessionId": "s1",
            "uuid": "u1",
            "parentUuid": "p0",
            "timestamp": "2025-01-01T00:00:00Z",
            "message": {"role": "user", "content": "do it"}
        }));

        assert_eq!(events.len(), 1);
        let NormalizedEvent::Message(m) = &events[0] else {
            panic!("expected message event");
        };
        assert_eq!(m.text, "do it");
        assert_eq!(m.role.as_deref(), Some("user"));
        assert_eq!(m.session_id.as_deref(), Some("s1"));
        assert_eq!(m.uuid.as_deref(), Some("u1"));
        assert_eq!(m.parent_uuid.as_deref(), Some("p0"));
        assert_eq!(m.timestamp.as_deref(), Some("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn test_assistant_text_and_tool_use_in_one_record() {
        let events = normalize_json(json!({
            "type": "assistant",
            "uuid": "u2",
            "message": {
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "Reading the file."},
                    {"type": "tool_use", "id": "t1", "name": "Read", "input": {"path": "/f"}},
                    {"type": "tool_use", "id": "t2", "name": "Grep", "input": "not a map"}
                ]
            }
        }));

        assert_eq!(events.len(), 3);
        let NormalizedEvent::ToolUse(read) = &events[0] else {
            panic!("expected tool use");
        };
        assert_eq!(read.tool_name, "Read");
        assert_eq!(read.tool_use_id.as_deref(), Some("t1"));
        assert_eq!(read.tool_input.get("path"), Some(&json!("/f")));
        assert_eq!(read.role, "assistant");

        let NormalizedEvent::ToolUse(grep) = &events[1] else {
            panic!("expected tool use");
        };
        assert!(grep.tool_input.is_empty());

        let NormalizedEvent::Message(m) = &events[2] else {
            panic!("expected message");
        };
        assert_eq!(m.text, "Reading the file.");
    }

    #[test]
    fn test_tool_use_without_name_is_dropped() {
        let events = normalize_json(json!({
            "message": {
                "role": "assistant",
                "content": [
                    {"type": "tool_use", "id": "t1", "name": ""},
                    {"type": "tool_use", "id": "t2", "name": 7},
                    {"type": "tool_use", "id": "t3"}
                ]
            }
        }));
        assert!(events.is_empty());
    }

    #[test]
    fn test_tool_use_only_extracted_for_assistant() {
        let events = normalize_json(json!({
            "message": {
                "role": "user",
                "content": [{"type": "tool_use", "id": "t1", "name": "Read"}]
            }
        }));
        assert!(events.is_empty());
    }

    #[test]
    fn test_tool_result_with_chunked_content() {
        let events = normalize_json(json!({
            "type": "user",
            "message": {
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": "t1",
                    "is_error": true,
                    "content": [
                        {"type": "text", "text": "line one"},
                        {"type": "image"},
                        {"type": "text", "text": "line two  "}
                    ]
                }]
            }
        }));

        assert_eq!(events.len(), 1);
        let NormalizedEvent::ToolResult(r) = &events[0] else {
            panic!("expected tool result");
        };
        assert_eq!(r.tool_use_id.as_deref(), Some("t1"));
        assert!(r.is_error);
        assert_eq!(r.content_text, "line one\nline two");
        assert_eq!(r.role, "user");
    }

    #[test]
    fn test_tool_result_without_id_is_still_emitted() {
        let events = normalize_json(json!({
            "message": {
                "content": [{"type": "tool_result", "content": " ok "}]
            }
        }));

        assert_eq!(events.len(), 1);
        let NormalizedEvent::ToolResult(r) = &events[0] else {
            panic!("expected tool result");
        };
        assert_eq!(r.tool_use_id, None);
        assert!(!r.is_error);
        assert_eq!(r.content_text, "ok");
        assert_eq!(r.role, "user");
    }

    #[test]
    fn test_meta_record_yields_nothing() {
        let events = normalize_json(json!({
            "isMeta": true,
            "type": "assistant",
            "message": {
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "hello"},
                    {"type": "tool_use", "id": "t1", "name": "Read", "input": {}}
                ]
            }
        }));
        assert!(events.is_empty());
    }

    #[test]
    fn test_internal_record_types_yield_nothing() {
        for kind in SKIPPED_RECORD_TYPES {
            let events = normalize_json(json!({
                "type": kind,
                "message": {"role": "user", "content": "hi"}
            }));
            assert!(events.is_empty(), "{kind} should be skipped");
        }
    }

    #[test]
    fn test_whitespace_only_message_is_not_emitted() {
        assert!(normalize_json(json!({"message": {"role": "user", "content": "   \n"}})).is_empty());
        assert!(normalize_json(json!({
            "message": {"role": "assistant", "content": [{"type": "text", "text": "  "}]}
        }))
        .is_empty());
    }

    #[test]
    fn test_other_roles_do_not_produce_messages() {
        let events = normalize_json(json!({"message": {"role": "system", "content": "boot"}}));
        assert!(events.is_empty());
    }

    #[test]
    fn test_garbage_shapes_do_not_panic() {
        let shapes = [
            json!({}),
            json!({"message": null}),
            json!({"message": "just a string"}),
            json!({"message": {"role": 5, "content": {"nested": true}}}),
            json!({"message": {"role": "assistant", "content": [1, null, "x", []]}}),
            json!({"isMeta": "true", "type": 12, "sessionId": []}),
        ];
        for shape in shapes {
            assert!(normalize_json(shape).is_empty());
        }
    }
}
