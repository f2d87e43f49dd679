//! Batch reconstruction of stored conversation items into chat messages.
//!
//! The service stores tool invocations as separate items that precede the
//! assistant message they contributed to. The grouper walks the items in order,
//! buffers tool calls, and attaches the buffer to the next assistant message.

use recon_wire::{ConversationItem, Message, MessageItem, Result, Role, ToolCall, parse_items};
use serde::Serialize;
use serde_json::Value;

use crate::normalize::normalize;

/// Why buffered tool calls were discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// A user message arrived before any assistant message
    UserMessage,
    /// The item list ended before any assistant message
    EndOfInput,
}

/// Tool calls that could not be attached to any message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedToolCalls {
    pub reason: DropReason,
    pub tool_call_ids: Vec<String>,
}

/// Output of one grouping pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouped {
    pub messages: Vec<Message>,
    pub drops: Vec<DroppedToolCalls>,
}

/// Groups conversation items into messages
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageGrouper {
    /// Timestamp used for items the service did not date
    fallback_timestamp: i64,
}

impl MessageGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timestamp given to messages whose item has no `created_at`
    pub fn with_fallback_timestamp(mut self, timestamp: i64) -> Self {
        self.fallback_timestamp = timestamp;
        self
    }

    /// Group items into messages
    pub fn group(&self, items: &[ConversationItem]) -> Vec<Message> {
        self.group_with_report(items).messages
    }

    /// Group items into messages and report every discarded tool call buffer
    pub fn group_with_report(&self, items: &[ConversationItem]) -> Grouped {
        let mut grouped = Grouped::default();
        let mut pending: Vec<ToolCall> = Vec::new();

        for item in items {
            match item {
                ConversationItem::ToolDiscovery => {}
                ConversationItem::Unknown { kind } => {
                    tracing::debug!("Skipping conversation item of type {:?}", kind);
                }
                ConversationItem::ToolCall(call) => {
                    tracing::debug!("Buffering {} item {}", call.kind(), call.id());
                    pending.push(normalize(call));
                }
                ConversationItem::Message(msg) => {
                    // A user message discards the buffer even when it has no content
                    if msg.role == Role::User && !pending.is_empty() {
                        grouped.drop_pending(&mut pending, DropReason::UserMessage);
                    }
                    if msg.content.is_empty() {
                        tracing::debug!("Skipping empty {} message", msg.role.as_str());
                        continue;
                    }
                    let tool_calls = match msg.role {
                        Role::Assistant => std::mem::take(&mut pending),
                        Role::User | Role::System => vec![],
                    };
                    grouped.messages.push(self.build(msg, tool_calls));
                }
            }
        }

        if !pending.is_empty() {
            grouped.drop_pending(&mut pending, DropReason::EndOfInput);
        }

        grouped
    }

    fn build(&self, item: &MessageItem, tool_calls: Vec<ToolCall>) -> Message {
        Message {
            role: item.role,
            content: item.content.clone(),
            tool_calls,
            timestamp: item.created_at.unwrap_or(self.fallback_timestamp),
        }
    }
}

impl Grouped {
    fn drop_pending(&mut self, pending: &mut Vec<ToolCall>, reason: DropReason) {
        let tool_call_ids: Vec<String> = pending.drain(..).map(|call| call.id).collect();
        tracing::warn!(
            "Dropping {} orphaned tool call(s) ({:?}): {}",
            tool_call_ids.len(),
            reason,
            tool_call_ids.join(", ")
        );
        self.drops.push(DroppedToolCalls {
            reason,
            tool_call_ids,
        });
    }
}

/// Group items into messages with the default grouper
pub fn group(items: &[ConversationItem]) -> Vec<Message> {
    MessageGrouper::new().group(items)
}

/// Parse a raw item list and group it. Fails only when `raw` is not a list.
pub fn group_value(raw: &Value) -> Result<Vec<Message>> {
    Ok(group(&parse_items(raw)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_wire::{ContentPart, Error, McpCall, TextDirection, ToolCallItem, ToolCallStatus};
    use serde_json::json;

    fn mcp(name: &str) -> ConversationItem {
        ConversationItem::ToolCall(ToolCallItem::Mcp(McpCall {
            id: format!("call_{name}"),
            name: name.into(),
            server_label: "srv".into(),
            output: Some(json!("ok")),
            ..Default::default()
        }))
    }

    fn message(role: Role, text: &str) -> ConversationItem {
        let direction = match role {
            Role::User => TextDirection::Input,
            _ => TextDirection::Output,
        };
        ConversationItem::Message(MessageItem {
            id: None,
            role,
            content: if text.is_empty() {
                vec![]
            } else {
                vec![ContentPart::text(direction, text)]
            },
            created_at: None,
        })
    }

    fn names(msg: &Message) -> Vec<&str> {
        msg.tool_calls.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_empty_user_message_still_discards_buffer() {
        let items = vec![
            mcp("c1"),
            message(Role::User, ""),
            message(Role::Assistant, "x"),
        ];
        let grouped = MessageGrouper::new().group_with_report(&items);
        assert_eq!(grouped.messages.len(), 1);
        assert_eq!(grouped.messages[0].role, Role::Assistant);
        assert!(grouped.messages[0].tool_calls.is_empty());
        assert_eq!(
            grouped.drops,
            vec![DroppedToolCalls {
                reason: DropReason::UserMessage,
                tool_call_ids: vec!["call_c1".into()],
            }]
        );
    }

    #[test]
    fn test_no_tool_calls_is_one_to_one() {
        let items = vec![
            message(Role::User, "hi"),
            message(Role::Assistant, "hello"),
            message(Role::User, "how are you"),
            message(Role::Assistant, "fine"),
        ];
        let messages = group(&items);
        assert_eq!(messages.len(), 4);
        let texts: Vec<String> = messages.iter().map(Message::text).collect();
        assert_eq!(texts, ["hi", "hello", "how are you", "fine"]);
        assert!(messages.iter().all(|m| m.tool_calls.is_empty()));
    }

    #[test]
    fn test_run_attaches_to_next_assistant() {
        // Scenario A
        let items = vec![mcp("a"), mcp("b"), message(Role::Assistant, "hi")];
        let grouped = MessageGrouper::new().group_with_report(&items);
        assert_eq!(grouped.messages.len(), 1);
        let msg = &grouped.messages[0];
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.text(), "hi");
        assert_eq!(names(msg), ["a", "b"]);
        assert_eq!(msg.tool_calls[0].status, ToolCallStatus::Completed);
        assert!(grouped.drops.is_empty());
    }

    #[test]
    fn test_user_message_discards_buffer() {
        // Scenario B
        let items = vec![mcp("a"), message(Role::User, "hello")];
        let grouped = MessageGrouper::new().group_with_report(&items);
        assert_eq!(grouped.messages.len(), 1);
        assert_eq!(grouped.messages[0].role, Role::User);
        assert_eq!(grouped.messages[0].text(), "hello");
        assert!(grouped.messages.iter().all(|m| m.tool_calls.is_empty()));
        assert_eq!(
            grouped.drops,
            vec![DroppedToolCalls {
                reason: DropReason::UserMessage,
                tool_call_ids: vec!["call_a".into()],
            }]
        );
    }

    #[test]
    fn test_discarded_buffer_does_not_reach_later_assistant() {
        let items = vec![
            mcp("stale"),
            message(Role::User, "question"),
            message(Role::Assistant, "answer"),
        ];
        let messages = group(&items);
        assert_eq!(messages.len(), 2);
        assert!(messages[1].tool_calls.is_empty());
    }

    #[test]
    fn test_new_calls_after_user_message_attach() {
        let items = vec![
            mcp("stale"),
            message(Role::User, "question"),
            mcp("fresh"),
            message(Role::Assistant, "answer"),
        ];
        let messages = group(&items);
        assert_eq!(names(&messages[1]), ["fresh"]);
    }

    #[test]
    fn test_call_after_assistant_starts_fresh_buffer() {
        let items = vec![
            mcp("a"),
            message(Role::Assistant, "first"),
            mcp("b"),
            message(Role::Assistant, "second"),
        ];
        let messages = group(&items);
        assert_eq!(names(&messages[0]), ["a"]);
        assert_eq!(names(&messages[1]), ["b"]);
    }

    #[test]
    fn test_trailing_calls_are_dropped() {
        let items = vec![message(Role::User, "q"), mcp("late")];
        let grouped = MessageGrouper::new().group_with_report(&items);
        assert_eq!(grouped.messages.len(), 1);
        assert_eq!(grouped.drops.len(), 1);
        assert_eq!(grouped.drops[0].reason, DropReason::EndOfInput);
    }

    #[test]
    fn test_empty_messages_are_not_emitted() {
        let items = vec![
            message(Role::User, ""),
            mcp("a"),
            message(Role::Assistant, ""),
            message(Role::Assistant, "done"),
        ];
        let messages = group(&items);
        assert_eq!(messages.len(), 1);
        // An empty assistant message does not consume the buffer
        assert_eq!(names(&messages[0]), ["a"]);
    }

    #[test]
    fn test_discovery_unknown_and_system_items() {
        let items = vec![
            ConversationItem::ToolDiscovery,
            message(Role::System, "be concise"),
            ConversationItem::Unknown {
                kind: "reasoning".into(),
            },
            mcp("a"),
            message(Role::Assistant, "ok"),
        ];
        let messages = group(&items);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(names(&messages[1]), ["a"]);
    }

    #[test]
    fn test_group_is_idempotent() {
        let items = vec![
            mcp("a"),
            message(Role::Assistant, "x"),
            mcp("b"),
            message(Role::User, "y"),
        ];
        assert_eq!(group(&items), group(&items));
    }

    #[test]
    fn test_timestamps() {
        let items = vec![
            ConversationItem::Message(MessageItem {
                id: Some("m1".into()),
                role: Role::User,
                content: vec![ContentPart::text(TextDirection::Input, "dated")],
                created_at: Some(1_700_000_123),
            }),
            message(Role::Assistant, "undated"),
        ];
        let messages = MessageGrouper::new()
            .with_fallback_timestamp(1_700_000_000)
            .group(&items);
        assert_eq!(messages[0].timestamp, 1_700_000_123);
        assert_eq!(messages[1].timestamp, 1_700_000_000);
    }

    #[test]
    fn test_group_value_from_raw_items() {
        let messages = group_value(&json!([
            {"id": "msg_1", "type": "message", "role": "user",
             "content": [{"type": "input_text", "text": "search the docs"}]},
            {"id": "mcp_list", "type": "mcp_list_tools", "server_label": "docs", "tools": []},
            {"id": "fs_1", "type": "file_search_call", "queries": ["docs"],
             "results": [{"filename": "a.md"}], "status": "completed"},
            {"id": "ws_1", "type": "web_search_call", "status": "completed", "error": "timeout"},
            {"id": "msg_2", "type": "message", "role": "assistant",
             "content": [{"type": "output_text", "text": "Here you go"}]}
        ]))
        .unwrap();

        assert_eq!(messages.len(), 2);
        let assistant = &messages[1];
        assert_eq!(names(assistant), ["knowledge_search", "web_search"]);
        assert_eq!(assistant.tool_calls[0].status, ToolCallStatus::Completed);
        assert_eq!(assistant.tool_calls[1].status, ToolCallStatus::Failed);
    }

    #[test]
    fn test_group_value_rejects_non_sequence() {
        let err = group_value(&json!(42)).unwrap_err();
        assert!(matches!(err, Error::NotASequence(_)));
    }
}
