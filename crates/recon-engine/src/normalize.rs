//! Tool call normalization
//!
//! Every known tool invocation item shape is mapped onto one [`ToolCall`]
//! record so the UI can render them uniformly.

use recon_wire::{FileSearchCall, McpCall, ToolCall, ToolCallItem, ToolCallStatus, WebSearchCall};
use serde_json::Value;

/// Display name used for built-in knowledge searches
pub const KNOWLEDGE_SEARCH_NAME: &str = "knowledge_search";
/// Display name used for built-in web searches
pub const WEB_SEARCH_NAME: &str = "web_search";
/// Server label for tools built into the agent service
pub const BUILTIN_SERVER_LABEL: &str = "llamastack";

const NO_RESULTS: &str = "No results found";

/// Map a raw tool invocation item to a uniform tool call record
pub fn normalize(item: &ToolCallItem) -> ToolCall {
    let status = if item.error().is_some() {
        ToolCallStatus::Failed
    } else {
        ToolCallStatus::Completed
    };

    match item {
        ToolCallItem::Mcp(McpCall {
            id,
            name,
            server_label,
            arguments,
            output,
            error,
        }) => ToolCall {
            id: id.clone(),
            name: name.clone(),
            server_label: server_label.clone(),
            arguments: arguments.clone(),
            output: stringify_output(output.as_ref()),
            error: error.clone(),
            status,
        },
        ToolCallItem::FileSearch(FileSearchCall {
            id,
            queries,
            results,
            error,
            ..
        }) => ToolCall {
            id: id.clone(),
            name: KNOWLEDGE_SEARCH_NAME.to_string(),
            server_label: BUILTIN_SERVER_LABEL.to_string(),
            arguments: if queries.is_empty() {
                None
            } else {
                serde_json::to_string(queries).ok()
            },
            output: stringify_output(results.as_ref()),
            error: error.clone(),
            status,
        },
        ToolCallItem::WebSearch(WebSearchCall {
            id,
            query,
            status: reported,
            error,
        }) => ToolCall {
            id: id.clone(),
            name: WEB_SEARCH_NAME.to_string(),
            server_label: BUILTIN_SERVER_LABEL.to_string(),
            arguments: query.clone(),
            // Web search items carry no result payload
            output: format!(
                "Tool execution {}",
                reported.as_deref().unwrap_or("completed")
            ),
            error: error.clone(),
            status,
        },
    }
}

fn stringify_output(output: Option<&Value>) -> String {
    match output {
        None | Some(Value::Null) => NO_RESULTS.to_string(),
        Some(Value::String(s)) if s.is_empty() => NO_RESULTS.to_string(),
        Some(Value::Array(items)) if items.is_empty() => NO_RESULTS.to_string(),
        Some(Value::Object(obj)) if obj.is_empty() => NO_RESULTS.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
