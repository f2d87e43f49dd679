//! Conversation item, content and message types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result, json_type_name};

/// Message roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Parse a role name as the service spells it
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" | "developer" => Some(Role::System),
            _ => None,
        }
    }

    /// Get the role as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Direction of bare text authored under this role
    fn default_direction(&self) -> TextDirection {
        match self {
            Role::User => TextDirection::Input,
            Role::Assistant | Role::System => TextDirection::Output,
        }
    }
}

/// Whether text was sent to the model or produced by it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Input,
    Output,
}

/// Content types in messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text {
        direction: TextDirection,
        text: String,
    },
    /// Image referenced by URL (may be a data URL)
    Image { url: String },
}

impl ContentPart {
    /// Create text content
    pub fn text(direction: TextDirection, text: impl Into<String>) -> Self {
        Self::Text {
            direction,
            text: text.into(),
        }
    }

    /// Create image content
    pub fn image(url: impl Into<String>) -> Self {
        Self::Image { url: url.into() }
    }

    /// Get text if this is text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::Image { .. } => None,
        }
    }

    /// Parse one structured content part. Unknown part types and parts
    /// without usable text or URL yield `None`.
    fn from_value(value: &Value, role: Role) -> Option<Self> {
        if let Some(text) = value.as_str() {
            return non_empty(text).map(|t| Self::text(role.default_direction(), t));
        }

        let part_type = value.get("type").and_then(Value::as_str).unwrap_or("text");
        match part_type {
            "input_text" | "output_text" | "text" => {
                let text = value.get("text").and_then(Value::as_str).and_then(non_empty)?;
                let direction = match part_type {
                    "input_text" => TextDirection::Input,
                    "output_text" => TextDirection::Output,
                    _ => role.default_direction(),
                };
                Some(Self::text(direction, text))
            }
            "input_image" | "image" | "image_url" => {
                let url = match value.get("image_url").or_else(|| value.get("url"))? {
                    Value::String(url) => url.as_str(),
                    Value::Object(obj) => obj.get("url").and_then(Value::as_str)?,
                    _ => return None,
                };
                non_empty(url).map(Self::image)
            }
            _ => None,
        }
    }
}

/// Parse raw message content, either a bare string or a list of parts.
pub fn parse_content(raw: Option<&Value>, role: Role) -> Vec<ContentPart> {
    match raw {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| ContentPart::from_value(part, role))
            .collect(),
        Some(other) => ContentPart::from_value(other, role).into_iter().collect(),
    }
}

fn non_empty(text: &str) -> Option<&str> {
    if text.is_empty() { None } else { Some(text) }
}

/// A message item as stored by the conversation service
#[derive(Debug, Clone, PartialEq)]
pub struct MessageItem {
    pub id: Option<String>,
    pub role: Role,
    pub content: Vec<ContentPart>,
    /// Creation time in unix seconds, when the service recorded one
    pub created_at: Option<i64>,
}

impl MessageItem {
    fn from_value(value: &Value) -> Result<Self> {
        let role_name = value
            .get("role")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedItem("message without role".into()))?;
        let role = Role::parse(role_name)
            .ok_or_else(|| Error::MalformedItem(format!("unknown role: {role_name}")))?;

        Ok(Self {
            id: value.get("id").and_then(Value::as_str).map(str::to_string),
            role,
            content: parse_content(value.get("content"), role),
            created_at: value.get("created_at").and_then(Value::as_i64),
        })
    }
}

/// MCP server tool invocation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct McpCall {
    pub id: String,
    pub name: String,
    pub server_label: String,
    #[serde(deserialize_with = "optional_text")]
    pub arguments: Option<String>,
    pub output: Option<Value>,
    #[serde(deserialize_with = "optional_text")]
    pub error: Option<String>,
}

/// Built-in knowledge (vector store) search invocation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileSearchCall {
    pub id: String,
    pub queries: Vec<String>,
    pub results: Option<Value>,
    #[serde(deserialize_with = "optional_text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    pub error: Option<String>,
}

/// Built-in web search invocation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WebSearchCall {
    pub id: String,
    #[serde(deserialize_with = "optional_text")]
    pub query: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    pub error: Option<String>,
}

impl WebSearchCall {
    fn from_value(value: &Value) -> Result<Self> {
        let mut call = Self::deserialize(value)?;
        // Newer services nest the query under `action`
        if call.query.is_none() {
            call.query = value
                .pointer("/action/query")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        Ok(call)
    }
}

/// The known tool invocation item shapes
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallItem {
    Mcp(McpCall),
    FileSearch(FileSearchCall),
    WebSearch(WebSearchCall),
}

impl ToolCallItem {
    /// Item id assigned by the service
    pub fn id(&self) -> &str {
        match self {
            Self::Mcp(call) => &call.id,
            Self::FileSearch(call) => &call.id,
            Self::WebSearch(call) => &call.id,
        }
    }

    /// Error reported for the invocation, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Mcp(call) => call.error.as_deref(),
            Self::FileSearch(call) => call.error.as_deref(),
            Self::WebSearch(call) => call.error.as_deref(),
        }
    }

    /// Item type as spelled on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mcp(_) => "mcp_call",
            Self::FileSearch(_) => "file_search_call",
            Self::WebSearch(_) => "web_search_call",
        }
    }
}

/// One entry of a stored conversation
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationItem {
    Message(MessageItem),
    ToolCall(ToolCallItem),
    /// Tool listing performed when an MCP server is attached
    ToolDiscovery,
    /// Any item type this crate does not interpret
    Unknown { kind: String },
}

impl ConversationItem {
    /// Interpret one raw item. Items that cannot be interpreted become
    /// `Unknown` rather than failing the whole conversation.
    pub fn from_value(value: &Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
        let parsed = match kind {
            "message" => MessageItem::from_value(value).map(Self::Message),
            "mcp_call" => McpCall::deserialize(value)
                .map(|call| Self::ToolCall(ToolCallItem::Mcp(call)))
                .map_err(Error::from),
            "file_search_call" => FileSearchCall::deserialize(value)
                .map(|call| Self::ToolCall(ToolCallItem::FileSearch(call)))
                .map_err(Error::from),
            "web_search_call" => WebSearchCall::from_value(value)
                .map(|call| Self::ToolCall(ToolCallItem::WebSearch(call))),
            "mcp_list_tools" => Ok(Self::ToolDiscovery),
            other => Ok(Self::Unknown {
                kind: other.to_string(),
            }),
        };

        parsed.unwrap_or_else(|e| {
            tracing::warn!("Skipping unreadable {} item: {}", kind, e);
            Self::Unknown {
                kind: kind.to_string(),
            }
        })
    }
}

impl<'de> Deserialize<'de> for ConversationItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Parse a raw item list. Accepts a bare array or a `{"data": [...]}` list
/// envelope; anything else is a caller error.
pub fn parse_items(raw: &Value) -> Result<Vec<ConversationItem>> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("data") {
            Some(Value::Array(items)) => items,
            _ => return Err(Error::NotASequence("object without a data list".into())),
        },
        other => return Err(Error::NotASequence(json_type_name(other).into())),
    };
    Ok(items.iter().map(ConversationItem::from_value).collect())
}

/// Accepts strings verbatim, treats null as absent and stringifies anything else.
fn optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Outcome of a tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    Completed,
    Failed,
}

/// Uniform record of one tool invocation attached to an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub server_label: String,
    pub arguments: Option<String>,
    pub output: String,
    pub error: Option<String>,
    pub status: ToolCallStatus,
}

/// A reconstructed chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
    /// Tool invocations that produced this message (assistant only)
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Unix seconds
    #[serde(default)]
    pub timestamp: i64,
}

impl Message {
    /// Get combined text content
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}
