//! Error types for recon-wire

use thiserror::Error;

/// Result type alias using recon-wire Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while ingesting raw service records
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A conversation item list was not a list
    #[error("Expected a sequence of conversation items, got {0}")]
    NotASequence(String),

    /// A single conversation item could not be interpreted
    #[error("Malformed item: {0}")]
    MalformedItem(String),

    /// A turn step event lacked its expected shape
    #[error("Malformed event: {0}")]
    MalformedEvent(String),
}

impl Error {
    /// Create a malformed-event error
    pub fn malformed_event(message: impl Into<String>) -> Self {
        Self::MalformedEvent(message.into())
    }
}

/// Short JSON type name used in error messages
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
