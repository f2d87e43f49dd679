//! ReAct output parsing
//!
//! Reasoning agents answer each inference step with a JSON object holding a
//! `thought`, an optional `action` to run, and an optional final `answer`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A tool the agent decided to call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReActAction {
    pub tool_name: String,
    #[serde(default)]
    pub tool_params: Value,
}

/// One parsed reasoning step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReActOutput {
    #[serde(default, deserialize_with = "lenient_text")]
    pub thought: Option<String>,
    #[serde(default, deserialize_with = "lenient_action")]
    pub action: Option<ReActAction>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub answer: Option<String>,
}

/// Models frequently wrap the JSON object in a Markdown code fence.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*(.*?)\s*```$").expect("valid code fence pattern")
});

/// Parse accumulated step text as a ReAct output object
pub fn parse_react_output(text: &str) -> Result<ReActOutput, serde_json::Error> {
    let trimmed = text.trim();
    let body = CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());
    serde_json::from_str(body)
}

/// Strings are kept verbatim, null means no answer, other scalars are stringified.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// An action that is not a `{tool_name, tool_params}` object is dropped, never the whole step.
fn lenient_action<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ReActAction>, D::Error> {
    let value = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    match serde_json::from_value::<ReActAction>(value) {
        Ok(action) => Ok(Some(action)),
        Err(e) => {
            tracing::debug!("Ignoring unusable ReAct action: {}", e);
            Ok(None)
        }
    }
}
