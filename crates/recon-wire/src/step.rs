//! Turn step events as delivered by the agent service

use serde_json::Value;

use crate::error::{Error, Result};

/// One result returned by a tool during a tool-execution step
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub call_id: Option<String>,
    pub tool_name: String,
    /// Payload flattened to text; non-text payloads are compact JSON
    pub content: String,
}

/// Details of a completed step
#[derive(Debug, Clone, PartialEq)]
pub enum StepDetails {
    /// Model inference finished; `content` is the full model response when the
    /// service includes it
    Inference { content: Option<String> },
    /// Tools ran and returned results
    ToolExecution { tool_responses: Vec<ToolResponse> },
    /// Shield calls, memory retrieval and other step types
    Other { step_type: String },
}

/// A single event of a live turn
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// Incremental model text
    Progress { delta: String },
    /// A step finished
    StepComplete(StepDetails),
    /// Turn/step start markers, non-text deltas and other event types
    Other { event_type: String },
}

impl StepEvent {
    /// Interpret one raw `{event: {payload: {...}}}` record.
    ///
    /// Records that lack the envelope, the event type, or the payload fields
    /// their event type requires are reported as `Error::MalformedEvent`.
    pub fn from_value(raw: &Value) -> Result<Self> {
        let payload = raw
            .get("event")
            .ok_or_else(|| Error::malformed_event("record has no event"))?
            .get("payload")
            .filter(|p| p.is_object())
            .ok_or_else(|| Error::malformed_event("event has no payload"))?;

        let event_type = payload
            .get("event_type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed_event("payload has no event_type"))?;

        match event_type {
            "step_progress" => {
                let delta = payload
                    .get("delta")
                    .filter(|d| d.is_object())
                    .ok_or_else(|| Error::malformed_event("step_progress without delta"))?;
                match delta.get("text").and_then(Value::as_str) {
                    Some(text) => Ok(Self::Progress {
                        delta: text.to_string(),
                    }),
                    // tool_call and image deltas carry no display text
                    None => Ok(Self::Other {
                        event_type: event_type.to_string(),
                    }),
                }
            }
            "step_complete" => {
                let details = payload
                    .get("step_details")
                    .filter(|d| d.is_object())
                    .ok_or_else(|| Error::malformed_event("step_complete without step_details"))?;
                StepDetails::from_value(details).map(Self::StepComplete)
            }
            other => Ok(Self::Other {
                event_type: other.to_string(),
            }),
        }
    }
}

impl StepDetails {
    fn from_value(details: &Value) -> Result<Self> {
        let step_type = details
            .get("step_type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed_event("step_details without step_type"))?;

        match step_type {
            "inference" => {
                let content = details
                    .pointer("/model_response/content")
                    .or_else(|| details.get("content"))
                    .filter(|c| !c.is_null())
                    .map(flatten_content);
                Ok(Self::Inference { content })
            }
            "tool_execution" => {
                let responses = details
                    .get("tool_responses")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        Error::malformed_event("tool_execution step without tool_responses")
                    })?;
                let tool_responses = responses
                    .iter()
                    .map(ToolResponse::from_value)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::ToolExecution { tool_responses })
            }
            other => Ok(Self::Other {
                step_type: other.to_string(),
            }),
        }
    }
}

impl ToolResponse {
    fn from_value(value: &Value) -> Result<Self> {
        let tool_name = value
            .get("tool_name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed_event("tool response without tool_name"))?;

        Ok(Self {
            call_id: value.get("call_id").and_then(Value::as_str).map(str::to_string),
            tool_name: tool_name.to_string(),
            content: value.get("content").map(flatten_content).unwrap_or_default(),
        })
    }
}

/// Flatten interleaved content to text.
///
/// Strings pass through, lists made only of strings and `{text}` items are
/// concatenated, and every other shape is serialized as compact JSON.
pub fn flatten_content(content: &Value) -> String {
    match content {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => {
            let texts: Option<Vec<&str>> = items
                .iter()
                .map(|item| match item {
                    Value::String(text) => Some(text.as_str()),
                    Value::Object(obj) => obj.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .collect();
            match texts {
                Some(texts) => texts.concat(),
                None => content.to_string(),
            }
        }
        other => other.to_string(),
    }
}
