//! Live formatting of a turn's step events into display fragments.
//!
//! [`TurnFormatter`] is the state machine for one turn; [`format_turn`] drives
//! it from a stream of raw step events.

use std::str::FromStr;

use async_stream::stream;
use futures::StreamExt;
use recon_wire::{Error, Fragment, FragmentStream, StepDetails, StepEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_stream::Stream;

use crate::react::parse_react_output;
use crate::render::{ToolResultEntry, render};

/// How the agent behind a turn produces its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnMode {
    /// Model text is shown as it streams
    #[default]
    Plain,
    /// Each inference step is a ReAct JSON object; only final answers are shown
    Reasoning,
}

impl FromStr for TurnMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "default" => Ok(TurnMode::Plain),
            "reasoning" | "react" => Ok(TurnMode::Reasoning),
            other => Err(format!("unknown turn mode: {other} (expected plain or reasoning)")),
        }
    }
}

/// Formatting state for a single turn
#[derive(Debug, Clone)]
pub struct TurnFormatter {
    mode: TurnMode,
    /// Text of the step in progress
    step_text: String,
    /// Tool results awaiting the end-of-turn summary
    pending_tool_results: Vec<ToolResultEntry>,
    final_answer_emitted: bool,
    finished: bool,
}

impl TurnFormatter {
    pub fn new(mode: TurnMode) -> Self {
        Self {
            mode,
            step_text: String::new(),
            pending_tool_results: Vec::new(),
            final_answer_emitted: false,
            finished: false,
        }
    }

    /// Whether the turn has ended, normally or through a malformed event
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance the turn by one event
    pub fn step(&mut self, event: StepEvent) -> Vec<Fragment> {
        if self.finished {
            return vec![];
        }

        match event {
            StepEvent::Progress { delta } => {
                self.step_text.push_str(&delta);
                match self.mode {
                    TurnMode::Plain if !delta.is_empty() => vec![Fragment::text(delta)],
                    TurnMode::Plain | TurnMode::Reasoning => vec![],
                }
            }
            StepEvent::StepComplete(StepDetails::Inference { content }) => match self.mode {
                TurnMode::Plain => {
                    // Plain turns show only streamed deltas, never the step's final content
                    self.step_text.clear();
                    vec![]
                }
                TurnMode::Reasoning => self.complete_reasoning_step(content),
            },
            StepEvent::StepComplete(StepDetails::ToolExecution { tool_responses }) => {
                self.step_text.clear();
                match self.mode {
                    TurnMode::Plain => tool_responses
                        .iter()
                        .map(|response| Fragment::tool_banner(&response.tool_name))
                        .collect(),
                    TurnMode::Reasoning => {
                        for response in tool_responses {
                            self.pending_tool_results
                                .push(ToolResultEntry::new(response.tool_name, response.content));
                        }
                        vec![]
                    }
                }
            }
            StepEvent::StepComplete(StepDetails::Other { step_type }) => {
                tracing::debug!("Ignoring {} step", step_type);
                vec![]
            }
            StepEvent::Other { event_type } => {
                tracing::debug!("Ignoring {} event", event_type);
                vec![]
            }
        }
    }

    /// Interpret a raw event and advance the turn. A malformed event ends the turn.
    pub fn step_raw(&mut self, raw: &Value) -> Vec<Fragment> {
        if self.finished {
            return vec![];
        }
        match StepEvent::from_value(raw) {
            Ok(event) => self.step(event),
            Err(e) => vec![self.fail(&e)],
        }
    }

    /// End the turn because of an error, returning the fragment explaining it
    pub fn fail(&mut self, error: &Error) -> Fragment {
        tracing::warn!("Ending turn early: {}", error);
        self.finished = true;
        self.step_text.clear();
        self.pending_tool_results.clear();
        Fragment::error(format!("Could not process agent response: {error}"))
    }

    /// End the turn, summarizing tool results if no final answer was given
    pub fn finish(&mut self) -> Vec<Fragment> {
        if self.finished {
            return vec![];
        }
        self.finished = true;

        if !self.step_text.is_empty() {
            tracing::debug!(
                "Turn ended with {} bytes of incomplete step text",
                self.step_text.len()
            );
        }

        if self.final_answer_emitted || self.pending_tool_results.is_empty() {
            return vec![];
        }

        let mut fragments = vec![Fragment::ResultsHeader];
        for entry in self.pending_tool_results.drain(..) {
            fragments.extend(render(&entry));
        }
        fragments
    }

    fn complete_reasoning_step(&mut self, content: Option<String>) -> Vec<Fragment> {
        let mut text = std::mem::take(&mut self.step_text);
        if text.trim().is_empty() {
            text = content.unwrap_or_default();
        }
        if text.trim().is_empty() {
            return vec![];
        }

        match parse_react_output(&text) {
            Ok(output) => {
                if let Some(thought) = &output.thought {
                    tracing::debug!(thought = %thought, "Reasoning step");
                }
                if let Some(action) = &output.action {
                    tracing::debug!(
                        tool = %action.tool_name,
                        params = %action.tool_params,
                        "Reasoning step chose an action"
                    );
                }
                match output.answer {
                    Some(answer) => {
                        self.final_answer_emitted = true;
                        vec![Fragment::final_answer(answer)]
                    }
                    None => vec![],
                }
            }
            Err(e) => {
                tracing::warn!("Reasoning step was not valid ReAct JSON: {}", e);
                vec![Fragment::unparsed(text)]
            }
        }
    }
}

/// Format a live turn.
///
/// Consumes one raw step event at a time and yields the fragments it produces.
/// A malformed event yields one error fragment and ends the stream; otherwise
/// the end-of-turn summary follows the last event.
pub fn format_turn<S>(events: S, mode: TurnMode) -> FragmentStream
where
    S: Stream<Item = Value> + Send + 'static,
{
    Box::pin(stream! {
        let mut formatter = TurnFormatter::new(mode);
        let mut events = Box::pin(events);

        while let Some(raw) = events.next().await {
            let fragments = formatter.step_raw(&raw);
            let produced = !fragments.is_empty();
            for fragment in fragments {
                yield fragment;
            }
            if formatter.is_finished() {
                return;
            }
            if !produced {
                // Let other turns run between silent events
                tokio::task::yield_now().await;
            }
        }

        for fragment in formatter.finish() {
            yield fragment;
        }
    })
}
