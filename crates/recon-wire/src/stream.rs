//! Display fragments produced while formatting a live turn

use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use tokio_stream::Stream;

/// A piece of displayable text emitted during a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fragment {
    /// Model text streamed as it arrives
    Text { text: String },
    /// Announces that a tool ran
    ToolBanner { tool_name: String },
    /// Reasoning output that could not be parsed, passed through raw
    Unparsed { text: String },
    /// The agent's final answer in reasoning mode
    FinalAnswer { answer: String },
    /// Introduces the end-of-turn tool result summary
    ResultsHeader,
    /// One bullet of a rendered tool result
    ResultLine { line: String },
    /// The turn could not be formatted further
    Error { message: String },
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_banner(tool_name: impl Into<String>) -> Self {
        Self::ToolBanner {
            tool_name: tool_name.into(),
        }
    }

    pub fn unparsed(text: impl Into<String>) -> Self {
        Self::Unparsed { text: text.into() }
    }

    pub fn final_answer(answer: impl Into<String>) -> Self {
        Self::FinalAnswer {
            answer: answer.into(),
        }
    }

    pub fn result_line(line: impl Into<String>) -> Self {
        Self::ResultLine { line: line.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Check if this fragment ends the turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, Fragment::Error { .. })
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Text { text } => f.write_str(text),
            Fragment::ToolBanner { tool_name } => write!(f, "\n\n*Using tool {tool_name}...*\n\n"),
            Fragment::Unparsed { text } => writeln!(f, "[unparsed] {text}"),
            Fragment::FinalAnswer { answer } => write!(f, "Final Answer: {answer}"),
            Fragment::ResultsHeader => f.write_str("\n\nHere's what I found:\n\n"),
            Fragment::ResultLine { line } => writeln!(f, "{line}"),
            Fragment::Error { message } => writeln!(f, "\n\nError: {message}"),
        }
    }
}

/// A stream of display fragments
pub type FragmentStream = Pin<Box<dyn Stream<Item = Fragment> + Send>>;
