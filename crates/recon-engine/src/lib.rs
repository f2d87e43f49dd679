//! recon-engine: Agent event reconstruction
//!
//! Turns stored conversation items into ordered chat messages with their tool
//! calls attached, and formats a live turn's step events into display text.

pub mod formatter;
pub mod grouper;
pub mod normalize;
pub mod react;
pub mod render;
pub mod sse;

pub use formatter::{TurnFormatter, TurnMode, format_turn};
pub use grouper::{DropReason, DroppedToolCalls, Grouped, MessageGrouper, group, group_value};
pub use normalize::normalize;
pub use react::{ReActAction, ReActOutput, parse_react_output};
pub use recon_wire::{Error, Result};
pub use render::{ToolResultEntry, render};
pub use sse::{into_sse, sse_frame};
