//! recon-wire: Data model for agent event reconstruction
//!
//! This crate parses the raw conversation items and turn step events produced by
//! the agent-orchestration service into closed Rust types, and defines the
//! `Message` and `Fragment` records handed back to the response layer.

pub mod error;
pub mod step;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use step::{StepDetails, StepEvent, ToolResponse};
pub use stream::{Fragment, FragmentStream};
pub use types::*;
