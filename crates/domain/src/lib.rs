//! Shared types for parley: conversation messages, upstream stream events,
//! tool call records, the configuration tree, and the common error type.

pub mod config;
pub mod error;
pub mod record;
pub mod stream;
pub mod tool;

pub use error::{Error, Result};
pub use record::{FailureKind, ToolCallRecord, ToolCallStatus, ToolFailure, ToolOutcome};
pub use tool::{ContentPart, Message, MessageContent, Role, ToolCall};
