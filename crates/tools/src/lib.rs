//! Tool execution for parley.
//!
//! - [`ToolExecutor`] / [`TypedTool`]: what a callable capability looks like
//! - [`ToolRegistry`]: name → executor, with an automatic or
//!   confirmation-gated policy per tool
//! - [`payload::ToolInvocation`]: typed view of a call's arguments
//! - [`builtins`]: weather, calculator, navigation and approval tools

pub mod builtins;
pub mod payload;
pub mod registry;
pub mod types;

pub use payload::ToolInvocation;
pub use registry::{ExecutionPolicy, RegisteredTool, ToolRegistry};
pub use types::{ToolContext, ToolError, ToolExecutor, ToolResult, Typed, TypedTool};
