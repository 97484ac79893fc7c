//! Core types for tool execution: context, results, errors, and the
//! executor traits the registry dispatches to.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Context provided to every executor invocation.
#[derive(Clone, Debug)]
pub struct ToolContext {
    /// Upstream tool call id this execution resolves.
    pub call_id: String,
    /// Tool name as requested by the model.
    pub tool_name: String,
    /// Cancelled when the caller gives up on the execution (timeout).
    pub cancel: CancellationToken,
}

impl ToolContext {
    pub fn new(call_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            cancel: CancellationToken::new(),
        }
    }
}

/// Result type for tool executors.
pub type ToolResult = Result<serde_json::Value, ToolError>;

/// Errors an executor can return.
///
/// The `Display` text becomes the error message of the `incomplete` record,
/// so `Failed` carries the underlying message verbatim.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("{0}")]
    Failed(String),
    #[error("{0}")]
    NotFound(String),
}

/// Implement this trait to make a capability callable by the model.
///
/// Executors run on the Tokio runtime and may perform async I/O.  The
/// arguments are the raw JSON emitted by the model.
#[async_trait::async_trait]
pub trait ToolExecutor: Send + Sync + 'static {
    async fn execute(&self, ctx: ToolContext, args: serde_json::Value) -> ToolResult;
}

/// A tool with its own argument and output schema.
///
/// Wrap it in [`Typed`] to register it; decoding and encoding of the JSON
/// payloads happens in one place instead of in every tool.
#[async_trait::async_trait]
pub trait TypedTool: Send + Sync + 'static {
    type Args: DeserializeOwned + Send;
    type Output: Serialize + Send;

    async fn run(&self, ctx: &ToolContext, args: Self::Args) -> Result<Self::Output, ToolError>;
}

/// Adapter turning a [`TypedTool`] into a [`ToolExecutor`].
pub struct Typed<T>(pub T);

#[async_trait::async_trait]
impl<T: TypedTool> ToolExecutor for Typed<T> {
    async fn execute(&self, ctx: ToolContext, args: serde_json::Value) -> ToolResult {
        let args: T::Args =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidArgs(e.to_string()))?;
        let output = self.0.run(&ctx, args).await?;
        serde_json::to_value(output).map_err(|e| ToolError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct AddArgs {
        a: i64,
        b: i64,
    }

    #[derive(Serialize)]
    struct Sum {
        sum: i64,
    }

    struct Add;

    #[async_trait::async_trait]
    impl TypedTool for Add {
        type Args = AddArgs;
        type Output = Sum;

        async fn run(&self, _ctx: &ToolContext, args: AddArgs) -> Result<Sum, ToolError> {
            Ok(Sum { sum: args.a + args.b })
        }
    }

    #[tokio::test]
    async fn typed_tool_round_trips_json() {
        let tool = Typed(Add);
        let out = tool
            .execute(ToolContext::new("c1", "add"), serde_json::json!({"a": 2, "b": 3}))
            .await
            .unwrap();
        assert_eq!(out, serde_json::json!({"sum": 5}));
    }

    #[tokio::test]
    async fn typed_tool_rejects_bad_args() {
        let tool = Typed(Add);
        let err = tool
            .execute(ToolContext::new("c1", "add"), serde_json::json!({"a": "two"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }

    #[test]
    fn failed_message_is_verbatim() {
        assert_eq!(ToolError::Failed("rate limited".into()).to_string(), "rate limited");
    }
}
