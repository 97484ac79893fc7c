use serde::{Deserialize, Serialize};

use crate::tool::ToolCall;

/// Events emitted by the upstream streaming layer for one model turn.
///
/// The coordinator maps these onto thread mutations: tokens become
/// streaming deltas, finished tool calls are routed for execution or
/// confirmation, and `done`/`error` close the running turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "token")]
    Token { text: String },

    #[serde(rename = "tool_call_started")]
    ToolCallStarted { call_id: String, tool_name: String },

    /// Incremental argument text; informational only; the finished event
    /// carries the parsed arguments.
    #[serde(rename = "tool_call_delta")]
    ToolCallDelta { call_id: String, delta: String },

    #[serde(rename = "tool_call_finished")]
    ToolCallFinished {
        call_id: String,
        tool_name: String,
        arguments: serde_json::Value,
    },

    #[serde(rename = "done")]
    Done {
        #[serde(default)]
        usage: Option<Usage>,
        #[serde(default)]
        finish_reason: Option<String>,
    },

    #[serde(rename = "error")]
    Error { message: String },
}

impl StreamEvent {
    /// Whether this event ends the running turn.
    pub fn ends_turn(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// The completed tool call carried by a `tool_call_finished` event.
    pub fn finished_tool_call(&self) -> Option<ToolCall> {
        match self {
            Self::ToolCallFinished { call_id, tool_name, arguments } => Some(ToolCall {
                call_id: call_id.clone(),
                tool_name: tool_name.clone(),
                arguments: arguments.clone(),
            }),
            _ => None,
        }
    }
}

/// Token usage for a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
