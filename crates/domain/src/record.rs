//! Tool call records: identity plus the status/result lifecycle of one
//! emitted tool invocation.
//!
//! A record is created `pending_execution`, may pass through
//! `awaiting_confirmation` and `running`, and ends in exactly one terminal
//! status.  [`ToolCallRecord::commit`] is the only way to reach a terminal
//! status and refuses a second commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::{Message, ToolCall};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Status
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    PendingExecution,
    AwaitingConfirmation,
    Running,
    Complete,
    Incomplete,
}

impl ToolCallStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Incomplete)
    }
}

impl std::fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PendingExecution => "pending_execution",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
        };
        f.write_str(s)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outcome
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The human rejected the call.
    UserDeclined,
    /// The tool's own executor returned an error or panicked.
    ExecutionFailed,
    /// The executor exceeded the configured timeout.
    TimedOut,
    /// No executor is registered under the requested name.
    UnknownTool,
}

/// Error descriptor stored on an `incomplete` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ToolFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// The terminal result of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Complete { payload: serde_json::Value },
    Incomplete { error: ToolFailure },
}

impl ToolOutcome {
    pub fn complete(payload: serde_json::Value) -> Self {
        Self::Complete { payload }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Incomplete { error: ToolFailure::new(kind, message) }
    }

    pub fn status(&self) -> ToolCallStatus {
        match self {
            Self::Complete { .. } => ToolCallStatus::Complete,
            Self::Incomplete { .. } => ToolCallStatus::Incomplete,
        }
    }

    pub fn failure(&self) -> Option<&ToolFailure> {
        match self {
            Self::Complete { .. } => None,
            Self::Incomplete { error } => Some(error),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
    pub status: ToolCallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ToolOutcome>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ToolCallRecord {
    pub fn new(call: ToolCall) -> Self {
        Self {
            id: call.call_id,
            name: call.tool_name,
            arguments: call.arguments,
            status: ToolCallStatus::PendingExecution,
            result: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to a non-terminal status.  Ignored once the record is terminal.
    pub fn transition(&mut self, status: ToolCallStatus) -> bool {
        if self.is_terminal() || status.is_terminal() {
            return false;
        }
        self.status = status;
        true
    }

    /// Commit the terminal outcome.  Returns `false` (and leaves the stored
    /// result untouched) when the record was already terminal.
    pub fn commit(&mut self, outcome: ToolOutcome) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = outcome.status();
        self.result = Some(outcome);
        self.resolved_at = Some(Utc::now());
        true
    }

    /// Commit only while the record is still in `expected`.
    pub fn commit_if(&mut self, expected: ToolCallStatus, outcome: ToolOutcome) -> bool {
        self.status == expected && self.commit(outcome)
    }

    /// The tool-result message the upstream model sees on its next turn.
    pub fn resolution_message(&self) -> Option<Message> {
        match self.result.as_ref()? {
            ToolOutcome::Complete { payload } => {
                let content = match payload {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some(Message::tool_result(&self.id, content))
            }
            ToolOutcome::Incomplete { error } => {
                Some(Message::tool_error(&self.id, error.message.clone()))
            }
        }
    }
}
