use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ToolContext, ToolError, TypedTool};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalArgs {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalResult {
    pub approved: bool,
    pub timestamp: DateTime<Utc>,
}

/// Generic yes/no gate.  Executing it means the human said yes; the
/// decline path never reaches the executor.
pub struct ApprovalTool;

#[async_trait::async_trait]
impl TypedTool for ApprovalTool {
    type Args = ApprovalArgs;
    type Output = ApprovalResult;

    async fn run(&self, _ctx: &ToolContext, _args: ApprovalArgs) -> Result<ApprovalResult, ToolError> {
        Ok(ApprovalResult {
            approved: true,
            timestamp: Utc::now(),
        })
    }
}
