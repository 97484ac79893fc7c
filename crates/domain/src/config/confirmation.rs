use serde::{Deserialize, Serialize};
use std::time::Duration;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Human-in-the-loop tool confirmation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Error message committed when the human rejects a tool call.
    #[serde(default = "d_decline_message")]
    pub decline_message: String,

    /// Upper bound on an approved executor's run time.  `None` (the
    /// default) waits indefinitely and the record stays `running`.
    #[serde(default)]
    pub executor_timeout_secs: Option<u64>,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            decline_message: d_decline_message(),
            executor_timeout_secs: None,
        }
    }
}

impl ConfirmationConfig {
    pub fn executor_timeout(&self) -> Option<Duration> {
        self.executor_timeout_secs.map(Duration::from_secs)
    }
}

fn d_decline_message() -> String {
    "User declined the tool call".into()
}
