mod confirmation;
mod llm;
mod observability;
mod title;

pub use confirmation::*;
pub use llm::*;
pub use observability::*;
pub use title::*;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub title: TitleConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Reject combinations that parse but cannot work at runtime.
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.min_messages == 0 {
            return Err(crate::Error::Config(
                "title.min_messages must be at least 1".into(),
            ));
        }
        if self.title.recent_messages == 0 {
            return Err(crate::Error::Config(
                "title.recent_messages must be at least 1".into(),
            ));
        }
        if self.confirmation.executor_timeout_secs == Some(0) {
            return Err(crate::Error::Config(
                "confirmation.executor_timeout_secs must be positive when set".into(),
            ));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(crate::Error::Config("llm.base_url must not be empty".into()));
        }
        Ok(())
    }
}
