use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Title model provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// OpenAI-compatible endpoint used by the title generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    /// Environment variable holding the API key.  An unset variable sends
    /// no auth header (local endpoints such as Ollama).
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "d_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            model: d_model(),
            api_key_env: d_api_key_env(),
            timeout_secs: d_timeout_secs(),
            temperature: d_temperature(),
        }
    }
}

fn d_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn d_model() -> String {
    "gpt-4o-mini".into()
}

fn d_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

fn d_timeout_secs() -> u64 {
    30
}

fn d_temperature() -> f32 {
    0.3
}
