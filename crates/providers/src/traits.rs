use pl_domain::error::Result;
use pl_domain::stream::Usage;
use pl_domain::tool::Message;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Sampling temperature. `None` lets the provider choose.
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the model for a single JSON object.
    pub json_mode: bool,
    /// Model override. When `None`, the provider uses its default.
    pub model: Option<String>,
}

/// A provider-agnostic chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: Option<Usage>,
    /// The model that actually produced the response.
    pub model: String,
    pub finish_reason: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A chat-completion backend.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and wait for the full response.
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    /// Identifier used in logs and error messages.
    fn provider_id(&self) -> &str;
}
