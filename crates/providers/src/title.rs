//! Conversation title generation.
//!
//! [`TitleGenerator`] is the boundary the title scheduler calls.
//! [`LlmTitleGenerator`] implements it on top of any [`LlmProvider`] by
//! asking for a JSON object `{"title": "..."}` built from the last few
//! messages of the thread.

use std::sync::Arc;

use pl_domain::config::TitleConfig;
use pl_domain::error::{Error, Result};
use pl_domain::tool::Message;
use serde::Deserialize;

use crate::traits::{ChatRequest, LlmProvider};

const MIN_TITLE_CHARS: usize = 2;
const MAX_TITLE_CHARS: usize = 50;

const SYSTEM_PROMPT: &str = "You name conversations. Reply with a JSON object \
{\"title\": \"...\"} whose title captures the core topic in 2-8 words, written \
in the language of the conversation. Avoid placeholders such as \"New Chat\".";

/// Produces a short title for a conversation, or fails.
#[async_trait::async_trait]
pub trait TitleGenerator: Send + Sync {
    async fn generate(&self, messages: &[Message]) -> Result<String>;
}

pub struct LlmTitleGenerator {
    provider: Arc<dyn LlmProvider>,
    recent_messages: usize,
    temperature: Option<f32>,
}

impl LlmTitleGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &TitleConfig) -> Self {
        Self {
            provider,
            recent_messages: config.recent_messages.max(1),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Render the tail of the conversation as `role: text` lines.
pub fn render_transcript(messages: &[Message], recent: usize) -> String {
    let start = messages.len().saturating_sub(recent);
    messages[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content.extract_all_text()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Deserialize)]
struct TitlePayload {
    title: String,
}

/// Pull the title out of the model's JSON answer and check its length.
pub fn parse_title(raw: &str) -> Result<String> {
    let payload: TitlePayload = serde_json::from_str(raw.trim())?;
    let title = payload.title.trim();
    let len = title.chars().count();
    if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len) {
        return Err(Error::Other(format!(
            "title must be {MIN_TITLE_CHARS}-{MAX_TITLE_CHARS} characters, got {len}"
        )));
    }
    Ok(title.to_string())
}

#[async_trait::async_trait]
impl TitleGenerator for LlmTitleGenerator {
    async fn generate(&self, messages: &[Message]) -> Result<String> {
        if messages.is_empty() {
            return Err(Error::Other("no messages provided".into()));
        }

        let transcript = render_transcript(messages, self.recent_messages);
        let req = ChatRequest {
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(format!("Conversation:\n{transcript}")),
            ],
            temperature: self.temperature,
            json_mode: true,
            ..Default::default()
        };

        let resp = self.provider.chat(&req).await?;
        let title = parse_title(&resp.content)?;
        tracing::debug!(provider = %self.provider.provider_id(), title = %title, "title generated");
        Ok(title)
    }
}
