//! OpenAI-compatible adapter.
//!
//! Works with OpenAI, Ollama, vLLM, LM Studio, Together, and any other
//! endpoint that follows the OpenAI chat completions contract.

use std::time::Duration;

use pl_domain::config::LlmConfig;
use pl_domain::error::{Error, Result};
use pl_domain::stream::Usage;
use pl_domain::tool::Message;
use serde_json::Value;

use crate::traits::{ChatRequest, ChatResponse, LlmProvider};
use crate::util::{from_reqwest, resolve_api_key};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiCompatProvider {
    id: String,
    base_url: String,
    api_key: Option<String>,
    default_model: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Build the adapter from the `[llm]` config section.  The API key is
    /// read once, here.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        if cfg.base_url.trim().is_empty() {
            return Err(Error::Config("llm.base_url must not be empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: "openai_compat".into(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: resolve_api_key(&cfg.api_key_env),
            default_model: cfg.model.clone(),
            client,
        })
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json");
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn build_chat_body(&self, req: &ChatRequest) -> Value {
        let messages: Vec<Value> = req.messages.iter().map(msg_to_openai).collect();
        let model = req.model.clone().unwrap_or_else(|| self.default_model.clone());

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });

        if let Some(temp) = req.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = req.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        if req.json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }
        body
    }

    fn provider_error(&self, message: impl Into<String>) -> Error {
        Error::Provider {
            provider: self.id.clone(),
            message: message.into(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message serialization helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Text-only rendering: tool parts and images are flattened away.
fn msg_to_openai(msg: &Message) -> Value {
    serde_json::json!({
        "role": msg.role.as_str(),
        "content": msg.content.extract_all_text(),
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn parse_chat_response(body: &Value) -> std::result::Result<ChatResponse, &'static str> {
    let choice = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .ok_or("no choices in response")?;
    let message = choice.get("message").ok_or("no message in choice")?;

    Ok(ChatResponse {
        content: message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        usage: body.get("usage").and_then(parse_usage),
        model: body
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        finish_reason: choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .map(String::from),
    })
}

fn parse_usage(v: &Value) -> Option<Usage> {
    Some(Usage {
        prompt_tokens: v.get("prompt_tokens")?.as_u64()? as u32,
        completion_tokens: v.get("completion_tokens")?.as_u64()? as u32,
        total_tokens: v.get("total_tokens")?.as_u64()? as u32,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_chat_body(req);

        tracing::debug!(provider = %self.id, url = %url, json_mode = req.json_mode, "chat request");

        let resp = self
            .authed_post(&url)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(self.provider_error(format!("HTTP {} - {}", status.as_u16(), resp_text)));
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_chat_response(&resp_json).map_err(|m| self.provider_error(m))
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
