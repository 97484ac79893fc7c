//! `parley title <file>`: one-shot title for a saved transcript.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use pl_domain::config::Config;
use pl_domain::tool::Message;
use pl_providers::{LlmTitleGenerator, OpenAiCompatProvider, TitleGenerator};

/// Print a title for the transcript at `path`.  Prints the fallback and
/// returns `false` when generation fails.
pub async fn run(config: &Config, path: &Path) -> anyhow::Result<bool> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let messages: Vec<Message> =
        serde_json::from_str(&raw).with_context(|| format!("parsing transcript {}", path.display()))?;

    let provider = OpenAiCompatProvider::from_config(&config.llm)?;
    let generator = LlmTitleGenerator::new(Arc::new(provider), &config.title).with_temperature(config.llm.temperature);

    match generator.generate(&messages).await {
        Ok(title) if !config.title.is_default_title(&title) => {
            println!("{title}");
            Ok(true)
        }
        Ok(title) => {
            tracing::warn!(title = %title, "generator returned a placeholder title");
            println!("{}", config.title.fallback_title);
            Ok(false)
        }
        Err(e) => {
            tracing::warn!(error = %e, "title generation failed");
            println!("{}", config.title.fallback_title);
            Ok(false)
        }
    }
}
