use serde::{Deserialize, Serialize};
use std::time::Duration;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Automatic title generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Controls when the title scheduler asks for a conversation title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleConfig {
    /// Enable automatic generation.  Manual regeneration works either way.
    #[serde(default = "d_true")]
    pub auto: bool,

    /// Quiet window after the last qualifying thread update before a title
    /// request fires.
    #[serde(default = "d_debounce_ms")]
    pub debounce_ms: u64,

    /// Minimum number of messages before a title is worth generating.
    #[serde(default = "d_min_messages")]
    pub min_messages: usize,

    /// How many of the most recent messages are sent to the generator.
    #[serde(default = "d_recent_messages")]
    pub recent_messages: usize,

    /// Title shown while no generated title exists.
    #[serde(default = "d_fallback_title")]
    pub fallback_title: String,

    /// Titles treated as "untitled": a thread carrying one of these is still
    /// eligible, and a generator answering with one produced nothing.
    #[serde(default = "d_default_titles")]
    pub default_titles: Vec<String>,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            auto: true,
            debounce_ms: d_debounce_ms(),
            min_messages: d_min_messages(),
            recent_messages: d_recent_messages(),
            fallback_title: d_fallback_title(),
            default_titles: d_default_titles(),
        }
    }
}

impl TitleConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Whether `title` is a placeholder rather than a real title.
    pub fn is_default_title(&self, title: &str) -> bool {
        let title = title.trim();
        title.is_empty()
            || title == self.fallback_title
            || self.default_titles.iter().any(|t| t == title)
    }
}

fn d_true() -> bool {
    true
}

fn d_debounce_ms() -> u64 {
    2000
}

fn d_min_messages() -> usize {
    2
}

fn d_recent_messages() -> usize {
    4
}

fn d_fallback_title() -> String {
    "New Chat".into()
}

fn d_default_titles() -> Vec<String> {
    vec!["New Chat".into(), "新對話".into()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_titles_are_default() {
        let cfg = TitleConfig::default();
        assert!(cfg.is_default_title(""));
        assert!(cfg.is_default_title("New Chat"));
        assert!(cfg.is_default_title("新對話"));
        assert!(!cfg.is_default_title("Refactoring Plan"));
    }

    #[test]
    fn debounce_is_two_seconds_by_default() {
        assert_eq!(TitleConfig::default().debounce(), Duration::from_secs(2));
    }
}
