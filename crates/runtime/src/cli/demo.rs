//! `parley demo`: a scripted two-turn conversation.
//!
//! The model side is canned: each turn is a list of stream events.  Tool
//! calls that need a human decision are put to the terminal (or decided by
//! `--approve-all` / `--reject-all`), and the title scheduler runs against
//! the configured LLM endpoint.  Without a reachable endpoint the title
//! stays at its fallback.

use std::sync::Arc;
use std::time::Duration;

use pl_domain::config::Config;
use pl_domain::record::{ToolCallRecord, ToolOutcome};
use pl_domain::stream::StreamEvent;
use pl_domain::tool::Role;
use pl_providers::{LlmTitleGenerator, OpenAiCompatProvider};
use pl_tools::builtins::{register_builtins, NavigationTarget, Navigator};
use pl_tools::{ToolInvocation, ToolRegistry};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;

use crate::confirmation::Resolution;
use crate::coordinator::ThreadCoordinator;
use crate::events::CoordinatorEvent;

/// How pending tool calls are decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionMode {
    Prompt,
    ApproveAll,
    RejectAll,
}

impl DecisionMode {
    pub fn from_flags(approve_all: bool, reject_all: bool) -> Self {
        match (approve_all, reject_all) {
            (true, _) => Self::ApproveAll,
            (_, true) => Self::RejectAll,
            _ => Self::Prompt,
        }
    }
}

/// Prints navigation requests instead of driving a UI.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, target: NavigationTarget) -> Result<(), String> {
        match target.path() {
            Some(path) => eprintln!("  [navigate] {path}"),
            None => eprintln!("  [navigate] {}", target.label()),
        }
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Script
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Turn {
    user: &'static str,
    events: Vec<StreamEvent>,
}

fn call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

fn tokens(text: &str) -> impl Iterator<Item = StreamEvent> + '_ {
    text.split_inclusive(' ')
        .map(|t| StreamEvent::Token { text: t.to_string() })
}

fn finished(tool_name: &str, arguments: serde_json::Value) -> StreamEvent {
    StreamEvent::ToolCallFinished {
        call_id: call_id(),
        tool_name: tool_name.to_string(),
        arguments,
    }
}

fn done() -> StreamEvent {
    StreamEvent::Done {
        usage: None,
        finish_reason: Some("tool_calls".into()),
    }
}

fn script() -> Vec<Turn> {
    let mut first: Vec<StreamEvent> = tokens("Let me work that out and check the forecast. ").collect();
    first.push(finished("calculator", json!({"expression": "(12 + 8) * 3"})));
    first.push(finished("getWeather", json!({"location": "Tokyo", "unit": "celsius"})));
    first.push(done());

    let mut second: Vec<StreamEvent> = tokens("Opening your settings. ").collect();
    second.push(finished(
        "navigationGuide",
        json!({"target": "settings", "reason": "change the display units"}),
    ));
    second.push(done());

    vec![
        Turn {
            user: "What is (12 + 8) * 3, and what's the weather in Tokyo this week?",
            events: first,
        },
        Turn {
            user: "Can you take me to the settings page?",
            events: second,
        },
    ]
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn run(config: Config, mode: DecisionMode) -> anyhow::Result<()> {
    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry, Arc::new(ConsoleNavigator));

    let provider = OpenAiCompatProvider::from_config(&config.llm)?;
    let generator = LlmTitleGenerator::new(Arc::new(provider), &config.title).with_temperature(config.llm.temperature);
    let coordinator = ThreadCoordinator::new(&config, registry, Arc::new(generator))?;
    let mut title_events = coordinator.events().subscribe();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    for turn in script() {
        println!("you> {}", turn.user);
        coordinator.user_message(turn.user);

        for event in turn.events {
            if let Some(resolution) = coordinator.apply(event).await {
                report(&resolution);
            }
        }
        println!("assistant> {}", last_assistant_text(&coordinator));

        for record in coordinator.resolver().pending() {
            let approve = decide(&record, mode, &mut stdin).await?;
            let resolution = if approve {
                coordinator.resolver().approve(&record.id).await
            } else {
                coordinator.resolver().reject(&record.id)
            };
            report(&resolution);
        }
    }

    let wait = config.title.debounce() + Duration::from_secs(config.llm.timeout_secs) + Duration::from_secs(1);
    match tokio::time::timeout(wait, wait_for_title(&mut title_events)).await {
        Ok(()) => {}
        Err(_) => tracing::warn!("no title outcome before the demo ended"),
    }
    println!("title> {}", coordinator.titles().display_title());

    coordinator.titles().teardown();
    Ok(())
}

async fn wait_for_title(rx: &mut tokio::sync::broadcast::Receiver<CoordinatorEvent>) {
    loop {
        match rx.recv().await {
            Ok(CoordinatorEvent::TitleGenerated { .. } | CoordinatorEvent::TitleFailed { .. }) => return,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return,
        }
    }
}

async fn decide(record: &ToolCallRecord, mode: DecisionMode, stdin: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<bool> {
    let summary = ToolInvocation::parse(&record.name, &record.arguments).summary();
    match mode {
        DecisionMode::ApproveAll => {
            println!("confirm> {summary} [auto-approved]");
            Ok(true)
        }
        DecisionMode::RejectAll => {
            println!("confirm> {summary} [auto-rejected]");
            Ok(false)
        }
        DecisionMode::Prompt => {
            println!("confirm> {summary}? [y/N]");
            let answer = stdin.next_line().await?.unwrap_or_default();
            Ok(parse_answer(&answer))
        }
    }
}

fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn report(resolution: &Resolution) {
    match resolution {
        Resolution::Committed(record) => {
            let detail = match &record.result {
                Some(ToolOutcome::Complete { payload }) => payload.to_string(),
                Some(ToolOutcome::Incomplete { error }) => error.to_string(),
                None => String::new(),
            };
            println!("tool> {} [{}] {detail}", record.name, record.status);
        }
        Resolution::AwaitingConfirmation => {}
        Resolution::Discarded(status) => println!("tool> decision ignored, already {status}"),
        Resolution::NotFound => println!("tool> unknown tool call"),
    }
}

fn last_assistant_text(coordinator: &ThreadCoordinator) -> String {
    coordinator
        .thread()
        .snapshot()
        .messages
        .iter()
        .rev()
        .filter(|m| m.role == Role::Assistant)
        .find_map(|m| m.content.text().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pick_mode() {
        assert_eq!(DecisionMode::from_flags(true, false), DecisionMode::ApproveAll);
        assert_eq!(DecisionMode::from_flags(false, true), DecisionMode::RejectAll);
        assert_eq!(DecisionMode::from_flags(false, false), DecisionMode::Prompt);
    }

    #[test]
    fn only_explicit_yes_approves() {
        assert!(parse_answer("y"));
        assert!(parse_answer(" YES\n"));
        assert!(!parse_answer(""));
        assert!(!parse_answer("nope"));
    }

    #[test]
    fn script_ends_every_turn() {
        for turn in script() {
            assert!(turn.events.last().is_some_and(StreamEvent::ends_turn));
            assert!(turn.events.iter().any(|e| e.finished_tool_call().is_some()));
        }
    }
}
