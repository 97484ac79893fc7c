//! Per-thread wiring: one conversation, its confirmation resolver and its
//! title scheduler, fed by the upstream stream events.

use std::sync::Arc;

use pl_domain::config::Config;
use pl_domain::error::Result;
use pl_domain::stream::StreamEvent;
use pl_domain::tool::{Message, ToolCall};
use pl_providers::TitleGenerator;
use pl_tools::ToolRegistry;

use crate::confirmation::{ConfirmationResolver, Resolution};
use crate::events::EventBus;
use crate::thread::ThreadRuntime;
use crate::title::TitleScheduler;

pub struct ThreadCoordinator {
    thread: Arc<ThreadRuntime>,
    resolver: ConfirmationResolver,
    titles: TitleScheduler,
    events: EventBus,
}

impl ThreadCoordinator {
    /// Build a coordinator over a fresh thread.  Must run inside a Tokio
    /// runtime.
    pub fn new(config: &Config, registry: ToolRegistry, generator: Arc<dyn TitleGenerator>) -> Result<Self> {
        Self::with_thread(Arc::new(ThreadRuntime::new()), config, registry, generator)
    }

    pub fn with_thread(
        thread: Arc<ThreadRuntime>,
        config: &Config,
        registry: ToolRegistry,
        generator: Arc<dyn TitleGenerator>,
    ) -> Result<Self> {
        let events = EventBus::new();
        let resolver = ConfirmationResolver::new(registry, thread.clone(), events.clone(), &config.confirmation);
        let titles = TitleScheduler::attach(
            thread.clone(),
            thread.clone(),
            generator,
            config.title.clone(),
            events.clone(),
        )?;
        Ok(Self {
            thread,
            resolver,
            titles,
            events,
        })
    }

    pub fn thread(&self) -> &Arc<ThreadRuntime> {
        &self.thread
    }

    pub fn resolver(&self) -> &ConfirmationResolver {
        &self.resolver
    }

    pub fn titles(&self) -> &TitleScheduler {
        &self.titles
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Record a user message and mark the thread as running a model turn.
    pub fn user_message(&self, text: impl Into<String>) {
        self.thread.append(Message::user(text));
        self.thread.begin_turn();
    }

    /// Apply one upstream stream event.  Returns the resolver's answer for
    /// finished tool calls.
    pub async fn apply(&self, event: StreamEvent) -> Option<Resolution> {
        match event {
            StreamEvent::Token { text } => {
                self.thread.push_text_delta(&text);
                None
            }
            StreamEvent::ToolCallStarted { call_id, tool_name } => {
                tracing::trace!(tool_call_id = %call_id, tool_name = %tool_name, "tool call started");
                None
            }
            StreamEvent::ToolCallDelta { call_id, delta } => {
                tracing::trace!(tool_call_id = %call_id, bytes = delta.len(), "tool call delta");
                None
            }
            StreamEvent::ToolCallFinished {
                call_id,
                tool_name,
                arguments,
            } => {
                let call = ToolCall {
                    call_id,
                    tool_name,
                    arguments,
                };
                self.thread.append(Message::tool_use(&call));
                Some(self.resolver.route(call).await)
            }
            StreamEvent::Done { usage, finish_reason } => {
                tracing::debug!(
                    finish_reason = finish_reason.as_deref().unwrap_or("stop"),
                    total_tokens = usage.map(|u| u.total_tokens),
                    "model turn finished"
                );
                self.thread.end_turn();
                None
            }
            StreamEvent::Error { message } => {
                tracing::warn!(error = %message, "model stream failed");
                self.thread.end_turn();
                None
            }
        }
    }

    /// Apply a whole turn in order.
    pub async fn apply_all(&self, events: impl IntoIterator<Item = StreamEvent>) -> Vec<Resolution> {
        let mut resolutions = Vec::new();
        for event in events {
            if let Some(resolution) = self.apply(event).await {
                resolutions.push(resolution);
            }
        }
        resolutions
    }
}
