//! In-memory conversation thread.
//!
//! The thread owns the message list, the running flag and its metadata.
//! The resolver and the title scheduler only read it through
//! [`ThreadObserver`] and write back through [`ConversationSink`].

use parking_lot::RwLock;
use pl_domain::tool::{ContentPart, Message, MessageContent, Role};
use serde::{Deserialize, Serialize};

use crate::observer::{Callback, Subscribers, Subscription, ThreadObserver};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    #[default]
    Regular,
    Archived,
}

/// Point-in-time copy of a thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThreadSnapshot {
    pub messages: Vec<Message>,
    pub is_running: bool,
    pub title: Option<String>,
    pub status: ThreadStatus,
}

impl ThreadSnapshot {
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Write boundary into a thread: tool resolutions are appended as
/// messages, generated titles land in the metadata.
pub trait ConversationSink: Send + Sync {
    fn append(&self, message: Message);
    fn set_title(&self, title: &str);
}

#[derive(Default)]
pub struct ThreadRuntime {
    state: RwLock<ThreadSnapshot>,
    subscribers: Subscribers,
}

impl ThreadRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing transcript.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            state: RwLock::new(ThreadSnapshot {
                messages,
                ..Default::default()
            }),
            subscribers: Subscribers::default(),
        }
    }

    /// Apply a mutation, then notify.  The write lock is released before
    /// any callback runs.
    fn mutate<R>(&self, f: impl FnOnce(&mut ThreadSnapshot) -> R) -> R {
        let out = {
            let mut state = self.state.write();
            f(&mut state)
        };
        self.subscribers.notify();
        out
    }

    pub fn append(&self, message: Message) {
        self.mutate(|s| s.messages.push(message));
    }

    pub fn begin_turn(&self) {
        self.mutate(|s| s.is_running = true);
    }

    pub fn end_turn(&self) {
        self.mutate(|s| s.is_running = false);
    }

    /// Extend the trailing assistant text with a streamed delta, or start a
    /// new assistant message when the thread does not end in one.
    pub fn push_text_delta(&self, delta: &str) {
        self.mutate(|s| {
            if let Some(last) = s.messages.last_mut() {
                if last.role == Role::Assistant && append_text(&mut last.content, delta) {
                    return;
                }
            }
            s.messages.push(Message::assistant(delta));
        });
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.mutate(|s| s.title = Some(title));
    }

    pub fn set_status(&self, status: ThreadStatus) {
        self.mutate(|s| s.status = status);
    }

    pub fn snapshot(&self) -> ThreadSnapshot {
        self.state.read().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

fn append_text(content: &mut MessageContent, delta: &str) -> bool {
    match content {
        MessageContent::Text(text) => {
            text.push_str(delta);
            true
        }
        MessageContent::Parts(parts) => match parts.last_mut() {
            Some(ContentPart::Text { text }) => {
                text.push_str(delta);
                true
            }
            _ => false,
        },
    }
}

impl ThreadObserver for ThreadRuntime {
    fn subscribe(&self, callback: Callback) -> Subscription {
        self.subscribers.add(callback)
    }

    fn snapshot(&self) -> ThreadSnapshot {
        ThreadRuntime::snapshot(self)
    }
}

impl ConversationSink for ThreadRuntime {
    fn append(&self, message: Message) {
        ThreadRuntime::append(self, message);
    }

    fn set_title(&self, title: &str) {
        ThreadRuntime::set_title(self, title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pl_domain::tool::ToolCall;
    use std::sync::Arc;

    #[test]
    fn deltas_extend_trailing_assistant_text() {
        let thread = ThreadRuntime::new();
        thread.append(Message::user("hi"));
        thread.push_text_delta("Hel");
        thread.push_text_delta("lo");

        let snap = thread.snapshot();
        assert_eq!(snap.message_count(), 2);
        assert_eq!(snap.messages[1].content.text(), Some("Hello"));
    }

    #[test]
    fn delta_after_tool_use_starts_new_message() {
        let thread = ThreadRuntime::new();
        thread.push_text_delta("Checking.");
        thread.append(Message::tool_use(&ToolCall {
            call_id: "c1".into(),
            tool_name: "calculator".into(),
            arguments: serde_json::json!({"expression": "1+1"}),
        }));
        thread.push_text_delta("Done");
        assert_eq!(thread.snapshot().message_count(), 3);
    }

    #[test]
    fn callbacks_see_the_mutation_they_report() {
        let thread = Arc::new(ThreadRuntime::new());
        let seen: Arc<Mutex<Vec<(usize, bool)>>> = Arc::default();

        let (t, s) = (thread.clone(), seen.clone());
        let _sub = thread.subscribe(Arc::new(move || {
            let snap = ThreadObserver::snapshot(&*t);
            s.lock().push((snap.message_count(), snap.is_running));
        }));

        thread.append(Message::user("hi"));
        thread.begin_turn();
        thread.push_text_delta("yo");
        thread.end_turn();

        assert_eq!(*seen.lock(), vec![(1, false), (1, true), (2, true), (2, false)]);
    }

    #[test]
    fn metadata_mutations_notify_too() {
        let thread = ThreadRuntime::new();
        let hits = Arc::new(Mutex::new(0));
        let h = hits.clone();
        let _sub = thread.subscribe(Arc::new(move || *h.lock() += 1));

        thread.set_title("Trip planning");
        thread.set_status(ThreadStatus::Archived);

        assert_eq!(*hits.lock(), 2);
        let snap = thread.snapshot();
        assert_eq!(snap.title.as_deref(), Some("Trip planning"));
        assert_eq!(snap.status, ThreadStatus::Archived);
    }
}
