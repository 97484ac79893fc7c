//! Coordinator event feed for presentation layers.
//!
//! Confirmation surfaces and title indicators subscribe here instead of
//! polling the resolver or scheduler.  Emitting with no subscribers is not
//! an error.

use pl_domain::record::ToolCallStatus;
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    ToolCallAwaitingConfirmation {
        call_id: String,
        tool_name: String,
        summary: String,
    },
    ToolCallResolved {
        call_id: String,
        tool_name: String,
        status: ToolCallStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    TitleGenerating {
        forced: bool,
    },
    TitleGenerated {
        title: String,
    },
    TitleFailed {
        error: String,
    },
}

const EVENT_CAPACITY: usize = 128;

#[derive(Clone)]
pub struct EventBus {
    event_tx: broadcast::Sender<CoordinatorEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { event_tx }
    }

    pub fn emit(&self, event: CoordinatorEvent) {
        // No receivers is the normal headless case.
        let _ = self.event_tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.event_tx.subscribe()
    }
}
