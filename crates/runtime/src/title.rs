//! Title scheduler: debounced, single-flight title generation for one
//! thread.
//!
//! ```text
//! idle ──(qualifying update)──▶ armed ──(quiet window elapsed)──▶ in-flight ──▶ settled
//!            ▲                    │
//!            └─(update re-arms)───┘
//! ```
//!
//! A thread update qualifies when the thread is idle, regular, still carries
//! a placeholder title, has enough messages, and no attempt has been made
//! yet.  Arming cancels and replaces the previous timer.  Both the "in
//! flight" and "attempted" flags are set before the generator is called, so
//! updates arriving during the call cannot schedule a second one.  A failed
//! attempt is not retried automatically; [`TitleScheduler::force_regenerate`]
//! always can.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use pl_domain::config::TitleConfig;
use pl_domain::error::{Error, Result};
use pl_domain::tool::Message;
use pl_providers::TitleGenerator;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::{CoordinatorEvent, EventBus};
use crate::observer::{Subscription, ThreadObserver};
use crate::thread::{ConversationSink, ThreadSnapshot, ThreadStatus};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// State
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Observable title state of one thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TitleState {
    pub has_generated: bool,
    pub is_generating: bool,
    pub generated_title: Option<String>,
    /// A debounce timer is pending.
    pub armed: bool,
}

/// Result of a manual regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenerateOutcome {
    Generated(String),
    Failed(String),
    /// A request was already outstanding; nothing was started.
    AlreadyInFlight,
    /// The scheduler was torn down before the answer arrived.
    Discarded,
}

struct Timer {
    token: CancellationToken,
    epoch: u64,
}

#[derive(Default)]
struct Slot {
    state: TitleState,
    timer: Option<Timer>,
    epoch: u64,
}

impl Slot {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.token.cancel();
        }
        self.state.armed = false;
    }

    /// Take the single-flight guard.
    fn begin_flight(&mut self) {
        self.state.is_generating = true;
        self.state.has_generated = true;
    }
}

struct Inner {
    observer: Arc<dyn ThreadObserver>,
    sink: Arc<dyn ConversationSink>,
    generator: Arc<dyn TitleGenerator>,
    events: EventBus,
    config: TitleConfig,
    slot: Mutex<Slot>,
    alive: AtomicBool,
    handle: Handle,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scheduler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct TitleScheduler {
    inner: Arc<Inner>,
    subscription: Mutex<Option<Subscription>>,
}

impl TitleScheduler {
    /// Subscribe to `observer` and start watching for a title opportunity.
    ///
    /// Must be called from within a Tokio runtime; timers and generator
    /// calls are spawned onto it.
    pub fn attach(
        observer: Arc<dyn ThreadObserver>,
        sink: Arc<dyn ConversationSink>,
        generator: Arc<dyn TitleGenerator>,
        config: TitleConfig,
        events: EventBus,
    ) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| Error::Runtime(format!("title scheduler needs a tokio runtime: {e}")))?;

        let inner = Arc::new(Inner {
            observer: observer.clone(),
            sink,
            generator,
            events,
            config,
            slot: Mutex::new(Slot::default()),
            alive: AtomicBool::new(true),
            handle,
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let subscription = observer.subscribe(Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_thread_changed();
            }
        }));

        Ok(Self {
            inner,
            subscription: Mutex::new(Some(subscription)),
        })
    }

    pub fn state(&self) -> TitleState {
        self.inner.slot.lock().state.clone()
    }

    /// The generated title, or the configured fallback.
    pub fn display_title(&self) -> String {
        self.state()
            .generated_title
            .unwrap_or_else(|| self.inner.config.fallback_title.clone())
    }

    /// Discard any previous title and generate a new one now, ignoring the
    /// debounce window and the automatic trigger conditions.  A no-op while
    /// another request is outstanding.
    ///
    /// A title this scheduler wrote earlier is reset to the fallback on the
    /// thread as well, so a failed run leaves both showing the fallback.
    pub async fn force_regenerate(&self) -> RegenerateOutcome {
        if !self.inner.alive.load(Ordering::Acquire) {
            return RegenerateOutcome::Discarded;
        }
        let previous;
        {
            let mut slot = self.inner.slot.lock();
            if slot.state.is_generating {
                tracing::debug!("manual title regeneration ignored, request in flight");
                return RegenerateOutcome::AlreadyInFlight;
            }
            slot.cancel_timer();
            slot.state.has_generated = false;
            previous = slot.state.generated_title.take();
            slot.begin_flight();
        }
        // The thread metadata follows the displayed title until the new
        // answer lands.
        if previous.is_some() {
            self.inner.sink.set_title(&self.inner.config.fallback_title);
        }

        let messages = self.inner.observer.snapshot().messages;
        match self.inner.spawn_generation(messages, true).await {
            Ok(outcome) => outcome,
            Err(_) => RegenerateOutcome::Discarded,
        }
    }

    /// Cancel the pending timer and stop observing the thread.  An
    /// outstanding request finishes but its answer is dropped.
    pub fn teardown(&self) {
        if !self.inner.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        self.inner.slot.lock().cancel_timer();
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.unsubscribe();
        }
        tracing::debug!("title scheduler torn down");
    }
}

impl Drop for TitleScheduler {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Inner {
    fn should_generate(&self, snapshot: &ThreadSnapshot, state: &TitleState) -> bool {
        self.config.auto
            && !state.has_generated
            && !state.is_generating
            && !snapshot.is_running
            && snapshot.status == ThreadStatus::Regular
            && snapshot.message_count() >= self.config.min_messages
            && snapshot
                .title
                .as_deref()
                .map_or(true, |t| self.config.is_default_title(t))
    }

    fn on_thread_changed(self: &Arc<Self>) {
        if !self.alive.load(Ordering::Acquire) {
            return;
        }
        let snapshot = self.observer.snapshot();
        let mut slot = self.slot.lock();

        if !self.should_generate(&snapshot, &slot.state) {
            // The quiet window restarts once the thread qualifies again.
            slot.cancel_timer();
            return;
        }

        slot.cancel_timer();
        slot.epoch += 1;
        let epoch = slot.epoch;
        let token = CancellationToken::new();
        slot.timer = Some(Timer {
            token: token.clone(),
            epoch,
        });
        slot.state.armed = true;
        drop(slot);

        let delay = self.config.debounce();
        let weak = Arc::downgrade(self);
        self.handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_timer_fired(epoch);
                    }
                }
            }
        });
    }

    fn on_timer_fired(self: &Arc<Self>, epoch: u64) {
        if !self.alive.load(Ordering::Acquire) {
            return;
        }
        // Re-read at fire time; the snapshot at arm time may be stale.
        let snapshot = self.observer.snapshot();
        {
            let mut slot = self.slot.lock();
            match &slot.timer {
                Some(timer) if timer.epoch == epoch => {}
                _ => return,
            }
            slot.timer = None;
            slot.state.armed = false;
            if !self.should_generate(&snapshot, &slot.state) {
                return;
            }
            slot.begin_flight();
        }

        tracing::debug!(messages = snapshot.message_count(), "debounce elapsed, generating title");
        // Detached: the settle step runs inside the spawned task.
        drop(self.spawn_generation(snapshot.messages, false));
    }

    /// Call the generator on its own task and settle the state from a
    /// second one, so a panicking generator still clears the in-flight flag.
    fn spawn_generation(self: &Arc<Self>, messages: Vec<Message>, forced: bool) -> JoinHandle<RegenerateOutcome> {
        self.events.emit(CoordinatorEvent::TitleGenerating { forced });

        let inner = Arc::clone(self);
        self.handle.spawn(async move {
            let generator = Arc::clone(&inner.generator);
            let call = inner
                .handle
                .spawn(async move { generator.generate(&messages).await });
            let result = match call.await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err("title generator panicked".to_string()),
            };
            inner.settle(result)
        })
    }

    fn settle(&self, result: std::result::Result<String, String>) -> RegenerateOutcome {
        if !self.alive.load(Ordering::Acquire) {
            tracing::debug!("title result discarded after teardown");
            return RegenerateOutcome::Discarded;
        }

        let result = match result {
            Ok(title) if self.config.is_default_title(&title) => {
                Err(format!("generator returned placeholder title '{title}'"))
            }
            other => other,
        };

        {
            let mut slot = self.slot.lock();
            slot.state.is_generating = false;
            if let Ok(title) = &result {
                slot.state.generated_title = Some(title.clone());
            }
        }

        match result {
            Ok(title) => {
                tracing::info!(title = %title, "conversation title generated");
                self.sink.set_title(&title);
                self.events.emit(CoordinatorEvent::TitleGenerated { title: title.clone() });
                RegenerateOutcome::Generated(title)
            }
            Err(error) => {
                tracing::warn!(error = %error, "title generation failed, keeping fallback title");
                self.events.emit(CoordinatorEvent::TitleFailed { error: error.clone() });
                RegenerateOutcome::Failed(error)
            }
        }
    }
}
