//! Confirmation resolver: gives every tool call exactly one terminal
//! outcome.
//!
//! Calls with an automatic executor run immediately.  Everything else parks
//! in `awaiting_confirmation` until a confirmation surface calls
//! [`ConfirmationResolver::approve`] or [`ConfirmationResolver::reject`].
//! The first decision claims the record under the ledger lock; any later or
//! concurrent decision is discarded without touching the stored result.
//!
//! Execution runs on its own task.  A caller that stops awaiting `approve`
//! (a remounted surface, a dropped request) does not lose the commit, and a
//! panicking executor still produces an `incomplete` record.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pl_domain::config::ConfirmationConfig;
use pl_domain::record::{FailureKind, ToolCallRecord, ToolCallStatus, ToolOutcome};
use pl_domain::tool::ToolCall;
use pl_tools::{ToolContext, ToolExecutor, ToolInvocation, ToolRegistry};

use crate::events::{CoordinatorEvent, EventBus};
use crate::thread::ConversationSink;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What a routing call or a decision did.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// This call committed the terminal outcome.
    Committed(ToolCallRecord),
    /// The record is waiting for a human decision.
    AwaitingConfirmation,
    /// Stale or duplicate; the record was left as it was.
    Discarded(ToolCallStatus),
    /// No record with that id.
    NotFound,
}

impl Resolution {
    pub fn record(&self) -> Option<&ToolCallRecord> {
        match self {
            Self::Committed(record) => Some(record),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Ledger {
    records: HashMap<String, ToolCallRecord>,
    order: Vec<String>,
}

struct Inner {
    ledger: Mutex<Ledger>,
    registry: ToolRegistry,
    sink: Arc<dyn ConversationSink>,
    events: EventBus,
    decline_message: String,
    executor_timeout: Option<Duration>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Resolver
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone)]
pub struct ConfirmationResolver {
    inner: Arc<Inner>,
}

impl ConfirmationResolver {
    pub fn new(
        registry: ToolRegistry,
        sink: Arc<dyn ConversationSink>,
        events: EventBus,
        config: &ConfirmationConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                ledger: Mutex::new(Ledger::default()),
                registry,
                sink,
                events,
                decline_message: config.decline_message.clone(),
                executor_timeout: config.executor_timeout(),
            }),
        }
    }

    /// Take ownership of a freshly emitted tool call.
    ///
    /// Automatic tools are executed and awaited; the returned resolution
    /// carries the committed record.  Other tools park for confirmation.
    /// A call id already known to the ledger is discarded.
    pub async fn route(&self, call: ToolCall) -> Resolution {
        let call_id = call.call_id.clone();
        let automatic = self.inner.registry.automatic_executor(&call.tool_name);

        {
            let mut ledger = self.inner.ledger.lock();
            if let Some(existing) = ledger.records.get(&call_id) {
                tracing::debug!(tool_call_id = %call_id, status = %existing.status, "duplicate tool call discarded");
                return Resolution::Discarded(existing.status);
            }
            let mut record = ToolCallRecord::new(call);
            let next = if automatic.is_some() {
                ToolCallStatus::Running
            } else {
                ToolCallStatus::AwaitingConfirmation
            };
            record.transition(next);
            ledger.order.push(call_id.clone());
            ledger.records.insert(call_id.clone(), record);
        }

        match automatic {
            Some(executor) => self.run_detached(&call_id, executor).await,
            None => {
                let (tool_name, summary) = self
                    .with_record(&call_id, |r| {
                        (r.name.clone(), ToolInvocation::parse(&r.name, &r.arguments).summary())
                    })
                    .unwrap_or_default();
                tracing::info!(tool_call_id = %call_id, tool_name = %tool_name, "tool call awaiting confirmation");
                self.inner.events.emit(CoordinatorEvent::ToolCallAwaitingConfirmation {
                    call_id,
                    tool_name,
                    summary,
                });
                Resolution::AwaitingConfirmation
            }
        }
    }

    /// Run the tool and commit its outcome.
    pub async fn approve(&self, call_id: &str) -> Resolution {
        let claimed = {
            let mut ledger = self.inner.ledger.lock();
            match ledger.records.get_mut(call_id) {
                None => return Resolution::NotFound,
                Some(record) if record.status != ToolCallStatus::AwaitingConfirmation => {
                    tracing::debug!(tool_call_id = %call_id, status = %record.status, "approve discarded");
                    return Resolution::Discarded(record.status);
                }
                Some(record) => {
                    record.transition(ToolCallStatus::Running);
                    record.name.clone()
                }
            }
        };

        match self.inner.registry.get(&claimed) {
            Some(tool) => self.run_detached(call_id, tool.executor).await,
            None => {
                let outcome = ToolOutcome::failed(
                    FailureKind::UnknownTool,
                    format!("no executor registered for tool '{claimed}'"),
                );
                match self.inner.commit(call_id, ToolCallStatus::Running, outcome) {
                    Ok(record) => Resolution::Committed(record),
                    Err(status) => Resolution::Discarded(status.unwrap_or(ToolCallStatus::Incomplete)),
                }
            }
        }
    }

    /// Commit `incomplete / user_declined` without executing anything.
    ///
    /// The status check and the commit happen under one ledger lock, so a
    /// concurrent `approve` that already claimed the record wins.
    pub fn reject(&self, call_id: &str) -> Resolution {
        let outcome = ToolOutcome::failed(FailureKind::UserDeclined, self.inner.decline_message.clone());
        match self.inner.commit(call_id, ToolCallStatus::AwaitingConfirmation, outcome) {
            Ok(record) => Resolution::Committed(record),
            Err(None) => Resolution::NotFound,
            Err(Some(status)) => {
                tracing::debug!(tool_call_id = %call_id, status = %status, "reject discarded");
                Resolution::Discarded(status)
            }
        }
    }

    pub fn record(&self, call_id: &str) -> Option<ToolCallRecord> {
        self.with_record(call_id, Clone::clone)
    }

    pub fn status(&self, call_id: &str) -> Option<ToolCallStatus> {
        self.with_record(call_id, |r| r.status)
    }

    /// Every record in emission order.
    pub fn records(&self) -> Vec<ToolCallRecord> {
        let ledger = self.inner.ledger.lock();
        ledger
            .order
            .iter()
            .filter_map(|id| ledger.records.get(id).cloned())
            .collect()
    }

    /// Records waiting for a human decision, in emission order.
    pub fn pending(&self) -> Vec<ToolCallRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.status == ToolCallStatus::AwaitingConfirmation)
            .collect()
    }

    fn with_record<R>(&self, call_id: &str, f: impl FnOnce(&ToolCallRecord) -> R) -> Option<R> {
        self.inner.ledger.lock().records.get(call_id).map(f)
    }

    /// Spawn execution plus commit as one task and wait for it.  Dropping
    /// the returned future leaves the task running.
    async fn run_detached(&self, call_id: &str, executor: Arc<dyn ToolExecutor>) -> Resolution {
        let inner = Arc::clone(&self.inner);
        let id = call_id.to_string();
        let task = tokio::spawn(async move { inner.execute_and_commit(id, executor).await });

        match task.await {
            Ok(Some(record)) => Resolution::Committed(record),
            Ok(None) | Err(_) => {
                Resolution::Discarded(self.status(call_id).unwrap_or(ToolCallStatus::Running))
            }
        }
    }
}

impl Inner {
    async fn execute_and_commit(
        self: Arc<Self>,
        call_id: String,
        executor: Arc<dyn ToolExecutor>,
    ) -> Option<ToolCallRecord> {
        let (tool_name, arguments) = {
            let ledger = self.ledger.lock();
            let record = ledger.records.get(&call_id)?;
            (record.name.clone(), record.arguments.clone())
        };

        let ctx = ToolContext::new(call_id.clone(), tool_name.clone());
        let cancel = ctx.cancel.clone();
        tracing::debug!(tool_call_id = %call_id, tool_name = %tool_name, "executing tool");

        // Separate task so a panic surfaces as a JoinError here.
        let mut execution = tokio::spawn(async move { executor.execute(ctx, arguments).await });

        let joined = match self.executor_timeout {
            None => execution.await,
            Some(limit) => match tokio::time::timeout(limit, &mut execution).await {
                Ok(joined) => joined,
                Err(_) => {
                    cancel.cancel();
                    execution.abort();
                    let outcome = ToolOutcome::failed(
                        FailureKind::TimedOut,
                        format!("tool execution timed out after {}s", limit.as_secs()),
                    );
                    return self.commit(&call_id, ToolCallStatus::Running, outcome).ok();
                }
            },
        };

        let outcome = match joined {
            Ok(Ok(payload)) => ToolOutcome::complete(payload),
            Ok(Err(e)) => ToolOutcome::failed(FailureKind::ExecutionFailed, e.to_string()),
            Err(join_err) => {
                tracing::error!(tool_call_id = %call_id, tool_name = %tool_name, error = %join_err, "tool executor panicked");
                ToolOutcome::failed(FailureKind::ExecutionFailed, "tool executor panicked")
            }
        };
        self.commit(&call_id, ToolCallStatus::Running, outcome).ok()
    }

    /// The single terminal write.  The record must still be in `expect`;
    /// the check and the write share one lock.  Appends the
    /// resolution message and emits the event only when this call won.
    ///
    /// On refusal returns the record's current status, or `None` for an
    /// unknown id.
    fn commit(
        &self,
        call_id: &str,
        expect: ToolCallStatus,
        outcome: ToolOutcome,
    ) -> std::result::Result<ToolCallRecord, Option<ToolCallStatus>> {
        let committed = {
            let mut ledger = self.ledger.lock();
            let record = ledger.records.get_mut(call_id).ok_or(None)?;
            if !record.commit_if(expect, outcome) {
                tracing::debug!(tool_call_id = %call_id, status = %record.status, "commit discarded");
                return Err(Some(record.status));
            }
            record.clone()
        };

        let error = committed
            .result
            .as_ref()
            .and_then(ToolOutcome::failure)
            .map(|f| f.message.clone());
        match &error {
            Some(e) => tracing::info!(tool_call_id = %call_id, tool_name = %committed.name, status = %committed.status, error = %e, "tool call resolved"),
            None => tracing::info!(tool_call_id = %call_id, tool_name = %committed.name, status = %committed.status, "tool call resolved"),
        }

        if let Some(message) = committed.resolution_message() {
            self.sink.append(message);
        }
        self.events.emit(CoordinatorEvent::ToolCallResolved {
            call_id: committed.id.clone(),
            tool_name: committed.name.clone(),
            status: committed.status,
            error,
        });
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_domain::tool::Message;
    use pl_tools::{ToolError, ToolResult};

    #[derive(Default)]
    struct Transcript(Mutex<Vec<Message>>);

    impl ConversationSink for Transcript {
        fn append(&self, message: Message) {
            self.0.lock().push(message);
        }
        fn set_title(&self, _title: &str) {}
    }

    struct Fixed(ToolResult);

    #[async_trait::async_trait]
    impl ToolExecutor for Fixed {
        async fn execute(&self, _ctx: ToolContext, _args: serde_json::Value) -> ToolResult {
            self.0.clone()
        }
    }

    struct Panics;

    #[async_trait::async_trait]
    impl ToolExecutor for Panics {
        async fn execute(&self, _ctx: ToolContext, _args: serde_json::Value) -> ToolResult {
            panic!("boom")
        }
    }

    struct Hangs;

    #[async_trait::async_trait]
    impl ToolExecutor for Hangs {
        async fn execute(&self, ctx: ToolContext, _args: serde_json::Value) -> ToolResult {
            ctx.cancel.cancelled().await;
            Err(ToolError::Failed("cancelled".into()))
        }
    }

    fn call(id: &str, tool: &str) -> ToolCall {
        ToolCall {
            call_id: id.into(),
            tool_name: tool.into(),
            arguments: serde_json::json!({"location": "Tokyo"}),
        }
    }

    fn resolver(registry: ToolRegistry, config: ConfirmationConfig) -> (ConfirmationResolver, Arc<Transcript>) {
        let sink = Arc::new(Transcript::default());
        (ConfirmationResolver::new(registry, sink.clone(), EventBus::new(), &config), sink)
    }

    #[tokio::test]
    async fn automatic_tool_commits_on_route() {
        let mut reg = ToolRegistry::new();
        reg.register_automatic("calculator", Fixed(Ok(serde_json::json!({"result": 2}))));
        let (resolver, sink) = resolver(reg, ConfirmationConfig::default());

        let res = resolver.route(call("c1", "calculator")).await;
        assert_eq!(res.record().map(|r| r.status), Some(ToolCallStatus::Complete));
        assert_eq!(sink.0.lock().len(), 1);
        assert!(resolver.pending().is_empty());
    }

    #[tokio::test]
    async fn confirmed_tool_parks_until_decision() {
        let mut reg = ToolRegistry::new();
        reg.register_confirmed("getWeather", Fixed(Ok(serde_json::json!({"temperature": 18}))));
        let (resolver, sink) = resolver(reg, ConfirmationConfig::default());

        assert_eq!(resolver.route(call("c1", "getWeather")).await, Resolution::AwaitingConfirmation);
        assert_eq!(resolver.pending().len(), 1);
        assert!(sink.0.lock().is_empty());

        let res = resolver.approve("c1").await;
        assert_eq!(res.record().map(|r| r.status), Some(ToolCallStatus::Complete));
        assert_eq!(sink.0.lock().len(), 1);
    }

    #[tokio::test]
    async fn reject_then_approve_keeps_decline() {
        let mut reg = ToolRegistry::new();
        reg.register_confirmed("getWeather", Fixed(Ok(serde_json::json!({}))));
        let (resolver, sink) = resolver(reg, ConfirmationConfig::default());
        resolver.route(call("c1", "getWeather")).await;

        let res = resolver.reject("c1");
        let failure = res.record().and_then(|r| r.result.clone()).and_then(|o| o.failure().cloned()).unwrap();
        assert_eq!(failure.kind, FailureKind::UserDeclined);
        assert_eq!(failure.message, "User declined the tool call");

        assert_eq!(resolver.approve("c1").await, Resolution::Discarded(ToolCallStatus::Incomplete));
        assert_eq!(resolver.reject("c1"), Resolution::Discarded(ToolCallStatus::Incomplete));
        assert_eq!(sink.0.lock().len(), 1);
    }

    #[tokio::test]
    async fn unknown_ids_and_duplicates() {
        let (resolver, _sink) = resolver(ToolRegistry::new(), ConfirmationConfig::default());
        assert_eq!(resolver.approve("nope").await, Resolution::NotFound);
        assert_eq!(resolver.reject("nope"), Resolution::NotFound);

        resolver.route(call("c1", "mystery")).await;
        assert_eq!(
            resolver.route(call("c1", "mystery")).await,
            Resolution::Discarded(ToolCallStatus::AwaitingConfirmation)
        );
        assert_eq!(resolver.records().len(), 1);
    }

    #[tokio::test]
    async fn approving_unregistered_tool_is_incomplete() {
        let (resolver, _sink) = resolver(ToolRegistry::new(), ConfirmationConfig::default());
        resolver.route(call("c1", "mystery")).await;

        let failure = resolver
            .approve("c1")
            .await
            .record()
            .and_then(|r| r.result.clone())
            .and_then(|o| o.failure().cloned())
            .unwrap();
        assert_eq!(failure.kind, FailureKind::UnknownTool);
    }

    #[tokio::test]
    async fn panicking_executor_becomes_incomplete() {
        let mut reg = ToolRegistry::new();
        reg.register_confirmed("getWeather", Panics);
        let (resolver, _sink) = resolver(reg, ConfirmationConfig::default());
        resolver.route(call("c1", "getWeather")).await;

        resolver.approve("c1").await;
        let record = resolver.record("c1").unwrap();
        assert_eq!(record.status, ToolCallStatus::Incomplete);
        assert_eq!(record.result.as_ref().and_then(ToolOutcome::failure).unwrap().message, "tool executor panicked");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_converts_hung_executor() {
        let mut reg = ToolRegistry::new();
        reg.register_confirmed("getWeather", Hangs);
        let config = ConfirmationConfig {
            executor_timeout_secs: Some(5),
            ..Default::default()
        };
        let (resolver, _sink) = resolver(reg, config);
        resolver.route(call("c1", "getWeather")).await;

        let record = resolver.approve("c1").await.record().cloned().unwrap();
        let failure = record.result.as_ref().and_then(ToolOutcome::failure).unwrap();
        assert_eq!(failure.kind, FailureKind::TimedOut);
        assert_eq!(failure.message, "tool execution timed out after 5s");
    }

    #[tokio::test]
    async fn reject_after_claim_is_discarded() {
        let gate = Arc::new(tokio::sync::Notify::new());

        struct Gated(Arc<tokio::sync::Notify>);

        #[async_trait::async_trait]
        impl ToolExecutor for Gated {
            async fn execute(&self, _ctx: ToolContext, _args: serde_json::Value) -> ToolResult {
                self.0.notified().await;
                Ok(serde_json::json!({"temperature": 18}))
            }
        }

        let mut reg = ToolRegistry::new();
        reg.register_confirmed("getWeather", Gated(gate.clone()));
        let (resolver, sink) = resolver(reg, ConfirmationConfig::default());
        resolver.route(call("c1", "getWeather")).await;

        let approval = {
            let r = resolver.clone();
            tokio::spawn(async move { r.approve("c1").await })
        };
        while resolver.status("c1") != Some(ToolCallStatus::Running) {
            tokio::task::yield_now().await;
        }

        assert_eq!(resolver.reject("c1"), Resolution::Discarded(ToolCallStatus::Running));
        gate.notify_one();

        let record = approval.await.unwrap().record().cloned().unwrap();
        assert_eq!(record.status, ToolCallStatus::Complete);
        assert_eq!(resolver.record("c1").unwrap().status, ToolCallStatus::Complete);
        assert_eq!(sink.0.lock().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_approve_and_reject_never_both_apply() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counting(Arc<AtomicUsize>);

        #[async_trait::async_trait]
        impl ToolExecutor for Counting {
            async fn execute(&self, _ctx: ToolContext, _args: serde_json::Value) -> ToolResult {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::json!({"temperature": 18}))
            }
        }

        for _ in 0..200 {
            let runs = Arc::new(AtomicUsize::new(0));
            let mut reg = ToolRegistry::new();
            reg.register_confirmed("getWeather", Counting(runs.clone()));
            let (resolver, sink) = resolver(reg, ConfirmationConfig::default());
            resolver.route(call("c1", "getWeather")).await;

            let approval = {
                let r = resolver.clone();
                tokio::spawn(async move { r.approve("c1").await })
            };
            let rejection = {
                let r = resolver.clone();
                tokio::task::spawn_blocking(move || r.reject("c1"))
            };
            let approved = approval.await.unwrap();
            let rejected = rejection.await.unwrap();

            let winners = [&approved, &rejected]
                .iter()
                .filter(|r| matches!(r, Resolution::Committed(_)))
                .count();
            assert_eq!(winners, 1, "approve={approved:?} reject={rejected:?}");

            let record = resolver.record("c1").unwrap();
            let declined = record
                .result
                .as_ref()
                .and_then(ToolOutcome::failure)
                .is_some_and(|f| f.kind == FailureKind::UserDeclined);
            let ran = runs.load(Ordering::SeqCst) == 1;
            assert!(ran != declined, "ran={ran} declined={declined}");
            assert_eq!(sink.0.lock().len(), 1);
        }
    }

    #[tokio::test]
    async fn dropped_approval_still_commits() {
        let gate = Arc::new(tokio::sync::Notify::new());

        struct Gated(Arc<tokio::sync::Notify>);

        #[async_trait::async_trait]
        impl ToolExecutor for Gated {
            async fn execute(&self, _ctx: ToolContext, _args: serde_json::Value) -> ToolResult {
                self.0.notified().await;
                Ok(serde_json::json!({"ok": true}))
            }
        }

        let mut reg = ToolRegistry::new();
        reg.register_confirmed("getWeather", Gated(gate.clone()));
        let (resolver, sink) = resolver(reg, ConfirmationConfig::default());
        resolver.route(call("c1", "getWeather")).await;

        // The surface goes away before the executor finishes.
        let surface = {
            let r = resolver.clone();
            tokio::spawn(async move { r.approve("c1").await })
        };
        while resolver.status("c1") != Some(ToolCallStatus::Running) {
            tokio::task::yield_now().await;
        }
        surface.abort();
        gate.notify_one();

        while resolver.status("c1") == Some(ToolCallStatus::Running) {
            tokio::task::yield_now().await;
        }
        assert_eq!(resolver.status("c1"), Some(ToolCallStatus::Complete));
        assert_eq!(sink.0.lock().len(), 1);
    }
}
