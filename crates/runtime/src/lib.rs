//! Conversation runtime for parley.
//!
//! - [`thread::ThreadRuntime`]: the in-memory conversation and its change feed
//! - [`confirmation::ConfirmationResolver`]: human-in-the-loop tool calls
//! - [`title::TitleScheduler`]: debounced, single-flight title generation
//! - [`coordinator::ThreadCoordinator`]: wires the three to upstream stream events
//! - [`cli`]: the `parley` command line

pub mod cli;
pub mod confirmation;
pub mod coordinator;
pub mod events;
pub mod observer;
pub mod thread;
pub mod title;

pub use confirmation::{ConfirmationResolver, Resolution};
pub use coordinator::ThreadCoordinator;
pub use events::{CoordinatorEvent, EventBus};
pub use observer::{Subscription, ThreadObserver};
pub use thread::{ConversationSink, ThreadRuntime, ThreadSnapshot, ThreadStatus};
pub use title::{RegenerateOutcome, TitleScheduler, TitleState};
