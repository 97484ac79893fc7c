//! Change notification over a thread.
//!
//! Callbacks run synchronously on the mutating task, after the mutation is
//! visible through [`ThreadObserver::snapshot`] and with no lock held, so a
//! callback may read the snapshot or mutate the thread again.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::thread::ThreadSnapshot;

pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Read-only view of a thread plus a change feed.
pub trait ThreadObserver: Send + Sync {
    /// Register `callback` to run after every mutation.  Delivery stops as
    /// soon as the returned handle is unsubscribed or dropped.
    fn subscribe(&self, callback: Callback) -> Subscription;

    /// Current messages, running flag and metadata.
    fn snapshot(&self) -> ThreadSnapshot;
}

#[derive(Clone)]
struct Entry {
    active: Arc<AtomicBool>,
    callback: Callback,
}

type EntryMap = Mutex<BTreeMap<u64, Entry>>;

/// Subscriber list owned by a thread runtime.
#[derive(Default)]
pub struct Subscribers {
    entries: Arc<EntryMap>,
    next_id: AtomicU64,
}

impl Subscribers {
    pub fn add(&self, callback: Callback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        self.entries.lock().insert(
            id,
            Entry {
                active: active.clone(),
                callback,
            },
        );
        Subscription {
            id,
            active,
            entries: Arc::downgrade(&self.entries),
        }
    }

    /// Run every live callback, in subscription order.
    pub fn notify(&self) {
        let entries: Vec<Entry> = self.entries.lock().values().cloned().collect();
        for entry in entries {
            // Re-checked per callback: an earlier callback may have torn
            // down a later subscription.
            if entry.active.load(Ordering::Acquire) {
                (entry.callback)();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`ThreadObserver::subscribe`].
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    entries: Weak<EntryMap>,
}

impl Subscription {
    /// Stop delivery.  Safe to call any number of times.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            if let Some(entries) = self.entries.upgrade() {
                entries.lock().remove(&self.id);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
