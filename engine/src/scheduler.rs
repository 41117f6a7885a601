//! Debounced write scheduling: one timer, one eventual remote write per key.
//!
//! Rapid repeated edits to the same key collapse into a single remote write
//! carrying the final value. Local state is updated synchronously on every
//! edit so the UI never waits on the network.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::{MutationKey, Quantity};

#[derive(Debug)]
struct PendingWrite {
    value: Quantity,
    epoch: u64,
    timer: JoinHandle<()>,
}

/// Coalesces rapid per-key edits into single remote writes.
///
/// Invariant: at most one live debounce timer per key. Scheduling a new
/// edit for a key replaces its pending entry and aborts the previous timer.
/// Cheap to clone; clones share the same registry.
#[derive(Debug, Clone)]
pub struct DebounceScheduler {
    inner: Arc<SchedulerInner>,
}

#[derive(Debug)]
struct SchedulerInner {
    window: Duration,
    pending: Mutex<HashMap<MutationKey, PendingWrite>>,
}

impl DebounceScheduler {
    /// Create a scheduler with the given quiescence window.
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                window,
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Schedule a remote write for `key`.
    ///
    /// `apply_local` runs synchronously before this call returns, giving
    /// immediate visual feedback regardless of debounce state. `commit` runs
    /// once the key has been quiet for the full window, carrying whatever
    /// value the latest `schedule` call set - a burst of N edits produces
    /// exactly one commit.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<A, C, Fut>(&self, key: MutationKey, value: Quantity, apply_local: A, commit: C)
    where
        A: FnOnce(Quantity),
        C: FnOnce(MutationKey, Quantity) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        apply_local(value);

        let mut pending = self.inner.pending.lock();
        let epoch = match pending.remove(&key) {
            Some(previous) => {
                previous.timer.abort();
                previous.epoch.wrapping_add(1)
            }
            None => 0,
        };
        let timer = tokio::spawn(fire_after(
            Arc::downgrade(&self.inner),
            key.clone(),
            epoch,
            self.inner.window,
            commit,
        ));
        pending.insert(key, PendingWrite { value, epoch, timer });
    }

    /// Whether a debounce timer is currently running for a key.
    pub fn is_pending(&self, key: &MutationKey) -> bool {
        self.inner.pending.lock().contains_key(key)
    }

    /// The value the pending write would carry, if one is scheduled.
    pub fn pending_value(&self, key: &MutationKey) -> Option<Quantity> {
        self.inner.pending.lock().get(key).map(|entry| entry.value)
    }

    /// Cancel the pending write for a key, if any.
    pub fn cancel(&self, key: &MutationKey) {
        if let Some(entry) = self.inner.pending.lock().remove(key) {
            entry.timer.abort();
        }
    }

    /// Cancel every pending write keyed under a child.
    pub fn cancel_child(&self, child_id: &str) {
        self.inner.pending.lock().retain(|key, entry| {
            if key.child_id == child_id {
                entry.timer.abort();
                false
            } else {
                true
            }
        });
    }

    /// Cancel all pending writes and abort all timers.
    pub fn clear(&self) {
        for (_, entry) in self.inner.pending.lock().drain() {
            entry.timer.abort();
        }
    }
}

async fn fire_after<C, Fut>(
    scheduler: Weak<SchedulerInner>,
    key: MutationKey,
    epoch: u64,
    window: Duration,
    commit: C,
) where
    C: FnOnce(MutationKey, Quantity) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::time::sleep(window).await;

    // Remove the pending entry before dispatching, reading the value it
    // holds at expiry. An entry from a newer schedule call (different
    // epoch) belongs to a different timer and is left alone.
    let value = {
        let Some(inner) = scheduler.upgrade() else {
            return;
        };
        let mut pending = inner.pending.lock();
        match pending.get(&key) {
            Some(entry) if entry.epoch == epoch => pending.remove(&key).map(|entry| entry.value),
            _ => None,
        }
    };

    if let Some(value) = value {
        commit(key, value).await;
    }
}
