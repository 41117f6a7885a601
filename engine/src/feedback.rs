//! Transient per-key write feedback with auto-expiry.
//!
//! After a remote write resolves, the affected entity shows a short
//! success/error pulse (the UI renders it as a border color). The pulse
//! reverts to idle on its own after a fixed interval.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::MutationKey;

/// Visual status of the most recent remote write for a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    /// No recent write, or the pulse has expired
    #[default]
    Idle,
    /// The last write persisted
    Success,
    /// The last write failed and was rolled back
    Error,
}

#[derive(Debug)]
struct FeedbackEntry {
    status: Feedback,
    epoch: u64,
    expiry_timer: JoinHandle<()>,
}

/// Keyed registry of feedback pulses.
///
/// `set` arms a fresh expiry timer per call and aborts the previous one, so
/// at most one timer is live per key and a stale reset can never clobber a
/// newer status. Cheap to clone; clones share the same registry.
#[derive(Debug, Clone)]
pub struct FeedbackStore {
    inner: Arc<FeedbackInner>,
}

#[derive(Debug)]
struct FeedbackInner {
    expiry: Duration,
    entries: Mutex<HashMap<MutationKey, FeedbackEntry>>,
}

impl FeedbackStore {
    /// Create a store whose pulses last `expiry` before reverting to idle.
    pub fn new(expiry: Duration) -> Self {
        Self {
            inner: Arc::new(FeedbackInner {
                expiry,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Record the outcome of a write cycle for a key.
    ///
    /// Must be called from within a Tokio runtime; the expiry timer is a
    /// spawned task.
    pub fn set(&self, key: MutationKey, status: Feedback) {
        let mut entries = self.inner.entries.lock();
        let epoch = match entries.remove(&key) {
            Some(previous) => {
                previous.expiry_timer.abort();
                previous.epoch.wrapping_add(1)
            }
            None => 0,
        };
        let expiry_timer = tokio::spawn(expire_later(
            Arc::downgrade(&self.inner),
            key.clone(),
            epoch,
            self.inner.expiry,
        ));
        entries.insert(
            key,
            FeedbackEntry {
                status,
                epoch,
                expiry_timer,
            },
        );
    }

    /// The current status for a key. Absent entries read as idle.
    pub fn get(&self, key: &MutationKey) -> Feedback {
        self.inner
            .entries
            .lock()
            .get(key)
            .map(|entry| entry.status)
            .unwrap_or(Feedback::Idle)
    }

    /// Drop the entry for a key, aborting its expiry timer.
    pub fn discard(&self, key: &MutationKey) {
        if let Some(entry) = self.inner.entries.lock().remove(key) {
            entry.expiry_timer.abort();
        }
    }

    /// Drop every entry keyed under a child.
    pub fn discard_child(&self, child_id: &str) {
        self.inner.entries.lock().retain(|key, entry| {
            if key.child_id == child_id {
                entry.expiry_timer.abort();
                false
            } else {
                true
            }
        });
    }

    /// Drop all entries and abort all expiry timers.
    pub fn clear(&self) {
        for (_, entry) in self.inner.entries.lock().drain() {
            entry.expiry_timer.abort();
        }
    }
}

async fn expire_later(store: Weak<FeedbackInner>, key: MutationKey, epoch: u64, expiry: Duration) {
    tokio::time::sleep(expiry).await;
    let Some(inner) = store.upgrade() else {
        return;
    };
    let mut entries = inner.entries.lock();
    // A timer that lost the abort race must not remove a newer entry.
    if entries.get(&key).is_some_and(|entry| entry.epoch == epoch) {
        entries.remove(&key);
    }
}
