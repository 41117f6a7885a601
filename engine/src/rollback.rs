//! Last known-good quantities, captured while a write cycle is pending.
//!
//! The first local edit of a cycle records the pre-edit value; later edits
//! in the same burst never overwrite it. On write failure the entry is what
//! the roster gets restored to.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{MutationKey, Quantity};

/// Keyed registry of pre-edit quantities.
///
/// Cheap to clone; clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct RollbackCache {
    entries: Arc<Mutex<HashMap<MutationKey, Quantity>>>,
}

impl RollbackCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the pre-edit value for a key, unless one is already held.
    ///
    /// The first capture of a cycle wins, so the entry always holds the
    /// value from before the burst of edits began.
    pub fn capture(&self, key: &MutationKey, value: Quantity) {
        self.entries.lock().entry(key.clone()).or_insert(value);
    }

    /// The held value for a key, if any.
    pub fn get(&self, key: &MutationKey) -> Option<Quantity> {
        self.entries.lock().get(key).copied()
    }

    /// Remove and return the held value for a key.
    pub fn take(&self, key: &MutationKey) -> Option<Quantity> {
        self.entries.lock().remove(key)
    }

    /// Drop the entry for a key without reading it.
    pub fn discard(&self, key: &MutationKey) {
        self.entries.lock().remove(key);
    }

    /// Drop every entry keyed under a child.
    pub fn discard_child(&self, child_id: &str) {
        self.entries.lock().retain(|key, _| key.child_id != child_id);
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
