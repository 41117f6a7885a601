//! The engine facade: wires the scheduler, sync client, feedback store and
//! list reconciler around one shared roster.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::client::SyncClient;
use crate::feedback::{Feedback, FeedbackStore};
use crate::reorder::{ListReconciler, ListScope};
use crate::remote::RemoteStore;
use crate::rollback::RollbackCache;
use crate::roster::{Child, ItemType, Roster, SharedRoster};
use crate::scheduler::DebounceScheduler;
use crate::{ChildId, ItemTypeId, MutationKey, Quantity};

/// Timing knobs for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Quiescence window after the last edit before a quantity write goes out.
    pub debounce_window: Duration,
    /// How long a success/error feedback pulse stays visible.
    pub feedback_expiry: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(1000),
            feedback_expiry: Duration::from_millis(500),
        }
    }
}

/// Where a key currently sits in its write cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No edit pending, no write in flight.
    Idle,
    /// A debounce timer is running.
    Pending,
    /// A remote write has been dispatched and has not resolved yet.
    InFlight,
}

/// The optimistic mutation synchronization engine.
///
/// Quantity edits apply to the roster immediately and reach the remote
/// store debounced, coalesced and with rollback on failure; drag reorders
/// apply immediately and persist fire-and-forget. Clones share the same
/// state and can be handed to every UI handler that needs one.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    roster: SharedRoster,
    scheduler: DebounceScheduler,
    rollback: RollbackCache,
    feedback: FeedbackStore,
    client: SyncClient,
    reconciler: ListReconciler,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        // Timer callbacks must never fire against a torn-down engine.
        self.scheduler.clear();
        self.feedback.clear();
        self.rollback.clear();
    }
}

impl SyncEngine {
    /// Create an engine over an initial list of children with default timing.
    pub fn new(children: Vec<Child>, remote: Arc<dyn RemoteStore>) -> Self {
        Self::with_config(children, remote, EngineConfig::default())
    }

    /// Create an engine with explicit timing configuration.
    pub fn with_config(
        children: Vec<Child>,
        remote: Arc<dyn RemoteStore>,
        config: EngineConfig,
    ) -> Self {
        let roster: SharedRoster = Arc::new(Mutex::new(Roster::new(children)));
        let scheduler = DebounceScheduler::new(config.debounce_window);
        let rollback = RollbackCache::new();
        let feedback = FeedbackStore::new(config.feedback_expiry);
        let client = SyncClient::new(
            Arc::clone(&remote),
            Arc::clone(&roster),
            rollback.clone(),
            feedback.clone(),
        );
        let reconciler = ListReconciler::new(Arc::clone(&roster), remote);

        Self {
            inner: Arc::new(EngineInner {
                roster,
                scheduler,
                rollback,
                feedback,
                client,
                reconciler,
            }),
        }
    }

    /// Set the quantity for one (child, item type) record.
    ///
    /// The roster reflects the edit before this call returns; the remote
    /// write goes out once the key has been quiet for the debounce window,
    /// carrying the latest value. Negative input clamps to zero. Edits for
    /// unknown entities are silent no-ops.
    pub fn update_item_quantity(&self, child_id: &str, item_type_id: &str, quantity: i64) {
        let key = MutationKey::new(child_id, item_type_id);
        let quantity = quantity.max(0) as Quantity;

        {
            let roster = self.inner.roster.lock();
            if !roster.contains_item(&key) {
                tracing::debug!(key = %key, "Ignoring edit for unknown entity");
                return;
            }
            // First edit of a cycle captures the pre-edit value.
            self.inner.rollback.capture(&key, roster.quantity(&key));
        }

        let client = self.inner.client.clone();
        self.inner.scheduler.schedule(
            key.clone(),
            quantity,
            |value| {
                self.inner.roster.lock().set_quantity(&key, value);
            },
            move |key, value| async move { client.commit_quantity(key, value).await },
        );
    }

    /// The displayed quantity for a record. Absent records read as zero.
    pub fn quantity(&self, child_id: &str, item_type_id: &str) -> Quantity {
        self.inner
            .roster
            .lock()
            .quantity(&MutationKey::new(child_id, item_type_id))
    }

    /// The current feedback pulse for a record.
    pub fn feedback(&self, child_id: &str, item_type_id: &str) -> Feedback {
        self.inner
            .feedback
            .get(&MutationKey::new(child_id, item_type_id))
    }

    /// Where a record's write cycle currently stands.
    ///
    /// A key can be pending and in flight at once (a new edit while a write
    /// is out); pending wins, since that is what decides the next write.
    pub fn sync_phase(&self, child_id: &str, item_type_id: &str) -> SyncPhase {
        let key = MutationKey::new(child_id, item_type_id);
        if self.inner.scheduler.is_pending(&key) {
            SyncPhase::Pending
        } else if self.inner.client.is_in_flight(&key) {
            SyncPhase::InFlight
        } else {
            SyncPhase::Idle
        }
    }

    /// A point-in-time copy of the roster for rendering.
    pub fn snapshot(&self) -> Vec<Child> {
        self.inner.roster.lock().children().to_vec()
    }

    /// Move a child within the top-level list and persist the new order.
    pub fn reorder_children(&self, from: usize, to: usize) -> Vec<ChildId> {
        self.inner.reconciler.reorder(ListScope::Children, from, to)
    }

    /// Move an item type within one child's checklist and persist the new
    /// order.
    pub fn reorder_item_types(&self, child_id: &str, from: usize, to: usize) -> Vec<ItemTypeId> {
        self.inner.reconciler.reorder(
            ListScope::Items {
                child_id: child_id.to_string(),
            },
            from,
            to,
        )
    }

    /// Append a child to the roster.
    pub fn add_child(&self, child: Child) {
        self.inner.roster.lock().add_child(child);
    }

    /// Remove a child and discard every pending timer, rollback entry and
    /// feedback entry keyed under it. Those entries are orphaned the moment
    /// the id no longer exists locally and must never be acted upon.
    pub fn remove_child(&self, child_id: &str) {
        let removed = self.inner.roster.lock().remove_child(child_id);
        if removed {
            self.inner.scheduler.cancel_child(child_id);
            self.inner.rollback.discard_child(child_id);
            self.inner.feedback.discard_child(child_id);
            tracing::debug!(child_id, "Child removed, pending sync state discarded");
        }
    }

    /// Append an item type to a child's checklist.
    pub fn add_item_type(&self, child_id: &str, item_type: ItemType) -> bool {
        self.inner.roster.lock().add_item_type(child_id, item_type)
    }

    /// Remove an item type and discard the sync state keyed under it.
    pub fn remove_item_type(&self, child_id: &str, item_type_id: &str) {
        let removed = self
            .inner
            .roster
            .lock()
            .remove_item_type(child_id, item_type_id);
        if removed {
            let key = MutationKey::new(child_id, item_type_id);
            self.inner.scheduler.cancel(&key);
            self.inner.rollback.discard(&key);
            self.inner.feedback.discard(&key);
            tracing::debug!(key = %key, "Item type removed, pending sync state discarded");
        }
    }

    /// Rename a child locally.
    pub fn rename_child(&self, child_id: &str, name: &str) -> bool {
        self.inner.roster.lock().rename_child(child_id, name)
    }

    /// Rename an item type locally.
    pub fn rename_item_type(&self, child_id: &str, item_type_id: &str, name: &str) -> bool {
        self.inner
            .roster
            .lock()
            .rename_item_type(child_id, item_type_id, name)
    }

    /// Abort every outstanding debounce and feedback timer and drop the
    /// rollback entries.
    ///
    /// After this call no timer callback mutates the roster or the keyed
    /// registries. In-flight network calls are not cancelled; their
    /// outcomes resolve against whatever state remains.
    pub fn shutdown(&self) {
        self.inner.scheduler.clear();
        self.inner.feedback.clear();
        self.inner.rollback.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteResult;
    use async_trait::async_trait;

    struct NullRemote;

    #[async_trait]
    impl RemoteStore for NullRemote {
        async fn write_quantity(&self, _: &str, _: &str, _: Quantity) -> RemoteResult<()> {
            Ok(())
        }
        async fn write_child_order(&self, _: &[String]) -> RemoteResult<()> {
            Ok(())
        }
        async fn write_item_order(&self, _: &str, _: &[String]) -> RemoteResult<()> {
            Ok(())
        }
    }

    fn engine() -> SyncEngine {
        let child = Child::new("child-1", "Mio", 0)
            .with_item_type(ItemType::new("towel", "タオル", true, 0));
        SyncEngine::new(vec![child], Arc::new(NullRemote))
    }

    #[tokio::test(start_paused = true)]
    async fn negative_quantities_clamp_to_zero() {
        let engine = engine();
        engine.update_item_quantity("child-1", "towel", -3);
        assert_eq!(engine.quantity("child-1", "towel"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_entity_edit_is_ignored() {
        let engine = engine();
        engine.update_item_quantity("child-1", "hat", 5);
        engine.update_item_quantity("nobody", "towel", 5);

        assert_eq!(engine.quantity("child-1", "hat"), 0);
        assert_eq!(engine.sync_phase("child-1", "hat"), SyncPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn edit_is_visible_before_the_call_returns() {
        let engine = engine();
        engine.update_item_quantity("child-1", "towel", 2);
        assert_eq!(engine.quantity("child-1", "towel"), 2);
        assert_eq!(engine.sync_phase("child-1", "towel"), SyncPhase::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn phase_returns_to_idle_after_commit() {
        let engine = engine();
        engine.update_item_quantity("child-1", "towel", 2);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(engine.sync_phase("child-1", "towel"), SyncPhase::Idle);
        assert_eq!(engine.feedback("child-1", "towel"), Feedback::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_reflects_local_edits() {
        let engine = engine();
        engine.update_item_quantity("child-1", "towel", 7);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].items[0].quantity, 7);
    }
}
