//! Remote sync client: issues quantity writes and settles their outcome.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::feedback::{Feedback, FeedbackStore};
use crate::remote::RemoteStore;
use crate::rollback::RollbackCache;
use crate::roster::SharedRoster;
use crate::{MutationKey, Quantity};

/// Dispatches the coalesced quantity writes and applies their outcome to
/// the roster, the rollback cache and the feedback store.
///
/// No failure escapes this type: every error becomes a rollback to the last
/// known-good value plus an `error` feedback pulse and a log line. When no
/// rollback entry exists at failure time the restore defaults to zero; this
/// is a known latent defect, since it can install a wrong value when the
/// true prior quantity was nonzero.
#[derive(Clone)]
pub struct SyncClient {
    remote: Arc<dyn RemoteStore>,
    roster: SharedRoster,
    rollback: RollbackCache,
    feedback: FeedbackStore,
    in_flight: Arc<Mutex<HashSet<MutationKey>>>,
}

impl SyncClient {
    pub(crate) fn new(
        remote: Arc<dyn RemoteStore>,
        roster: SharedRoster,
        rollback: RollbackCache,
        feedback: FeedbackStore,
    ) -> Self {
        Self {
            remote,
            roster,
            rollback,
            feedback,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether a remote write for a key has been dispatched and not yet
    /// resolved. In-flight writes are never cancelled, only superseded by
    /// a later edit after they resolve.
    pub fn is_in_flight(&self, key: &MutationKey) -> bool {
        self.in_flight.lock().contains(key)
    }

    /// Commit one coalesced quantity write and settle its outcome.
    pub async fn commit_quantity(&self, key: MutationKey, quantity: Quantity) {
        self.in_flight.lock().insert(key.clone());
        let outcome = self
            .remote
            .write_quantity(&key.child_id, &key.item_type_id, quantity)
            .await;
        self.in_flight.lock().remove(&key);

        let mut roster = self.roster.lock();
        if !roster.contains_item(&key) {
            // The entity was deleted while the write was in flight. Its
            // entries are orphaned and must not be acted on.
            self.rollback.discard(&key);
            self.feedback.discard(&key);
            tracing::debug!(key = %key, "Discarding write outcome for removed entity");
            return;
        }

        match outcome {
            Ok(()) => {
                self.rollback.discard(&key);
                tracing::debug!(key = %key, quantity, "Quantity persisted");
                self.feedback.set(key, Feedback::Success);
            }
            Err(error) => {
                // Full overwrite, not a merge: edits made after this write
                // was dispatched are lost along with the failed one.
                let restore = self.rollback.take(&key).unwrap_or(0);
                roster.set_quantity(&key, restore);
                tracing::warn!(key = %key, %error, restore, "Quantity write failed, rolled back");
                self.feedback.set(key, Feedback::Error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RemoteError, RemoteResult};
    use crate::roster::{Child, ItemType, Roster};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;

    struct ScriptedRemote {
        outcomes: Mutex<VecDeque<RemoteResult<()>>>,
        calls: Mutex<Vec<(String, String, Quantity)>>,
    }

    impl ScriptedRemote {
        fn new(outcomes: Vec<RemoteResult<()>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RemoteStore for ScriptedRemote {
        async fn write_quantity(
            &self,
            child_id: &str,
            item_type_id: &str,
            quantity: Quantity,
        ) -> RemoteResult<()> {
            self.calls
                .lock()
                .push((child_id.to_string(), item_type_id.to_string(), quantity));
            self.outcomes.lock().pop_front().unwrap_or(Ok(()))
        }

        async fn write_child_order(&self, _child_ids: &[String]) -> RemoteResult<()> {
            Ok(())
        }

        async fn write_item_order(
            &self,
            _child_id: &str,
            _item_type_ids: &[String],
        ) -> RemoteResult<()> {
            Ok(())
        }
    }

    fn shared_roster() -> SharedRoster {
        Arc::new(Mutex::new(Roster::new(vec![Child::new("child-1", "Mio", 0)
            .with_item_type(ItemType::new("towel", "タオル", true, 0))])))
    }

    fn client(remote: Arc<ScriptedRemote>, roster: SharedRoster) -> (SyncClient, RollbackCache, FeedbackStore) {
        let rollback = RollbackCache::new();
        let feedback = FeedbackStore::new(Duration::from_millis(500));
        let client = SyncClient::new(remote, roster, rollback.clone(), feedback.clone());
        (client, rollback, feedback)
    }

    #[tokio::test(start_paused = true)]
    async fn success_clears_rollback_and_pulses_success() {
        let remote = ScriptedRemote::new(vec![Ok(())]);
        let roster = shared_roster();
        let (client, rollback, feedback) = client(Arc::clone(&remote), Arc::clone(&roster));

        let key = MutationKey::new("child-1", "towel");
        rollback.capture(&key, 0);
        roster.lock().set_quantity(&key, 3);

        client.commit_quantity(key.clone(), 3).await;

        let expected = vec![("child-1".to_string(), "towel".to_string(), 3)];
        assert_eq!(*remote.calls.lock(), expected);
        assert_eq!(roster.lock().quantity(&key), 3);
        assert_eq!(rollback.get(&key), None);
        assert_eq!(feedback.get(&key), Feedback::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_restores_last_known_good_value() {
        let remote = ScriptedRemote::new(vec![Err(RemoteError::Status(500))]);
        let roster = shared_roster();
        let (client, rollback, feedback) = client(remote, Arc::clone(&roster));

        let key = MutationKey::new("child-1", "towel");
        roster.lock().set_quantity(&key, 4);
        rollback.capture(&key, 4); // pre-edit value
        roster.lock().set_quantity(&key, 9); // optimistic edit

        client.commit_quantity(key.clone(), 9).await;

        assert_eq!(roster.lock().quantity(&key), 4);
        assert_eq!(rollback.get(&key), None);
        assert_eq!(feedback.get(&key), Feedback::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_without_rollback_entry_restores_zero() {
        // Known latent defect: a rollback cache miss falls back to zero
        // even when the prior value was nonzero.
        let remote = ScriptedRemote::new(vec![Err(RemoteError::Transport("reset".into()))]);
        let roster = shared_roster();
        let (client, _rollback, feedback) = client(remote, Arc::clone(&roster));

        let key = MutationKey::new("child-1", "towel");
        roster.lock().set_quantity(&key, 6);

        client.commit_quantity(key.clone(), 6).await;

        assert_eq!(roster.lock().quantity(&key), 0);
        assert_eq!(feedback.get(&key), Feedback::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_key_outcome_is_a_silent_noop() {
        let remote = ScriptedRemote::new(vec![Err(RemoteError::Status(500))]);
        let roster = shared_roster();
        let (client, rollback, feedback) = client(remote, Arc::clone(&roster));

        let key = MutationKey::new("child-1", "towel");
        rollback.capture(&key, 2);
        roster.lock().remove_item_type("child-1", "towel");

        client.commit_quantity(key.clone(), 5).await;

        // No feedback pulse, no restore attempt, orphaned entries dropped.
        assert_eq!(feedback.get(&key), Feedback::Idle);
        assert_eq!(rollback.get(&key), None);
        assert_eq!(roster.lock().quantity(&key), 0);
    }
}
