//! List reconciliation: local reordering with best-effort persistence.

use std::sync::Arc;

use crate::remote::RemoteStore;
use crate::roster::SharedRoster;
use crate::ChildId;

/// Which ordered sequence a reorder targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// The top-level list of children.
    Children,
    /// The item checklist of one child.
    Items { child_id: ChildId },
}

/// Applies drag reorders to the roster and persists the resulting order.
///
/// The local order is authoritative the moment a drag completes; the remote
/// write is fire-and-forget and runs independently of the debounce
/// scheduler. A failed order write is logged and never rolled back, leaving
/// local and remote order divergent until the next successful reorder or a
/// full refetch. That asymmetry with quantity writes (which do roll back)
/// is deliberate.
#[derive(Clone)]
pub struct ListReconciler {
    roster: SharedRoster,
    remote: Arc<dyn RemoteStore>,
}

impl ListReconciler {
    pub(crate) fn new(roster: SharedRoster, remote: Arc<dyn RemoteStore>) -> Self {
        Self { roster, remote }
    }

    /// Move one element of `scope`'s sequence from `from` to `to`.
    ///
    /// Returns the resulting id order. Equal indices, an out-of-range
    /// `from` or an unknown child are defined no-ops: the current order is
    /// returned unchanged (empty for an unknown child) and nothing is sent
    /// to the remote.
    pub fn reorder(&self, scope: ListScope, from: usize, to: usize) -> Vec<String> {
        let moved = {
            let mut roster = self.roster.lock();
            match &scope {
                ListScope::Children => roster.move_child(from, to),
                ListScope::Items { child_id } => roster.move_item_type(child_id, from, to),
            }
        };

        match moved {
            Some(order) => {
                self.persist(scope, order.clone());
                order
            }
            None => {
                let roster = self.roster.lock();
                match &scope {
                    ListScope::Children => roster.child_order(),
                    ListScope::Items { child_id } => {
                        roster.item_order(child_id).unwrap_or_default()
                    }
                }
            }
        }
    }

    fn persist(&self, scope: ListScope, order: Vec<String>) {
        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            let outcome = match &scope {
                ListScope::Children => remote.write_child_order(&order).await,
                ListScope::Items { child_id } => remote.write_item_order(child_id, &order).await,
            };
            if let Err(error) = outcome {
                // Best effort only; the next successful reorder or a full
                // refetch reconverges the remote order.
                tracing::warn!(%error, ?scope, "Failed to persist list order");
            }
        });
    }
}
