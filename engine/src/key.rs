//! Mutation keys scoping debounce, rollback and feedback state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ChildId, ItemTypeId};

/// Identifies one (child, item type) quantity record.
///
/// The scheduler, the rollback cache and the feedback store all index their
/// state by this key. Deriving it in a single place keeps the three
/// registries agreeing on which entries belong to which entity - a mismatch
/// would leak state across entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationKey {
    /// The owning child's id
    pub child_id: ChildId,
    /// The item type id within that child's checklist
    pub item_type_id: ItemTypeId,
}

impl MutationKey {
    /// Create a key for a (child, item type) pair.
    pub fn new(child_id: impl Into<ChildId>, item_type_id: impl Into<ItemTypeId>) -> Self {
        Self {
            child_id: child_id.into(),
            item_type_id: item_type_id.into(),
        }
    }
}

impl fmt::Display for MutationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.child_id, self.item_type_id)
    }
}
