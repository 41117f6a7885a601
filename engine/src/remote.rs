//! Boundary trait for the persistence collaborator.
//!
//! The endpoints behind this trait are opaque to the engine: it only ever
//! interprets the binary success/error outcome of a write. Status codes,
//! response payloads and retries all stay on the implementation's side.

use async_trait::async_trait;

use crate::{error::RemoteResult, ChildId, ItemTypeId, Quantity};

/// The remote endpoints the engine writes to.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upsert the quantity for one (child, item type) record.
    ///
    /// The caller has already clamped `quantity` to a non-negative value.
    async fn write_quantity(
        &self,
        child_id: &str,
        item_type_id: &str,
        quantity: Quantity,
    ) -> RemoteResult<()>;

    /// Persist the order of the top-level child list, positions 0..N-1.
    async fn write_child_order(&self, child_ids: &[ChildId]) -> RemoteResult<()>;

    /// Persist the order of one child's item checklist, positions 0..N-1.
    async fn write_item_order(
        &self,
        child_id: &str,
        item_type_ids: &[ItemTypeId],
    ) -> RemoteResult<()>;
}
