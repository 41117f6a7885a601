//! # Satchel Engine
//!
//! The optimistic mutation synchronization engine behind Satchel's
//! per-child packing checklists.
//!
//! A user rapidly taps increment/decrement controls and drag-reorders
//! lists; the UI must stay instantly responsive while the resulting writes
//! are batched, reconciled against a remote store that may fail or race,
//! and acknowledged with transient per-entity feedback.
//!
//! ## Design Principles
//!
//! - **Optimistic first**: every edit mutates the in-memory roster before
//!   anything touches the network
//! - **Coalesced writes**: a burst of edits to one record produces exactly
//!   one remote write, carrying the final value
//! - **Recoverable failures**: a failed quantity write rolls the record
//!   back to its last known-good value and pulses `error` feedback; no
//!   failure in this engine is fatal or blocking
//! - **Opaque remote**: the persistence endpoints are a trait; the engine
//!   only ever sees binary success/error outcomes
//!
//! ## Core Concepts
//!
//! ### Roster
//!
//! The in-memory entity tree - children, their ordered item checklists and
//! non-negative quantity records - and the single source of truth for
//! rendering. See [`Roster`].
//!
//! ### Mutation Keys
//!
//! A [`MutationKey`] pairs a child id with an item type id. The
//! [`DebounceScheduler`], [`RollbackCache`] and [`FeedbackStore`] all index
//! their state by it, so state never leaks across entities.
//!
//! ### Write Cycle
//!
//! Per key: `idle` -> `pending` (debounce timer running) -> `in-flight`
//! (remote call issued) -> `idle`, with a success or error [`Feedback`]
//! pulse left behind for a short interval. A new edit re-enters `pending`
//! from any state and restarts the debounce window.
//!
//! ### Reordering
//!
//! Drag reorders go through the [`ListReconciler`]: the move applies
//! locally at once and the full id order is persisted fire-and-forget,
//! deliberately without rollback.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use satchel_engine::{Child, ItemType, RemoteResult, RemoteStore, SyncEngine};
//!
//! struct NullRemote;
//!
//! #[async_trait::async_trait]
//! impl RemoteStore for NullRemote {
//!     async fn write_quantity(&self, _: &str, _: &str, _: u32) -> RemoteResult<()> {
//!         Ok(())
//!     }
//!     async fn write_child_order(&self, _: &[String]) -> RemoteResult<()> {
//!         Ok(())
//!     }
//!     async fn write_item_order(&self, _: &str, _: &[String]) -> RemoteResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let child = Child::new("child-1", "Mio", 0)
//!         .with_item_type(ItemType::new("towel", "タオル", true, 0));
//!
//!     let engine = SyncEngine::new(vec![child], Arc::new(NullRemote));
//!
//!     // The roster reflects the edit immediately; the remote write goes
//!     // out after the debounce window.
//!     engine.update_item_quantity("child-1", "towel", 2);
//!     assert_eq!(engine.quantity("child-1", "towel"), 2);
//!
//!     engine.shutdown();
//! }
//! ```

pub mod client;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod key;
pub mod remote;
pub mod reorder;
pub mod rollback;
pub mod roster;
pub mod scheduler;

// Re-export main types at crate root
pub use client::SyncClient;
pub use engine::{EngineConfig, SyncEngine, SyncPhase};
pub use error::{RemoteError, RemoteResult};
pub use feedback::{Feedback, FeedbackStore};
pub use key::MutationKey;
pub use remote::RemoteStore;
pub use reorder::{ListReconciler, ListScope};
pub use rollback::RollbackCache;
pub use roster::{Child, ChildItem, ItemType, Roster};
pub use scheduler::DebounceScheduler;

/// Type aliases for clarity
pub type ChildId = String;
pub type ItemTypeId = String;
pub type Quantity = u32;
