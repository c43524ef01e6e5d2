//! Lifecycle hooks for guarded mutations
//!
//! This crate dispatches before/after events for delete, soft delete and
//! restore operations in the repohaus ecosystem. Before-hooks can veto a
//! mutation by returning an error.

pub mod event;
pub mod manager;
pub mod prelude;
pub mod types;

pub use event::{ContextData, EventType, LifecycleEvent, RecordSnapshot};
pub use manager::{CallbackId, SignalManager};
pub use types::{EventCallback, LifecycleSubscriber, SignalError};
