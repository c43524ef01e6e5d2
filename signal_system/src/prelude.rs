//! Convenience re-exports for common signal-system usage

pub use crate::event::{ContextData, EventType, LifecycleEvent, RecordSnapshot};
pub use crate::manager::{CallbackId, SignalManager};
pub use crate::types::{EventCallback, LifecycleSubscriber, SignalError};
pub use config::SignalConfig;

// Common external dependencies
pub use async_trait::async_trait;
pub use type_mapping::SqlValue;
