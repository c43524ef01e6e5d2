//! Callback and subscriber types for the signal system

use crate::event::{EventType, LifecycleEvent};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;

/// Async event callback type that returns a Result
pub type EventCallback =
    Arc<dyn Fn(LifecycleEvent) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A lifecycle subscriber, such as an audit log writer
#[async_trait]
pub trait LifecycleSubscriber: Send + Sync {
    /// Whether this subscriber wants the given event type
    fn handles(&self, _event_type: EventType) -> bool {
        true
    }

    async fn on_event(&self, event: &LifecycleEvent) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Hook {callback_id} failed on {event_type}: {message}")]
    Callback {
        callback_id: u64,
        event_type: EventType,
        message: String,
    },
    #[error("Hook {callback_id} timed out after {seconds}s on {event_type}")]
    Timeout {
        callback_id: u64,
        event_type: EventType,
        seconds: u64,
    },
    #[error("Hook limit of {max} reached")]
    TooManyHooks { max: usize },
}
