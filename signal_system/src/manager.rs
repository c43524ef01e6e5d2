use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use config::SignalConfig;
use futures::future::BoxFuture;

use crate::event::LifecycleEvent;
use crate::types::{EventCallback, LifecycleSubscriber, SignalError};

/// Identifier returned when a hook is registered
pub type CallbackId = u64;

#[derive(Clone)]
enum Hook {
    Callback(EventCallback),
    Subscriber(Arc<dyn LifecycleSubscriber>),
}

/// Signal manager for lifecycle hooks
pub struct SignalManager {
    hooks: RwLock<Vec<(CallbackId, Hook)>>,
    next_id: AtomicU64,
    config: SignalConfig,
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("callback_count", &self.callback_count())
            .field("config", &self.config)
            .finish()
    }
}

impl SignalManager {
    pub fn new(config: SignalConfig) -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    /// Add an async event callback
    pub fn add_callback<F, Fut>(&self, callback: F) -> Result<CallbackId, SignalError>
    where
        F: Fn(LifecycleEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let callback: EventCallback =
            Arc::new(move |event| Box::pin(callback(event)) as BoxFuture<'static, _>);
        self.register(Hook::Callback(callback))
    }

    /// Add a subscriber object
    pub fn subscribe(
        &self,
        subscriber: Arc<dyn LifecycleSubscriber>,
    ) -> Result<CallbackId, SignalError> {
        self.register(Hook::Subscriber(subscriber))
    }

    fn register(&self, hook: Hook) -> Result<CallbackId, SignalError> {
        let mut hooks = self
            .hooks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if hooks.len() >= self.config.max_hooks {
            return Err(SignalError::TooManyHooks {
                max: self.config.max_hooks,
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        hooks.push((id, hook));
        Ok(id)
    }

    /// Remove a hook; returns whether it was registered
    pub fn remove_callback(&self, id: CallbackId) -> bool {
        let mut hooks = self
            .hooks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() != before
    }

    /// Run every interested hook in registration order.
    ///
    /// Stops at the first failure or timeout.
    pub async fn emit(&self, event: &LifecycleEvent) -> Result<(), SignalError> {
        let hooks: Vec<(CallbackId, Hook)> = match self.hooks.read() {
            Ok(hooks) => hooks.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let timeout = Duration::from_secs(self.config.hook_timeout_seconds);

        for (id, hook) in hooks {
            let outcome = match &hook {
                Hook::Callback(callback) => {
                    tokio::time::timeout(timeout, callback(event.clone())).await
                }
                Hook::Subscriber(subscriber) => {
                    if !subscriber.handles(event.event_type) {
                        continue;
                    }
                    tokio::time::timeout(timeout, subscriber.on_event(event)).await
                }
            };

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(
                        callback_id = id,
                        event_type = %event.event_type,
                        table = %event.table_name,
                        "lifecycle hook failed: {:#}",
                        err
                    );
                    return Err(SignalError::Callback {
                        callback_id: id,
                        event_type: event.event_type,
                        message: format!("{:#}", err),
                    });
                }
                Err(_) => {
                    tracing::warn!(
                        callback_id = id,
                        event_type = %event.event_type,
                        "lifecycle hook timed out"
                    );
                    return Err(SignalError::Timeout {
                        callback_id: id,
                        event_type: event.event_type,
                        seconds: self.config.hook_timeout_seconds,
                    });
                }
            }
        }

        Ok(())
    }

    /// Clear all hooks
    pub fn clear_callbacks(&self) {
        if let Ok(mut hooks) = self.hooks.write() {
            hooks.clear();
        }
    }

    /// Get number of registered hooks
    pub fn callback_count(&self) -> usize {
        self.hooks.read().map(|h| h.len()).unwrap_or(0)
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new(SignalConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use crate::types::LifecycleSubscriber;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct Counter {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl LifecycleSubscriber for Counter {
        fn handles(&self, event_type: EventType) -> bool {
            event_type == EventType::AfterSoftRemove
        }

        async fn on_event(&self, _event: &LifecycleEvent) -> anyhow::Result<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_subscriber_filters_event_types() {
        let manager = SignalManager::default();
        let counter = Arc::new(Counter {
            seen: AtomicUsize::new(0),
        });
        manager.subscribe(counter.clone()).unwrap();

        let before = LifecycleEvent::new(EventType::BeforeSoftRemove, "products");
        manager.emit(&before).await.unwrap();
        manager
            .emit(&before.follow_up(EventType::AfterSoftRemove))
            .await
            .unwrap();

        assert_eq!(counter.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_hook_stops_dispatch() {
        let manager = SignalManager::default();
        let calls = Arc::new(AtomicUsize::new(0));

        manager
            .add_callback(|_event| async { Err(anyhow::anyhow!("audit store offline")) })
            .unwrap();
        let later = calls.clone();
        manager
            .add_callback(move |_event| {
                let later = later.clone();
                async move {
                    later.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap();

        let err = manager
            .emit(&LifecycleEvent::new(EventType::BeforeRemove, "products"))
            .await
            .unwrap_err();

        assert!(matches!(err, SignalError::Callback { callback_id: 1, .. }));
        assert!(err.to_string().contains("audit store offline"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hook_timeout() {
        let manager = SignalManager::new(SignalConfig::new(1, 10));
        manager
            .add_callback(|_event| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Ok(())
            })
            .unwrap();

        let err = manager
            .emit(&LifecycleEvent::new(EventType::BeforeRecover, "products"))
            .await
            .unwrap_err();
        assert!(matches!(err, SignalError::Timeout { seconds: 1, .. }));
    }

    #[test]
    fn test_hook_limit_and_removal() {
        let manager = SignalManager::new(SignalConfig::new(5, 1));
        let id = manager.add_callback(|_event| async { Ok(()) }).unwrap();
        assert!(matches!(
            manager.add_callback(|_event| async { Ok(()) }),
            Err(SignalError::TooManyHooks { max: 1 })
        ));

        assert!(manager.remove_callback(id));
        assert!(!manager.remove_callback(id));
        assert_eq!(manager.callback_count(), 0);
    }
}
