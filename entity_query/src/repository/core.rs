use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use config::QueryConfig;
use signal_system::SignalManager;

use crate::errors::QueryError;
use crate::query_builder::EntityQuery;
use crate::traits::Entity;
use crate::validation::ValidatedIdentifier;

/// Per-entity query factory.
///
/// Holds the root alias and shared handles only; every call to
/// [`query`](Self::query) starts from an empty query.
pub struct EntityRepository<T: Entity> {
    alias: ValidatedIdentifier,
    signal_manager: Option<Arc<SignalManager>>,
    query_config: QueryConfig,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for EntityRepository<T> {
    fn clone(&self) -> Self {
        Self {
            alias: self.alias.clone(),
            signal_manager: self.signal_manager.clone(),
            query_config: self.query_config.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T: Entity> fmt::Debug for EntityRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRepository")
            .field("table", &T::TABLE)
            .field("alias", &self.alias)
            .field("has_signals", &self.has_signals())
            .field("query_config", &self.query_config)
            .finish()
    }
}

impl<T: Entity> EntityRepository<T> {
    /// Create a repository whose queries use `alias` for the root table
    pub fn new(alias: &str) -> Result<Self, QueryError> {
        Ok(Self {
            alias: ValidatedIdentifier::new(alias)?,
            signal_manager: None,
            query_config: QueryConfig::default(),
            _phantom: PhantomData,
        })
    }

    /// Dispatch lifecycle hooks for mutations through `signal_manager`
    pub fn with_signals(mut self, signal_manager: Arc<SignalManager>) -> Self {
        self.signal_manager = Some(signal_manager);
        self
    }

    pub fn with_query_config(mut self, query_config: QueryConfig) -> Self {
        self.query_config = query_config;
        self
    }

    pub fn has_signals(&self) -> bool {
        self.signal_manager.is_some()
    }

    pub fn alias(&self) -> &str {
        self.alias.as_str()
    }

    /// A fresh, unscoped query over `T`
    pub fn query(&self) -> EntityQuery<T> {
        EntityQuery::new(
            self.alias.clone(),
            self.query_config.clone(),
            self.signal_manager.clone(),
        )
    }
}
