//! Core Repohaus functionality
//!
//! This module contains the `Repohaus` coordinator: it owns the connection
//! pool, the shared lifecycle hook dispatcher and the query defaults, and
//! hands out per-entity repositories wired to them.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use config::{AppConfig, DatabaseConfig, QueryConfig, SignalConfig};
use entity_query::{Entity, EntityRepository};
use signal_system::SignalManager;

use crate::errors::RepohausError;

/// Main Repohaus coordinator
#[derive(Debug, Clone)]
pub struct Repohaus {
    pool: PgPool,
    signal_manager: Arc<SignalManager>,
    query_config: QueryConfig,
}

impl Repohaus {
    /// Validate the configuration and connect
    pub async fn new(config: AppConfig) -> Result<Self, RepohausError> {
        config.validate()?;
        let pool = connect(&config.database).await?;
        Ok(Self::with_pool(pool, config.query, config.signal))
    }

    /// Load `AppConfig` from `REPOHAUS_CONFIG` or `./repohaus.toml` and connect
    pub async fn from_env() -> Result<Self, RepohausError> {
        Self::new(AppConfig::load()?).await
    }

    /// Wrap an existing pool
    pub fn with_pool(pool: PgPool, query_config: QueryConfig, signal_config: SignalConfig) -> Self {
        Self {
            pool,
            signal_manager: Arc::new(SignalManager::new(signal_config)),
            query_config,
        }
    }

    /// Get database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Shared hook dispatcher; register audit subscribers here
    pub fn signals(&self) -> &Arc<SignalManager> {
        &self.signal_manager
    }

    pub fn query_config(&self) -> &QueryConfig {
        &self.query_config
    }

    /// Repository for `T` with `alias` as its root table alias
    pub fn repository<T: Entity>(&self, alias: &str) -> Result<EntityRepository<T>, RepohausError> {
        Ok(EntityRepository::new(alias)?
            .with_signals(Arc::clone(&self.signal_manager))
            .with_query_config(self.query_config.clone()))
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), RepohausError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn connect(config: &DatabaseConfig) -> Result<PgPool, RepohausError> {
    let mut pool_options = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

    // Set max lifetime if specified
    if config.max_lifetime_seconds > 0 {
        pool_options = pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
    }

    tracing::debug!(
        host = %config.host,
        database = %config.database,
        max_connections = config.max_connections,
        "connecting to PostgreSQL"
    );
    Ok(pool_options.connect(&config.connection_string()).await?)
}
