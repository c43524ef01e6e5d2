//! Convenience re-exports for common Repohaus usage
//!
//! This prelude module re-exports the most commonly used items from the Repohaus ecosystem,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use repohaus::prelude::*;
//!
//! // Now you have access to all the common Repohaus types and traits
//! ```

// Core Repohaus components
pub use crate::core::Repohaus;
pub use crate::errors::RepohausError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, DatabaseConfig, QueryConfig, SignalConfig};

// Re-export commonly used entity-query types for convenience
pub use entity_query::prelude::*;

// Re-export entity_query module for macro-generated code
pub use entity_query;

// Re-export signal system for lifecycle hooks
pub use signal_system::prelude::*;

// Re-export table derive for model creation
pub use table_derive::{model, Entity};

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use sqlx;
pub use tokio;

// Commonly used value types
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;

// Commonly used sqlx types
pub use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
