//! Error types for the Repohaus crate
//!
//! This module contains the facade error returned by coordinator operations.

use thiserror::Error;

use config::ConfigError;
use entity_query::QueryError;

#[derive(Error, Debug)]
pub enum RepohausError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl RepohausError {
    /// HTTP status class for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RepohausError::Query(err) => err.status_code(),
            _ => 500,
        }
    }
}
