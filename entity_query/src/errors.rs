use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid column name '{column}': only letters, digits, '_', '.' and ':' are allowed")]
    InvalidColumn { column: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] ValidationError),

    #[error("{entity} not found")]
    NotFound {
        entity: String,
        /// Localizable key, `<entity>.not_found`
        message_key: String,
    },

    #[error("Query configuration error: {0}")]
    Configuration(String),

    #[error("Lifecycle hook failed: {0}")]
    Hook(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl QueryError {
    pub fn not_found(entity: &str) -> Self {
        QueryError::NotFound {
            entity: entity.to_string(),
            message_key: format!("{}.not_found", entity),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        QueryError::Configuration(message.into())
    }

    /// Whether the underlying database error is a unique constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            QueryError::Database(err) => is_unique_violation(err),
            _ => false,
        }
    }

    /// HTTP status class for this error
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::NotFound { .. } => 404,
            err if err.is_unique_violation() => 409,
            _ => 500,
        }
    }

    /// Copy of an error recorded while the query was being built.
    ///
    /// Builder errors never wrap a database error, so nothing is lost.
    pub(crate) fn replay(&self) -> Self {
        match self {
            QueryError::InvalidColumn { column } => QueryError::InvalidColumn {
                column: column.clone(),
            },
            QueryError::InvalidIdentifier(err) => QueryError::InvalidIdentifier(err.clone()),
            QueryError::NotFound {
                entity,
                message_key,
            } => QueryError::NotFound {
                entity: entity.clone(),
                message_key: message_key.clone(),
            },
            QueryError::Configuration(msg) => QueryError::Configuration(msg.clone()),
            QueryError::Hook(msg) => QueryError::Hook(msg.clone()),
            QueryError::Database(err) => QueryError::Configuration(err.to_string()),
        }
    }
}

impl From<signal_system::SignalError> for QueryError {
    fn from(err: signal_system::SignalError) -> Self {
        QueryError::Hook(err.to_string())
    }
}

/// Recognize a unique constraint violation so callers can report "already exists"
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
