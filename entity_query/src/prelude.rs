//! Convenience re-exports for common entity-query usage

// Entity traits
pub use crate::traits::{Entity, Relation, SoftDeletable};

// Error types
pub use crate::errors::{is_unique_violation, QueryError};

// Repository and query
pub use crate::repository::{DeleteOptions, EntityRepository, RestoreOptions};
pub use crate::query_builder::{
    AnyCondition, EntityQuery, Intent, JoinOn, JoinType, QueryOperator, RowState, SelectField,
    SortOrder,
};
pub use crate::scope::{MutationScope, ScopeReason};

// Columns and validation
pub use crate::column::{ColumnRef, IntoColumn};
pub use crate::validation::{ValidatedIdentifier, ValidationError};

// Values and audit context
pub use signal_system::ContextData;
pub use type_mapping::{IntoFilterValue, SqlValue};
