//! Entity Query - guarded, parameterized queries over a single entity
//!
//! This crate provides the column validator, parameter key sanitizer,
//! condition builder, filter composer, query assembler and executor that
//! every repository in the repohaus ecosystem is built on.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::__tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        $crate::__tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

#[doc(hidden)]
pub use tracing as __tracing;

pub mod column;
pub mod errors;
pub mod prelude;
pub mod query_builder;
pub mod repository;
pub mod scope;
pub mod traits;
pub mod validation;

pub use column::{ColumnRef, IntoColumn};
pub use errors::{is_unique_violation, QueryError};
pub use query_builder::{
    build_condition, sanitize_param_key, AggregateFunction, AnyCondition, CompiledQuery,
    EntityQuery, Intent, JoinOn, JoinType, ParameterSet, QueryOperator, RowState, SelectField,
    SortOrder, SqlFragment, Statement,
};
pub use repository::{DeleteOptions, EntityRepository, RestoreOptions};
pub use scope::{MutationScope, ScopeReason};
pub use traits::*;
pub use validation::{validate_column, ValidatedIdentifier, ValidationError};

pub use signal_system::ContextData;
pub use type_mapping::{IntoFilterValue, SqlValue};
