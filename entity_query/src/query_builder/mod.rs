//! Query builder
//!
//! Filter composition, query assembly and the compile step that turns an
//! [`EntityQuery`] into positional SQL.

pub mod aggregation;
pub mod builder;
pub mod condition;
pub mod filter;
pub mod join;
pub mod ordering;
pub mod pagination;
pub mod params;
pub mod sql_generation;

#[cfg(test)]
mod tests;

pub use aggregation::{AggregateFunction, SelectField};
pub use builder::EntityQuery;
pub use condition::{build_condition, SqlFragment};
pub use filter::{AnyCondition, QueryCondition, QueryFilter, QueryOperator};
pub use join::{JoinOn, JoinType};
pub use ordering::SortOrder;
pub use pagination::Pagination;
pub use params::{sanitize_param_key, ParameterSet};
pub use sql_generation::{CompiledQuery, Intent, RowState, Statement};
