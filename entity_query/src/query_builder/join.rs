use type_mapping::{IntoFilterValue, SqlValue};

use crate::column::{ColumnRef, IntoColumn};
use crate::errors::QueryError;
use crate::query_builder::filter::{AnyCondition, QueryCondition, QueryOperator};

/// Represents the type of SQL JOIN operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// INNER JOIN - returns records that have matching values in both tables
    #[default]
    Inner,
    /// LEFT JOIN - returns all records from the root table and matched joined records
    Left,
}

impl JoinType {
    /// Convert JoinType to SQL string
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

/// Explicit ON clause for tables that are not declared relations.
///
/// Bare column names are qualified with the joined alias on the left and the
/// root alias on the right.
#[derive(Debug)]
pub struct JoinOn {
    pub(crate) left: Result<ColumnRef, QueryError>,
    pub(crate) right: Result<ColumnRef, QueryError>,
    pub(crate) predicates: Vec<AnyCondition>,
}

impl JoinOn {
    /// `ON left = right`
    pub fn columns(left: impl IntoColumn, right: impl IntoColumn) -> Self {
        Self {
            left: left.into_column(),
            right: right.into_column(),
            predicates: Vec::new(),
        }
    }

    /// Extra parameterized predicate, ANDed into the ON clause.
    /// Skipped when the value is absent.
    pub fn and(
        mut self,
        column: impl IntoColumn,
        value: impl IntoFilterValue,
        operator: QueryOperator,
    ) -> Self {
        self.predicates.push(AnyCondition::new(column, value, operator));
        self
    }

    /// Extra `IS NULL` predicate
    pub fn and_null(mut self, column: impl IntoColumn) -> Self {
        self.predicates
            .push(AnyCondition::new(column, None::<SqlValue>, QueryOperator::IsNull));
        self
    }
}

/// Represents a complete JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub alias: String,
    /// Qualified column of the joined table
    pub left: String,
    /// Qualified column it must equal
    pub right: String,
    pub predicates: Vec<QueryCondition>,
    /// Qualified soft-delete column of the joined entity, excluded unless
    /// the query includes deleted rows
    pub soft_delete: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_type_to_sql() {
        assert_eq!(JoinType::Inner.to_sql(), "INNER JOIN");
        assert_eq!(JoinType::Left.to_sql(), "LEFT JOIN");
    }

    #[test]
    fn test_join_on_defers_column_errors() {
        let on = JoinOn::columns("product_id", "id").and("bad column", 1i32, QueryOperator::Eq);
        assert!(on.left.is_ok());
        assert!(on.right.is_ok());
        assert!(on.predicates[0].column.is_err());
    }
}
