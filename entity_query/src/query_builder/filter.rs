//! Filter conditions
//!
//! Operators, single conditions and OR groups as accumulated by the filter
//! composer. Nothing here touches SQL text; see `condition.rs` for that.

use std::fmt;
use std::str::FromStr;

use type_mapping::{IntoFilterValue, SqlValue};

use crate::column::{ColumnRef, IntoColumn};
use crate::errors::QueryError;
use crate::query_builder::params::sanitize_param_key;

/// Query condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOperator {
    Eq,         // =
    Ne,         // !=
    Gt,         // >
    Gte,        // >=
    Lt,         // <
    Lte,        // <=
    In,         // IN
    Like,       // LIKE '%v%'
    ILike,      // ILIKE '%v%'
    StartLike,  // LIKE 'v%'
    StartILike, // ILIKE 'v%'
    EndLike,    // LIKE '%v'
    EndILike,   // ILIKE '%v'
    Between,    // BETWEEN min AND max
    IsNull,     // IS NULL
    IsNotNull,  // IS NOT NULL
}

impl QueryOperator {
    /// SQL spelling; pattern variants collapse onto `LIKE`/`ILIKE`
    pub fn to_sql(&self) -> &'static str {
        match self {
            QueryOperator::Eq => "=",
            QueryOperator::Ne => "!=",
            QueryOperator::Gt => ">",
            QueryOperator::Gte => ">=",
            QueryOperator::Lt => "<",
            QueryOperator::Lte => "<=",
            QueryOperator::In => "IN",
            QueryOperator::Like | QueryOperator::StartLike | QueryOperator::EndLike => "LIKE",
            QueryOperator::ILike | QueryOperator::StartILike | QueryOperator::EndILike => "ILIKE",
            QueryOperator::Between => "BETWEEN",
            QueryOperator::IsNull => "IS NULL",
            QueryOperator::IsNotNull => "IS NOT NULL",
        }
    }

    /// Name accepted by `from_str`
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOperator::StartLike => "START_LIKE",
            QueryOperator::StartILike => "START_ILIKE",
            QueryOperator::EndLike => "END_LIKE",
            QueryOperator::EndILike => "END_ILIKE",
            other => other.to_sql(),
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            QueryOperator::Like
                | QueryOperator::ILike
                | QueryOperator::StartLike
                | QueryOperator::StartILike
                | QueryOperator::EndLike
                | QueryOperator::EndILike
        )
    }

    pub fn is_null_check(&self) -> bool {
        matches!(self, QueryOperator::IsNull | QueryOperator::IsNotNull)
    }

    /// Rewrite a pattern operator into plain `LIKE`/`ILIKE` with the
    /// wildcards applied to the value.
    ///
    /// Arrays pass through untouched so the compile step rejects them.
    pub fn apply_pattern(self, value: SqlValue) -> (QueryOperator, SqlValue) {
        if !self.is_pattern() || value.is_array() {
            return (self, value);
        }

        let text = value.canonical_string();
        let (op, pattern) = match self {
            QueryOperator::Like => (QueryOperator::Like, format!("%{}%", text)),
            QueryOperator::ILike => (QueryOperator::ILike, format!("%{}%", text)),
            QueryOperator::StartLike => (QueryOperator::Like, format!("{}%", text)),
            QueryOperator::StartILike => (QueryOperator::ILike, format!("{}%", text)),
            QueryOperator::EndLike => (QueryOperator::Like, format!("%{}", text)),
            QueryOperator::EndILike => (QueryOperator::ILike, format!("%{}", text)),
            other => (other, text),
        };
        (op, SqlValue::Text(pattern))
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_ascii_uppercase().as_str() {
            "=" | "EQ" => QueryOperator::Eq,
            "!=" | "<>" | "NE" => QueryOperator::Ne,
            ">" | "GT" => QueryOperator::Gt,
            ">=" | "GTE" => QueryOperator::Gte,
            "<" | "LT" => QueryOperator::Lt,
            "<=" | "LTE" => QueryOperator::Lte,
            "IN" => QueryOperator::In,
            "LIKE" => QueryOperator::Like,
            "ILIKE" => QueryOperator::ILike,
            "START_LIKE" => QueryOperator::StartLike,
            "START_ILIKE" => QueryOperator::StartILike,
            "END_LIKE" => QueryOperator::EndLike,
            "END_ILIKE" => QueryOperator::EndILike,
            "BETWEEN" => QueryOperator::Between,
            "IS NULL" => QueryOperator::IsNull,
            "IS NOT NULL" => QueryOperator::IsNotNull,
            other => {
                return Err(QueryError::configuration(format!(
                    "unsupported operator '{}'",
                    other
                )))
            }
        };
        Ok(op)
    }
}

/// Single condition in WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    /// Fully qualified column (`p.name`)
    pub column: String,
    pub operator: QueryOperator,
    /// `None` for null checks; `[min, max]` for `Between`
    pub value: Option<SqlValue>,
    /// Sanitized key the value is bound under
    pub param_key: String,
}

impl QueryCondition {
    pub fn new(column: String, operator: QueryOperator, value: Option<SqlValue>) -> Self {
        let expression = column.split("::").next().unwrap_or(&column);
        let param_key = sanitize_param_key(expression);
        Self {
            column,
            operator,
            value,
            param_key,
        }
    }

    /// `IN` takes a list and nothing else does
    pub fn check_value_shape(&self) -> Result<(), QueryError> {
        let is_array = self.value.as_ref().map(SqlValue::is_array).unwrap_or(false);
        match self.operator {
            QueryOperator::In if !is_array => Err(QueryError::configuration(format!(
                "operator IN on '{}' requires an array value",
                self.column
            ))),
            QueryOperator::In | QueryOperator::Between => Ok(()),
            op if op.is_null_check() => Ok(()),
            op if is_array => Err(QueryError::configuration(format!(
                "operator {} on '{}' does not accept an array value",
                op, self.column
            ))),
            _ => Ok(()),
        }
    }
}

/// Query filter: a condition or a bracketed OR group
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Any(Vec<QueryCondition>),
}

/// One alternative inside `filter_any`
#[derive(Debug)]
pub struct AnyCondition {
    pub(crate) column: Result<ColumnRef, QueryError>,
    pub(crate) operator: QueryOperator,
    pub(crate) value: Option<SqlValue>,
}

impl AnyCondition {
    pub fn new(column: impl IntoColumn, value: impl IntoFilterValue, operator: QueryOperator) -> Self {
        Self {
            column: column.into_column(),
            operator,
            value: value.into_filter_value(),
        }
    }

    pub fn eq(column: impl IntoColumn, value: impl IntoFilterValue) -> Self {
        Self::new(column, value, QueryOperator::Eq)
    }

    pub fn like(column: impl IntoColumn, value: impl IntoFilterValue) -> Self {
        Self::new(column, value, QueryOperator::Like)
    }

    pub fn ilike(column: impl IntoColumn, value: impl IntoFilterValue) -> Self {
        Self::new(column, value, QueryOperator::ILike)
    }
}
