use crate::column::ColumnRef;
use crate::errors::QueryError;
use crate::validation::ValidatedIdentifier;

/// Represents SQL aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// COUNT(*) or COUNT(column)
    Count,
    /// SUM(column)
    Sum,
    /// AVG(column)
    Avg,
    /// MIN(column)
    Min,
    /// MAX(column)
    Max,
    /// COUNT(DISTINCT column)
    CountDistinct,
}

impl AggregateFunction {
    /// Convert aggregate function to SQL string
    pub fn to_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::CountDistinct => "COUNT",
        }
    }

    /// Check if this is a DISTINCT aggregate
    pub fn is_distinct(&self) -> bool {
        matches!(self, AggregateFunction::CountDistinct)
    }
}

/// One entry of a SELECT list.
///
/// Column names are kept as given and validated when the query compiles;
/// bare names are qualified with the root alias.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectField {
    /// `p.name`
    Column(String),
    /// `c.name AS c_name`
    ColumnAs { column: String, alias: String },
    /// `COUNT(p.id) AS total`
    Aggregate {
        function: AggregateFunction,
        column: Option<String>, // None for COUNT(*)
        alias: Option<String>,
    },
}

impl SelectField {
    pub fn column(column: impl Into<String>) -> Self {
        SelectField::Column(column.into())
    }

    pub fn column_as(column: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectField::ColumnAs {
            column: column.into(),
            alias: alias.into(),
        }
    }

    /// Create COUNT(*) aggregate
    pub fn count_all() -> Self {
        SelectField::Aggregate {
            function: AggregateFunction::Count,
            column: None,
            alias: None,
        }
    }

    pub fn count(column: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Count, column)
    }

    pub fn count_distinct(column: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::CountDistinct, column)
    }

    pub fn sum(column: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Sum, column)
    }

    pub fn avg(column: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Avg, column)
    }

    pub fn min(column: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Min, column)
    }

    pub fn max(column: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Max, column)
    }

    fn aggregate(function: AggregateFunction, column: impl Into<String>) -> Self {
        SelectField::Aggregate {
            function,
            column: Some(column.into()),
            alias: None,
        }
    }

    /// Add an alias to this select field
    pub fn with_alias(self, alias: impl Into<String>) -> Self {
        match self {
            SelectField::Column(column) | SelectField::ColumnAs { column, .. } => {
                SelectField::ColumnAs {
                    column,
                    alias: alias.into(),
                }
            }
            SelectField::Aggregate {
                function, column, ..
            } => SelectField::Aggregate {
                function,
                column,
                alias: Some(alias.into()),
            },
        }
    }

    /// Whether this field selects `qualified` (e.g. `p.id`) as a plain column
    pub(crate) fn selects(&self, root_alias: &str, qualified: &str) -> bool {
        match self {
            SelectField::Column(column) | SelectField::ColumnAs { column, .. } => {
                ColumnRef::parse(column.as_str())
                    .map(|c| c.qualified(root_alias) == qualified)
                    .unwrap_or(false)
            }
            SelectField::Aggregate { .. } => false,
        }
    }

    /// Render into SQL, validating every name
    pub(crate) fn to_sql(&self, root_alias: &str) -> Result<String, QueryError> {
        match self {
            SelectField::Column(column) => Ok(ColumnRef::parse(column.as_str())?.qualified(root_alias)),
            SelectField::ColumnAs { column, alias } => Ok(format!(
                "{} AS {}",
                ColumnRef::parse(column.as_str())?.qualified(root_alias),
                ValidatedIdentifier::new(alias)?
            )),
            SelectField::Aggregate {
                function,
                column,
                alias,
            } => {
                let argument = match column {
                    Some(column) => {
                        let column = ColumnRef::parse(column.as_str())?.qualified(root_alias);
                        if function.is_distinct() {
                            format!("DISTINCT {}", column)
                        } else {
                            column
                        }
                    }
                    None => "*".to_string(),
                };
                let mut sql = format!("{}({})", function.to_sql(), argument);
                if let Some(alias) = alias {
                    sql.push_str(" AS ");
                    sql.push_str(ValidatedIdentifier::new(alias)?.as_str());
                }
                Ok(sql)
            }
        }
    }
}

impl From<&str> for SelectField {
    fn from(column: &str) -> Self {
        SelectField::Column(column.to_string())
    }
}

impl From<String> for SelectField {
    fn from(column: String) -> Self {
        SelectField::Column(column)
    }
}

impl From<ColumnRef> for SelectField {
    fn from(column: ColumnRef) -> Self {
        SelectField::Column(column.as_str().to_string())
    }
}
