//! Column references
//!
//! A column reaches SQL text either as a runtime string that passed
//! [`validate_column`] or as a derive-generated column enum whose names were
//! checked when the macro expanded.

use std::borrow::Cow;
use std::fmt;

use crate::errors::QueryError;
use crate::validation::validate_column;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef(Cow<'static, str>);

impl ColumnRef {
    /// Validate a runtime column token
    pub fn parse(column: impl Into<String>) -> Result<Self, QueryError> {
        let column = column.into();
        validate_column(&column)?;
        Ok(Self(Cow::Owned(column)))
    }

    /// Column name known to be valid at compile time.
    ///
    /// Used by `#[derive(Entity)]` output; the name is not checked again.
    #[doc(hidden)]
    pub const fn trusted(column: &'static str) -> Self {
        Self(Cow::Borrowed(column))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the column already carries a table alias
    pub fn is_qualified(&self) -> bool {
        self.expression().contains('.')
    }

    /// Column without any `::type` cast
    pub fn expression(&self) -> &str {
        self.0.split("::").next().unwrap_or(&self.0)
    }

    /// Column name with alias and cast stripped (`p.price::numeric` -> `price`)
    pub fn bare(&self) -> &str {
        let expression = self.expression();
        expression.rsplit('.').next().unwrap_or(expression)
    }

    /// Prefix with `alias.` unless already qualified
    pub fn qualified(&self, alias: &str) -> String {
        if self.is_qualified() {
            self.0.to_string()
        } else {
            format!("{}.{}", alias, self.0)
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything usable as a column in filters, ordering and grouping
pub trait IntoColumn {
    fn into_column(self) -> Result<ColumnRef, QueryError>;
}

impl IntoColumn for ColumnRef {
    fn into_column(self) -> Result<ColumnRef, QueryError> {
        Ok(self)
    }
}

impl IntoColumn for &str {
    fn into_column(self) -> Result<ColumnRef, QueryError> {
        ColumnRef::parse(self)
    }
}

impl IntoColumn for String {
    fn into_column(self) -> Result<ColumnRef, QueryError> {
        ColumnRef::parse(self)
    }
}

impl IntoColumn for &String {
    fn into_column(self) -> Result<ColumnRef, QueryError> {
        ColumnRef::parse(self.as_str())
    }
}
