//! Optional filter values
//!
//! Filter builders accept anything implementing [`IntoFilterValue`]. `None`
//! means "no value supplied" and turns the filter into a no-op, while real
//! values such as `0`, `false` or `""` always produce a predicate.

use crate::types::SqlValue;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

/// A value that may be absent from a filter call
pub trait IntoFilterValue {
    /// Returns `None` when the caller supplied no value
    fn into_filter_value(self) -> Option<SqlValue>;
}

macro_rules! impl_filter_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoFilterValue for $ty {
                fn into_filter_value(self) -> Option<SqlValue> {
                    Some(SqlValue::from(self))
                }
            }

            impl IntoFilterValue for Option<$ty> {
                fn into_filter_value(self) -> Option<SqlValue> {
                    self.map(SqlValue::from)
                }
            }
        )*
    };
}

impl_filter_value!(
    String,
    i16,
    i32,
    i64,
    u32,
    f32,
    f64,
    bool,
    Uuid,
    DateTime<Utc>,
    DateTime<FixedOffset>,
    NaiveDateTime,
    NaiveDate,
    serde_json::Value,
);

impl<'a> IntoFilterValue for &'a str {
    fn into_filter_value(self) -> Option<SqlValue> {
        Some(SqlValue::from(self))
    }
}

impl<'a> IntoFilterValue for Option<&'a str> {
    fn into_filter_value(self) -> Option<SqlValue> {
        self.map(SqlValue::from)
    }
}

impl<'a> IntoFilterValue for &'a String {
    fn into_filter_value(self) -> Option<SqlValue> {
        Some(SqlValue::from(self))
    }
}

// `SqlValue::Null` counts as absent; use `filter_null` to match NULL columns.
impl IntoFilterValue for SqlValue {
    fn into_filter_value(self) -> Option<SqlValue> {
        match self {
            SqlValue::Null => None,
            other => Some(other),
        }
    }
}

impl IntoFilterValue for Option<SqlValue> {
    fn into_filter_value(self) -> Option<SqlValue> {
        self.and_then(IntoFilterValue::into_filter_value)
    }
}

impl<T> IntoFilterValue for Vec<T>
where
    T: Into<SqlValue>,
{
    fn into_filter_value(self) -> Option<SqlValue> {
        Some(SqlValue::from(self))
    }
}

impl<T> IntoFilterValue for Option<Vec<T>>
where
    T: Into<SqlValue>,
{
    fn into_filter_value(self) -> Option<SqlValue> {
        self.map(SqlValue::from)
    }
}
