//! Binding `SqlValue`s onto sqlx queries

/// Bind one `SqlValue` onto any sqlx query type (`query`, `query_as`,
/// `query_scalar`), picking the native PostgreSQL type for each variant.
///
/// Lists and records travel as `jsonb`; decimals are bound as text and cast
/// to `numeric` by the placeholder.
macro_rules! bind_sql_value {
    ($query:expr, $value:expr) => {
        match $value {
            type_mapping::SqlValue::Text(v) | type_mapping::SqlValue::Decimal(v) => $query.bind(v),
            type_mapping::SqlValue::SmallInt(v) => $query.bind(v),
            type_mapping::SqlValue::Integer(v) => $query.bind(v),
            type_mapping::SqlValue::BigInt(v) => $query.bind(v),
            type_mapping::SqlValue::Float(v) => $query.bind(v),
            type_mapping::SqlValue::Boolean(v) => $query.bind(v),
            type_mapping::SqlValue::Uuid(v) => $query.bind(v),
            type_mapping::SqlValue::Timestamp(v) => $query.bind(v),
            type_mapping::SqlValue::Date(v) => $query.bind(v),
            type_mapping::SqlValue::Json(v) => $query.bind(sqlx::types::Json(v)),
            other @ (type_mapping::SqlValue::Array(_) | type_mapping::SqlValue::Record(_)) => {
                $query.bind(sqlx::types::Json(other.to_json()))
            }
            type_mapping::SqlValue::Null => $query.bind(Option::<String>::None),
        }
    };
}
