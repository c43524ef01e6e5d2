//! Bind parameter naming and positional rendering
//!
//! Fragments refer to values by name (`:key`, `:...key`). A query collects
//! its values in a [`ParameterSet`] and renders the named fragment into
//! PostgreSQL `$n` placeholders in one pass.

use type_mapping::SqlValue;

use crate::errors::QueryError;
use crate::query_builder::condition::{max_key, min_key, SqlFragment, Token};

/// Derive a bind parameter name from an arbitrary column string.
///
/// Keeps `[A-Za-z0-9_]`, trims underscores at both ends, prefixes `param_`
/// when the result starts with a digit and falls back to `param` when
/// nothing is left.
pub fn sanitize_param_key(column: &str) -> String {
    let stripped: String = column
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    let trimmed = stripped.trim_matches('_');

    if trimmed.is_empty() {
        "param".to_string()
    } else if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("param_{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Ordered named bind values for one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, SqlValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    // A key is free when neither it nor its range companions are taken.
    fn is_free(&self, key: &str) -> bool {
        !self.contains(key) && !self.contains(&min_key(key)) && !self.contains(&max_key(key))
    }

    /// `base`, or `base_2`, `base_3`, ... when already taken
    pub fn unique_key(&self, base: &str) -> String {
        if self.is_free(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.is_free(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: SqlValue) {
        self.entries.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&SqlValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render a named fragment into positional SQL and its ordered values.
    ///
    /// List parameters expand to one placeholder per element.
    pub fn render(&self, fragment: &SqlFragment) -> Result<(String, Vec<SqlValue>), QueryError> {
        let mut sql = String::new();
        let mut values: Vec<SqlValue> = Vec::new();

        for token in fragment.tokens() {
            match token {
                Token::Sql(text) => sql.push_str(text),
                Token::Param(key) => {
                    let value = self.lookup(key)?;
                    values.push(value.clone());
                    push_placeholder(&mut sql, values.len(), value);
                }
                Token::ParamList(key) => match self.lookup(key)? {
                    SqlValue::Array(items) if !items.is_empty() => {
                        for (i, item) in items.iter().enumerate() {
                            if i > 0 {
                                sql.push_str(", ");
                            }
                            values.push(item.clone());
                            push_placeholder(&mut sql, values.len(), item);
                        }
                    }
                    _ => {
                        return Err(QueryError::configuration(format!(
                            "parameter '{}' must be a non-empty list",
                            key
                        )))
                    }
                },
            }
        }

        Ok((sql, values))
    }

    fn lookup(&self, key: &str) -> Result<&SqlValue, QueryError> {
        self.get(key)
            .ok_or_else(|| QueryError::configuration(format!("unbound parameter '{}'", key)))
    }
}

fn push_placeholder(sql: &mut String, position: usize, value: &SqlValue) {
    sql.push('$');
    sql.push_str(&position.to_string());
    if let Some(cast) = value.pg_cast() {
        sql.push_str("::");
        sql.push_str(cast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::condition::build_condition;
    use crate::query_builder::filter::QueryOperator;

    #[test]
    fn test_sanitize_param_key() {
        let cases = [
            ("name", "name"),
            ("p.category_id", "pcategory_id"),
            ("price::numeric", "pricenumeric"),
            ("__weird__", "weird"),
            ("1st_place", "param_1st_place"),
            ("_9lives", "param_9lives"),
            ("!!!", "param"),
            ("", "param"),
            ("name; DROP TABLE x", "nameDROPTABLEx"),
        ];
        for (input, expected) in cases {
            assert_eq!(sanitize_param_key(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_sanitized_keys_are_safe() {
        let inputs = ["a.b", "_x_", "9", "ü.id", "a-b-c", "__", "x__y", ":..:"];
        for input in inputs {
            let key = sanitize_param_key(input);
            assert!(key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
            assert!(!key.starts_with(|c: char| c.is_ascii_digit()));
            assert!(!key.starts_with('_') && !key.ends_with('_'), "key: {}", key);
        }
    }

    #[test]
    fn test_unique_keys() {
        let mut params = ParameterSet::new();
        let first = params.unique_key("status");
        params.insert(first.clone(), SqlValue::Text("a".into()));
        let second = params.unique_key("status");
        params.insert(second.clone(), SqlValue::Text("b".into()));
        let third = params.unique_key("status");

        assert_eq!(first, "status");
        assert_eq!(second, "status_2");
        assert_eq!(third, "status_3");
    }

    #[test]
    fn test_range_keys_block_base() {
        let mut params = ParameterSet::new();
        let key = params.unique_key("price");
        params.insert(min_key(&key), SqlValue::Integer(1));
        params.insert(max_key(&key), SqlValue::Integer(9));

        assert_eq!(params.unique_key("price"), "price_2");
        assert_eq!(params.unique_key("min_price"), "min_price_2");
    }

    #[test]
    fn test_render_positional() {
        let mut params = ParameterSet::new();
        params.insert("pid", SqlValue::Array(vec![SqlValue::BigInt(1), SqlValue::BigInt(2)]));
        params.insert("pprice", SqlValue::Decimal("9.99".into()));

        let mut fragment = build_condition("p.id", "pid", QueryOperator::In);
        fragment.push_sql(" AND ");
        fragment.append(build_condition("p.price", "pprice", QueryOperator::Gte));

        assert_eq!(fragment.to_string(), "p.id IN (:...pid) AND p.price >= :pprice");

        let (sql, values) = params.render(&fragment).unwrap();
        assert_eq!(sql, "p.id IN ($1, $2) AND p.price >= $3::numeric");
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_render_unbound() {
        let fragment = build_condition("p.name", "pname", QueryOperator::Eq);
        assert!(matches!(
            ParameterSet::new().render(&fragment),
            Err(QueryError::Configuration(_))
        ));
    }
}
