//! Condition builder
//!
//! Turns a `(column, operator)` pair into a named SQL fragment. Values never
//! appear in the text; they are bound under the given parameter key.

use std::fmt;

use crate::query_builder::filter::QueryOperator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Sql(String),
    /// `:key`
    Param(String),
    /// `:...key`, expanded to one placeholder per list element
    ParamList(String),
}

/// SQL text interleaved with named parameter slots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlFragment {
    tokens: Vec<Token>,
}

impl SqlFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        let mut fragment = Self::new();
        fragment.push_sql(sql);
        fragment
    }

    pub fn push_sql(&mut self, sql: impl Into<String>) {
        let sql = sql.into();
        if sql.is_empty() {
            return;
        }
        if let Some(Token::Sql(last)) = self.tokens.last_mut() {
            last.push_str(&sql);
        } else {
            self.tokens.push(Token::Sql(sql));
        }
    }

    pub fn push_param(&mut self, key: impl Into<String>) {
        self.tokens.push(Token::Param(key.into()));
    }

    pub fn push_param_list(&mut self, key: impl Into<String>) {
        self.tokens.push(Token::ParamList(key.into()));
    }

    pub fn append(&mut self, other: SqlFragment) {
        for token in other.tokens {
            match token {
                Token::Sql(sql) => self.push_sql(sql),
                token => self.tokens.push(token),
            }
        }
    }

    /// Join fragments with a separator, e.g. `" AND "`
    pub fn join(fragments: Vec<SqlFragment>, separator: &str) -> SqlFragment {
        let mut joined = SqlFragment::new();
        for (i, fragment) in fragments.into_iter().enumerate() {
            if i > 0 {
                joined.push_sql(separator);
            }
            joined.append(fragment);
        }
        joined
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for SqlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            match token {
                Token::Sql(sql) => f.write_str(sql)?,
                Token::Param(key) => write!(f, ":{}", key)?,
                Token::ParamList(key) => write!(f, ":...{}", key)?,
            }
        }
        Ok(())
    }
}

pub fn min_key(key: &str) -> String {
    format!("min_{}", key)
}

pub fn max_key(key: &str) -> String {
    format!("max_{}", key)
}

/// Build the predicate for one condition.
///
/// `column` must already be validated and qualified.
pub fn build_condition(column: &str, param_key: &str, operator: QueryOperator) -> SqlFragment {
    let mut fragment = SqlFragment::new();
    match operator {
        QueryOperator::In => {
            fragment.push_sql(format!("{} IN (", column));
            fragment.push_param_list(param_key);
            fragment.push_sql(")");
        }
        QueryOperator::Between => {
            fragment.push_sql(format!("{} BETWEEN ", column));
            fragment.push_param(min_key(param_key));
            fragment.push_sql(" AND ");
            fragment.push_param(max_key(param_key));
        }
        QueryOperator::IsNull | QueryOperator::IsNotNull => {
            fragment.push_sql(format!("{} {}", column, operator.to_sql()));
        }
        op => {
            fragment.push_sql(format!("{} {} ", column, op.to_sql()));
            fragment.push_param(param_key);
        }
    }
    fragment
}
