//! Compile step
//!
//! Every invariant of a query is checked here, in one place, before any I/O.
//! The result is positional SQL plus the ordered bind values.

use type_mapping::SqlValue;

use crate::errors::QueryError;
use crate::query_builder::builder::EntityQuery;
use crate::query_builder::condition::{build_condition, max_key, min_key, SqlFragment};
use crate::query_builder::filter::{QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::params::ParameterSet;
use crate::traits::Entity;

/// What the compiled query will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// One row
    First,
    /// All rows, optionally with a total count, as entities or raw rows
    FetchAll { with_count: bool, raw: bool },
    /// `COUNT(DISTINCT pk)` only
    Count,
    /// Rows a delete or restore would touch
    Candidates { rows: RowState },
}

/// Soft-delete state of mutation candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// Whatever the query would fetch, honoring `with_deleted`
    Visible,
    /// Rows without the soft-delete marker, even under `with_deleted`
    Live,
    /// Soft-deleted rows only
    Deleted,
}

impl Intent {
    pub fn fetch_all(with_count: bool, raw: bool) -> Self {
        Intent::FetchAll { with_count, raw }
    }
}

/// A ready-to-run statement
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL with `$n` placeholders
    pub sql: String,
    /// The same SQL with named `:key` slots, for logging
    pub named: String,
    pub params: Vec<SqlValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub statement: Statement,
    /// Present for `FetchAll { with_count: true, .. }`
    pub count: Option<Statement>,
}

impl<T: Entity> EntityQuery<T> {
    /// Validate the query and render it for `intent`
    pub fn compile(&self, intent: Intent) -> Result<CompiledQuery, QueryError> {
        if let Some(err) = self.errors.first() {
            return Err(err.replay());
        }
        self.check_conditions()?;
        self.check_intent(intent)?;

        let mut params = ParameterSet::new();
        let from = self.from_clause(&mut params)?;
        let where_clause = self.where_clause(&mut params, intent)?;

        let statement = match intent {
            Intent::Count => self.count_fragment(&from, &where_clause),
            Intent::Candidates { .. } => {
                let mut fragment = SqlFragment::raw(format!("SELECT {}.* ", self.alias));
                fragment.append(from.clone());
                fragment.append(where_clause.clone());
                fragment
            }
            Intent::First | Intent::FetchAll { .. } => {
                let mut fragment = SqlFragment::raw(format!("SELECT {} ", self.projection_sql()?));
                fragment.append(from.clone());
                fragment.append(where_clause.clone());
                fragment.push_sql(self.tail_sql(intent));
                fragment
            }
        };

        let count = match intent {
            Intent::FetchAll {
                with_count: true, ..
            } => Some(self.render(&params, &self.count_fragment(&from, &where_clause))?),
            _ => None,
        };
        let statement = self.render(&params, &statement)?;

        tracing::debug!(
            table = T::TABLE,
            intent = ?intent,
            params = statement.params.len(),
            "compiled entity query"
        );
        crate::trace_log!(sql = %statement.named, "entity query statement");

        Ok(CompiledQuery { statement, count })
    }

    fn check_conditions(&self) -> Result<(), QueryError> {
        for filter in &self.filters {
            match filter {
                QueryFilter::Condition(condition) => condition.check_value_shape()?,
                QueryFilter::Any(group) => {
                    for condition in group {
                        condition.check_value_shape()?;
                    }
                }
            }
        }
        for join in &self.joins {
            for predicate in &join.predicates {
                predicate.check_value_shape()?;
            }
        }
        Ok(())
    }

    fn check_intent(&self, intent: Intent) -> Result<(), QueryError> {
        match intent {
            Intent::FetchAll {
                with_count: true,
                raw: true,
            } => Err(QueryError::configuration(
                "counted fetch returns entities only; raw rows cannot be counted",
            )),
            Intent::FetchAll {
                with_count: true, ..
            } if self.has_group() => Err(QueryError::configuration(
                "counted fetch is not supported on a grouped query",
            )),
            Intent::Candidates {
                rows: RowState::Live | RowState::Deleted,
            } if T::SOFT_DELETE.is_none() => {
                Err(QueryError::configuration(format!(
                    "{} does not support soft delete",
                    T::NAME
                )))
            }
            _ => Ok(()),
        }
    }

    fn from_clause(&self, params: &mut ParameterSet) -> Result<SqlFragment, QueryError> {
        let mut fragment = SqlFragment::raw(format!("FROM {} {}", T::TABLE, self.alias));

        for join in &self.joins {
            fragment.push_sql(format!(
                " {} {} {} ON {} = {}",
                join.join_type.to_sql(),
                join.table,
                join.alias,
                join.left,
                join.right
            ));
            for predicate in &join.predicates {
                fragment.push_sql(" AND ");
                fragment.append(condition_fragment(predicate, params)?);
            }
            if let Some(column) = &join.soft_delete {
                if !self.with_deleted {
                    fragment.push_sql(format!(" AND {} IS NULL", column));
                }
            }
        }

        Ok(fragment)
    }

    fn where_clause(
        &self,
        params: &mut ParameterSet,
        intent: Intent,
    ) -> Result<SqlFragment, QueryError> {
        let mut terms = Vec::with_capacity(self.filters.len() + 1);

        for filter in &self.filters {
            match filter {
                QueryFilter::Condition(condition) => {
                    terms.push(condition_fragment(condition, params)?);
                }
                QueryFilter::Any(group) => {
                    let mut alternatives = Vec::with_capacity(group.len());
                    for condition in group {
                        alternatives.push(condition_fragment(condition, params)?);
                    }
                    let mut bracketed = SqlFragment::raw("(");
                    bracketed.append(SqlFragment::join(alternatives, " OR "));
                    bracketed.push_sql(")");
                    terms.push(bracketed);
                }
            }
        }

        if let Some(column) = T::SOFT_DELETE {
            match intent {
                Intent::Candidates {
                    rows: RowState::Deleted,
                } => {
                    terms.push(SqlFragment::raw(format!(
                        "{}.{} IS NOT NULL",
                        self.alias, column
                    )));
                }
                Intent::Candidates {
                    rows: RowState::Live,
                } => {
                    terms.push(SqlFragment::raw(format!("{}.{} IS NULL", self.alias, column)));
                }
                _ if !self.with_deleted => {
                    terms.push(SqlFragment::raw(format!("{}.{} IS NULL", self.alias, column)));
                }
                _ => {}
            }
        }

        if terms.is_empty() {
            return Ok(SqlFragment::new());
        }
        let mut fragment = SqlFragment::raw(" WHERE ");
        fragment.append(SqlFragment::join(terms, " AND "));
        Ok(fragment)
    }

    fn projection_sql(&self) -> Result<String, QueryError> {
        let alias = self.alias.as_str();
        let mut fields = match &self.projection {
            Some(fields) => fields
                .iter()
                .map(|field| field.to_sql(alias))
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![format!("{}.*", alias)],
        };
        for field in &self.extra_projection {
            fields.push(field.to_sql(alias)?);
        }
        Ok(fields.join(", "))
    }

    fn count_fragment(&self, from: &SqlFragment, where_clause: &SqlFragment) -> SqlFragment {
        let mut fragment = SqlFragment::raw(format!(
            "SELECT COUNT(DISTINCT {}.{}) AS total ",
            self.alias,
            T::PRIMARY_KEY
        ));
        fragment.append(from.clone());
        fragment.append(where_clause.clone());
        fragment
    }

    /// GROUP BY, ORDER BY and LIMIT/OFFSET
    fn tail_sql(&self, intent: Intent) -> String {
        let mut sql = String::new();

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, order)| format!("{} {}", column, order.to_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        let page = self
            .pagination
            .map(|pagination| pagination.resolve(&self.query_config));
        match (intent, page) {
            (Intent::First, Some((_, offset))) if offset > 0 => {
                sql.push_str(&format!(" LIMIT 1 OFFSET {}", offset));
            }
            (Intent::First, _) => sql.push_str(" LIMIT 1"),
            (_, Some((limit, offset))) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
            }
            _ => {}
        }

        sql
    }

    fn render(&self, params: &ParameterSet, fragment: &SqlFragment) -> Result<Statement, QueryError> {
        let (sql, values) = params.render(fragment)?;
        Ok(Statement {
            sql,
            named: fragment.to_string(),
            params: values,
        })
    }
}

/// Bind the condition's value under a fresh key and build its predicate
fn condition_fragment(
    condition: &QueryCondition,
    params: &mut ParameterSet,
) -> Result<SqlFragment, QueryError> {
    let operator = condition.operator;
    if operator.is_null_check() {
        return Ok(build_condition(&condition.column, &condition.param_key, operator));
    }

    let value = condition.value.as_ref().ok_or_else(|| {
        QueryError::configuration(format!(
            "operator {} on '{}' requires a value",
            operator, condition.column
        ))
    })?;

    // An empty list matches nothing.
    if let (QueryOperator::In, SqlValue::Array(items)) = (operator, value) {
        if items.is_empty() {
            return Ok(SqlFragment::raw("1=0"));
        }
    }

    let key = params.unique_key(&condition.param_key);
    match (operator, value) {
        (QueryOperator::Between, SqlValue::Array(bounds)) if bounds.len() == 2 => {
            params.insert(min_key(&key), bounds[0].clone());
            params.insert(max_key(&key), bounds[1].clone());
        }
        (QueryOperator::Between, _) => {
            return Err(QueryError::configuration(format!(
                "operator BETWEEN on '{}' requires a [min, max] pair",
                condition.column
            )));
        }
        _ => params.insert(key.clone(), value.clone()),
    }

    Ok(build_condition(&condition.column, &key, operator))
}
