//! Entity query builder
//!
//! `EntityQuery<T>` accumulates filters, joins, projection, ordering and
//! pagination for one entity. Every call consumes and returns the query.
//! Errors found while building are recorded and reported by `compile`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use config::QueryConfig;
use signal_system::{ContextData, SignalManager};
use type_mapping::{IntoFilterValue, SqlValue};

use crate::column::{ColumnRef, IntoColumn};
use crate::errors::QueryError;
use crate::query_builder::aggregation::SelectField;
use crate::query_builder::filter::{AnyCondition, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::join::{JoinClause, JoinOn, JoinType};
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::pagination::Pagination;
use crate::scope::{is_key_column, MutationScope, ScopeReason};
use crate::traits::Entity;
use crate::validation::ValidatedIdentifier;

/// Query under construction for one entity, consumed by an executor call
pub struct EntityQuery<T: Entity> {
    pub(crate) alias: ValidatedIdentifier,
    pub(crate) filters: Vec<QueryFilter>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) projection: Option<Vec<SelectField>>,
    pub(crate) extra_projection: Vec<SelectField>,
    pub(crate) order_by: Vec<(String, SortOrder)>,
    pub(crate) group_by: Vec<String>,
    pub(crate) pagination: Option<Pagination>,
    pub(crate) with_deleted: bool,
    pub(crate) scope: MutationScope,
    pub(crate) context: Option<ContextData>,
    pub(crate) errors: Vec<QueryError>,
    pub(crate) signals: Option<Arc<SignalManager>>,
    pub(crate) query_config: QueryConfig,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> fmt::Debug for EntityQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityQuery")
            .field("table", &T::TABLE)
            .field("alias", &self.alias)
            .field("filters", &self.filters)
            .field("joins", &self.joins)
            .field("projection", &self.projection)
            .field("order_by", &self.order_by)
            .field("group_by", &self.group_by)
            .field("pagination", &self.pagination)
            .field("with_deleted", &self.with_deleted)
            .field("scope", &self.scope)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl<T: Entity> EntityQuery<T> {
    pub(crate) fn new(
        alias: ValidatedIdentifier,
        query_config: QueryConfig,
        signals: Option<Arc<SignalManager>>,
    ) -> Self {
        Self {
            alias,
            filters: Vec::new(),
            joins: Vec::new(),
            projection: None,
            extra_projection: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            pagination: None,
            with_deleted: false,
            scope: MutationScope::Unscoped,
            context: None,
            errors: Vec::new(),
            signals,
            query_config,
            _entity: PhantomData,
        }
    }

    pub fn alias(&self) -> &str {
        self.alias.as_str()
    }

    pub fn scope(&self) -> &MutationScope {
        &self.scope
    }

    pub fn has_group(&self) -> bool {
        !self.group_by.is_empty()
    }

    pub fn context(&self) -> Option<&ContextData> {
        self.context.as_ref()
    }

    fn defer(mut self, error: QueryError) -> Self {
        self.errors.push(error);
        self
    }

    fn root_qualified(&self, column: &ColumnRef) -> String {
        column.qualified(self.alias.as_str())
    }

    fn primary_key(&self) -> String {
        format!("{}.{}", self.alias, T::PRIMARY_KEY)
    }

    // ---- filter composer ----

    /// `column = value`; no-op when the value is absent
    pub fn filter_by(self, column: impl IntoColumn, value: impl IntoFilterValue) -> Self {
        self.filter_by_op(column, value, QueryOperator::Eq)
    }

    /// Filter with an explicit operator; no-op when the value is absent.
    ///
    /// Pattern operators wrap the value in `%` wildcards. `IS NULL` and
    /// `IS NOT NULL` ignore the value.
    pub fn filter_by_op(
        self,
        column: impl IntoColumn,
        value: impl IntoFilterValue,
        operator: QueryOperator,
    ) -> Self {
        if operator.is_null_check() {
            return self.push_null_check(column, operator);
        }
        let Some(value) = value.into_filter_value() else {
            return self;
        };
        let column = match column.into_column() {
            Ok(column) => column,
            Err(err) => return self.defer(err),
        };

        let qualified = self.root_qualified(&column);
        let (operator, value) = operator.apply_pattern(value);
        self.push_condition(qualified, operator, value)
    }

    fn push_condition(mut self, qualified: String, operator: QueryOperator, value: SqlValue) -> Self {
        let condition = QueryCondition::new(qualified, operator, Some(value));
        let expression = condition.column.split("::").next().unwrap_or(&condition.column);
        if matches!(operator, QueryOperator::Eq | QueryOperator::In) && is_key_column(expression) {
            self.scope = self.scope.mark(ScopeReason::KeyColumn(expression.to_string()));
        }
        self.filters.push(QueryFilter::Condition(condition));
        self
    }

    fn push_null_check(mut self, column: impl IntoColumn, operator: QueryOperator) -> Self {
        match column.into_column() {
            Ok(column) => {
                let qualified = self.root_qualified(&column);
                self.filters
                    .push(QueryFilter::Condition(QueryCondition::new(qualified, operator, None)));
                self
            }
            Err(err) => self.defer(err),
        }
    }

    /// OR group of alternatives, ANDed into the query as one bracketed term.
    ///
    /// Alternatives with an absent value are skipped; an empty group is a
    /// no-op. OR groups never scope a mutation.
    pub fn filter_any(mut self, conditions: impl IntoIterator<Item = AnyCondition>) -> Self {
        let mut group = Vec::new();
        for condition in conditions {
            let column = match condition.column {
                Ok(column) => column,
                Err(err) => {
                    self.errors.push(err);
                    continue;
                }
            };
            let qualified = self.root_qualified(&column);
            if condition.operator.is_null_check() {
                group.push(QueryCondition::new(qualified, condition.operator, None));
                continue;
            }
            let Some(value) = condition.value else {
                continue;
            };
            let (operator, value) = condition.operator.apply_pattern(value);
            group.push(QueryCondition::new(qualified, operator, Some(value)));
        }

        if !group.is_empty() {
            self.filters.push(QueryFilter::Any(group));
        }
        self
    }

    /// Inclusive range: `BETWEEN` with both bounds, `>=` or `<=` with one,
    /// no-op with none. RFC3339 text bounds are normalized to UTC.
    pub fn filter_by_range(
        self,
        column: impl IntoColumn,
        min: impl IntoFilterValue,
        max: impl IntoFilterValue,
    ) -> Self {
        let min = min.into_filter_value().map(normalize_bound);
        let max = max.into_filter_value().map(normalize_bound);

        match (min, max) {
            (Some(min), Some(max)) => {
                let column = match column.into_column() {
                    Ok(column) => column,
                    Err(err) => return self.defer(err),
                };
                let qualified = self.root_qualified(&column);
                let mut query = self;
                query.filters.push(QueryFilter::Condition(QueryCondition::new(
                    qualified,
                    QueryOperator::Between,
                    Some(SqlValue::Array(vec![min, max])),
                )));
                query
            }
            (Some(min), None) => self.filter_by_op(column, min, QueryOperator::Gte),
            (None, Some(max)) => self.filter_by_op(column, max, QueryOperator::Lte),
            (None, None) => self,
        }
    }

    /// Filter on the primary key; a list becomes `IN`. Scopes the query
    /// for delete and restore.
    pub fn filter_by_id(self, id: impl IntoFilterValue) -> Self {
        let Some(value) = id.into_filter_value() else {
            return self;
        };
        let operator = if value.is_array() {
            QueryOperator::In
        } else {
            QueryOperator::Eq
        };
        let qualified = self.primary_key();
        let mut query = self.push_condition(qualified, operator, value);
        query.scope = query.scope.mark(ScopeReason::PrimaryKey);
        query
    }

    pub fn filter_by_status(self, status: impl IntoFilterValue) -> Self {
        self.filter_by("status", status)
    }

    /// Equality on a declared unique column. Scopes the query for delete
    /// and restore.
    pub fn filter_by_unique(self, column: impl IntoColumn, value: impl IntoFilterValue) -> Self {
        let Some(value) = value.into_filter_value() else {
            return self;
        };
        let column = match column.into_column() {
            Ok(column) => column,
            Err(err) => return self.defer(err),
        };
        if !T::UNIQUE_COLUMNS.contains(&column.bare()) {
            return self.defer(QueryError::configuration(format!(
                "'{}' is not a unique column of {}",
                column, T::NAME
            )));
        }

        let qualified = self.root_qualified(&column);
        let mut query = self.push_condition(qualified, QueryOperator::Eq, value);
        query.scope = query
            .scope
            .mark(ScopeReason::UniqueKey(column.bare().to_string()));
        query
    }

    pub fn filter_null(self, column: impl IntoColumn) -> Self {
        self.push_null_check(column, QueryOperator::IsNull)
    }

    pub fn filter_not_null(self, column: impl IntoColumn) -> Self {
        self.push_null_check(column, QueryOperator::IsNotNull)
    }

    /// Audit metadata handed to lifecycle hooks for every affected row
    pub fn with_context(mut self, context: ContextData) -> Self {
        self.context = Some(context);
        self
    }

    // ---- query assembler ----

    /// Replace the projection; the primary key is prepended when missing
    pub fn select<F: Into<SelectField>>(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        let mut fields: Vec<SelectField> = fields.into_iter().map(Into::into).collect();
        let primary_key = self.primary_key();
        if !fields
            .iter()
            .any(|field| field.selects(self.alias.as_str(), &primary_key))
        {
            fields.insert(0, SelectField::Column(primary_key));
        }
        self.projection = Some(fields);
        self
    }

    /// Replace the projection exactly as given
    pub fn select_without_id<F: Into<SelectField>>(
        mut self,
        fields: impl IntoIterator<Item = F>,
    ) -> Self {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Add fields after the current projection (`alias.*` by default)
    pub fn add_select<F: Into<SelectField>>(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        self.extra_projection
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Join a declared relation or a table.
    ///
    /// A relation derives its ON clause unless `on` is given; a plain table
    /// requires `on`.
    pub fn join(mut self, target: &str, alias: &str, join_type: JoinType, on: Option<JoinOn>) -> Self {
        let join_alias = match ValidatedIdentifier::new(alias) {
            Ok(alias) => alias,
            Err(err) => return self.defer(err.into()),
        };

        let relation = T::relation(target);
        let table = match relation {
            Some(relation) => relation.table.to_string(),
            None => match ValidatedIdentifier::new(target) {
                Ok(table) => table.into_string(),
                Err(err) => return self.defer(err.into()),
            },
        };

        let (left, right, predicates) = match (on, relation) {
            (Some(on), _) => match self.resolve_on(on, join_alias.as_str()) {
                Ok(resolved) => resolved,
                Err(err) => return self.defer(err),
            },
            (None, Some(relation)) => (
                format!("{}.{}", join_alias, relation.foreign_key),
                format!("{}.{}", self.alias, relation.local_key),
                Vec::new(),
            ),
            (None, None) => {
                return self.defer(QueryError::configuration(format!(
                    "join to '{}' requires an ON clause",
                    target
                )));
            }
        };

        self.joins.push(JoinClause {
            join_type,
            table,
            alias: join_alias.into_string(),
            left,
            right,
            predicates,
            soft_delete: None,
        });
        self
    }

    fn resolve_on(
        &self,
        on: JoinOn,
        join_alias: &str,
    ) -> Result<(String, String, Vec<QueryCondition>), QueryError> {
        let left = on.left?.qualified(join_alias);
        let right = on.right?.qualified(self.alias.as_str());

        let mut predicates = Vec::new();
        for predicate in on.predicates {
            let qualified = predicate.column?.qualified(join_alias);
            if predicate.operator.is_null_check() {
                predicates.push(QueryCondition::new(qualified, predicate.operator, None));
                continue;
            }
            let Some(value) = predicate.value else {
                continue;
            };
            let (operator, value) = predicate.operator.apply_pattern(value);
            predicates.push(QueryCondition::new(qualified, operator, Some(value)));
        }
        Ok((left, right, predicates))
    }

    /// Join and project every column of `R` as `alias_column`. Soft-deleted
    /// rows of `R` are excluded in the ON clause unless `with_deleted`.
    pub fn join_and_select<R: Entity>(
        self,
        target: &str,
        alias: &str,
        join_type: JoinType,
        on: Option<JoinOn>,
    ) -> Self {
        let joined = self.joins.len();
        let mut query = self.join(target, alias, join_type, on);
        if query.joins.len() == joined {
            return query;
        }

        if let Some(join) = query.joins.last_mut() {
            join.soft_delete = R::SOFT_DELETE.map(|column| format!("{}.{}", join.alias, column));
            let projected = R::COLUMNS.iter().map(|column| {
                SelectField::column_as(
                    format!("{}.{}", join.alias, column),
                    format!("{}_{}", join.alias, column),
                )
            });
            query.extra_projection.extend(projected);
        }
        query
    }

    pub fn order_by(mut self, column: impl IntoColumn, order: SortOrder) -> Self {
        match column.into_column() {
            Ok(column) => {
                let qualified = self.root_qualified(&column);
                self.order_by.push((qualified, order));
                self
            }
            Err(err) => self.defer(err),
        }
    }

    /// `order_by` that does nothing without a column
    pub fn order_by_opt<C: IntoColumn>(self, column: Option<C>, order: SortOrder) -> Self {
        match column {
            Some(column) => self.order_by(column, order),
            None => self,
        }
    }

    pub fn group_by(mut self, column: impl IntoColumn) -> Self {
        match column.into_column() {
            Ok(column) => {
                let qualified = self.root_qualified(&column);
                self.group_by.push(qualified);
                self
            }
            Err(err) => self.defer(err),
        }
    }

    /// 1-based page; defaults and the size cap come from `QueryConfig`
    pub fn pagination(mut self, page: Option<u32>, limit: Option<u32>) -> Self {
        self.pagination = Some(Pagination::new(page, limit));
        self
    }

    /// Include soft-deleted rows of the root and typed joins
    pub fn with_deleted(mut self, with_deleted: bool) -> Self {
        self.with_deleted = with_deleted;
        self
    }
}

// Date and time bounds are compared in UTC.
fn normalize_bound(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(text) => match DateTime::parse_from_rfc3339(&text) {
            Ok(instant) => SqlValue::Timestamp(instant.with_timezone(&Utc)),
            Err(_) => SqlValue::Text(text),
        },
        other => other,
    }
}
