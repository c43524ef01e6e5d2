//! Guarded delete and restore
//!
//! A mutation only runs on a scoped query (or with `force`). It opens a
//! nested transaction on the caller's connection, loads the affected rows,
//! runs before-hooks, mutates by primary key and commits before the
//! after-hooks fire.

use std::collections::HashSet;

use signal_system::{EventType, LifecycleEvent};
use sqlx::{Acquire, Postgres};
use type_mapping::{serialize_to_record_payload, SqlValue};

use crate::errors::QueryError;
use crate::query_builder::condition::{build_condition, SqlFragment};
use crate::query_builder::params::ParameterSet;
use crate::query_builder::{EntityQuery, Intent, QueryOperator, RowState, Statement};
use crate::repository::executor::fetch_typed;
use crate::traits::{Entity, SoftDeletable};

const KEYS_PARAM: &str = "keys";

/// Primary keys per mutation statement, well under the bind-parameter limit
const KEY_BATCH_SIZE: usize = 1000;

/// Options for [`EntityQuery::delete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Set the soft-delete marker instead of removing rows
    pub soft: bool,
    /// Allow more than one row to be affected
    pub multiple: bool,
    /// Skip the scope guard
    pub force: bool,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            soft: true,
            multiple: false,
            force: false,
        }
    }
}

impl DeleteOptions {
    pub fn soft() -> Self {
        Self::default()
    }

    pub fn hard() -> Self {
        Self {
            soft: false,
            ..Self::default()
        }
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Options for [`EntityQuery::restore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreOptions {
    pub multiple: bool,
    pub force: bool,
}

impl RestoreOptions {
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}

impl<T: Entity> EntityQuery<T> {
    /// Delete (soft by default) the matching rows.
    ///
    /// Returns the number of affected rows; `0` when nothing matched.
    pub async fn delete<'c, A>(self, conn: A, options: DeleteOptions) -> Result<u64, QueryError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let soft_column = match (options.soft, T::SOFT_DELETE) {
            (true, Some(column)) => Some(column),
            (true, None) => {
                return Err(QueryError::configuration(format!(
                    "{} does not support soft delete",
                    T::NAME
                )));
            }
            (false, _) => None,
        };
        self.check_guard("delete", options.force)?;

        // A soft delete never touches rows that already carry the marker.
        let rows = match soft_column {
            Some(_) => RowState::Live,
            None => RowState::Visible,
        };
        let compiled = self.compile(Intent::Candidates { rows })?;
        let mut tx = conn.begin().await?;

        let rows = load_candidates::<T>(&mut *tx, compiled.statement).await?;
        if rows.is_empty() {
            return Ok(0);
        }
        check_multiple::<T>(rows.len(), options.multiple)?;

        let (before, after) = match soft_column {
            Some(_) => (EventType::BeforeSoftRemove, EventType::AfterSoftRemove),
            None => (EventType::BeforeRemove, EventType::AfterRemove),
        };
        let event = self.lifecycle_event(before, &rows);
        self.emit_before(event.as_ref()).await?;

        let prefix = match soft_column {
            Some(column) => format!("UPDATE {} SET {} = NOW() WHERE ", T::TABLE, column),
            None => format!("DELETE FROM {} WHERE ", T::TABLE),
        };
        let affected = execute_by_keys(&mut *tx, &prefix, &rows).await?;
        tx.commit().await?;

        tracing::debug!(
            table = T::TABLE,
            soft = soft_column.is_some(),
            affected,
            "deleted rows"
        );
        self.emit_after(event, after).await;
        Ok(affected)
    }

    fn check_guard(&self, operation: &str, force: bool) -> Result<(), QueryError> {
        if force || self.scope.is_scoped() {
            return Ok(());
        }
        tracing::warn!(
            table = T::TABLE,
            operation,
            "rejected mutation without a scoping filter"
        );
        Err(QueryError::configuration(format!(
            "{} on {} requires filter_by_id, filter_by_unique or a key column filter; pass force to override",
            operation,
            T::TABLE
        )))
    }

    fn lifecycle_event(&self, event_type: EventType, rows: &[T]) -> Option<LifecycleEvent> {
        self.signals.as_ref()?;
        let event = rows
            .iter()
            .fold(LifecycleEvent::new(event_type, T::TABLE), |event, row| {
                event.with_record(
                    row.primary_key_value().canonical_string(),
                    serialize_to_record_payload(row),
                )
            });
        Some(event.with_context(self.context.clone()))
    }

    async fn emit_before(&self, event: Option<&LifecycleEvent>) -> Result<(), QueryError> {
        if let (Some(signals), Some(event)) = (&self.signals, event) {
            signals.emit(event).await?;
        }
        Ok(())
    }

    // The mutation is already committed; a failing after-hook is reported
    // but not returned.
    async fn emit_after(&self, before: Option<LifecycleEvent>, event_type: EventType) {
        if let (Some(signals), Some(before)) = (&self.signals, before) {
            let event = before.follow_up(event_type);
            if let Err(err) = signals.emit(&event).await {
                tracing::warn!(
                    table = T::TABLE,
                    event = %event_type,
                    error = %err,
                    "after-hook failed"
                );
            }
        }
    }
}

impl<T: SoftDeletable> EntityQuery<T> {
    /// Clear the soft-delete marker on matching soft-deleted rows.
    ///
    /// Unlike `delete`, matching nothing is `NotFound`.
    pub async fn restore<'c, A>(self, conn: A, options: RestoreOptions) -> Result<u64, QueryError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        self.check_guard("restore", options.force)?;

        let compiled = self.compile(Intent::Candidates {
            rows: RowState::Deleted,
        })?;
        let mut tx = conn.begin().await?;

        let rows = load_candidates::<T>(&mut *tx, compiled.statement).await?;
        if rows.is_empty() {
            return Err(QueryError::not_found(T::NAME));
        }
        check_multiple::<T>(rows.len(), options.multiple)?;

        let event = self.lifecycle_event(EventType::BeforeRecover, &rows);
        self.emit_before(event.as_ref()).await?;

        let prefix = format!(
            "UPDATE {} SET {} = NULL WHERE ",
            T::TABLE,
            T::SOFT_DELETE_COLUMN
        );
        let affected = execute_by_keys(&mut *tx, &prefix, &rows).await?;
        tx.commit().await?;

        tracing::debug!(table = T::TABLE, affected, "restored rows");
        self.emit_after(event, EventType::AfterRecover).await;
        Ok(affected)
    }
}

/// Candidate rows, one per primary key
async fn load_candidates<T: Entity>(
    conn: &mut sqlx::PgConnection,
    statement: Statement,
) -> Result<Vec<T>, QueryError> {
    let mut rows = fetch_typed::<T>(conn, statement).await?;
    let mut seen = HashSet::new();
    rows.retain(|row| seen.insert(row.primary_key_value().canonical_string()));
    Ok(rows)
}

fn check_multiple<T: Entity>(found: usize, multiple: bool) -> Result<(), QueryError> {
    if found > 1 && !multiple {
        return Err(QueryError::configuration(format!(
            "query matched {} {} rows; pass multiple to affect more than one",
            found,
            T::NAME
        )));
    }
    Ok(())
}

/// Run `prefix` followed by `pk IN (...)` over `rows`, one batch at a time
async fn execute_by_keys<T: Entity>(
    conn: &mut sqlx::PgConnection,
    prefix: &str,
    rows: &[T],
) -> Result<u64, QueryError> {
    let keys: Vec<SqlValue> = rows.iter().map(T::primary_key_value).collect();
    let mut affected = 0;

    for (sql, values) in keyed_statements(prefix, T::PRIMARY_KEY, &keys)? {
        crate::trace_log!(sql = %sql, keys = values.len(), "mutation statement");

        let mut query = sqlx::query::<Postgres>(&sql);
        for value in values {
            query = bind_sql_value!(query, value);
        }
        affected += query.execute(&mut *conn).await?.rows_affected();
    }

    Ok(affected)
}

/// Positional statements covering `keys` in batches of [`KEY_BATCH_SIZE`]
fn keyed_statements(
    prefix: &str,
    primary_key: &str,
    keys: &[SqlValue],
) -> Result<Vec<(String, Vec<SqlValue>)>, QueryError> {
    keys.chunks(KEY_BATCH_SIZE)
        .map(|batch| {
            let mut params = ParameterSet::new();
            params.insert(KEYS_PARAM, SqlValue::Array(batch.to_vec()));

            let mut statement = SqlFragment::raw(prefix);
            statement.append(build_condition(primary_key, KEYS_PARAM, QueryOperator::In));
            params.render(&statement)
        })
        .collect()
}
