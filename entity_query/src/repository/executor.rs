//! Terminal read operations
//!
//! Each method compiles the query for its intent and runs it on a connection
//! acquired from whatever the caller passes: a pool, a connection or an open
//! transaction.

use sqlx::postgres::PgRow;
use sqlx::{Acquire, Postgres};

use crate::errors::QueryError;
use crate::query_builder::{EntityQuery, Intent, Statement};
use crate::traits::Entity;

impl<T: Entity> EntityQuery<T> {
    /// First matching row, or `None`
    pub async fn first<'c, A>(self, conn: A) -> Result<Option<T>, QueryError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let compiled = self.compile(Intent::First)?;
        let mut conn = conn.acquire().await?;

        let Statement { sql, params, .. } = compiled.statement;
        let mut query = sqlx::query_as::<Postgres, T>(&sql);
        for value in params {
            query = bind_sql_value!(query, value);
        }
        Ok(query.fetch_optional(&mut *conn).await?)
    }

    /// First matching row as a raw `PgRow`, for custom projections
    pub async fn first_raw<'c, A>(self, conn: A) -> Result<Option<PgRow>, QueryError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let compiled = self.compile(Intent::First)?;
        let mut conn = conn.acquire().await?;

        let Statement { sql, params, .. } = compiled.statement;
        let mut query = sqlx::query::<Postgres>(&sql);
        for value in params {
            query = bind_sql_value!(query, value);
        }
        Ok(query.fetch_optional(&mut *conn).await?)
    }

    /// First matching row or `NotFound` keyed `<entity>.not_found`
    pub async fn first_or_fail<'c, A>(self, conn: A) -> Result<T, QueryError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        self.first(conn)
            .await?
            .ok_or_else(|| QueryError::not_found(T::NAME))
    }

    pub async fn first_raw_or_fail<'c, A>(self, conn: A) -> Result<PgRow, QueryError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        self.first_raw(conn)
            .await?
            .ok_or_else(|| QueryError::not_found(T::NAME))
    }

    pub async fn all<'c, A>(self, conn: A) -> Result<Vec<T>, QueryError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let compiled = self.compile(Intent::fetch_all(false, false))?;
        let mut conn = conn.acquire().await?;
        fetch_typed(&mut *conn, compiled.statement).await
    }

    pub async fn all_raw<'c, A>(self, conn: A) -> Result<Vec<PgRow>, QueryError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let compiled = self.compile(Intent::fetch_all(false, true))?;
        let mut conn = conn.acquire().await?;

        let Statement { sql, params, .. } = compiled.statement;
        let mut query = sqlx::query::<Postgres>(&sql);
        for value in params {
            query = bind_sql_value!(query, value);
        }
        Ok(query.fetch_all(&mut *conn).await?)
    }

    /// Page of rows plus the total number of matching rows, ignoring
    /// pagination. Both statements run on the same connection.
    pub async fn all_with_count<'c, A>(self, conn: A) -> Result<(Vec<T>, i64), QueryError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let compiled = self.compile(Intent::fetch_all(true, false))?;
        let count = compiled
            .count
            .ok_or_else(|| QueryError::configuration("counted fetch compiled without a count"))?;
        let mut conn = conn.acquire().await?;

        let rows = fetch_typed(&mut *conn, compiled.statement).await?;
        let total = fetch_count(&mut *conn, count).await?;
        Ok((rows, total))
    }

    /// Number of distinct matching entities
    pub async fn count<'c, A>(self, conn: A) -> Result<i64, QueryError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let compiled = self.compile(Intent::Count)?;
        let mut conn = conn.acquire().await?;
        fetch_count(&mut *conn, compiled.statement).await
    }
}

pub(crate) async fn fetch_typed<T: Entity>(
    conn: &mut sqlx::PgConnection,
    statement: Statement,
) -> Result<Vec<T>, QueryError> {
    let Statement { sql, params, .. } = statement;
    let mut query = sqlx::query_as::<Postgres, T>(&sql);
    for value in params {
        query = bind_sql_value!(query, value);
    }
    Ok(query.fetch_all(&mut *conn).await?)
}

async fn fetch_count(conn: &mut sqlx::PgConnection, statement: Statement) -> Result<i64, QueryError> {
    let Statement { sql, params, .. } = statement;
    let mut query = sqlx::query_scalar::<Postgres, i64>(&sql);
    for value in params {
        query = bind_sql_value!(query, value);
    }
    Ok(query.fetch_one(&mut *conn).await?)
}
