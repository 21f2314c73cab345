//! The engine seam: anything that can run parameterized SQL.

use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// A parameterized-query-capable database handle.
///
/// Implemented for `tokio_postgres::Client` (and `deadpool_postgres` clients with
/// the `pool` feature). Implementations decode engine rows into [`Row`] and map
/// driver failures through [`OrmError::from_db_error`].
pub trait Executor: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// Execute parameterless statements (`BEGIN`, `COMMIT`, `ROLLBACK`).
    fn batch_execute(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<()>> + Send;

    /// Whether the driver reports the underlying connection as closed.
    fn is_closed(&self) -> bool {
        false
    }
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl Executor for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        let refs = param_refs(params);
        let rows = tokio_postgres::Client::query(self, sql, &refs)
            .await
            .map_err(OrmError::from_db_error)?;
        rows.iter().map(Row::from_pg).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        let refs = param_refs(params);
        tokio_postgres::Client::execute(self, sql, &refs)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        tokio_postgres::Client::batch_execute(self, sql)
            .await
            .map_err(OrmError::from_db_error)
    }

    fn is_closed(&self) -> bool {
        tokio_postgres::Client::is_closed(self)
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::ClientWrapper {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        // Delegate to the deref target (tokio_postgres::Client).
        Executor::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        Executor::execute(&**self, sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        Executor::batch_execute(&**self, sql).await
    }

    fn is_closed(&self) -> bool {
        Executor::is_closed(&**self)
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper).
        Executor::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        Executor::execute(&**self, sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        Executor::batch_execute(&**self, sql).await
    }

    fn is_closed(&self) -> bool {
        Executor::is_closed(&**self)
    }
}
