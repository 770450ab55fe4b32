//! Client abstraction over tokio-postgres connection-like types.
//!
//! [`GenericClient`] lets the builders execute against a plain client, a
//! transaction, or a pooled client interchangeably. Driver errors are mapped
//! through [`QueryError::from_db_error`] so constraint violations surface as
//! typed variants.

use tokio_postgres::types::ToSql;
use tokio_postgres::{CancelToken, Row};

use crate::error::{QueryError, QueryResult};

/// Unified interface over client-like types.
///
/// Methods return `impl Future + Send` so generic callers can spawn the
/// resulting futures across tasks.
pub trait GenericClient: Send + Sync {
    /// Run a query and collect all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = QueryResult<Vec<Row>>> + Send;

    /// Run a query expecting exactly one row.
    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = QueryResult<Row>> + Send;

    /// Run a query expecting at most one row.
    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = QueryResult<Option<Row>>> + Send;

    /// Run a statement and return the affected-row count.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = QueryResult<u64>> + Send;

    /// Token for cancelling the in-flight query, when the backend offers one.
    fn cancel_token(&self) -> Option<CancelToken> {
        None
    }
}

macro_rules! delegate_client {
    ($ty:ty) => {
        impl GenericClient for $ty {
            async fn query(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> QueryResult<Vec<Row>> {
                <$ty>::query(self, sql, params)
                    .await
                    .map_err(QueryError::from_db_error)
            }

            async fn query_one(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> QueryResult<Row> {
                match <$ty>::query_opt(self, sql, params)
                    .await
                    .map_err(QueryError::from_db_error)?
                {
                    Some(row) => Ok(row),
                    None => Err(QueryError::no_result(sql.to_string())),
                }
            }

            async fn query_opt(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> QueryResult<Option<Row>> {
                <$ty>::query_opt(self, sql, params)
                    .await
                    .map_err(QueryError::from_db_error)
            }

            async fn execute(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> QueryResult<u64> {
                <$ty>::execute(self, sql, params)
                    .await
                    .map_err(QueryError::from_db_error)
            }

            fn cancel_token(&self) -> Option<CancelToken> {
                Some(<$ty>::cancel_token(self))
            }
        }
    };
}

delegate_client!(tokio_postgres::Client);
delegate_client!(tokio_postgres::Transaction<'_>);

// Deadpool wrappers delegate through their deref targets, ending at the
// tokio_postgres impls above.
macro_rules! delegate_deref {
    ($ty:ty) => {
        #[cfg(feature = "pool")]
        impl GenericClient for $ty {
            async fn query(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> QueryResult<Vec<Row>> {
                GenericClient::query(&**self, sql, params).await
            }

            async fn query_one(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> QueryResult<Row> {
                GenericClient::query_one(&**self, sql, params).await
            }

            async fn query_opt(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> QueryResult<Option<Row>> {
                GenericClient::query_opt(&**self, sql, params).await
            }

            async fn execute(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> QueryResult<u64> {
                GenericClient::execute(&**self, sql, params).await
            }

            fn cancel_token(&self) -> Option<CancelToken> {
                GenericClient::cancel_token(&**self)
            }
        }
    };
}

delegate_deref!(deadpool_postgres::Client);
delegate_deref!(deadpool_postgres::ClientWrapper);
delegate_deref!(deadpool_postgres::Transaction<'_>);

impl<C: GenericClient> GenericClient for &C {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QueryResult<Vec<Row>> {
        (**self).query(sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QueryResult<Row> {
        (**self).query_one(sql, params).await
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> QueryResult<Option<Row>> {
        (**self).query_opt(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QueryResult<u64> {
        (**self).execute(sql, params).await
    }

    fn cancel_token(&self) -> Option<CancelToken> {
        (**self).cancel_token()
    }
}
