//! Closure-scoped transactions.

use deadpool_postgres::Pool;

use crate::error::{QueryError, QueryResult};

/// Runs a closure inside a database transaction.
///
/// The transaction commits when the closure returns `Ok` and rolls back when
/// it returns `Err`; the pooled connection goes back to the pool either way.
///
/// ```ignore
/// let moved = db
///     .transaction()
///     .execute(async |tx| {
///         db.update_table("accounts")?
///             .set("balance", 0i64)?
///             .where_eq("id", from)?
///             .execute(tx)
///             .await
///     })
///     .await?;
/// ```
pub struct TransactionBuilder<'db> {
    pool: &'db Pool,
}

impl<'db> TransactionBuilder<'db> {
    pub(crate) fn new(pool: &'db Pool) -> Self {
        Self { pool }
    }

    /// Run `f` inside a transaction.
    pub async fn execute<T, F>(&self, f: F) -> QueryResult<T>
    where
        F: AsyncFnOnce(&deadpool_postgres::Transaction<'_>) -> QueryResult<T>,
    {
        let mut client = self.pool.get().await?;
        let tx = client
            .transaction()
            .await
            .map_err(QueryError::from_db_error)?;

        match f(&tx).await {
            Ok(value) => {
                tx.commit().await.map_err(QueryError::from_db_error)?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_err) = tx.rollback().await {
                    return Err(QueryError::Other(format!(
                        "{error} (rollback failed: {rollback_err})"
                    )));
                }
                Err(error)
            }
        }
    }
}
