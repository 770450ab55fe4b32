//! The execution engine: pool + dialect + schema in one handle.

use std::sync::Arc;

use deadpool_postgres::Pool;

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::qb::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};
use crate::row::{KeyCase, row_to_json};
use crate::schema::Schema;
use crate::transaction::TransactionBuilder;

/// Database handle: the starting point for building and running queries.
///
/// Cheap to clone; the pool and schema are shared.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
    dialect: &'static dyn Dialect,
    schema: Arc<Schema>,
    key_case: KeyCase,
}

impl Database {
    /// Create a handle over an existing pool.
    pub fn new(pool: Pool, dialect: &'static dyn Dialect, schema: Schema) -> Self {
        Self {
            pool,
            dialect,
            schema: Arc::new(schema),
            key_case: KeyCase::Preserve,
        }
    }

    /// Emit `lowerCamelCase` keys from dynamic JSON row mapping.
    pub fn with_camel_case(mut self) -> Self {
        self.key_case = KeyCase::Camel;
        self
    }

    /// The key style used by [`row_to_json`](crate::row::row_to_json) callers.
    pub fn key_case(&self) -> KeyCase {
        self.key_case
    }

    /// The active dialect.
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    /// The schema descriptor.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Start a SELECT over `table`.
    pub fn select_from(&self, table: &str) -> QueryResult<SelectBuilder> {
        SelectBuilder::new(self.schema.clone(), self.dialect, table)
    }

    /// Start an INSERT into `table`.
    pub fn insert_into(&self, table: &str) -> QueryResult<InsertBuilder> {
        InsertBuilder::new(self.schema.clone(), self.dialect, table)
    }

    /// Start an UPDATE of `table`.
    pub fn update_table(&self, table: &str) -> QueryResult<UpdateBuilder> {
        UpdateBuilder::new(self.schema.clone(), self.dialect, table)
    }

    /// Start a DELETE from `table`.
    pub fn delete_from(&self, table: &str) -> QueryResult<DeleteBuilder> {
        DeleteBuilder::new(self.schema.clone(), self.dialect, table)
    }

    /// Execute a SELECT and map every row into a JSON object, applying the
    /// configured key style. The key style never affects the generated SQL.
    pub async fn execute_json(
        &self,
        query: &SelectBuilder,
    ) -> QueryResult<Vec<serde_json::Map<String, serde_json::Value>>> {
        let client = self.client().await?;
        let rows = query.execute_rows(&client).await?;
        rows.iter().map(|row| row_to_json(row, self.key_case)).collect()
    }

    /// Check a client out of the pool.
    pub async fn client(&self) -> QueryResult<deadpool_postgres::Client> {
        Ok(self.pool.get().await?)
    }

    /// Start building a transaction.
    pub fn transaction(&self) -> TransactionBuilder<'_> {
        TransactionBuilder::new(&self.pool)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect.name())
            .field("key_case", &self.key_case)
            .finish_non_exhaustive()
    }
}
