//! INSERT query builder.

use std::sync::Arc;

use tokio_postgres::Row;

use crate::client::GenericClient;
use crate::compile::{CompiledStatement, ParamAccumulator};
use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::row::FromRow;
use crate::schema::Schema;
use crate::value::Value;

/// INSERT query builder.
///
/// Columns not supplied are left to the database (defaults, identity); an
/// INSERT with no values at all compiles to `INSERT INTO t DEFAULT VALUES`.
#[derive(Clone, Debug)]
pub struct InsertBuilder {
    schema: Arc<Schema>,
    dialect: &'static dyn Dialect,
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
    returning: Vec<String>,
}

impl InsertBuilder {
    /// Start an INSERT into `table`, validating it against the schema.
    pub fn new(
        schema: Arc<Schema>,
        dialect: &'static dyn Dialect,
        table: &str,
    ) -> QueryResult<Self> {
        schema.require_table(table)?;
        Ok(Self {
            schema,
            dialect,
            table: table.to_string(),
            columns: Vec::new(),
            values: Vec::new(),
            returning: Vec::new(),
        })
    }

    /// Set one column to a value.
    pub fn value(mut self, column: &str, value: impl Into<Value>) -> QueryResult<Self> {
        let def = self.schema.require_table(&self.table)?;
        if !def.has_column(column) {
            return Err(QueryError::unknown_column(
                column,
                std::slice::from_ref(&self.table),
            ));
        }
        self.columns.push(column.to_string());
        self.values.push(value.into());
        Ok(self)
    }

    /// Set several columns at once.
    pub fn values<K: Into<String>>(mut self, pairs: Vec<(K, Value)>) -> QueryResult<Self> {
        for (column, value) in pairs {
            self = self.value(&column.into(), value)?;
        }
        Ok(self)
    }

    /// Request a RETURNING clause over the given columns.
    ///
    /// Whether the active dialect supports RETURNING is checked at
    /// [`compile`](Self::compile) time.
    pub fn returning(mut self, columns: &[&str]) -> QueryResult<Self> {
        let def = self.schema.require_table(&self.table)?;
        for col in columns {
            if *col != "*" && !def.has_column(col) {
                return Err(QueryError::unknown_column(
                    *col,
                    std::slice::from_ref(&self.table),
                ));
            }
        }
        self.returning = columns.iter().map(|s| s.to_string()).collect();
        Ok(self)
    }

    /// Compile into a parameterized statement for the active dialect.
    pub fn compile(&self) -> QueryResult<CompiledStatement> {
        if !self.returning.is_empty() && !self.dialect.supports_returning() {
            return Err(QueryError::Unsupported {
                dialect: self.dialect.name(),
                feature: "RETURNING",
            });
        }

        let table_def = self.schema.require_table(&self.table)?;
        let mut acc = ParamAccumulator::new(self.dialect);
        let mut sql = format!("INSERT INTO {}", acc.quote_path(&self.table));

        if self.columns.is_empty() {
            sql.push(' ');
            sql.push_str(self.dialect.empty_insert_clause());
        } else {
            let cols: Vec<String> = self.columns.iter().map(|c| acc.quote_path(c)).collect();
            sql.push_str(&format!(" ({})", cols.join(", ")));

            let mut placeholders = Vec::with_capacity(self.values.len());
            for (column, value) in self.columns.iter().zip(&self.values) {
                let coerced = match table_def.column_def(column) {
                    Some(def) => self.dialect.coerce(value.clone(), &def.ty),
                    None => value.clone(),
                };
                placeholders.push(acc.bind(coerced));
            }
            sql.push_str(&format!(" VALUES ({})", placeholders.join(", ")));
        }

        if !self.returning.is_empty() {
            let cols: Vec<String> = self.returning.iter().map(|c| acc.quote_path(c)).collect();
            sql.push_str(&format!(" RETURNING {}", cols.join(", ")));
        }

        Ok(acc.finish(sql))
    }

    /// Rendered SQL (for inspection and tests).
    pub fn to_sql(&self) -> QueryResult<String> {
        Ok(self.compile()?.sql)
    }

    /// Execute and return the number of inserted rows.
    pub async fn execute(&self, conn: &impl GenericClient) -> QueryResult<u64> {
        let stmt = self.compile()?;
        conn.execute(&stmt.sql, &stmt.param_refs()).await
    }

    /// Execute and map the RETURNING rows into `T`.
    pub async fn execute_returning<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> QueryResult<Vec<T>> {
        let stmt = self.compile()?;
        let rows: Vec<Row> = conn.query(&stmt.sql, &stmt.param_refs()).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute and map the first RETURNING row, if any.
    pub async fn execute_take_first<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> QueryResult<Option<T>> {
        let stmt = self.compile()?;
        let rows = conn.query(&stmt.sql, &stmt.param_refs()).await?;
        rows.first().map(T::from_row).transpose()
    }

    /// Execute and map the first RETURNING row, failing with
    /// [`QueryError::NoResult`] on an empty result set.
    pub async fn execute_take_first_or_throw<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> QueryResult<T> {
        self.execute_take_first(conn)
            .await?
            .ok_or_else(|| QueryError::no_result(format!("INSERT into '{}'", self.table)))
    }
}
