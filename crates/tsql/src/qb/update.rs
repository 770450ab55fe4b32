//! UPDATE query builder.

use std::sync::Arc;

use crate::client::GenericClient;
use crate::compile::{CompiledStatement, ParamAccumulator};
use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::expr::Expr;
use crate::qb::check_expr;
use crate::row::FromRow;
use crate::schema::Schema;
use crate::sql::SqlFragment;
use crate::value::Value;

/// UPDATE query builder.
///
/// Compiling without any WHERE condition fails with
/// [`QueryError::MissingPredicate`] unless
/// [`confirm_unfiltered`](Self::confirm_unfiltered) was called, so a
/// table-wide rewrite is always a deliberate act.
#[derive(Clone, Debug)]
pub struct UpdateBuilder {
    schema: Arc<Schema>,
    dialect: &'static dyn Dialect,
    table: String,
    sets: Vec<(String, Value)>,
    where_exprs: Vec<Expr>,
    returning: Vec<String>,
    unfiltered_confirmed: bool,
}

impl UpdateBuilder {
    /// Start an UPDATE of `table`, validating it against the schema.
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
            sets: Vec::new(),
            where_exprs: Vec::new(),
            returning: Vec::new(),
            unfiltered_confirmed: false,
        })
    }

    /// SET one column to a value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> QueryResult<Self> {
        let def = self.schema.require_table(&self.table)?;
        if !def.has_column(column) {
            return Err(QueryError::unknown_column(
                column,
                std::slice::from_ref(&self.table),
            ));
        }
        self.sets.push((column.to_string(), value.into()));
        Ok(self)
    }

    /// Add a WHERE condition (ANDed with any previous conditions).
    pub fn where_(mut self, expr: Expr) -> QueryResult<Self> {
        let scope = [self.table.clone()];
        check_expr(&self.schema, &scope, &[], &expr)?;
        self.where_exprs.push(expr);
        Ok(self)
    }

    /// Shorthand for `where_(Expr::eq(column, value))`.
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> QueryResult<Self> {
        self.where_(Expr::eq(column, value))
    }

    /// Add a raw-fragment WHERE condition.
    pub fn where_fragment(mut self, fragment: SqlFragment) -> Self {
        self.where_exprs.push(Expr::fragment(fragment));
        self
    }

    /// Explicitly allow this UPDATE to run without a WHERE clause.
    pub fn confirm_unfiltered(mut self) -> Self {
        self.unfiltered_confirmed = true;
        self
    }

    /// Request a RETURNING clause over the given columns.
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
        if self.sets.is_empty() {
            return Err(QueryError::Compilation(format!(
                "UPDATE of '{}' has no SET assignments",
                self.table
            )));
        }
        // Structurally empty groups (And/Or of nothing) render no WHERE
        // clause, so they must not satisfy the guard.
        let has_predicate = self.where_exprs.iter().any(|e| !e.is_empty());
        if !has_predicate && !self.unfiltered_confirmed {
            return Err(QueryError::MissingPredicate {
                statement: "UPDATE",
                table: self.table.clone(),
            });
        }
        if !self.returning.is_empty() && !self.dialect.supports_returning() {
            return Err(QueryError::Unsupported {
                dialect: self.dialect.name(),
                feature: "RETURNING",
            });
        }

        let table_def = self.schema.require_table(&self.table)?;
        let mut acc = ParamAccumulator::new(self.dialect);
        let mut sql = format!("UPDATE {} SET ", acc.quote_path(&self.table));

        let mut assignments = Vec::with_capacity(self.sets.len());
        for (column, value) in &self.sets {
            let coerced = match table_def.column_def(column) {
                Some(def) => self.dialect.coerce(value.clone(), &def.ty),
                None => value.clone(),
            };
            let placeholder = acc.bind(coerced);
            assignments.push(format!("{} = {}", acc.quote_path(column), placeholder));
        }
        sql.push_str(&assignments.join(", "));

        let where_root = Expr::And(self.where_exprs.clone());
        if !where_root.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_root.render(&mut acc)?);
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

    /// Execute and return the number of updated rows.
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
        let rows = conn.query(&stmt.sql, &stmt.param_refs()).await?;
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
            .ok_or_else(|| QueryError::no_result(format!("UPDATE of '{}'", self.table)))
    }
}
