//! SELECT query builder.

use std::sync::Arc;

use tokio_postgres::Row;

use crate::client::GenericClient;
use crate::compile::{CompiledStatement, ParamAccumulator};
use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::expr::Expr;
use crate::qb::{JoinKind, Order, check_expr};
use crate::row::FromRow;
use crate::schema::Schema;
use crate::sql::SqlFragment;

/// A projected item in the SELECT list.
#[derive(Clone, Debug, PartialEq)]
enum SelectItem {
    /// Plain (possibly qualified) column reference.
    Column(String),
    /// Arbitrary expression with an alias.
    Expr { expr: Expr, alias: String },
}

#[derive(Clone, Debug, PartialEq)]
struct Join {
    kind: JoinKind,
    table: String,
    on_left: String,
    on_right: String,
}

#[derive(Clone, Debug, PartialEq)]
struct CommonTable {
    name: String,
    query: SelectBuilder,
}

/// SELECT query builder.
///
/// Created via [`Database::select_from`](crate::Database::select_from) or
/// [`SelectBuilder::new`]. Compilation follows the canonical clause order:
/// WITH, SELECT, FROM, JOIN, WHERE, GROUP BY, HAVING, ORDER BY, LIMIT/OFFSET.
#[derive(Clone, Debug)]
pub struct SelectBuilder {
    schema: Arc<Schema>,
    dialect: &'static dyn Dialect,
    ctes: Vec<CommonTable>,
    table: String,
    /// Tables visible to column references: FROM + JOINs + CTE names.
    scope: Vec<String>,
    cte_names: Vec<String>,
    projection: Vec<SelectItem>,
    joins: Vec<Join>,
    where_exprs: Vec<Expr>,
    group_by: Vec<String>,
    having: Vec<Expr>,
    order_by: Vec<(String, Order)>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PartialEq for SelectBuilder {
    fn eq(&self, other: &Self) -> bool {
        // Dialects are stateless singletons; compare by name.
        self.dialect.name() == other.dialect.name()
            && *self.schema == *other.schema
            && self.ctes == other.ctes
            && self.table == other.table
            && self.projection == other.projection
            && self.joins == other.joins
            && self.where_exprs == other.where_exprs
            && self.group_by == other.group_by
            && self.having == other.having
            && self.order_by == other.order_by
            && self.limit == other.limit
            && self.offset == other.offset
    }
}

impl SelectBuilder {
    /// Start a SELECT over `table`, validating it against the schema.
    pub fn new(
        schema: Arc<Schema>,
        dialect: &'static dyn Dialect,
        table: &str,
    ) -> QueryResult<Self> {
        schema.require_table(table)?;
        Ok(Self {
            schema,
            dialect,
            ctes: Vec::new(),
            table: table.to_string(),
            scope: vec![table.to_string()],
            cte_names: Vec::new(),
            projection: Vec::new(),
            joins: Vec::new(),
            where_exprs: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        })
    }

    // ==================== Projection ====================

    /// Set the SELECT columns. Replaces any previous projection.
    pub fn select(mut self, columns: &[&str]) -> QueryResult<Self> {
        let mut items = Vec::with_capacity(columns.len());
        for col in columns {
            self.schema
                .check_column(&self.scope, &self.cte_names, col)?;
            items.push(SelectItem::Column((*col).to_string()));
        }
        self.projection = items;
        Ok(self)
    }

    /// Append one aliased expression to the SELECT list.
    pub fn select_expr(mut self, expr: Expr, alias: &str) -> QueryResult<Self> {
        check_expr(&self.schema, &self.scope, &self.cte_names, &expr)?;
        self.projection.push(SelectItem::Expr {
            expr,
            alias: alias.to_string(),
        });
        Ok(self)
    }

    // ==================== CTE ====================

    /// Attach a common table expression. The name becomes joinable.
    pub fn with(mut self, name: &str, query: SelectBuilder) -> Self {
        self.cte_names.push(name.to_string());
        self.ctes.push(CommonTable {
            name: name.to_string(),
            query,
        });
        self
    }

    // ==================== JOIN ====================

    fn join(
        mut self,
        kind: JoinKind,
        table: &str,
        on_left: &str,
        on_right: &str,
    ) -> QueryResult<Self> {
        if !self.cte_names.iter().any(|c| c == table) {
            self.schema.require_table(table)?;
        }
        self.scope.push(table.to_string());
        self.schema
            .check_column(&self.scope, &self.cte_names, on_left)?;
        self.schema
            .check_column(&self.scope, &self.cte_names, on_right)?;
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            on_left: on_left.to_string(),
            on_right: on_right.to_string(),
        });
        Ok(self)
    }

    /// INNER JOIN `table` ON `on_left` = `on_right`.
    pub fn inner_join(self, table: &str, on_left: &str, on_right: &str) -> QueryResult<Self> {
        self.join(JoinKind::Inner, table, on_left, on_right)
    }

    /// LEFT JOIN `table` ON `on_left` = `on_right`.
    pub fn left_join(self, table: &str, on_left: &str, on_right: &str) -> QueryResult<Self> {
        self.join(JoinKind::Left, table, on_left, on_right)
    }

    /// RIGHT JOIN `table` ON `on_left` = `on_right`.
    pub fn right_join(self, table: &str, on_left: &str, on_right: &str) -> QueryResult<Self> {
        self.join(JoinKind::Right, table, on_left, on_right)
    }

    /// FULL OUTER JOIN `table` ON `on_left` = `on_right`.
    pub fn full_join(self, table: &str, on_left: &str, on_right: &str) -> QueryResult<Self> {
        self.join(JoinKind::Full, table, on_left, on_right)
    }

    // ==================== WHERE ====================

    /// Add a WHERE condition (ANDed with any previous conditions).
    pub fn where_(mut self, expr: Expr) -> QueryResult<Self> {
        check_expr(&self.schema, &self.scope, &self.cte_names, &expr)?;
        self.where_exprs.push(expr);
        Ok(self)
    }

    /// Shorthand for `where_(Expr::eq(column, value))`.
    pub fn where_eq(
        self,
        column: &str,
        value: impl Into<crate::value::Value>,
    ) -> QueryResult<Self> {
        self.where_(Expr::eq(column, value))
    }

    /// Add a raw-fragment WHERE condition. Column references inside the
    /// fragment text are not schema-validated.
    pub fn where_fragment(mut self, fragment: SqlFragment) -> Self {
        self.where_exprs.push(Expr::fragment(fragment));
        self
    }

    // ==================== Grouping & ordering ====================

    /// Set GROUP BY columns.
    pub fn group_by(mut self, columns: &[&str]) -> QueryResult<Self> {
        for col in columns {
            self.schema
                .check_column(&self.scope, &self.cte_names, col)?;
        }
        self.group_by = columns.iter().map(|s| s.to_string()).collect();
        Ok(self)
    }

    /// Add a HAVING condition (ANDed).
    pub fn having(mut self, expr: Expr) -> QueryResult<Self> {
        check_expr(&self.schema, &self.scope, &self.cte_names, &expr)?;
        self.having.push(expr);
        Ok(self)
    }

    /// Add an ORDER BY clause.
    pub fn order_by(mut self, column: &str, order: Order) -> QueryResult<Self> {
        self.schema
            .check_column(&self.scope, &self.cte_names, column)?;
        self.order_by.push((column.to_string(), order));
        Ok(self)
    }

    /// Set LIMIT.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    // ==================== Compilation ====================

    /// Render this query into an existing accumulator (shared with the outer
    /// statement for subqueries and CTEs).
    pub(crate) fn render_into(&self, acc: &mut ParamAccumulator<'_>) -> QueryResult<String> {
        let mut sql = String::new();

        if !self.ctes.is_empty() {
            sql.push_str("WITH ");
            let mut parts = Vec::with_capacity(self.ctes.len());
            for cte in &self.ctes {
                let inner = cte.query.render_into(acc)?;
                parts.push(format!("{} AS ({})", acc.quote_path(&cte.name), inner));
            }
            sql.push_str(&parts.join(", "));
            sql.push(' ');
        }

        sql.push_str("SELECT ");
        if self.projection.is_empty() {
            sql.push('*');
        } else {
            let mut parts = Vec::with_capacity(self.projection.len());
            for item in &self.projection {
                match item {
                    SelectItem::Column(col) => parts.push(acc.quote_path(col)),
                    SelectItem::Expr { expr, alias } => {
                        let rendered = expr.render(acc)?;
                        parts.push(format!("{} AS {}", rendered, acc.quote_path(alias)));
                    }
                }
            }
            sql.push_str(&parts.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&acc.quote_path(&self.table));

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.kind.as_sql());
            sql.push(' ');
            sql.push_str(&acc.quote_path(&join.table));
            sql.push_str(" ON ");
            sql.push_str(&acc.quote_path(&join.on_left));
            sql.push_str(" = ");
            sql.push_str(&acc.quote_path(&join.on_right));
        }

        let where_root = Expr::And(self.where_exprs.clone());
        if !where_root.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_root.render(acc)?);
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            let cols: Vec<String> = self.group_by.iter().map(|c| acc.quote_path(c)).collect();
            sql.push_str(&cols.join(", "));
        }

        let having_root = Expr::And(self.having.clone());
        if !having_root.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&having_root.render(acc)?);
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let parts: Vec<String> = self
                .order_by
                .iter()
                .map(|(col, ord)| format!("{} {}", acc.quote_path(col), ord.as_sql()))
                .collect();
            sql.push_str(&parts.join(", "));
        }

        sql.push_str(&acc.dialect().limit_clause(self.limit, self.offset));

        Ok(sql)
    }

    /// Compile into a parameterized statement for the active dialect.
    pub fn compile(&self) -> QueryResult<CompiledStatement> {
        let mut acc = ParamAccumulator::new(self.dialect);
        let sql = self.render_into(&mut acc)?;
        Ok(acc.finish(sql))
    }

    /// Rendered SQL (for inspection and tests).
    pub fn to_sql(&self) -> QueryResult<String> {
        Ok(self.compile()?.sql)
    }

    // ==================== Execution ====================

    /// Execute and return all raw rows.
    pub async fn execute_rows(&self, conn: &impl GenericClient) -> QueryResult<Vec<Row>> {
        let stmt = self.compile()?;
        conn.query(&stmt.sql, &stmt.param_refs()).await
    }

    /// Execute and map every row into `T`.
    pub async fn execute<T: FromRow>(&self, conn: &impl GenericClient) -> QueryResult<Vec<T>> {
        let rows = self.execute_rows(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute and map the first row, if any. Extra rows are discarded.
    pub async fn execute_take_first<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> QueryResult<Option<T>> {
        let rows = self.execute_rows(conn).await?;
        rows.first().map(T::from_row).transpose()
    }

    /// Execute and map the first row, failing with
    /// [`QueryError::NoResult`] on an empty result set.
    pub async fn execute_take_first_or_throw<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> QueryResult<T> {
        self.execute_take_first(conn)
            .await?
            .ok_or_else(|| QueryError::no_result(format!("SELECT from '{}'", self.table)))
    }
}
