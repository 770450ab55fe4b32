//! Expression AST for WHERE/HAVING clauses and projections.
//!
//! Nodes are immutable once constructed and structurally comparable.
//! Constructing a node never touches a connection; rendering happens only
//! when a builder compiles, through the shared parameter accumulator so every
//! literal becomes a bound parameter.

use crate::compile::ParamAccumulator;
use crate::error::QueryResult;
use crate::qb::SelectBuilder;
use crate::sql::SqlFragment;
use crate::value::Value;

/// Expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Column reference, possibly qualified (`table.column`).
    Column(String),

    /// Literal value, always bound as a parameter.
    Literal(Value),

    /// Binary operator over two sub-expressions.
    Binary {
        lhs: Box<Expr>,
        op: &'static str,
        rhs: Box<Expr>,
    },

    /// AND group: all conditions must be true.
    And(Vec<Expr>),

    /// OR group: at least one condition must be true.
    Or(Vec<Expr>),

    /// NOT: negate the inner expression.
    Not(Box<Expr>),

    /// NULL check: column IS NULL or column IS NOT NULL.
    NullCheck { column: String, is_null: bool },

    /// IN list: column IN ($1, $2, ...) or column NOT IN (...).
    InList {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },

    /// BETWEEN: column BETWEEN $n AND $m.
    Between {
        column: String,
        from: Value,
        to: Value,
        negated: bool,
    },

    /// Function call: NAME(arg, ...).
    Func { name: String, args: Vec<Expr> },

    /// Scalar subquery, rendered parenthesized.
    Subquery(Box<SelectBuilder>),

    /// Raw SQL fragment with its own bound values (see [`crate::sql`]).
    Fragment(SqlFragment),

    /// Always true (used for empty NOT IN lists).
    True,

    /// Always false (used for empty IN lists).
    False,
}

impl Expr {
    /// Column reference.
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    /// Literal value (bound, never inlined).
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    fn compare(column: impl Into<String>, op: &'static str, value: impl Into<Value>) -> Self {
        Expr::Binary {
            lhs: Box::new(Expr::Column(column.into())),
            op,
            rhs: Box::new(Expr::Literal(value.into())),
        }
    }

    /// column = value
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "=", value)
    }

    /// column != value
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "!=", value)
    }

    /// column > value
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, ">", value)
    }

    /// column >= value
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, ">=", value)
    }

    /// column < value
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "<", value)
    }

    /// column <= value
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, "<=", value)
    }

    /// column LIKE pattern
    pub fn like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::compare(column, "LIKE", pattern)
    }

    /// Generic binary operator over two expressions.
    pub fn binary(lhs: Expr, op: &'static str, rhs: Expr) -> Self {
        Expr::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    /// AND group.
    pub fn and(exprs: Vec<Expr>) -> Self {
        Expr::And(exprs)
    }

    /// OR group.
    pub fn or(exprs: Vec<Expr>) -> Self {
        Expr::Or(exprs)
    }

    /// Negation.
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    /// column IS NULL
    pub fn is_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: true,
        }
    }

    /// column IS NOT NULL
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: false,
        }
    }

    /// column IN (values...). An empty list folds to FALSE.
    pub fn in_list<T: Into<Value>>(column: impl Into<String>, values: Vec<T>) -> Self {
        if values.is_empty() {
            return Expr::False;
        }
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// column NOT IN (values...). An empty list folds to TRUE.
    pub fn not_in<T: Into<Value>>(column: impl Into<String>, values: Vec<T>) -> Self {
        if values.is_empty() {
            return Expr::True;
        }
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// column BETWEEN from AND to
    pub fn between(
        column: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            from: from.into(),
            to: to.into(),
            negated: false,
        }
    }

    /// Function call expression.
    pub fn func(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Func {
            name: name.into(),
            args,
        }
    }

    /// column IN (subquery)
    pub fn in_subquery(column: impl Into<String>, query: SelectBuilder) -> Self {
        Expr::Binary {
            lhs: Box::new(Expr::Column(column.into())),
            op: "IN",
            rhs: Box::new(Expr::Subquery(Box::new(query))),
        }
    }

    /// EXISTS (subquery)
    pub fn exists(query: SelectBuilder) -> Self {
        Expr::Func {
            name: "EXISTS".to_string(),
            args: vec![Expr::Subquery(Box::new(query))],
        }
    }

    /// Embed a raw SQL fragment (see [`crate::sql`]).
    pub fn fragment(fragment: SqlFragment) -> Self {
        Expr::Fragment(fragment)
    }

    /// Check if this expression is empty (contains no conditions).
    pub fn is_empty(&self) -> bool {
        match self {
            Expr::And(exprs) | Expr::Or(exprs) => {
                exprs.is_empty() || exprs.iter().all(|e| e.is_empty())
            }
            Expr::Not(inner) => inner.is_empty(),
            _ => false,
        }
    }

    /// Visit every column reference in this expression tree.
    ///
    /// Subqueries are skipped: they validate their own references against
    /// their own scope at construction.
    pub(crate) fn for_each_column(&self, f: &mut dyn FnMut(&str)) {
        match self {
            Expr::Column(c) => f(c),
            Expr::Literal(_) | Expr::True | Expr::False => {}
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_column(f);
                rhs.for_each_column(f);
            }
            Expr::And(exprs) | Expr::Or(exprs) => {
                for e in exprs {
                    e.for_each_column(f);
                }
            }
            Expr::Not(inner) => inner.for_each_column(f),
            Expr::NullCheck { column, .. }
            | Expr::InList { column, .. }
            | Expr::Between { column, .. } => f(column),
            Expr::Func { args, .. } => {
                for e in args {
                    e.for_each_column(f);
                }
            }
            Expr::Subquery(_) | Expr::Fragment(_) => {}
        }
    }

    /// Render this expression, binding literals through the accumulator.
    pub(crate) fn render(&self, acc: &mut ParamAccumulator<'_>) -> QueryResult<String> {
        Ok(match self {
            Expr::Column(c) => acc.quote_path(c),
            Expr::Literal(v) => acc.bind(v.clone()),
            Expr::Binary { lhs, op, rhs } => {
                let l = Self::render_operand(lhs, acc)?;
                let r = Self::render_operand(rhs, acc)?;
                format!("{} {} {}", l, op, r)
            }
            Expr::And(exprs) => {
                let mut parts = Vec::new();
                for e in exprs.iter().filter(|e| !e.is_empty()) {
                    let sql = e.render(acc)?;
                    if sql.is_empty() {
                        continue;
                    }
                    // Wrap OR groups in parentheses.
                    if matches!(e, Expr::Or(_)) {
                        parts.push(format!("({})", sql));
                    } else {
                        parts.push(sql);
                    }
                }
                parts.join(" AND ")
            }
            Expr::Or(exprs) => {
                let mut parts = Vec::new();
                for e in exprs.iter().filter(|e| !e.is_empty()) {
                    let sql = e.render(acc)?;
                    if sql.is_empty() {
                        continue;
                    }
                    // Wrap AND groups in parentheses.
                    if matches!(e, Expr::And(_)) {
                        parts.push(format!("({})", sql));
                    } else {
                        parts.push(sql);
                    }
                }
                parts.join(" OR ")
            }
            Expr::Not(inner) => {
                let sql = inner.render(acc)?;
                if sql.is_empty() {
                    String::new()
                } else {
                    format!("NOT ({})", sql)
                }
            }
            Expr::NullCheck { column, is_null } => {
                if *is_null {
                    format!("{} IS NULL", acc.quote_path(column))
                } else {
                    format!("{} IS NOT NULL", acc.quote_path(column))
                }
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                let placeholders: Vec<String> =
                    values.iter().map(|v| acc.bind(v.clone())).collect();
                let op = if *negated { "NOT IN" } else { "IN" };
                format!(
                    "{} {} ({})",
                    acc.quote_path(column),
                    op,
                    placeholders.join(", ")
                )
            }
            Expr::Between {
                column,
                from,
                to,
                negated,
            } => {
                let p1 = acc.bind(from.clone());
                let p2 = acc.bind(to.clone());
                let op = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{} {} {} AND {}", acc.quote_path(column), op, p1, p2)
            }
            Expr::Func { name, args } => {
                let mut parts = Vec::new();
                for a in args {
                    parts.push(a.render(acc)?);
                }
                format!("{}({})", name, parts.join(", "))
            }
            Expr::Subquery(query) => format!("({})", query.render_into(acc)?),
            // Fragments carry arbitrary text; parenthesize so AND/OR
            // composition preserves their precedence.
            Expr::Fragment(fragment) => format!("({})", fragment.render(acc)),
            Expr::True => "1=1".to_string(),
            Expr::False => "1=0".to_string(),
        })
    }

    fn render_operand(expr: &Expr, acc: &mut ParamAccumulator<'_>) -> QueryResult<String> {
        let sql = expr.render(acc)?;
        Ok(match expr {
            Expr::And(_) | Expr::Or(_) | Expr::Binary { .. } => format!("({})", sql),
            _ => sql,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Postgres;

    fn render(expr: &Expr) -> (String, Vec<Value>) {
        let mut acc = ParamAccumulator::new(&Postgres);
        let sql = expr.render(&mut acc).unwrap();
        let stmt = acc.finish(sql.clone());
        (sql, stmt.params)
    }

    #[test]
    fn simple_eq() {
        let (sql, params) = render(&Expr::eq("name", "alice"));
        assert_eq!(sql, "\"name\" = $1");
        assert_eq!(params, vec![Value::Text("alice".into())]);
    }

    #[test]
    fn nested_and_or() {
        let expr = Expr::and(vec![
            Expr::eq("status", "active"),
            Expr::or(vec![Expr::eq("role", "admin"), Expr::eq("role", "root")]),
        ]);
        let (sql, params) = render(&expr);
        assert_eq!(
            sql,
            "\"status\" = $1 AND (\"role\" = $2 OR \"role\" = $3)"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn in_list_and_empty_folds() {
        let (sql, params) = render(&Expr::in_list("id", vec![1i64, 2, 3]));
        assert_eq!(sql, "\"id\" IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);

        let (sql, params) = render(&Expr::in_list::<i64>("id", vec![]));
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());

        let (sql, _) = render(&Expr::not_in::<i64>("id", vec![]));
        assert_eq!(sql, "1=1");
    }

    #[test]
    fn between_binds_both_ends() {
        let (sql, params) = render(&Expr::between("age", 18i32, 65i32));
        assert_eq!(sql, "\"age\" BETWEEN $1 AND $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn not_wraps_inner() {
        let (sql, _) = render(&Expr::not(Expr::eq("banned", true)));
        assert_eq!(sql, "NOT (\"banned\" = $1)");
    }

    #[test]
    fn func_renders_args() {
        let (sql, _) = render(&Expr::func("lower", vec![Expr::col("username")]));
        assert_eq!(sql, "lower(\"username\")");
    }

    #[test]
    fn qualified_columns_quote_each_segment() {
        let (sql, _) = render(&Expr::is_null("users.deleted_at"));
        assert_eq!(sql, "\"users\".\"deleted_at\" IS NULL");
    }

    #[test]
    fn fragment_is_parenthesized() {
        let expr = Expr::and(vec![
            Expr::eq("a", 1i32),
            Expr::fragment(crate::sql::sql("b = ").bind(2i32).raw(" OR c = ").bind(3i32)),
        ]);
        let (sql, params) = render(&expr);
        assert_eq!(sql, "\"a\" = $1 AND (b = $2 OR c = $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn column_visitor_reaches_nested_refs() {
        let expr = Expr::and(vec![
            Expr::eq("a", 1i32),
            Expr::func("lower", vec![Expr::col("b")]),
            Expr::between("c", 1i32, 2i32),
        ]);
        let mut seen = Vec::new();
        expr.for_each_column(&mut |c| seen.push(c.to_string()));
        assert_eq!(seen, vec!["a", "b", "c"]);
    }
}
