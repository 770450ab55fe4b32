//! Fluent query builders.
//!
//! Builders are immutable values: every method consumes the builder and
//! returns a new one, so a partially built query can be `clone()`d and reused
//! safely across tasks. Methods that introduce a table or column reference
//! validate it against the schema descriptor *at that call* and return a
//! `Result`; purely structural methods (`limit`, `offset`,
//! `confirm_unfiltered`) stay infallible.
//!
//! # Usage
//!
//! ```ignore
//! use tsql::{Expr, Order};
//!
//! // SELECT
//! let users: Vec<User> = db
//!     .select_from("users")?
//!     .select(&["id", "username"])?
//!     .where_eq("status", "active")?
//!     .order_by("created_at", Order::Desc)?
//!     .limit(20)
//!     .execute(&client)
//!     .await?;
//!
//! // INSERT ... RETURNING
//! let id: Single<i64> = db
//!     .insert_into("users")?
//!     .value("username", "alice")?
//!     .returning(&["id"])?
//!     .execute_take_first_or_throw(&client)
//!     .await?;
//!
//! // DELETE requires a predicate (or an explicit confirm_unfiltered()).
//! db.delete_from("users")?
//!     .where_(Expr::eq("id", 1i64))?
//!     .execute(&client)
//!     .await?;
//! ```

mod delete;
mod insert;
mod select;
mod update;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

use crate::error::QueryResult;
use crate::expr::Expr;
use crate::schema::Schema;

/// Sort direction for ORDER BY.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// Join flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
        }
    }
}

/// Validate every column reference inside an expression against the scope.
///
/// Returns the first failing reference, so the error points at the call that
/// introduced it.
pub(crate) fn check_expr(
    schema: &Schema,
    scope: &[String],
    cte_names: &[String],
    expr: &Expr,
) -> QueryResult<()> {
    let mut first_err = None;
    expr.for_each_column(&mut |column| {
        if first_err.is_none() {
            if let Err(e) = schema.check_column(scope, cte_names, column) {
                first_err = Some(e);
            }
        }
    });
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests;
