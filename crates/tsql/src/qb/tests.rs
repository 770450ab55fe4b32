use std::sync::Arc;

use crate::dialect::{MySql, Postgres, SqlServer};
use crate::error::QueryError;
use crate::expr::Expr;
use crate::qb::{DeleteBuilder, InsertBuilder, Order, SelectBuilder, UpdateBuilder};
use crate::schema::{ColumnType, Schema, TableDef};
use crate::sql::sql;
use crate::value::Value;

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::new()
            .table(
                TableDef::new("users")
                    .generated("id", ColumnType::Int8)
                    .column("username", ColumnType::Text)
                    .column("status", ColumnType::Text)
                    .nullable("created_at", ColumnType::TimestampTz),
            )
            .table(
                TableDef::new("posts")
                    .generated("id", ColumnType::Int8)
                    .column("user_id", ColumnType::Int8)
                    .column("title", ColumnType::Text)
                    .column("published", ColumnType::Bool),
            ),
    )
}

// ==================== SELECT ====================

#[test]
fn select_full_clause_order() {
    let stmt = SelectBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .select(&["id", "username"])
        .unwrap()
        .where_eq("status", "active")
        .unwrap()
        .order_by("created_at", Order::Desc)
        .unwrap()
        .limit(20)
        .offset(40)
        .compile()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT \"id\", \"username\" FROM \"users\" WHERE \"status\" = $1 \
         ORDER BY \"created_at\" DESC LIMIT 20 OFFSET 40"
    );
    assert_eq!(stmt.params, vec![Value::Text("active".into())]);
}

#[test]
fn select_defaults_to_star() {
    let sql_text = SelectBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .to_sql()
        .unwrap();
    assert_eq!(sql_text, "SELECT * FROM \"users\"");
}

#[test]
fn select_join_qualifies_and_quotes() {
    let sql_text = SelectBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .inner_join("posts", "users.id", "posts.user_id")
        .unwrap()
        .select(&["users.username", "posts.title"])
        .unwrap()
        .to_sql()
        .unwrap();
    assert_eq!(
        sql_text,
        "SELECT \"users\".\"username\", \"posts\".\"title\" FROM \"users\" \
         INNER JOIN \"posts\" ON \"users\".\"id\" = \"posts\".\"user_id\""
    );
}

#[test]
fn select_group_by_and_having() {
    let stmt = SelectBuilder::new(schema(), &Postgres, "posts")
        .unwrap()
        .select(&["user_id"])
        .unwrap()
        .select_expr(Expr::func("count", vec![Expr::col("*")]), "n")
        .unwrap()
        .group_by(&["user_id"])
        .unwrap()
        .having(Expr::binary(
            Expr::func("count", vec![Expr::col("*")]),
            ">",
            Expr::lit(5i64),
        ))
        .unwrap()
        .compile()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT \"user_id\", count(*) AS \"n\" FROM \"posts\" \
         GROUP BY \"user_id\" HAVING count(*) > $1"
    );
    assert_eq!(stmt.params, vec![Value::Int8(5)]);
}

#[test]
fn select_subquery_shares_parameter_numbering() {
    let sub = SelectBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .select(&["id"])
        .unwrap()
        .where_eq("status", "active")
        .unwrap();
    let stmt = SelectBuilder::new(schema(), &Postgres, "posts")
        .unwrap()
        .where_(Expr::in_subquery("user_id", sub))
        .unwrap()
        .where_eq("published", true)
        .unwrap()
        .compile()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT * FROM \"posts\" WHERE \"user_id\" IN \
         (SELECT \"id\" FROM \"users\" WHERE \"status\" = $1) AND \"published\" = $2"
    );
    assert_eq!(
        stmt.params,
        vec![Value::Text("active".into()), Value::Bool(true)]
    );
}

#[test]
fn select_cte_is_joinable_and_opaque() {
    let recent = SelectBuilder::new(schema(), &Postgres, "posts")
        .unwrap()
        .select(&["user_id"])
        .unwrap()
        .where_eq("published", true)
        .unwrap();
    let stmt = SelectBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .with("recent", recent)
        .inner_join("recent", "users.id", "recent.user_id")
        .unwrap()
        .compile()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "WITH \"recent\" AS (SELECT \"user_id\" FROM \"posts\" WHERE \"published\" = $1) \
         SELECT * FROM \"users\" INNER JOIN \"recent\" ON \"users\".\"id\" = \"recent\".\"user_id\""
    );
    assert_eq!(stmt.params, vec![Value::Bool(true)]);
}

#[test]
fn select_fragment_binds_stay_parameterized() {
    let stmt = SelectBuilder::new(schema(), &Postgres, "posts")
        .unwrap()
        .where_fragment(sql("length(title) > ").bind(80i32))
        .compile()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT * FROM \"posts\" WHERE (length(title) > $1)"
    );
    assert!(!stmt.sql.contains("80"));
    assert_eq!(stmt.params, vec![Value::Int4(80)]);
}

#[test]
fn select_rejects_unknown_references_at_the_call() {
    let err = SelectBuilder::new(schema(), &Postgres, "missing").unwrap_err();
    assert!(matches!(err, QueryError::UnknownTable(t) if t == "missing"));

    let err = SelectBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .select(&["nope"])
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownColumn { column, .. } if column == "nope"));

    // Qualified reference to a table not in scope.
    let err = SelectBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .where_(Expr::eq("posts.title", "x"))
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownTable(t) if t == "posts"));
}

#[test]
fn compile_is_deterministic() {
    let qb = SelectBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .where_(Expr::and(vec![
            Expr::eq("status", "active"),
            Expr::or(vec![Expr::is_null("created_at"), Expr::gt("id", 100i64)]),
        ]))
        .unwrap();
    assert_eq!(qb.compile().unwrap(), qb.compile().unwrap());
}

#[test]
fn builders_are_reusable_values() {
    let base = SelectBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .where_eq("status", "active")
        .unwrap();
    let narrowed = base.clone().where_eq("username", "alice").unwrap();
    assert_ne!(base, narrowed);
    // The original plan is untouched by extending the clone.
    assert_eq!(
        base.to_sql().unwrap(),
        "SELECT * FROM \"users\" WHERE \"status\" = $1"
    );
    assert_eq!(
        narrowed.to_sql().unwrap(),
        "SELECT * FROM \"users\" WHERE \"status\" = $1 AND \"username\" = $2"
    );
}

// ==================== Dialect rendering ====================

#[test]
fn mysql_renders_backticks_and_question_marks() {
    let stmt = SelectBuilder::new(schema(), &MySql, "users")
        .unwrap()
        .select(&["id"])
        .unwrap()
        .where_eq("status", "active")
        .unwrap()
        .limit(3)
        .compile()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT `id` FROM `users` WHERE `status` = ? LIMIT 3"
    );
}

#[test]
fn sqlserver_renders_paging_and_named_placeholders() {
    let stmt = SelectBuilder::new(schema(), &SqlServer, "users")
        .unwrap()
        .where_eq("status", "active")
        .unwrap()
        .order_by("id", Order::Asc)
        .unwrap()
        .limit(5)
        .compile()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT * FROM [users] WHERE [status] = @P1 ORDER BY [id] ASC \
         OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
    );
}

// ==================== INSERT ====================

#[test]
fn insert_with_returning() {
    let stmt = InsertBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .value("username", "alice")
        .unwrap()
        .value("status", "active")
        .unwrap()
        .returning(&["id"])
        .unwrap()
        .compile()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "INSERT INTO \"users\" (\"username\", \"status\") VALUES ($1, $2) RETURNING \"id\""
    );
    assert_eq!(
        stmt.params,
        vec![Value::Text("alice".into()), Value::Text("active".into())]
    );
}

#[test]
fn insert_without_values_uses_defaults() {
    let stmt = InsertBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .compile()
        .unwrap();
    assert_eq!(stmt.sql, "INSERT INTO \"users\" DEFAULT VALUES");
    assert!(stmt.params.is_empty());
}

#[test]
fn insert_without_values_renders_per_dialect() {
    let stmt = InsertBuilder::new(schema(), &MySql, "users")
        .unwrap()
        .compile()
        .unwrap();
    assert_eq!(stmt.sql, "INSERT INTO `users` () VALUES ()");
    assert!(stmt.params.is_empty());
}

#[test]
fn insert_returning_needs_dialect_support() {
    let err = InsertBuilder::new(schema(), &MySql, "users")
        .unwrap()
        .value("username", "alice")
        .unwrap()
        .returning(&["id"])
        .unwrap()
        .compile()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Unsupported {
            dialect: "mysql",
            feature: "RETURNING",
        }
    ));
}

#[test]
fn insert_coerces_values_per_dialect() {
    let stmt = InsertBuilder::new(schema(), &MySql, "posts")
        .unwrap()
        .value("published", true)
        .unwrap()
        .compile()
        .unwrap();
    // MySQL BOOLEAN is TINYINT(1); the coercion stays in the parameter list.
    assert_eq!(stmt.params, vec![Value::Int2(1)]);
    assert_eq!(stmt.sql, "INSERT INTO `posts` (`published`) VALUES (?)");
}

#[test]
fn insert_rejects_unknown_column() {
    let err = InsertBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .value("nope", 1i32)
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownColumn { column, .. } if column == "nope"));
}

// ==================== UPDATE ====================

#[test]
fn update_set_then_where() {
    let stmt = UpdateBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .set("status", "banned")
        .unwrap()
        .where_eq("username", "mallory")
        .unwrap()
        .compile()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE \"users\" SET \"status\" = $1 WHERE \"username\" = $2"
    );
    assert_eq!(
        stmt.params,
        vec![Value::Text("banned".into()), Value::Text("mallory".into())]
    );
}

#[test]
fn update_without_predicate_is_refused() {
    let err = UpdateBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .set("status", "x")
        .unwrap()
        .compile()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::MissingPredicate {
            statement: "UPDATE",
            ..
        }
    ));
}

#[test]
fn update_unfiltered_requires_confirmation() {
    let stmt = UpdateBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .set("status", "archived")
        .unwrap()
        .confirm_unfiltered()
        .compile()
        .unwrap();
    assert_eq!(stmt.sql, "UPDATE \"users\" SET \"status\" = $1");
}

#[test]
fn update_without_set_is_a_compile_error() {
    let err = UpdateBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .where_eq("id", 1i64)
        .unwrap()
        .compile()
        .unwrap_err();
    assert!(matches!(err, QueryError::Compilation(_)));
}

// ==================== DELETE ====================

#[test]
fn delete_with_predicate() {
    let stmt = DeleteBuilder::new(schema(), &Postgres, "posts")
        .unwrap()
        .where_(Expr::and(vec![
            Expr::eq("user_id", 7i64),
            Expr::eq("published", false),
        ]))
        .unwrap()
        .returning(&["id"])
        .unwrap()
        .compile()
        .unwrap();
    assert_eq!(
        stmt.sql,
        "DELETE FROM \"posts\" WHERE \"user_id\" = $1 AND \"published\" = $2 RETURNING \"id\""
    );
}

#[test]
fn empty_predicate_groups_do_not_satisfy_the_guard() {
    // An And/Or of nothing renders no WHERE clause, so it must be treated
    // the same as having no predicate at all.
    let err = DeleteBuilder::new(schema(), &Postgres, "posts")
        .unwrap()
        .where_(Expr::and(vec![]))
        .unwrap()
        .compile()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::MissingPredicate {
            statement: "DELETE",
            ..
        }
    ));

    let err = UpdateBuilder::new(schema(), &Postgres, "users")
        .unwrap()
        .set("status", "x")
        .unwrap()
        .where_(Expr::or(vec![]))
        .unwrap()
        .compile()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::MissingPredicate {
            statement: "UPDATE",
            ..
        }
    ));

    // A real predicate alongside the empty group still compiles.
    let stmt = DeleteBuilder::new(schema(), &Postgres, "posts")
        .unwrap()
        .where_(Expr::and(vec![]))
        .unwrap()
        .where_eq("user_id", 7i64)
        .unwrap()
        .compile()
        .unwrap();
    assert_eq!(stmt.sql, "DELETE FROM \"posts\" WHERE \"user_id\" = $1");
}

#[test]
fn delete_without_predicate_is_refused() {
    let err = DeleteBuilder::new(schema(), &Postgres, "posts")
        .unwrap()
        .compile()
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::MissingPredicate {
            statement: "DELETE",
            ..
        }
    ));

    let stmt = DeleteBuilder::new(schema(), &Postgres, "posts")
        .unwrap()
        .confirm_unfiltered()
        .compile()
        .unwrap();
    assert_eq!(stmt.sql, "DELETE FROM \"posts\"");
}
