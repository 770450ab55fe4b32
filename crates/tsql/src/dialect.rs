//! Dialect adapters: per-engine rendering and capability rules.
//!
//! A [`Dialect`] is a small capability set (identifier quoting, placeholder
//! syntax, RETURNING support, value coercion) selected once when the execution
//! engine is constructed. Compilation consults the dialect; execution never
//! re-negotiates syntax. Requesting a feature a dialect lacks fails at compile
//! time with [`QueryError::Unsupported`](crate::QueryError::Unsupported), so
//! the failure is reproducible without a live connection.

use crate::schema::ColumnType;
use crate::value::Value;

/// Capability set implemented by each database engine variant.
pub trait Dialect: Send + Sync + std::fmt::Debug {
    /// Engine name, used in error messages and statement caching keys.
    fn name(&self) -> &'static str;

    /// Quote a single (non-qualified) identifier.
    ///
    /// The quoting character embedded in the identifier is doubled, so no
    /// identifier can break out of its quotes.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Render the placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Whether the engine supports a native RETURNING clause on mutations.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Clause emitted for an INSERT that supplies no values.
    fn empty_insert_clause(&self) -> &'static str {
        "DEFAULT VALUES"
    }

    /// Coerce a bound value toward the representation the engine stores for
    /// `target`. Must never widen into SQL text; coercion only reshapes the
    /// bound value.
    fn coerce(&self, value: Value, target: &ColumnType) -> Value {
        let _ = target;
        value
    }

    /// Render the LIMIT/OFFSET tail for this engine.
    fn limit_clause(&self, limit: Option<i64>, offset: Option<i64>) -> String {
        let mut out = String::new();
        if let Some(n) = limit {
            out.push_str(&format!(" LIMIT {}", n));
        }
        if let Some(n) = offset {
            out.push_str(&format!(" OFFSET {}", n));
        }
        out
    }
}

fn quote_with(ident: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(ident.len() + 2);
    out.push(open);
    for ch in ident.chars() {
        out.push(ch);
        if ch == close {
            out.push(close);
        }
    }
    out.push(close);
    out
}

/// PostgreSQL: double-quoted identifiers, `$n` placeholders, native RETURNING.
#[derive(Clone, Copy, Debug, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '"', '"')
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn supports_returning(&self) -> bool {
        true
    }
}

/// MySQL: backtick identifiers, `?` placeholders, no RETURNING.
#[derive(Clone, Copy, Debug, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '`', '`')
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    // MySQL has no DEFAULT VALUES form.
    fn empty_insert_clause(&self) -> &'static str {
        "() VALUES ()"
    }

    fn coerce(&self, value: Value, target: &ColumnType) -> Value {
        match (value, target) {
            // MySQL BOOLEAN is TINYINT(1).
            (Value::Bool(b), ColumnType::Bool) => Value::Int2(b as i16),
            (Value::Uuid(u), ColumnType::Uuid) => Value::Text(u.to_string()),
            (v, _) => v,
        }
    }
}

/// SQLite: double-quoted identifiers, `?` placeholders, RETURNING since 3.35.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '"', '"')
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn coerce(&self, value: Value, target: &ColumnType) -> Value {
        match (value, target) {
            (Value::Bool(b), ColumnType::Bool) => Value::Int8(b as i64),
            (Value::Uuid(u), ColumnType::Uuid) => Value::Text(u.to_string()),
            (Value::Json(j), ColumnType::Json) => Value::Text(j.to_string()),
            (Value::Date(d), ColumnType::Date) => Value::Text(d.to_string()),
            (Value::Timestamp(t), ColumnType::Timestamp) => Value::Text(t.to_string()),
            (Value::TimestampTz(t), ColumnType::TimestampTz) => Value::Text(t.to_rfc3339()),
            (v, _) => v,
        }
    }
}

/// SQL Server: bracketed identifiers, `@Pn` placeholders, no RETURNING
/// (OUTPUT is a different shape and is not emulated).
#[derive(Clone, Copy, Debug, Default)]
pub struct SqlServer;

impl Dialect for SqlServer {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '[', ']')
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@P{}", index)
    }

    fn coerce(&self, value: Value, target: &ColumnType) -> Value {
        match (value, target) {
            // BIT accepts 0/1.
            (Value::Bool(b), ColumnType::Bool) => Value::Int2(b as i16),
            (v, _) => v,
        }
    }

    fn limit_clause(&self, limit: Option<i64>, offset: Option<i64>) -> String {
        match (limit, offset) {
            (None, None) => String::new(),
            (l, o) => {
                let mut out = format!(" OFFSET {} ROWS", o.unwrap_or(0));
                if let Some(n) = l {
                    out.push_str(&format!(" FETCH NEXT {} ROWS ONLY", n));
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_per_dialect() {
        assert_eq!(Postgres.quote_identifier("users"), "\"users\"");
        assert_eq!(MySql.quote_identifier("users"), "`users`");
        assert_eq!(SqlServer.quote_identifier("users"), "[users]");
    }

    #[test]
    fn quoting_doubles_embedded_quote_char() {
        assert_eq!(Postgres.quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(MySql.quote_identifier("we`ird"), "`we``ird`");
        assert_eq!(SqlServer.quote_identifier("we]ird"), "[we]]ird]");
    }

    #[test]
    fn placeholders_per_dialect() {
        assert_eq!(Postgres.placeholder(3), "$3");
        assert_eq!(MySql.placeholder(3), "?");
        assert_eq!(Sqlite.placeholder(1), "?");
        assert_eq!(SqlServer.placeholder(2), "@P2");
    }

    #[test]
    fn returning_support() {
        assert!(Postgres.supports_returning());
        assert!(Sqlite.supports_returning());
        assert!(!MySql.supports_returning());
        assert!(!SqlServer.supports_returning());
    }

    #[test]
    fn sqlite_coerces_rich_types() {
        let u = uuid::Uuid::nil();
        assert_eq!(
            Sqlite.coerce(Value::Uuid(u), &ColumnType::Uuid),
            Value::Text(u.to_string())
        );
        assert_eq!(
            Sqlite.coerce(Value::Bool(true), &ColumnType::Bool),
            Value::Int8(1)
        );
    }

    #[test]
    fn sqlserver_paging_clause() {
        assert_eq!(
            SqlServer.limit_clause(Some(10), Some(20)),
            " OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(SqlServer.limit_clause(None, None), "");
        assert_eq!(Postgres.limit_clause(Some(5), None), " LIMIT 5");
    }
}
