//! Compiled statements and the parameter accumulator.
//!
//! Compilation is a pure function of (plan, dialect): rendering the same
//! builder twice yields a byte-identical [`CompiledStatement`]. The
//! accumulator is threaded through the depth-first clause render so every
//! literal appends to the parameter list and emits a dialect-correct
//! placeholder; nothing is ever inlined into the SQL text.

use tokio_postgres::types::ToSql;

use crate::dialect::Dialect;
use crate::value::Value;

/// Parameterized SQL text plus its ordered bind values.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledStatement {
    /// Rendered SQL with dialect-specific placeholders.
    pub sql: String,
    /// Bind values in placeholder order.
    pub params: Vec<Value>,
}

impl CompiledStatement {
    /// Borrow the parameters as references compatible with tokio-postgres.
    pub fn param_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }
}

/// Accumulates bind values during a render pass and hands out placeholders.
pub(crate) struct ParamAccumulator<'d> {
    dialect: &'d dyn Dialect,
    params: Vec<Value>,
}

impl<'d> ParamAccumulator<'d> {
    pub(crate) fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    /// Bind a value and return the placeholder text to splice into the SQL.
    pub(crate) fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        self.dialect.placeholder(self.params.len())
    }

    pub(crate) fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Quote a possibly-qualified column path (`t.c` → `"t"."c"`).
    ///
    /// `*` segments pass through unquoted; everything else goes through the
    /// dialect's identifier quoting.
    pub(crate) fn quote_path(&self, path: &str) -> String {
        path.split('.')
            .map(|seg| {
                if seg == "*" {
                    seg.to_string()
                } else {
                    self.dialect.quote_identifier(seg)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    pub(crate) fn finish(self, sql: String) -> CompiledStatement {
        tracing::debug!(sql = %sql, params = self.params.len(), "compiled statement");
        CompiledStatement {
            sql,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres};

    #[test]
    fn bind_numbers_sequentially() {
        let mut acc = ParamAccumulator::new(&Postgres);
        assert_eq!(acc.bind(Value::Int4(1)), "$1");
        assert_eq!(acc.bind(Value::Int4(2)), "$2");
        let stmt = acc.finish("SELECT $1, $2".to_string());
        assert_eq!(stmt.params, vec![Value::Int4(1), Value::Int4(2)]);
    }

    #[test]
    fn bind_uses_dialect_placeholders() {
        let mut acc = ParamAccumulator::new(&MySql);
        assert_eq!(acc.bind(Value::Int4(1)), "?");
        assert_eq!(acc.bind(Value::Int4(2)), "?");
    }

    #[test]
    fn quote_path_handles_qualified_and_star() {
        let acc = ParamAccumulator::new(&Postgres);
        assert_eq!(acc.quote_path("users.id"), "\"users\".\"id\"");
        assert_eq!(acc.quote_path("id"), "\"id\"");
        assert_eq!(acc.quote_path("users.*"), "\"users\".*");
    }
}
