//! Schema descriptor: the table-and-column catalog builders validate against.
//!
//! The schema is supplied once by the embedding program (typically at startup)
//! and shared read-only behind an `Arc`. The core never infers it from a live
//! database; generating a descriptor from an existing database is the job of
//! external tooling.
//!
//! # Example
//!
//! ```ignore
//! use tsql::{ColumnType, Schema, TableDef};
//!
//! let schema = Schema::new()
//!     .table(
//!         TableDef::new("posts")
//!             .generated("id", ColumnType::Int8)
//!             .column("title", ColumnType::Text)
//!             .nullable("body", ColumnType::Text),
//!     );
//! ```

use std::collections::BTreeMap;

use crate::error::{QueryError, QueryResult};

/// The semantic type of a column, independent of any dialect's rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Text,
    Bytes,
    Uuid,
    Date,
    Timestamp,
    TimestampTz,
    Json,
}

/// Definition of a single column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    /// Semantic column type.
    pub ty: ColumnType,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Whether the database generates the value (serial/identity/default).
    pub generated: bool,
}

/// Definition of a table: an ordered map of column definitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDef {
    name: String,
    columns: BTreeMap<String, ColumnDef>,
}

impl TableDef {
    /// Create an empty table definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Add a non-nullable column.
    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.insert(
            name.into(),
            ColumnDef {
                ty,
                nullable: false,
                generated: false,
            },
        );
        self
    }

    /// Add a nullable column.
    pub fn nullable(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.insert(
            name.into(),
            ColumnDef {
                ty,
                nullable: true,
                generated: false,
            },
        );
        self
    }

    /// Add a database-generated column (identity, serial, default expression).
    ///
    /// Generated columns may be omitted from INSERT values.
    pub fn generated(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.insert(
            name.into(),
            ColumnDef {
                ty,
                nullable: false,
                generated: true,
            },
        );
        self
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a column definition.
    pub fn column_def(&self, column: &str) -> Option<&ColumnDef> {
        self.columns.get(column)
    }

    /// Whether the table has the given column.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Iterate over column names in deterministic order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

/// The full schema descriptor: table name → [`TableDef`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    tables: BTreeMap<String, TableDef>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table definition (chainable).
    pub fn table(mut self, table: TableDef) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Look up a table definition.
    pub fn table_def(&self, table: &str) -> Option<&TableDef> {
        self.tables.get(table)
    }

    /// Look up a table, failing with `UnknownTable`.
    pub(crate) fn require_table(&self, table: &str) -> QueryResult<&TableDef> {
        self.tables
            .get(table)
            .ok_or_else(|| QueryError::UnknownTable(table.to_string()))
    }

    /// Resolve a column reference against a set of tables in scope.
    ///
    /// Accepts `*`, `table.*`, `table.column` and bare `column` forms.
    /// `cte_names` are opaque bindings (their projections are not known to the
    /// descriptor), so any column qualified by a CTE name resolves.
    pub(crate) fn check_column(
        &self,
        scope: &[String],
        cte_names: &[String],
        reference: &str,
    ) -> QueryResult<()> {
        if reference == "*" {
            return Ok(());
        }

        if let Some((table, column)) = reference.split_once('.') {
            if !scope.iter().any(|t| t == table) {
                return Err(QueryError::UnknownTable(table.to_string()));
            }
            if cte_names.iter().any(|t| t == table) {
                return Ok(());
            }
            let def = self.require_table(table)?;
            if column == "*" || def.has_column(column) {
                return Ok(());
            }
            return Err(QueryError::unknown_column(reference, scope));
        }

        // Bare column: any in-scope table (or CTE) may provide it.
        let found = scope.iter().any(|t| {
            cte_names.iter().any(|c| c == t)
                || self.tables.get(t).is_some_and(|def| def.has_column(reference))
        });
        if found {
            Ok(())
        } else {
            Err(QueryError::unknown_column(reference, scope))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new().table(
            TableDef::new("users")
                .generated("id", ColumnType::Int8)
                .column("username", ColumnType::Text)
                .nullable("bio", ColumnType::Text),
        )
    }

    #[test]
    fn require_table_unknown() {
        let err = schema().require_table("orders").unwrap_err();
        assert!(matches!(err, QueryError::UnknownTable(t) if t == "orders"));
    }

    #[test]
    fn check_bare_and_qualified_columns() {
        let s = schema();
        let scope = vec!["users".to_string()];
        assert!(s.check_column(&scope, &[], "username").is_ok());
        assert!(s.check_column(&scope, &[], "users.id").is_ok());
        assert!(s.check_column(&scope, &[], "users.*").is_ok());
        assert!(s.check_column(&scope, &[], "*").is_ok());
        assert!(s.check_column(&scope, &[], "users.missing").is_err());
        assert!(s.check_column(&scope, &[], "missing").is_err());
    }

    #[test]
    fn qualified_column_requires_table_in_scope() {
        let s = schema();
        let err = s
            .check_column(&["users".to_string()], &[], "orders.id")
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownTable(_)));
    }

    #[test]
    fn cte_names_are_opaque() {
        let s = schema();
        let scope = vec!["recent".to_string()];
        let ctes = vec!["recent".to_string()];
        assert!(s.check_column(&scope, &ctes, "recent.anything").is_ok());
    }

    #[test]
    fn generated_flag_recorded() {
        let s = schema();
        let def = s.table_def("users").unwrap().column_def("id").unwrap();
        assert!(def.generated);
        assert!(!def.nullable);
        assert_eq!(def.ty, ColumnType::Int8);
    }
}
