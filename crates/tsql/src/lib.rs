//! tsql - a type-safe SQL query builder for async Rust
//!
//! Queries are assembled through fluent builders that validate every table
//! and column reference against a schema descriptor at the call that
//! introduces it, compile deterministically into parameterized SQL for a
//! chosen dialect, and execute over tokio-postgres (plain clients,
//! transactions, or a deadpool pool).
//!
//! # Quick start
//!
//! ```ignore
//! use tsql::{ColumnType, ConnectionConfig, Database, Postgres, Schema, TableDef};
//!
//! let schema = Schema::new().table(
//!     TableDef::new("users")
//!         .generated("id", ColumnType::Int8)
//!         .column("username", ColumnType::Text)
//!         .nullable("bio", ColumnType::Text),
//! );
//!
//! let pool = tsql::pool_from_config(&ConnectionConfig::default())?;
//! let db = Database::new(pool, &Postgres, schema);
//! let client = db.client().await?;
//!
//! let names: Vec<Single<String>> = db
//!     .select_from("users")?
//!     .select(&["username"])?
//!     .where_eq("status", "active")?
//!     .execute(&client)
//!     .await?;
//! ```
//!
//! Every literal that reaches a query travels as a bound parameter; the only
//! way to splice text into SQL is the explicit [`sql`] escape hatch with its
//! [`SqlFragment::raw`] opt-out.

pub mod client;
pub mod compile;
#[cfg(feature = "pool")]
pub mod database;
pub mod dialect;
pub mod error;
pub mod expr;
#[cfg(feature = "pool")]
pub mod pool;
pub mod qb;
pub mod row;
pub mod schema;
pub mod sql;
#[cfg(feature = "pool")]
pub mod transaction;
pub mod value;

pub use client::GenericClient;
pub use compile::CompiledStatement;
#[cfg(feature = "pool")]
pub use database::Database;
pub use dialect::{Dialect, MySql, Postgres, Sqlite, SqlServer};
pub use error::{QueryError, QueryResult};
pub use expr::Expr;
#[cfg(feature = "pool")]
pub use pool::{ConnectionConfig, pool_from_config, pool_from_url};
pub use qb::{DeleteBuilder, InsertBuilder, JoinKind, Order, SelectBuilder, UpdateBuilder};
pub use row::{FromRow, KeyCase, RowExt, Single, row_to_json};
pub use schema::{ColumnDef, ColumnType, Schema, TableDef};
pub use sql::{SqlFragment, sql};
#[cfg(feature = "pool")]
pub use transaction::TransactionBuilder;
pub use value::Value;

// Commonly paired re-exports so callers need not add these crates directly.
pub use tokio_postgres::Row;
#[cfg(feature = "pool")]
pub use deadpool_postgres::Pool;
